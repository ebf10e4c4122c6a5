use ndarray::{Array1, ArrayView2};
use tracing::{debug, warn};

use crate::learner::StructuredLearner;
use crate::model::{find_constraint, LinearModel, MultiClassModel};
use crate::qp::DualQp;
use crate::SvmError;

const QP_MAX_SWEEPS: usize = 10_000;

/// 1-slack cutting-plane structured SVM.
///
/// Every iteration runs loss-augmented inference on all samples and adds one
/// constraint built from the averaged joint-feature difference and loss. All
/// constraints share a single slack with dual budget `c * n`. Training stops
/// when the newest constraint exceeds the current slack by less than `tol`.
#[derive(Debug, Clone)]
pub struct OneSlackSsvm {
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    fitted: Option<LinearModel>,
}

impl Default for OneSlackSsvm {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 10_000,
            tol: 1e-3,
            fitted: None,
        }
    }
}

impl OneSlackSsvm {
    pub fn new(c: f64, max_iter: usize, tol: f64) -> Self {
        Self {
            c,
            max_iter,
            tol,
            fitted: None,
        }
    }
}

impl StructuredLearner for OneSlackSsvm {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<(), SvmError> {
        if !(self.c > 0.0) {
            return Err(SvmError::InvalidParam(format!("C must be positive, got {}", self.c)));
        }
        if !(self.tol > 0.0) {
            return Err(SvmError::InvalidParam(format!("tol must be positive, got {}", self.tol)));
        }
        let (model, classes, encoded) = MultiClassModel::for_data(x, y)?;
        let y = encoded.as_slice();
        model.check(x, y)?;

        let n = x.nrows() as f64;
        let mut qp = DualQp::new(model.size());
        let group = qp.add_group(self.c * n);
        let mut converged = false;

        for iteration in 0..self.max_iter {
            let mut dpsi = Array1::<f64>::zeros(model.size());
            let mut loss = 0.0;
            for (row, &label) in x.outer_iter().zip(y) {
                let c = find_constraint(&model, row, label, qp.w().view());
                dpsi += &c.dpsi;
                loss += c.loss;
            }
            dpsi /= n;
            loss /= n;

            let violation = loss - qp.w().dot(&dpsi);
            let slack = qp.slack(group);
            debug!(
                "one-slack iteration {}: violation {:.6}, slack {:.6}, {} constraints",
                iteration,
                violation,
                slack,
                qp.len()
            );
            if violation - slack < self.tol {
                converged = true;
                break;
            }

            qp.push(group, dpsi, loss);
            qp.solve(self.tol * 0.1, QP_MAX_SWEEPS);
        }
        if !converged {
            warn!(
                "one-slack SSVM did not converge within {} iterations",
                self.max_iter
            );
        }

        self.fitted = Some(LinearModel {
            model,
            classes,
            w: qp.w().clone(),
        });
        Ok(())
    }

    fn fitted(&self) -> Option<&LinearModel> {
        self.fitted.as_ref()
    }
}
