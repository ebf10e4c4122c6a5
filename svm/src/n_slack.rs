use ndarray::ArrayView2;
use tracing::{debug, warn};

use crate::learner::StructuredLearner;
use crate::model::{find_constraint, LinearModel, MultiClassModel};
use crate::qp::DualQp;
use crate::SvmError;

const QP_MAX_SWEEPS: usize = 1000;

/// n-slack cutting-plane structured SVM.
///
/// Keeps a working set of constraints per sample, each sample's constraints
/// sharing a dual budget of `c`. Samples are visited in order; a constraint
/// joins the working set when it is violated by more than `tol` beyond the
/// sample's current slack, and the QP is re-solved after every `batch_size`
/// new constraints. Training stops once a full pass adds nothing.
#[derive(Debug, Clone)]
pub struct NSlackSsvm {
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub batch_size: usize,
    /// Skip constraints whose label is already in the sample's working set.
    pub check_constraints: bool,
    fitted: Option<LinearModel>,
}

impl Default for NSlackSsvm {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tol: 1e-3,
            batch_size: 100,
            check_constraints: true,
            fitted: None,
        }
    }
}

impl NSlackSsvm {
    pub fn new(c: f64, max_iter: usize, tol: f64, batch_size: usize, check_constraints: bool) -> Self {
        Self {
            c,
            max_iter,
            tol,
            batch_size,
            check_constraints,
            fitted: None,
        }
    }

    fn validate(&self) -> Result<(), SvmError> {
        if !(self.c > 0.0) {
            return Err(SvmError::InvalidParam(format!("C must be positive, got {}", self.c)));
        }
        if !(self.tol > 0.0) {
            return Err(SvmError::InvalidParam(format!("tol must be positive, got {}", self.tol)));
        }
        if self.batch_size == 0 {
            return Err(SvmError::InvalidParam("batch_size must be positive".into()));
        }
        Ok(())
    }
}

impl StructuredLearner for NSlackSsvm {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<(), SvmError> {
        self.validate()?;
        let (model, classes, encoded) = MultiClassModel::for_data(x, y)?;
        let y = encoded.as_slice();
        model.check(x, y)?;

        let n = x.nrows();
        let mut qp = DualQp::new(model.size());
        for _ in 0..n {
            qp.add_group(self.c);
        }
        let mut active: Vec<Vec<usize>> = vec![Vec::new(); n];
        let qp_eps = self.tol * 0.1;
        let mut converged = false;

        for iteration in 0..self.max_iter {
            let mut added = 0usize;
            let mut pending = 0usize;

            for (i, row) in x.outer_iter().enumerate() {
                let c = find_constraint(&model, row, y[i], qp.w().view());
                if c.y_hat == y[i] {
                    continue;
                }
                if c.slack <= qp.slack(i) + self.tol {
                    continue;
                }
                if self.check_constraints && active[i].contains(&c.y_hat) {
                    continue;
                }
                active[i].push(c.y_hat);
                qp.push(i, c.dpsi, c.loss);
                added += 1;
                pending += 1;
                if pending >= self.batch_size {
                    qp.solve(qp_eps, QP_MAX_SWEEPS);
                    pending = 0;
                }
            }
            if pending > 0 {
                qp.solve(qp_eps, QP_MAX_SWEEPS);
            }

            debug!(
                "n-slack iteration {}: {} new constraints, {} total, dual {:.6}",
                iteration,
                added,
                qp.len(),
                qp.dual_objective()
            );
            if added == 0 {
                converged = true;
                break;
            }
        }
        if !converged {
            warn!(
                "n-slack SSVM did not converge within {} iterations",
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
