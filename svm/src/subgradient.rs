use ndarray::{Array1, ArrayView2};
use tracing::{debug, warn};

use crate::learner::StructuredLearner;
use crate::model::{find_constraint, LinearModel, MultiClassModel};
use crate::SvmError;

/// Online subgradient structured SVM.
///
/// Visits samples in order and steps along `c * dpsi - w / n` with learning
/// rate `learning_rate / (t + decay_t0)^decay_exponent`, where `t` counts
/// updates. Stops early once a full pass finds no margin violation.
#[derive(Debug, Clone)]
pub struct SubgradientSsvm {
    pub c: f64,
    pub max_iter: usize,
    pub learning_rate: f64,
    /// Exponent of the learning-rate decay; 0 keeps the rate constant.
    pub decay_exponent: f64,
    pub decay_t0: f64,
    /// Fraction of the previous step carried into the next, in `[0, 1)`.
    pub momentum: f64,
    fitted: Option<LinearModel>,
}

impl Default for SubgradientSsvm {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            learning_rate: 1e-3,
            decay_exponent: 1.0,
            decay_t0: 10.0,
            momentum: 0.0,
            fitted: None,
        }
    }
}

impl SubgradientSsvm {
    pub fn new(c: f64, max_iter: usize, learning_rate: f64) -> Self {
        Self {
            c,
            max_iter,
            learning_rate,
            ..Self::default()
        }
    }

    fn effective_rate(&self, t: f64) -> f64 {
        if self.decay_exponent == 0.0 {
            self.learning_rate
        } else {
            self.learning_rate / (t + self.decay_t0).powf(self.decay_exponent)
        }
    }
}

impl StructuredLearner for SubgradientSsvm {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<(), SvmError> {
        if !(self.c > 0.0) {
            return Err(SvmError::InvalidParam(format!("C must be positive, got {}", self.c)));
        }
        if !(self.learning_rate > 0.0) {
            return Err(SvmError::InvalidParam(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(SvmError::InvalidParam(format!(
                "momentum must be in [0, 1), got {}",
                self.momentum
            )));
        }
        let (model, classes, encoded) = MultiClassModel::for_data(x, y)?;
        let y = encoded.as_slice();
        model.check(x, y)?;

        let n = x.nrows() as f64;
        let mut w = Array1::<f64>::zeros(model.size());
        let mut step = Array1::<f64>::zeros(model.size());
        let mut t = 0.0;
        let mut converged = false;

        for iteration in 0..self.max_iter {
            let mut violated = 0usize;
            let mut slack_sum = 0.0;

            for (row, &label) in x.outer_iter().zip(y) {
                let c = find_constraint(&model, row, label, w.view());
                if c.y_hat != label {
                    violated += 1;
                }
                slack_sum += c.slack.max(0.0);

                let mut grad = c.dpsi * self.c;
                grad.scaled_add(-1.0 / n, &w);
                step *= self.momentum;
                step.scaled_add(1.0 - self.momentum, &grad);
                w.scaled_add(self.effective_rate(t), &step);
                t += 1.0;
            }

            debug!(
                "subgradient iteration {}: {} violations, objective {:.6}",
                iteration,
                violated,
                0.5 * w.dot(&w) + self.c * slack_sum
            );
            if violated == 0 {
                converged = true;
                break;
            }
        }
        if !converged {
            warn!(
                "subgradient SSVM still had margin violations after {} iterations",
                self.max_iter
            );
        }

        self.fitted = Some(LinearModel { model, classes, w });
        Ok(())
    }

    fn fitted(&self) -> Option<&LinearModel> {
        self.fitted.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_rate_without_decay() {
        let mut svm = SubgradientSsvm::new(1.0, 10, 0.5);
        svm.decay_exponent = 0.0;
        assert_eq!(svm.effective_rate(0.0), 0.5);
        assert_eq!(svm.effective_rate(100.0), 0.5);
    }

    #[test]
    fn rate_decays_with_updates() {
        let svm = SubgradientSsvm::new(1.0, 10, 1.0);
        assert!((svm.effective_rate(0.0) - 0.1).abs() < 1e-12);
        assert!((svm.effective_rate(90.0) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn learns_two_blobs() {
        let x = ndarray::array![
            [1.0, 0.2, 1.0],
            [1.2, -0.1, 1.0],
            [-1.0, 0.1, 1.0],
            [-1.1, -0.2, 1.0],
        ];
        let y = vec![0, 0, 1, 1];
        let mut svm = SubgradientSsvm::new(1.0, 200, 0.1);
        svm.decay_exponent = 0.0;
        StructuredLearner::fit(&mut svm, x.view(), &y).unwrap();
        assert_eq!(StructuredLearner::predict(&svm, x.view()).unwrap(), y);
    }

    #[test]
    fn rejects_bad_momentum() {
        let x = ndarray::array![[1.0], [2.0]];
        let mut svm = SubgradientSsvm::new(1.0, 10, 0.1);
        svm.momentum = 1.5;
        assert!(StructuredLearner::fit(&mut svm, x.view(), &[0, 1]).is_err());
    }
}
