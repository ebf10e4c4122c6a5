use ndarray::{ArrayView1, ArrayView2};

use crate::metrics::accuracy;
use crate::model::LinearModel;
use crate::SvmError;

/// A multiclass classifier the benchmark can drive uniformly.
pub trait Classifier {
    /// Trains on rows of `x` labelled by `y`, replacing any earlier fit.
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<(), SvmError>;

    /// Predicts one label per row of `x`.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>, SvmError>;

    /// Mean accuracy of [`Classifier::predict`] on `x` against `y`.
    fn score(&self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<f64, SvmError> {
        if x.nrows() != y.len() {
            return Err(SvmError::LengthMismatch {
                samples: x.nrows(),
                labels: y.len(),
            });
        }
        let pred = self.predict(x)?;
        Ok(accuracy(y, &pred))
    }
}

/// Structured SVM learner over a [`crate::MultiClassModel`].
///
/// Implementors only provide training and access to the fitted weights;
/// prediction is loss-free inference with those weights.
pub trait StructuredLearner {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<(), SvmError>;

    /// Fitted model, if any.
    fn fitted(&self) -> Option<&LinearModel>;

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>, SvmError> {
        self.fitted().ok_or(SvmError::NotFitted)?.predict(x)
    }

    /// Learned weight vector, laid out class block by class block.
    fn weights(&self) -> Option<ArrayView1<'_, f64>> {
        self.fitted().map(|m| m.w.view())
    }
}

impl<T: StructuredLearner> Classifier for T {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<(), SvmError> {
        StructuredLearner::fit(self, x, y)
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>, SvmError> {
        StructuredLearner::predict(self, x)
    }
}
