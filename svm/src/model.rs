use ndarray::{s, Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::SvmError;

/// Multiclass structured model.
///
/// The joint feature `psi(x, y)` is a `n_classes * n_features` vector with
/// `x` copied into block `y` and zeros elsewhere, so `w . psi(x, y)` is the
/// score of class `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiClassModel {
    pub n_features: usize,
    pub n_classes: usize,
}

impl MultiClassModel {
    pub fn new(n_features: usize, n_classes: usize) -> Result<Self, SvmError> {
        if n_features == 0 {
            return Err(SvmError::InvalidParam("n_features must be positive".into()));
        }
        if n_classes < 2 {
            return Err(SvmError::InvalidParam(format!(
                "n_classes must be at least 2, got {n_classes}"
            )));
        }
        Ok(Self {
            n_features,
            n_classes,
        })
    }

    /// Builds a model with one block per distinct label in `y`.
    ///
    /// Returns the sorted distinct labels and `y` re-encoded as indices into
    /// them, which is what the learners train on.
    pub fn for_data(
        x: ArrayView2<'_, f64>,
        y: &[usize],
    ) -> Result<(Self, Vec<usize>, Vec<usize>), SvmError> {
        check_training(x, y)?;
        let (classes, encoded) = encode_labels(y);
        if classes.len() < 2 {
            return Err(SvmError::TooFewClasses(classes.len()));
        }
        let model = Self::new(x.ncols(), classes.len())?;
        Ok((model, classes, encoded))
    }

    /// Length of the weight vector.
    pub fn size(&self) -> usize {
        self.n_features * self.n_classes
    }

    pub fn joint_feature(&self, x: ArrayView1<'_, f64>, y: usize) -> Array1<f64> {
        let mut psi = Array1::zeros(self.size());
        self.block_mut(&mut psi, y).assign(&x);
        psi
    }

    /// `psi(x, y) - psi(x, y_hat)`.
    pub fn delta_joint_feature(&self, x: ArrayView1<'_, f64>, y: usize, y_hat: usize) -> Array1<f64> {
        let mut d = Array1::zeros(self.size());
        if y != y_hat {
            self.block_mut(&mut d, y).assign(&x);
            self.block_mut(&mut d, y_hat).assign(&x.mapv(|v| -v));
        }
        d
    }

    /// Class scores `w_y . x` for every class.
    pub fn scores(&self, x: ArrayView1<'_, f64>, w: ArrayView1<'_, f64>) -> Vec<f64> {
        (0..self.n_classes)
            .map(|c| {
                let start = c * self.n_features;
                w.slice(s![start..start + self.n_features]).dot(&x)
            })
            .collect()
    }

    /// Highest scoring class; ties go to the lower label.
    pub fn inference(&self, x: ArrayView1<'_, f64>, w: ArrayView1<'_, f64>) -> usize {
        argmax(&self.scores(x, w))
    }

    /// Most violating class: `argmax_c w_c . x + loss(y, c)`.
    pub fn loss_augmented_inference(
        &self,
        x: ArrayView1<'_, f64>,
        y: usize,
        w: ArrayView1<'_, f64>,
    ) -> usize {
        let mut scores = self.scores(x, w);
        for (c, s) in scores.iter_mut().enumerate() {
            *s += self.loss(y, c);
        }
        argmax(&scores)
    }

    /// Zero-one loss.
    pub fn loss(&self, y: usize, y_hat: usize) -> f64 {
        if y == y_hat { 0.0 } else { 1.0 }
    }

    /// Checks that `x`/`y` can be used to train this model.
    pub fn check(&self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<(), SvmError> {
        check_training(x, y)?;
        if x.ncols() != self.n_features {
            return Err(SvmError::DimensionMismatch {
                expected: self.n_features,
                got: x.ncols(),
            });
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= self.n_classes) {
            return Err(SvmError::InvalidParam(format!(
                "label {bad} outside 0..{}",
                self.n_classes
            )));
        }
        Ok(())
    }

    fn block_mut<'a>(
        &self,
        v: &'a mut Array1<f64>,
        class: usize,
    ) -> ndarray::ArrayViewMut1<'a, f64> {
        let start = class * self.n_features;
        v.slice_mut(s![start..start + self.n_features])
    }
}

/// A fitted weight vector together with its model.
///
/// Block `i` of `w` scores the label `classes[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub model: MultiClassModel,
    pub classes: Vec<usize>,
    pub w: Array1<f64>,
}

impl LinearModel {
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>, SvmError> {
        if x.ncols() != self.model.n_features {
            return Err(SvmError::DimensionMismatch {
                expected: self.model.n_features,
                got: x.ncols(),
            });
        }
        Ok(x
            .outer_iter()
            .map(|row| self.classes[self.model.inference(row, self.w.view())])
            .collect())
    }
}

/// Sorted distinct labels and `y` mapped to positions in that list.
pub(crate) fn encode_labels(y: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let mut classes = y.to_vec();
    classes.sort_unstable();
    classes.dedup();
    let encoded = y
        .iter()
        .map(|c| classes.binary_search(c).unwrap_or_default())
        .collect();
    (classes, encoded)
}

/// Most violated constraint of one sample under the current weights.
#[derive(Debug, Clone)]
pub(crate) struct Constraint {
    pub y_hat: usize,
    pub dpsi: Array1<f64>,
    pub loss: f64,
    /// `loss - w . dpsi`; positive when the margin is violated.
    pub slack: f64,
}

pub(crate) fn find_constraint(
    model: &MultiClassModel,
    x: ArrayView1<'_, f64>,
    y: usize,
    w: ArrayView1<'_, f64>,
) -> Constraint {
    let y_hat = model.loss_augmented_inference(x, y, w);
    let dpsi = model.delta_joint_feature(x, y, y_hat);
    let loss = model.loss(y, y_hat);
    let slack = loss - w.dot(&dpsi);
    Constraint {
        y_hat,
        dpsi,
        loss,
        slack,
    }
}

/// Rejects empty or mismatched training data.
pub(crate) fn check_training(x: ArrayView2<'_, f64>, y: &[usize]) -> Result<(), SvmError> {
    if x.nrows() == 0 {
        return Err(SvmError::EmptyTrainingSet);
    }
    if x.nrows() != y.len() {
        return Err(SvmError::LengthMismatch {
            samples: x.nrows(),
            labels: y.len(),
        });
    }
    Ok(())
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
