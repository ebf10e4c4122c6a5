use ndarray::{s, Array2, ArrayView2};
use speakerid_features::FeatureExtractor;
use tracing::{debug, info, warn};

use crate::loader::RawDataset;
use crate::DatasetError;

/// Feature matrix `X` and label vector `y`; row `i` of both describe the
/// same source window.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    x: Array2<f64>,
    y: Vec<usize>,
}

impl FeatureSet {
    /// Pairs a matrix with its labels. Row and label counts must match.
    pub fn new(x: Array2<f64>, y: Vec<usize>) -> Result<Self, DatasetError> {
        if x.nrows() != y.len() {
            return Err(DatasetError::LengthMismatch {
                rows: x.nrows(),
                labels: y.len(),
            });
        }
        Ok(Self { x, y })
    }

    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn y(&self) -> &[usize] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Number of distinct labels.
    pub fn n_classes(&self) -> usize {
        self.unique_labels().len()
    }

    /// Distinct labels in ascending order.
    pub fn unique_labels(&self) -> Vec<usize> {
        let mut labels = self.y.clone();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    pub fn into_parts(self) -> (Array2<f64>, Vec<usize>) {
        (self.x, self.y)
    }
}

/// Runs `extractor` over every window of `raw` and appends the heart-rate
/// value as the last column.
///
/// A feature vector whose length differs from `expected_len` is logged and
/// kept. The first window fixes the matrix width; a later window whose
/// vector cannot be stacked is an error.
pub fn extract_features(
    raw: &RawDataset,
    extractor: &dyn FeatureExtractor,
    expected_len: usize,
) -> Result<FeatureSet, DatasetError> {
    info!(
        "Extracting features and labels for {} audio windows...",
        raw.len()
    );

    let mut values: Vec<f64> = Vec::new();
    let mut width: Option<usize> = None;
    let mut y = Vec::with_capacity(raw.len());

    for i in 0..raw.len() {
        debug!("Extracting features for window {}...", i);
        let window = raw.window(i);
        let x = match window.as_slice() {
            Some(samples) => extractor.extract(samples),
            None => extractor.extract(&window.to_vec()),
        }
        .map_err(|source| DatasetError::Feature { index: i, source })?;

        if x.len() != expected_len {
            warn!(
                "Received feature vector of length {}. Expected feature vector of length {}.",
                x.len(),
                expected_len
            );
        }

        let row_width = x.len() + 1;
        match width {
            None => width = Some(row_width),
            Some(w) if w != row_width => {
                return Err(DatasetError::FeatureWidth {
                    index: i,
                    expected: w - 1,
                    got: x.len(),
                });
            }
            Some(_) => {}
        }

        let label = raw.label(i);
        // usize::MAX as f64 rounds up to 2^64, the first value that saturates
        if !label.is_finite() || label < 0.0 || label >= usize::MAX as f64 {
            return Err(DatasetError::InvalidLabel {
                index: i,
                value: label,
            });
        }

        values.extend(x);
        values.push(raw.heart_rate(i));
        y.push(label.trunc() as usize);
    }

    let cols = width.unwrap_or(expected_len + 1);
    let x = Array2::from_shape_vec((y.len(), cols), values)?;
    let set = FeatureSet::new(x, y)?;

    info!("Finished feature extraction over {} windows", set.len());
    info!("Unique labels found: {:?}", set.unique_labels());
    Ok(set)
}

/// Appends a constant column of ones to `x`.
pub fn with_bias(x: ArrayView2<'_, f64>) -> Array2<f64> {
    let mut out = Array2::<f64>::ones((x.nrows(), x.ncols() + 1));
    out.slice_mut(s![.., ..x.ncols()]).assign(&x);
    out
}
