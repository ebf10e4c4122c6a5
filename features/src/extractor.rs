use crate::FeatureError;

/// Turns one raw audio window into a fixed-length feature vector.
///
/// The input is the window's raw samples in recording order (no timestamp,
/// heart-rate or label columns). The output length is expected to equal
/// [`FeatureExtractor::dimension`]; callers treat a different length as a
/// warning, not an error.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use.
pub trait FeatureExtractor: Send + Sync {
    /// Computes the feature vector for a single window.
    fn extract(&self, window: &[f64]) -> Result<Vec<f64>, FeatureError>;

    /// Returns the length of the vectors produced by [`FeatureExtractor::extract`].
    fn dimension(&self) -> usize;
}
