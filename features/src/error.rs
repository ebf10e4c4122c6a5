use thiserror::Error;

/// Errors returned by feature extraction.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("window too short: need at least {min_samples} samples, got {got_samples}")]
    WindowTooShort {
        min_samples: usize,
        got_samples: usize,
    },

    #[error("invalid feature config: {0}")]
    InvalidConfig(String),
}
