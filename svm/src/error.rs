use thiserror::Error;

/// Errors returned by learners, metrics and data splitting.
#[derive(Debug, Error)]
pub enum SvmError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("length mismatch: {samples} samples, {labels} labels")]
    LengthMismatch { samples: usize, labels: usize },

    #[error("dimension mismatch: expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("training data has {0} distinct class(es); at least 2 are required")]
    TooFewClasses(usize),

    #[error("classifier is not fitted")]
    NotFitted,

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("invalid split: {0}")]
    InvalidSplit(String),

    #[error("unknown classifier {0:?}")]
    UnknownClassifier(String),

    #[error("entropy source: {0}")]
    Entropy(String),
}
