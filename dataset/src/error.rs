use std::path::PathBuf;

use speakerid_features::FeatureError;
use thiserror::Error;

/// Errors returned while loading recordings or building the feature matrix.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad recording file name {name:?}: expected <prefix>-<speaker>-<number>-<label>")]
    BadFileName { name: String },

    #[error("heart rate file not found: {}", path.display())]
    MissingHeartRate { path: PathBuf },

    #[error("csv {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}:{row}:{col}: not a number: {value:?}", path.display())]
    Parse {
        path: PathBuf,
        row: usize,
        col: usize,
        value: String,
    },

    #[error("{}:{row}: expected {expected} columns, got {got}", path.display())]
    Ragged {
        path: PathBuf,
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("{}: need at least {min} columns, got {got}", path.display())]
    TooFewColumns {
        path: PathBuf,
        min: usize,
        got: usize,
    },

    #[error("aligned rows need at least {min} columns, got {got}")]
    NarrowRows { min: usize, got: usize },

    #[error("{}: aligned rows have {got} columns, earlier recordings have {expected}", path.display())]
    WidthMismatch {
        path: PathBuf,
        expected: usize,
        got: usize,
    },

    #[error("feature extraction failed for window {index}: {source}")]
    Feature {
        index: usize,
        #[source]
        source: FeatureError,
    },

    #[error("window {index}: feature vector has {got} values, matrix has {expected} columns")]
    FeatureWidth {
        index: usize,
        expected: usize,
        got: usize,
    },

    #[error("window {index}: label {value} is not a non-negative number")]
    InvalidLabel { index: usize, value: f64 },

    #[error("feature matrix has {rows} rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
