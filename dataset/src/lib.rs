//! Loading and featurizing labelled speaker recordings.
//!
//! # Data Layout
//!
//! A data directory holds pairs of headerless numeric CSV files:
//!
//! ```text
//! audio-<speaker>-<number>-<label>.csv   timestamp, samples..., placeholder
//! ppg-<speaker>-<number>-<label>.csv     timestamp, heart rate, label, ...
//! ```
//!
//! [`load_dir`] aligns each pair row by row (truncating to the shorter file)
//! into a [`RawDataset`] whose rows are `[timestamp, samples..., rate, label]`.
//! [`extract_features`] then turns every window into one row of a
//! [`FeatureSet`] using a [`speakerid_features::FeatureExtractor`].

mod error;
mod features;
mod filename;
mod loader;
mod registry;

pub use error::DatasetError;
pub use features::{extract_features, with_bias, FeatureSet};
pub use filename::RecordingName;
pub use loader::{align, load_dir, read_csv, LabelSource, LoaderConfig, RawDataset, Recording};
pub use registry::SpeakerRegistry;
