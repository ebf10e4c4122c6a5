//! Audio features for speaker identification from short raw-audio windows.
//!
//! # Pipeline
//!
//! Each window is cut into overlapping frames (25ms / 10ms at 8kHz by
//! default). Per frame the extractor computes:
//!
//! 1. LPC envelope peaks, accumulated into a formant histogram
//! 2. An autocorrelation pitch estimate, accumulated into a pitch histogram
//! 3. Short-time descriptors and MFCCs, averaged over frames
//!
//! ```text
//! window (N samples) -> frames -> [formants | pitch | short-time | mfcc]
//! ```
//!
//! The [`FeatureExtractor`] trait is the contract the dataset loop depends
//! on; [`SpeakerFeatureExtractor`] is the default implementation.

mod error;
mod extractor;
mod fft;
mod lpc;
mod mel;
mod pitch;
mod short_term;
mod speaker;

pub use error::FeatureError;
pub use extractor::FeatureExtractor;
pub use short_term::SHORT_TERM_FEATURES;
pub use speaker::{FeatureConfig, SpeakerFeatureExtractor};
