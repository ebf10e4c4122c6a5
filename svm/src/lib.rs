//! Multiclass SVMs for the speaker-ID benchmark.
//!
//! # Learners
//!
//! Structured SVMs share a [`MultiClassModel`] whose joint feature places a
//! sample in the weight block of its class:
//!
//! - [`NSlackSsvm`]: cutting plane, one slack per sample
//! - [`OneSlackSsvm`]: cutting plane, one shared slack
//! - [`SubgradientSsvm`]: online subgradient descent
//! - [`FrankWolfeSsvm`]: block-coordinate or batch Frank-Wolfe
//!
//! [`LinearSvc`] is the Crammer-Singer baseline with its own intercept.
//! Everything implements [`Classifier`]; [`ClassifierKind`] builds the
//! benchmark variants by name.
//!
//! ```text
//! X, y -> train_test_split -> Classifier::fit -> Classifier::predict -> accuracy
//! ```

mod error;
mod frank_wolfe;
mod learner;
mod linear_svc;
mod metrics;
mod model;
mod n_slack;
mod one_slack;
mod qp;
mod rng;
mod split;
mod subgradient;
mod variants;

pub use error::SvmError;
pub use frank_wolfe::FrankWolfeSsvm;
pub use learner::{Classifier, StructuredLearner};
pub use linear_svc::LinearSvc;
pub use metrics::accuracy;
pub use model::{LinearModel, MultiClassModel};
pub use n_slack::NSlackSsvm;
pub use one_slack::OneSlackSsvm;
pub use rng::{entropy_seed, Xoshiro256ss};
pub use split::{train_test_split, Split, SplitConfig};
pub use subgradient::SubgradientSsvm;
pub use variants::{ClassifierKind, BENCHMARK_C};
