use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::frank_wolfe::FrankWolfeSsvm;
use crate::learner::Classifier;
use crate::linear_svc::LinearSvc;
use crate::n_slack::NSlackSsvm;
use crate::one_slack::OneSlackSsvm;
use crate::subgradient::SubgradientSsvm;
use crate::SvmError;

/// Regularization shared by every benchmark variant.
pub const BENCHMARK_C: f64 = 0.1;

/// The classifier variants compared by the benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierKind {
    NSlack,
    OneSlack,
    Subgradient,
    LinearSvc,
    FrankWolfeBc,
    FrankWolfeBatch,
}

impl ClassifierKind {
    /// Every variant in benchmark order.
    pub const ALL: [ClassifierKind; 6] = [
        ClassifierKind::NSlack,
        ClassifierKind::OneSlack,
        ClassifierKind::Subgradient,
        ClassifierKind::LinearSvc,
        ClassifierKind::FrankWolfeBc,
        ClassifierKind::FrankWolfeBatch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ClassifierKind::NSlack => "n-slack",
            ClassifierKind::OneSlack => "one-slack",
            ClassifierKind::Subgradient => "subgradient",
            ClassifierKind::LinearSvc => "linear-svc",
            ClassifierKind::FrankWolfeBc => "frank-wolfe-bc",
            ClassifierKind::FrankWolfeBatch => "frank-wolfe-batch",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ClassifierKind::NSlack => {
                "n-slack cutting plane SSVM (C=0.1, batch 100, tol 1e-2, 100 iterations)"
            }
            ClassifierKind::OneSlack => "1-slack cutting plane SSVM (C=0.1, tol 1e-3, 1000 iterations)",
            ClassifierKind::Subgradient => "subgradient SSVM (C=0.1, learning rate 1e-6, 1000 iterations)",
            ClassifierKind::LinearSvc => "Crammer-Singer linear SVM (C=0.1, tol 1e-4, 1000 iterations)",
            ClassifierKind::FrankWolfeBc => "block-coordinate Frank-Wolfe SSVM (C=0.1, 50 iterations)",
            ClassifierKind::FrankWolfeBatch => "batch Frank-Wolfe SSVM (C=0.1, 50 iterations)",
        }
    }

    /// Whether the variant expects a trailing constant column in `x`.
    /// The linear SVM fits its own intercept instead.
    pub fn needs_bias(self) -> bool {
        !matches!(self, ClassifierKind::LinearSvc)
    }

    /// Creates an untrained classifier with the benchmark parameters.
    pub fn build(self) -> Box<dyn Classifier> {
        match self {
            ClassifierKind::NSlack => Box::new(NSlackSsvm::new(BENCHMARK_C, 100, 1e-2, 100, false)),
            ClassifierKind::OneSlack => Box::new(OneSlackSsvm::new(BENCHMARK_C, 1000, 1e-3)),
            ClassifierKind::Subgradient => Box::new(SubgradientSsvm::new(BENCHMARK_C, 1000, 1e-6)),
            ClassifierKind::LinearSvc => Box::new(LinearSvc::new(BENCHMARK_C, 1e-4, 1000)),
            ClassifierKind::FrankWolfeBc => Box::new(FrankWolfeSsvm::new(BENCHMARK_C, 50, false)),
            ClassifierKind::FrankWolfeBatch => Box::new(FrankWolfeSsvm::new(BENCHMARK_C, 50, true)),
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassifierKind {
    type Err = SvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ClassifierKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| SvmError::UnknownClassifier(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ClassifierKind::ALL {
            assert_eq!(kind.name().parse::<ClassifierKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_string(&kind).unwrap(),
                format!("\"{}\"", kind.name())
            );
        }
        assert_eq!(" One-Slack ".parse::<ClassifierKind>().unwrap(), ClassifierKind::OneSlack);
    }

    #[test]
    fn unknown_name() {
        let err = "svm-light".parse::<ClassifierKind>().unwrap_err();
        assert!(matches!(err, SvmError::UnknownClassifier(name) if name == "svm-light"));
    }

    #[test]
    fn only_linear_svc_skips_bias() {
        let without: Vec<_> = ClassifierKind::ALL
            .into_iter()
            .filter(|k| !k.needs_bias())
            .collect();
        assert_eq!(without, vec![ClassifierKind::LinearSvc]);
    }
}
