//! Benchmark execution and reporting.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use speakerid_dataset::with_bias;
use speakerid_svm::{accuracy, ClassifierKind, Split, SvmError};
use tracing::{error, info};

/// Shape of the data the classifiers were trained on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub data_dir: PathBuf,
    pub recordings: usize,
    pub speakers: Vec<String>,
    pub windows: usize,
    pub features: usize,
    pub classes: Vec<usize>,
    pub train_size: usize,
    pub test_size: usize,
    pub seed: u64,
}

/// Outcome of one classifier variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierResult {
    pub name: String,
    pub accuracy: f64,
    pub fit_ms: i64,
    pub predict_ms: i64,
    pub status: String, // "ok", "error"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Full benchmark report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub timestamp: String,
    pub dataset: DatasetSummary,
    pub classifiers: Vec<ClassifierResult>,
}

impl BenchmarkReport {
    pub fn new(dataset: DatasetSummary, classifiers: Vec<ClassifierResult>) -> Self {
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            dataset,
            classifiers,
        }
    }
}

/// Train/test matrices with and without the bias column, built once.
struct Prepared<'a> {
    split: &'a Split,
    biased_train: Array2<f64>,
    biased_test: Array2<f64>,
}

impl<'a> Prepared<'a> {
    fn new(split: &'a Split) -> Self {
        Self {
            split,
            biased_train: with_bias(split.x_train.view()),
            biased_test: with_bias(split.x_test.view()),
        }
    }

    fn matrices(&self, kind: ClassifierKind) -> (&Array2<f64>, &Array2<f64>) {
        if kind.needs_bias() {
            (&self.biased_train, &self.biased_test)
        } else {
            (&self.split.x_train, &self.split.x_test)
        }
    }
}

/// Fits and scores every variant in `kinds` on the same split.
///
/// A variant that fails is recorded with status "error"; the remaining
/// variants still run.
pub fn run(split: &Split, kinds: &[ClassifierKind]) -> Vec<ClassifierResult> {
    let prepared = Prepared::new(split);
    let mut results = Vec::with_capacity(kinds.len());

    for &kind in kinds {
        info!("Training {}: {}", kind, kind.description());
        let (train, test) = prepared.matrices(kind);

        let result = match run_one(kind, train, &split.y_train, test, &split.y_test) {
            Ok((acc, fit, predict)) => {
                println!(
                    "Score with {}: {} (took {:.3} seconds)",
                    kind,
                    acc,
                    reported_duration(kind, fit, predict).as_secs_f64()
                );
                ClassifierResult {
                    name: kind.name().to_string(),
                    accuracy: acc,
                    fit_ms: fit.as_millis() as i64,
                    predict_ms: predict.as_millis() as i64,
                    status: "ok".to_string(),
                    error: None,
                }
            }
            Err(e) => {
                error!("{} failed: {}", kind, e);
                ClassifierResult {
                    name: kind.name().to_string(),
                    accuracy: 0.0,
                    fit_ms: 0,
                    predict_ms: 0,
                    status: "error".to_string(),
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(result);
    }

    results
}

/// Seconds shown on the score line: training time, plus prediction for the
/// Frank-Wolfe variants, whose runs were always timed end to end.
fn reported_duration(kind: ClassifierKind, fit: Duration, predict: Duration) -> Duration {
    match kind {
        ClassifierKind::FrankWolfeBc | ClassifierKind::FrankWolfeBatch => fit + predict,
        _ => fit,
    }
}

fn run_one(
    kind: ClassifierKind,
    x_train: &Array2<f64>,
    y_train: &[usize],
    x_test: &Array2<f64>,
    y_test: &[usize],
) -> Result<(f64, Duration, Duration), SvmError> {
    let mut clf = kind.build();

    let start = Instant::now();
    clf.fit(x_train.view(), y_train)?;
    let fit = start.elapsed();

    let start = Instant::now();
    let pred = clf.predict(x_test.view())?;
    let predict = start.elapsed();

    Ok((accuracy(y_test, &pred), fit, predict))
}

/// Save report to JSON file.
pub fn save_report(report: &BenchmarkReport, path: &Path) -> Result<()> {
    let data = serde_json::to_string_pretty(report)?;
    std::fs::write(path, data)
        .with_context(|| format!("failed to write report {}", path.display()))?;
    Ok(())
}

/// Print benchmark summary.
pub fn print_summary(report: &BenchmarkReport) {
    let d = &report.dataset;
    println!("\n{}", "=".repeat(72));
    println!("BENCHMARK SUMMARY");
    println!("{}", "=".repeat(72));
    println!(
        "{} windows x {} features, {} classes, train {} / test {} (seed {})",
        d.windows,
        d.features,
        d.classes.len(),
        d.train_size,
        d.test_size,
        d.seed
    );

    println!(
        "\n{:<20} {:>10} {:>12} {:>12} {:>10}",
        "Classifier", "Accuracy", "Fit(ms)", "Predict(ms)", "Status"
    );
    println!("{}", "-".repeat(72));

    for r in &report.classifiers {
        println!(
            "{:<20} {:>9.1}% {:>12} {:>12} {:>10}",
            r.name,
            r.accuracy * 100.0,
            r.fit_ms,
            r.predict_ms,
            r.status
        );
    }
    println!("{}", "-".repeat(72));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn split() -> Split {
        Split {
            x_train: array![
                [3.0, 0.0],
                [2.5, 0.5],
                [0.0, 3.0],
                [0.5, 2.5],
                [-3.0, -3.0],
                [-2.5, -3.5],
            ],
            y_train: vec![0, 0, 1, 1, 2, 2],
            x_test: array![[2.8, 0.2], [0.1, 2.9], [-3.1, -2.9]],
            y_test: vec![0, 1, 2],
            seed: 1,
        }
    }

    #[test]
    fn runs_selected_variants() {
        let kinds = [ClassifierKind::LinearSvc, ClassifierKind::OneSlack];
        let results = run(&split(), &kinds);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "linear-svc");
        assert_eq!(results[1].name, "one-slack");
        for r in &results {
            assert_eq!(r.status, "ok", "{:?}", r.error);
            assert_eq!(r.accuracy, 1.0, "{}", r.name);
        }
    }

    #[test]
    fn failures_are_recorded() {
        let mut s = split();
        s.y_train = vec![0; 6];
        let results = run(&s, &[ClassifierKind::LinearSvc]);
        assert_eq!(results[0].status, "error");
        assert!(results[0].error.is_some());
    }

    #[test]
    fn score_line_times_training() {
        let fit = Duration::from_millis(1500);
        let predict = Duration::from_millis(250);
        for kind in [
            ClassifierKind::NSlack,
            ClassifierKind::OneSlack,
            ClassifierKind::Subgradient,
            ClassifierKind::LinearSvc,
        ] {
            assert_eq!(reported_duration(kind, fit, predict), fit, "{kind}");
        }
        for kind in [ClassifierKind::FrankWolfeBc, ClassifierKind::FrankWolfeBatch] {
            assert_eq!(reported_duration(kind, fit, predict), fit + predict, "{kind}");
        }
    }

    #[test]
    fn report_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = BenchmarkReport::new(
            DatasetSummary {
                windows: 9,
                features: 3,
                classes: vec![0, 1, 2],
                train_size: 6,
                test_size: 3,
                ..Default::default()
            },
            run(&split(), &[ClassifierKind::LinearSvc]),
        );
        save_report(&report, &path).unwrap();

        let loaded: BenchmarkReport =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(loaded.timestamp, report.timestamp);
        assert_eq!(loaded.dataset.windows, 9);
        assert_eq!(loaded.classifiers.len(), 1);
        assert_eq!(loaded.classifiers[0].accuracy, report.classifiers[0].accuracy);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("\"error\""), "ok results omit the error field");
    }
}
