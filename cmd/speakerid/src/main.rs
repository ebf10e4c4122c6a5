//! speakerid - Speaker identification benchmark.
//!
//! Loads paired audio/heart-rate recordings, extracts per-window features and
//! compares structured SVM variants against a Crammer-Singer linear SVM.

mod config;
mod runner;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use speakerid_dataset::{extract_features, load_dir};
use speakerid_features::{FeatureExtractor, SpeakerFeatureExtractor};
use speakerid_svm::{train_test_split, ClassifierKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;

/// Speaker identification benchmark over audio and heart-rate recordings.
#[derive(Parser, Debug)]
#[command(name = "speakerid")]
#[command(about = "Benchmark speaker identification classifiers")]
#[command(version)]
struct Args {
    /// Config file (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory with audio-*.csv and ppg-*.csv files (default: labelled-data)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory for the report (default: training_output)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Classifiers to run, comma-separated (e.g. n-slack,linear-svc, all)
    #[arg(long = "classifier", value_delimiter = ',')]
    classifiers: Vec<String>,

    /// Train/test shuffle seed (default: random)
    #[arg(long)]
    seed: Option<u64>,

    /// Fraction of windows held out for testing (default: 0.25)
    #[arg(long)]
    test_size: Option<f64>,

    /// Output JSON report to file (default: <output-dir>/report.json)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Quiet mode (warnings only, no summary table)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    verbose: bool,

    /// List available classifiers
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if args.list {
        println!("Available classifiers:");
        for kind in ClassifierKind::ALL {
            println!("  {:<20} {}", kind.name(), kind.description());
        }
        return Ok(());
    }

    let cfg = resolve_config(&args)?;
    std::fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("failed to create {}", cfg.output_dir.display()))?;

    // Load and align recordings
    let raw = load_dir(&cfg.data_dir, &cfg.loader)
        .with_context(|| format!("failed to load {}", cfg.data_dir.display()))?;
    if raw.is_empty() {
        bail!("no recordings found in {}", cfg.data_dir.display());
    }
    info!(
        "Found data for {} speakers : {}",
        raw.speakers().len(),
        raw.speakers().names().join(", ")
    );
    info!(
        "Loaded {} windows from {} recordings",
        raw.len(),
        raw.recordings().len()
    );

    // Featurize
    let extractor = SpeakerFeatureExtractor::new(cfg.features.clone())?;
    let set = extract_features(&raw, &extractor, extractor.dimension())?;

    // One split shared by every classifier
    let split = train_test_split(set.x(), set.y(), &cfg.split)?;
    info!(
        "Split {} windows into {} train / {} test (seed {})",
        set.len(),
        split.y_train.len(),
        split.y_test.len(),
        split.seed
    );

    if !args.quiet {
        println!(
            "=== Classifiers Selected ({}) ===",
            cfg.classifiers.len()
        );
        for kind in &cfg.classifiers {
            println!("  - {}", kind);
        }
        println!();
    }

    let results = runner::run(&split, &cfg.classifiers);

    let report = runner::BenchmarkReport::new(
        runner::DatasetSummary {
            data_dir: cfg.data_dir.clone(),
            recordings: raw.recordings().len(),
            speakers: raw.speakers().names().to_vec(),
            windows: set.len(),
            features: set.n_features(),
            classes: set.unique_labels(),
            train_size: split.y_train.len(),
            test_size: split.y_test.len(),
            seed: split.seed,
        },
        results,
    );

    if !args.quiet {
        runner::print_summary(&report);
    }

    let output = args.output.clone().unwrap_or_else(|| cfg.report_path());
    runner::save_report(&report, &output)?;
    println!("\nReport saved to {}", output.display());

    Ok(())
}

/// Loads the config file, if any, and applies command-line overrides.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(dir) = &args.data_dir {
        cfg.data_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        cfg.output_dir = dir.clone();
    }
    if !args.classifiers.is_empty() {
        cfg.classifiers = config::parse_classifiers(&args.classifiers)?;
    }
    if args.seed.is_some() {
        cfg.split.seed = args.seed;
    }
    if let Some(ts) = args.test_size {
        cfg.split.test_size = ts;
    }
    if cfg.classifiers.is_empty() {
        bail!("no classifiers selected");
    }

    Ok(cfg)
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
