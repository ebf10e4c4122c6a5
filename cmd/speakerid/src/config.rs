//! Benchmark configuration file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use speakerid_dataset::LoaderConfig;
use speakerid_features::FeatureConfig;
use speakerid_svm::{ClassifierKind, SplitConfig};

/// Everything a benchmark run needs. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory with the audio and heart-rate CSV files.
    pub data_dir: PathBuf,
    /// Directory for the report; created when missing.
    pub output_dir: PathBuf,
    #[serde(flatten)]
    pub loader: LoaderConfig,
    pub features: FeatureConfig,
    pub split: SplitConfig,
    /// Variants to run, in order.
    pub classifiers: Vec<ClassifierKind>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("labelled-data"),
            output_dir: PathBuf::from("training_output"),
            loader: LoaderConfig::default(),
            features: FeatureConfig::default(),
            split: SplitConfig::default(),
            classifiers: ClassifierKind::ALL.to_vec(),
        }
    }
}

impl Config {
    /// Loads a YAML (`.yaml`, `.yml`) or JSON (`.json`) config file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let cfg = match ext {
            "json" => serde_json::from_slice(&data)
                .with_context(|| format!("invalid JSON config {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_slice(&data)
                .with_context(|| format!("invalid YAML config {}", path.display()))?,
            _ => bail!(
                "unsupported config extension {:?} (use .yaml, .yml or .json)",
                ext
            ),
        };
        Ok(cfg)
    }

    /// Default report location inside the output directory.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join("report.json")
    }
}

/// Parses a comma-separated classifier selection; `all` selects every variant.
pub fn parse_classifiers(names: &[String]) -> Result<Vec<ClassifierKind>> {
    let mut kinds = Vec::new();
    for name in names.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if name == "all" {
            return Ok(ClassifierKind::ALL.to_vec());
        }
        let kind: ClassifierKind = name.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        bail!("no classifiers selected");
    }
    Ok(kinds)
}
