use std::path::{Path, PathBuf};

use ndarray::{concatenate, s, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::filename::RecordingName;
use crate::registry::SpeakerRegistry;
use crate::DatasetError;

/// Where the label column of each aligned row comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    /// Keep the label column of the heart-rate file.
    #[default]
    HeartRate,
    /// Replace it with the speaker's registry index.
    Speaker,
}

/// Configures [`load_dir`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Audio files are the `.csv` files whose name starts with `<this>-`
    /// (default: "audio").
    pub audio_prefix: String,
    /// Prefix of the paired heart-rate file (default: "ppg").
    pub heart_prefix: String,
    /// Only load these speakers; empty loads everyone.
    pub speakers: Vec<String>,
    /// Label column source (default: heart rate file).
    pub label_source: LabelSource,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            audio_prefix: "audio".to_string(),
            heart_prefix: "ppg".to_string(),
            speakers: Vec::new(),
            label_source: LabelSource::HeartRate,
        }
    }
}

/// One audio/heart-rate pair that was loaded.
#[derive(Debug, Clone)]
pub struct Recording {
    pub audio_path: PathBuf,
    pub heart_path: PathBuf,
    pub speaker: String,
    pub audio_rows: usize,
    pub heart_rows: usize,
    /// Rows kept after alignment: `min(audio_rows, heart_rows)`.
    pub aligned_rows: usize,
}

const MIN_ROW_WIDTH: usize = 3;

/// Aligned windows of every loaded recording, in load order.
///
/// Each row is `[timestamp, samples..., heart_rate, label]`.
#[derive(Debug, Clone)]
pub struct RawDataset {
    rows: Array2<f64>,
    speakers: SpeakerRegistry,
    recordings: Vec<Recording>,
}

impl RawDataset {
    /// Wraps an already aligned matrix.
    ///
    /// Non-empty matrices need the timestamp, heart-rate and label columns;
    /// anything between them is the window.
    pub fn from_rows(
        rows: Array2<f64>,
        speakers: SpeakerRegistry,
    ) -> Result<Self, DatasetError> {
        if rows.nrows() > 0 && rows.ncols() < MIN_ROW_WIDTH {
            return Err(DatasetError::NarrowRows {
                min: MIN_ROW_WIDTH,
                got: rows.ncols(),
            });
        }
        Ok(Self {
            rows,
            speakers,
            recordings: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.rows.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.nrows() == 0
    }

    pub fn rows(&self) -> ArrayView2<'_, f64> {
        self.rows.view()
    }

    /// Raw audio samples of window `i` (timestamp, heart rate and label excluded).
    pub fn window(&self, i: usize) -> ArrayView1<'_, f64> {
        let n = self.rows.ncols();
        self.rows.slice(s![i, 1..n - 2])
    }

    pub fn heart_rate(&self, i: usize) -> f64 {
        self.rows[[i, self.rows.ncols() - 2]]
    }

    pub fn label(&self, i: usize) -> f64 {
        self.rows[[i, self.rows.ncols() - 1]]
    }

    pub fn speakers(&self) -> &SpeakerRegistry {
        &self.speakers
    }

    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }
}

/// Loads every audio recording in `dir` together with its heart-rate sibling.
///
/// Files are visited in sorted name order. For each audio file the sibling
/// `<heart_prefix>-<speaker>-<number>-<label>` must exist; both are truncated
/// to the shorter length, the audio's trailing column is dropped, the heart
/// file's rate and label columns are appended, and the rows are added to the
/// result.
pub fn load_dir(dir: &Path, cfg: &LoaderConfig) -> Result<RawDataset, DatasetError> {
    let io_err = |source| DatasetError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let audio_prefix = format!("{}-", cfg.audio_prefix);
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".csv") && name.starts_with(&audio_prefix) {
            names.push(name);
        }
    }
    names.sort();

    let mut speakers = SpeakerRegistry::new();
    let mut recordings = Vec::new();
    let mut data: Option<Array2<f64>> = None;

    for name in names {
        let rec = RecordingName::parse(&name)
            .ok_or_else(|| DatasetError::BadFileName { name: name.clone() })?;
        if !cfg.speakers.is_empty() && !cfg.speakers.iter().any(|s| s == &rec.speaker) {
            debug!("skipping {} (speaker {} not selected)", name, rec.speaker);
            continue;
        }

        info!("Loading data for {}.", rec.speaker);
        let speaker_label = speakers.intern(&rec.speaker);

        let audio_path = dir.join(&name);
        let heart_path = dir.join(rec.sibling(&cfg.heart_prefix));
        if !heart_path.is_file() {
            return Err(DatasetError::MissingHeartRate { path: heart_path });
        }

        let audio = read_csv(&audio_path)?;
        let heart = read_csv(&heart_path)?;
        info!("Loaded {} raw audio data samples.", audio.nrows());
        info!("Loaded {} raw heart rate data samples.", heart.nrows());

        let mut aligned = align(&audio, &audio_path, &heart, &heart_path)?;
        if cfg.label_source == LabelSource::Speaker {
            let last = aligned.ncols() - 1;
            aligned.column_mut(last).fill(speaker_label as f64);
        }

        recordings.push(Recording {
            audio_path: audio_path.clone(),
            heart_path,
            speaker: rec.speaker.clone(),
            audio_rows: audio.nrows(),
            heart_rows: heart.nrows(),
            aligned_rows: aligned.nrows(),
        });

        data = Some(match data.take() {
            None => aligned,
            Some(mut acc) => {
                if acc.ncols() != aligned.ncols() {
                    return Err(DatasetError::WidthMismatch {
                        path: audio_path,
                        expected: acc.ncols(),
                        got: aligned.ncols(),
                    });
                }
                acc.append(Axis(0), aligned.view())?;
                acc
            }
        });
    }

    Ok(RawDataset {
        rows: data.unwrap_or_else(|| Array2::zeros((0, 0))),
        speakers,
        recordings,
    })
}

/// Aligns an audio table with its heart-rate table by row index.
///
/// Keeps the first `min(audio.nrows(), heart.nrows())` rows of both, drops the
/// audio's last column and appends heart-rate columns 1 and 2 (rate, label).
pub fn align(
    audio: &Array2<f64>,
    audio_path: &Path,
    heart: &Array2<f64>,
    heart_path: &Path,
) -> Result<Array2<f64>, DatasetError> {
    if audio.ncols() < 2 {
        return Err(DatasetError::TooFewColumns {
            path: audio_path.to_path_buf(),
            min: 2,
            got: audio.ncols(),
        });
    }
    if heart.ncols() < 3 {
        return Err(DatasetError::TooFewColumns {
            path: heart_path.to_path_buf(),
            min: 3,
            got: heart.ncols(),
        });
    }

    let n = audio.nrows().min(heart.nrows());
    let audio_part = audio.slice(s![..n, ..audio.ncols() - 1]);
    let heart_part = heart.slice(s![..n, 1..3]);
    Ok(concatenate(Axis(1), &[audio_part, heart_part])?)
}

/// Reads a headerless numeric CSV file into a matrix.
///
/// Blank lines are skipped. Every row must have as many fields as the first.
pub fn read_csv(path: &Path) -> Result<Array2<f64>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut values = Vec::new();
    let mut width = 0usize;
    let mut rows = 0usize;

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if rows == 0 {
            width = record.len();
        } else if record.len() != width {
            return Err(DatasetError::Ragged {
                path: path.to_path_buf(),
                row: row + 1,
                expected: width,
                got: record.len(),
            });
        }
        for (col, field) in record.iter().enumerate() {
            let v: f64 = field.parse().map_err(|_| DatasetError::Parse {
                path: path.to_path_buf(),
                row: row + 1,
                col: col + 1,
                value: field.to_string(),
            })?;
            values.push(v);
        }
        rows += 1;
    }

    Ok(Array2::from_shape_vec((rows, width), values)?)
}
