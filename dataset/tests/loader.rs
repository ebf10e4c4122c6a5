use std::fmt::Write as _;
use std::path::Path;

use speakerid_dataset::{
    extract_features, load_dir, DatasetError, LabelSource, LoaderConfig,
};
use speakerid_features::{FeatureError, FeatureExtractor};

const SAMPLES: usize = 16;

/// Writes `rows` audio windows: timestamp, SAMPLES samples, placeholder.
fn write_audio(dir: &Path, name: &str, rows: usize, level: f64) {
    let mut out = String::new();
    for r in 0..rows {
        write!(out, "{}", r).unwrap();
        for s in 0..SAMPLES {
            write!(out, ",{}", level + s as f64).unwrap();
        }
        writeln!(out, ",-1").unwrap();
    }
    std::fs::write(dir.join(name), out).unwrap();
}

/// Writes `rows` heart-rate rows: timestamp, rate, label.
fn write_heart(dir: &Path, name: &str, rows: usize, rate: f64, label: usize) {
    let mut out = String::new();
    for r in 0..rows {
        writeln!(out, "{},{},{}", r, rate + r as f64, label).unwrap();
    }
    std::fs::write(dir.join(name), out).unwrap();
}

struct Mean;

impl FeatureExtractor for Mean {
    fn extract(&self, window: &[f64]) -> Result<Vec<f64>, FeatureError> {
        Ok(vec![window.iter().sum::<f64>() / window.len() as f64])
    }

    fn dimension(&self) -> usize {
        1
    }
}

fn two_speaker_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    // erik: audio longer than heart rate -> 3 rows
    write_audio(p, "audio-erik-1-0.csv", 5, 0.0);
    write_heart(p, "ppg-erik-1-0.csv", 3, 60.0, 0);
    // caitlyn: heart rate longer than audio -> 4 rows
    write_audio(p, "audio-caitlyn-1-1.csv", 4, 100.0);
    write_heart(p, "ppg-caitlyn-1-1.csv", 7, 90.0, 1);
    // caitlyn again: equal lengths -> 2 rows
    write_audio(p, "audio-caitlyn-2-1.csv", 2, 200.0);
    write_heart(p, "ppg-caitlyn-2-1.csv", 2, 95.0, 1);
    // not audio, ignored
    std::fs::write(p.join("notes.txt"), "hello").unwrap();
    dir
}

#[test]
fn loads_and_aligns_two_speakers() {
    let dir = two_speaker_dir();
    let raw = load_dir(dir.path(), &LoaderConfig::default()).unwrap();

    assert_eq!(raw.len(), 3 + 4 + 2);
    // timestamp + samples + rate + label
    assert_eq!(raw.rows().ncols(), 1 + SAMPLES + 2);

    // Sorted load order: caitlyn-1, caitlyn-2, erik-1.
    assert_eq!(raw.speakers().names(), &["caitlyn", "erik"]);
    assert_eq!(raw.speakers().get("erik"), Some(1));

    let aligned: Vec<usize> = raw.recordings().iter().map(|r| r.aligned_rows).collect();
    assert_eq!(aligned, vec![4, 2, 3]);
    for rec in raw.recordings() {
        assert_eq!(rec.aligned_rows, rec.audio_rows.min(rec.heart_rows));
    }

    // Heart-rate columns follow each recording.
    assert_eq!(raw.heart_rate(0), 90.0);
    assert_eq!(raw.heart_rate(3), 93.0);
    assert_eq!(raw.heart_rate(4), 95.0);
    assert_eq!(raw.heart_rate(6), 60.0);
    assert_eq!(raw.label(0), 1.0);
    assert_eq!(raw.label(8), 0.0);

    assert_eq!(raw.window(6).len(), SAMPLES);
    assert_eq!(raw.window(6)[0], 0.0);
    assert_eq!(raw.window(4)[0], 200.0);
}

#[test]
fn features_and_labels_have_equal_rows() {
    let dir = two_speaker_dir();
    let raw = load_dir(dir.path(), &LoaderConfig::default()).unwrap();
    let set = extract_features(&raw, &Mean, 1).unwrap();

    assert_eq!(set.x().nrows(), raw.len());
    assert_eq!(set.y().len(), raw.len());
    assert_eq!(set.y(), &[1, 1, 1, 1, 1, 1, 0, 0, 0]);
    // feature + heart rate
    assert_eq!(set.n_features(), 2);
    assert_eq!(set.x()[[6, 1]], 60.0);
}

#[test]
fn speaker_label_source_uses_registry() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    write_audio(p, "audio-zed-1-7.csv", 2, 0.0);
    write_heart(p, "ppg-zed-1-7.csv", 2, 60.0, 7);
    write_audio(p, "audio-amy-1-7.csv", 2, 0.0);
    write_heart(p, "ppg-amy-1-7.csv", 2, 60.0, 7);

    let heart = load_dir(p, &LoaderConfig::default()).unwrap();
    assert!((0..heart.len()).all(|i| heart.label(i) == 7.0));

    let cfg = LoaderConfig {
        label_source: LabelSource::Speaker,
        ..LoaderConfig::default()
    };
    let by_speaker = load_dir(p, &cfg).unwrap();
    let labels: Vec<f64> = (0..by_speaker.len()).map(|i| by_speaker.label(i)).collect();
    assert_eq!(labels, vec![0.0, 0.0, 1.0, 1.0]);
}

#[test]
fn speaker_filter_skips_others() {
    let dir = two_speaker_dir();
    let cfg = LoaderConfig {
        speakers: vec!["erik".to_string()],
        ..LoaderConfig::default()
    };
    let raw = load_dir(dir.path(), &cfg).unwrap();
    assert_eq!(raw.len(), 3);
    assert_eq!(raw.speakers().names(), &["erik"]);
}

#[test]
fn missing_heart_rate_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_audio(dir.path(), "audio-erik-1-0.csv", 2, 0.0);

    let err = load_dir(dir.path(), &LoaderConfig::default()).unwrap_err();
    match err {
        DatasetError::MissingHeartRate { path } => {
            assert!(path.ends_with("ppg-erik-1-0.csv"), "{}", path.display());
        }
        other => panic!("expected MissingHeartRate, got {other}"),
    }
}

#[test]
fn malformed_csv_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_audio(dir.path(), "audio-erik-1-0.csv", 2, 0.0);
    std::fs::write(dir.path().join("ppg-erik-1-0.csv"), "0,61,0\n1,abc,0\n").unwrap();

    let err = load_dir(dir.path(), &LoaderConfig::default()).unwrap_err();
    assert!(
        matches!(err, DatasetError::Parse { row: 2, col: 2, .. }),
        "got {err}"
    );
}

#[test]
fn bad_file_name_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_audio(dir.path(), "audio-erik.csv", 2, 0.0);

    let err = load_dir(dir.path(), &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, DatasetError::BadFileName { .. }), "got {err}");
}

#[test]
fn empty_directory_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let raw = load_dir(dir.path(), &LoaderConfig::default()).unwrap();
    assert!(raw.is_empty());
    assert!(raw.speakers().is_empty());
}

#[test]
fn prefix_needs_separator() {
    let dir = two_speaker_dir();
    std::fs::write(dir.path().join("audio_notes.csv"), "not,a,recording\n").unwrap();
    write_audio(dir.path(), "audiox.csv", 2, 0.0);
    write_audio(dir.path(), "audiobook-erik-1-0.csv", 2, 0.0);

    let raw = load_dir(dir.path(), &LoaderConfig::default()).unwrap();
    assert_eq!(raw.len(), 3 + 4 + 2);
    assert_eq!(raw.recordings().len(), 3);
}
