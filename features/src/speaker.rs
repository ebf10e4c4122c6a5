use serde::{Deserialize, Serialize};

use crate::extractor::FeatureExtractor;
use crate::fft::{hamming_window, next_pow2, power_spectrum, pre_emphasize, remove_dc};
use crate::lpc::formants;
use crate::mel::{mel_filterbank, mfcc};
use crate::pitch::estimate_pitch;
use crate::short_term::{self, SHORT_TERM_FEATURES};
use crate::FeatureError;

/// FFT length used to sample the LPC envelope.
const LPC_FFT_SIZE: usize = 512;
/// Formant candidates closer than this to DC or Nyquist are ignored (Hz).
const FORMANT_MIN_HZ: f64 = 90.0;
const FORMANT_NYQUIST_MARGIN_HZ: f64 = 50.0;

/// Configures [`SpeakerFeatureExtractor`].
///
/// Defaults target 8 kHz windows: 25 ms frames, 10 ms shift, 55 formant bins,
/// 64 pitch bins, 8 short-time descriptors and 13 MFCCs (140 values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Input sample rate in Hz (default: 8000).
    pub sample_rate: usize,
    /// Frame length in samples (default: 200 = 25ms @ 8kHz).
    pub frame_length: usize,
    /// Frame shift in samples (default: 80 = 10ms @ 8kHz).
    pub frame_shift: usize,
    /// Pre-emphasis coefficient applied before LPC (default: 0.97).
    pub pre_emphasis: f64,
    /// Formant histogram bins over `[0, Nyquist)` (default: 55).
    pub n_formant_bins: usize,
    /// Pitch histogram bins over `[min_pitch, max_pitch)` (default: 64).
    pub n_pitch_bins: usize,
    /// Lowest pitch considered voiced, Hz (default: 50).
    pub min_pitch: f64,
    /// Highest pitch considered voiced, Hz (default: 500).
    pub max_pitch: f64,
    /// Normalized autocorrelation needed to call a frame voiced (default: 0.3).
    pub voicing_threshold: f64,
    /// Mel filters feeding the MFCCs (default: 26).
    pub n_mels: usize,
    /// Cepstral coefficients kept (default: 13).
    pub n_mfcc: usize,
    /// Sub-blocks for energy and spectral entropy (default: 10).
    pub entropy_blocks: usize,
    /// Energy ratio for spectral rolloff (default: 0.90).
    pub rolloff: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            frame_length: 200,
            frame_shift: 80,
            pre_emphasis: 0.97,
            n_formant_bins: 55,
            n_pitch_bins: 64,
            min_pitch: 50.0,
            max_pitch: 500.0,
            voicing_threshold: 0.3,
            n_mels: 26,
            n_mfcc: 13,
            entropy_blocks: 10,
            rolloff: 0.90,
        }
    }
}

impl FeatureConfig {
    /// Length of the vector produced for this configuration.
    pub fn dimension(&self) -> usize {
        self.n_formant_bins + self.n_pitch_bins + SHORT_TERM_FEATURES + self.n_mfcc
    }

    fn validate(&self) -> Result<(), FeatureError> {
        if self.sample_rate == 0 || self.frame_length < 2 || self.frame_shift == 0 {
            return Err(FeatureError::InvalidConfig(
                "sample_rate, frame_length and frame_shift must be positive".into(),
            ));
        }
        if self.min_pitch <= 0.0 || self.max_pitch <= self.min_pitch {
            return Err(FeatureError::InvalidConfig(format!(
                "pitch range [{}, {}] is empty",
                self.min_pitch, self.max_pitch
            )));
        }
        if !(0.0..=1.0).contains(&self.rolloff) {
            return Err(FeatureError::InvalidConfig(format!(
                "rolloff must be within [0, 1], got {}",
                self.rolloff
            )));
        }
        Ok(())
    }
}

/// Formant, pitch-contour and short-time feature extractor.
///
/// # Layout
///
/// ```text
/// [ formant histogram | pitch histogram | 8 short-time means | MFCC means ]
/// ```
///
/// Histograms are normalized to sum to 1 (all zeros when nothing was found).
/// Short-time values are zero crossing rate, energy, energy entropy,
/// spectral centroid, spectral spread, spectral entropy, spectral flux and
/// spectral rolloff, averaged over frames.
pub struct SpeakerFeatureExtractor {
    cfg: FeatureConfig,
    window: Vec<f64>,
    fft_size: usize,
    filterbank: Vec<Vec<f64>>,
    lpc_order: usize,
}

impl SpeakerFeatureExtractor {
    /// Creates an extractor, precomputing the window and mel filterbank.
    pub fn new(cfg: FeatureConfig) -> Result<Self, FeatureError> {
        cfg.validate()?;
        let fft_size = next_pow2(cfg.frame_length);
        let nyquist = cfg.sample_rate as f64 / 2.0;
        let filterbank = mel_filterbank(cfg.n_mels, fft_size, cfg.sample_rate, 0.0, nyquist);
        Ok(Self {
            window: hamming_window(cfg.frame_length),
            fft_size,
            filterbank,
            lpc_order: 2 + cfg.sample_rate / 1000,
            cfg,
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &FeatureConfig {
        &self.cfg
    }

    fn formant_bin(&self, hz: f64) -> usize {
        let nyquist = self.cfg.sample_rate as f64 / 2.0;
        let bin = (hz / nyquist * self.cfg.n_formant_bins as f64).floor() as usize;
        bin.min(self.cfg.n_formant_bins - 1)
    }

    fn pitch_bin(&self, hz: f64) -> usize {
        let span = self.cfg.max_pitch - self.cfg.min_pitch;
        let bin = ((hz - self.cfg.min_pitch) / span * self.cfg.n_pitch_bins as f64).floor();
        (bin.max(0.0) as usize).min(self.cfg.n_pitch_bins - 1)
    }
}

impl Default for SpeakerFeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureConfig::default()).expect("default feature config is valid")
    }
}

impl FeatureExtractor for SpeakerFeatureExtractor {
    fn extract(&self, window: &[f64]) -> Result<Vec<f64>, FeatureError> {
        let cfg = &self.cfg;
        if window.len() < cfg.frame_length {
            return Err(FeatureError::WindowTooShort {
                min_samples: cfg.frame_length,
                got_samples: window.len(),
            });
        }
        let num_frames = (window.len() - cfg.frame_length) / cfg.frame_shift + 1;
        let nyquist = cfg.sample_rate as f64 / 2.0;

        let mut formant_hist = vec![0.0f64; cfg.n_formant_bins];
        let mut pitch_hist = vec![0.0f64; cfg.n_pitch_bins];
        let mut short_sum = [0.0f64; SHORT_TERM_FEATURES];
        let mut mfcc_sum = vec![0.0f64; cfg.n_mfcc];
        let mut prev_mag: Option<Vec<f64>> = None;

        for f in 0..num_frames {
            let offset = f * cfg.frame_shift;
            let mut frame = window[offset..offset + cfg.frame_length].to_vec();
            remove_dc(&mut frame);

            if cfg.n_pitch_bins > 0 {
                if let Some(hz) = estimate_pitch(
                    &frame,
                    cfg.sample_rate,
                    cfg.min_pitch,
                    cfg.max_pitch,
                    cfg.voicing_threshold,
                ) {
                    pitch_hist[self.pitch_bin(hz)] += 1.0;
                }
            }

            let windowed: Vec<f64> = frame.iter().zip(&self.window).map(|(s, w)| s * w).collect();
            let power = power_spectrum(&windowed, self.fft_size);
            let magnitude: Vec<f64> = power.iter().map(|p| p.sqrt()).collect();

            let (centroid, spread) = short_term::centroid_and_spread(&magnitude, cfg.sample_rate);
            let flux = prev_mag
                .as_deref()
                .map(|prev| short_term::spectral_flux(&magnitude, prev))
                .unwrap_or(0.0);
            let frame_short = [
                short_term::zero_crossing_rate(&frame),
                short_term::energy(&frame),
                short_term::energy_entropy(&frame, cfg.entropy_blocks),
                centroid,
                spread,
                short_term::spectral_entropy(&magnitude, cfg.entropy_blocks),
                flux,
                short_term::spectral_rolloff(&magnitude, cfg.rolloff),
            ];
            for (acc, v) in short_sum.iter_mut().zip(frame_short) {
                *acc += v;
            }

            if cfg.n_mfcc > 0 {
                let coeffs = mfcc(&power, &self.filterbank, cfg.n_mfcc, 1e-10);
                for (acc, c) in mfcc_sum.iter_mut().zip(coeffs) {
                    *acc += c;
                }
            }

            if cfg.n_formant_bins > 0 {
                let mut emphasized = frame;
                pre_emphasize(&mut emphasized, cfg.pre_emphasis);
                for (s, w) in emphasized.iter_mut().zip(&self.window) {
                    *s *= w;
                }
                for hz in formants(
                    &emphasized,
                    self.lpc_order,
                    cfg.sample_rate,
                    LPC_FFT_SIZE,
                    FORMANT_MIN_HZ,
                    nyquist - FORMANT_NYQUIST_MARGIN_HZ,
                ) {
                    formant_hist[self.formant_bin(hz)] += 1.0;
                }
            }

            prev_mag = Some(magnitude);
        }

        normalize_histogram(&mut formant_hist);
        normalize_histogram(&mut pitch_hist);
        let frames = num_frames as f64;

        let mut out = Vec::with_capacity(cfg.dimension());
        out.extend(formant_hist);
        out.extend(pitch_hist);
        out.extend(short_sum.iter().map(|v| v / frames));
        out.extend(mfcc_sum.iter().map(|v| v / frames));
        Ok(out)
    }

    fn dimension(&self) -> usize {
        self.cfg.dimension()
    }
}

fn normalize_histogram(hist: &mut [f64]) {
    let total: f64 = hist.iter().sum();
    if total > 0.0 {
        for v in hist.iter_mut() {
            *v /= total;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn voiced_window(f0: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / 8000.0;
                (1..=6)
                    .map(|h| (2.0 * PI * f0 * h as f64 * t).sin() * 1000.0 / h as f64)
                    .sum()
            })
            .collect()
    }

    #[test]
    fn feature_config_default() {
        let cfg = FeatureConfig::default();
        assert_eq!(cfg.sample_rate, 8000);
        assert_eq!(cfg.frame_length, 200);
        assert_eq!(cfg.frame_shift, 80);
        assert_eq!(cfg.dimension(), 55 + 64 + 8 + 13);
    }

    #[test]
    fn rejects_short_window() {
        let ext = SpeakerFeatureExtractor::default();
        let err = ext.extract(&[0.0; 100]).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::WindowTooShort {
                min_samples: 200,
                got_samples: 100
            }
        ));
    }

    #[test]
    fn rejects_empty_pitch_range() {
        let cfg = FeatureConfig {
            min_pitch: 300.0,
            max_pitch: 100.0,
            ..FeatureConfig::default()
        };
        assert!(SpeakerFeatureExtractor::new(cfg).is_err());
    }

    #[test]
    fn output_matches_dimension() {
        let ext = SpeakerFeatureExtractor::default();
        let x = ext.extract(&voiced_window(150.0, 8000)).unwrap();
        assert_eq!(x.len(), ext.dimension());
        assert!(x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn silence_has_empty_histograms() {
        let ext = SpeakerFeatureExtractor::default();
        let x = ext.extract(&vec![0.0; 8000]).unwrap();
        assert!(x[..55 + 64].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn pitch_histogram_tracks_f0() {
        let ext = SpeakerFeatureExtractor::default();
        let x = ext.extract(&voiced_window(200.0, 8000)).unwrap();
        let pitch = &x[55..55 + 64];
        let total: f64 = pitch.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "pitch histogram sums to {total}");

        // 200 Hz falls in bin floor((200 - 50) / 450 * 64) = 21.
        let peak = pitch
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 21);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: FeatureConfig = serde_json::from_str(r#"{"n_mfcc": 0}"#).unwrap();
        assert_eq!(cfg.n_mfcc, 0);
        assert_eq!(cfg.n_formant_bins, 55);
        assert_eq!(cfg.dimension(), 55 + 64 + 8);
    }
}
