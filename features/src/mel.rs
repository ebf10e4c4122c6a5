use std::f64::consts::PI;

pub(crate) fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub(crate) fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank over the one-sided spectrum.
/// Returns `[num_mels][fft_size/2 + 1]` weights.
pub(crate) fn mel_filterbank(
    num_mels: usize,
    fft_size: usize,
    sample_rate: usize,
    low_freq: f64,
    high_freq: f64,
) -> Vec<Vec<f64>> {
    let half_fft = fft_size / 2 + 1;
    let mel_low = hz_to_mel(low_freq);
    let mel_high = hz_to_mel(high_freq);

    let bins: Vec<usize> = (0..num_mels + 2)
        .map(|i| {
            let mel = mel_low + i as f64 * (mel_high - mel_low) / (num_mels + 1) as f64;
            let bin = (mel_to_hz(mel) * fft_size as f64 / sample_rate as f64).floor() as isize;
            bin.clamp(0, half_fft as isize - 1) as usize
        })
        .collect();

    (0..num_mels)
        .map(|m| {
            let (left, center, right) = (bins[m], bins[m + 1], bins[m + 2]);
            let mut filter = vec![0.0f64; half_fft];
            if center > left {
                for k in left..=center {
                    filter[k] = (k - left) as f64 / (center - left) as f64;
                }
            }
            if right > center {
                for k in center..=right {
                    filter[k] = (right - k) as f64 / (right - center) as f64;
                }
            }
            filter
        })
        .collect()
}

/// Mel-frequency cepstral coefficients from one power spectrum frame.
///
/// Log mel energies (floored at `energy_floor`) followed by an orthonormal
/// DCT-II, keeping the first `n_mfcc` coefficients.
pub(crate) fn mfcc(
    power_spec: &[f64],
    filterbank: &[Vec<f64>],
    n_mfcc: usize,
    energy_floor: f64,
) -> Vec<f64> {
    let log_mel: Vec<f64> = filterbank
        .iter()
        .map(|filter| {
            let energy: f64 = filter.iter().zip(power_spec).map(|(w, p)| w * p).sum();
            energy.max(energy_floor).ln()
        })
        .collect();
    dct2(&log_mel, n_mfcc)
}

fn dct2(input: &[f64], n_out: usize) -> Vec<f64> {
    let n = input.len();
    if n == 0 {
        return vec![0.0; n_out];
    }
    let scale0 = (1.0 / n as f64).sqrt();
    let scale = (2.0 / n as f64).sqrt();
    (0..n_out)
        .map(|k| {
            if k >= n {
                return 0.0;
            }
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, &v)| v * (PI * k as f64 * (2 * i + 1) as f64 / (2 * n) as f64).cos())
                .sum();
            sum * if k == 0 { scale0 } else { scale }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mel_hz_roundtrip() {
        for &hz in &[0.0, 300.0, 1000.0, 3999.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((hz - back).abs() < 1e-6, "{hz} came back as {back}");
        }
    }

    #[test]
    fn filterbank_shape_and_peaks() {
        let fb = mel_filterbank(26, 256, 8000, 0.0, 4000.0);
        assert_eq!(fb.len(), 26);
        assert!(fb.iter().all(|f| f.len() == 129));
        for filter in &fb {
            let max = filter.iter().cloned().fold(0.0, f64::max);
            assert!(max <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn dct_of_constant_has_only_dc() {
        let out = dct2(&[2.0; 8], 4);
        assert!((out[0] - 2.0 * 8f64.sqrt()).abs() < 1e-9);
        for &c in &out[1..] {
            assert!(c.abs() < 1e-9, "expected zero, got {c}");
        }
    }

    #[test]
    fn mfcc_of_silence_is_finite() {
        let fb = mel_filterbank(26, 256, 8000, 0.0, 4000.0);
        let coeffs = mfcc(&vec![0.0; 129], &fb, 13, 1e-10);
        assert_eq!(coeffs.len(), 13);
        assert!(coeffs.iter().all(|c| c.is_finite()));
    }
}
