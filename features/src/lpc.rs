//! Linear prediction and LPC-envelope formant picking.

use crate::fft::power_spectrum;

/// Autocorrelation `r[0..=max_lag]` of `frame`.
pub(crate) fn autocorrelation(frame: &[f64], max_lag: usize) -> Vec<f64> {
    (0..=max_lag)
        .map(|lag| {
            if lag >= frame.len() {
                return 0.0;
            }
            frame[..frame.len() - lag]
                .iter()
                .zip(&frame[lag..])
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Levinson-Durbin recursion.
///
/// Returns the prediction polynomial `[1, a1, ..., ap]` for `p = r.len() - 1`,
/// or `None` when the signal has no energy or the recursion becomes unstable.
pub(crate) fn levinson_durbin(r: &[f64]) -> Option<Vec<f64>> {
    let order = r.len().checked_sub(1)?;
    if r[0] <= f64::EPSILON {
        return None;
    }
    let mut a = vec![0.0f64; order + 1];
    a[0] = 1.0;
    let mut err = r[0];

    for i in 1..=order {
        let acc: f64 = (1..i).map(|j| a[j] * r[i - j]).sum();
        let k = -(r[i] + acc) / err;
        let prev = a.clone();
        for j in 1..i {
            a[j] = prev[j] + k * prev[i - j];
        }
        a[i] = k;
        err *= 1.0 - k * k;
        if err <= 0.0 {
            return None;
        }
    }
    Some(a)
}

/// Formant candidates of one pre-emphasized, windowed frame.
///
/// The LPC envelope `1/|A(f)|^2` is sampled on `fft_size/2 + 1` bins and every
/// local maximum inside `(min_hz, max_hz)` is reported in Hz.
pub(crate) fn formants(
    frame: &[f64],
    order: usize,
    sample_rate: usize,
    fft_size: usize,
    min_hz: f64,
    max_hz: f64,
) -> Vec<f64> {
    let r = autocorrelation(frame, order);
    let Some(poly) = levinson_durbin(&r) else {
        return Vec::new();
    };

    let denom = power_spectrum(&poly, fft_size);
    let envelope: Vec<f64> = denom.iter().map(|&d| 1.0 / d.max(1e-12)).collect();
    let bin_hz = sample_rate as f64 / fft_size as f64;

    let mut peaks = Vec::new();
    for k in 1..envelope.len().saturating_sub(1) {
        if envelope[k] > envelope[k - 1] && envelope[k] >= envelope[k + 1] {
            let hz = k as f64 * bin_hz;
            if hz > min_hz && hz < max_hz {
                peaks.push(hz);
            }
        }
    }
    peaks
}
