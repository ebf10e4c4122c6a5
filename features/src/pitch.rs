/// Autocorrelation pitch estimate of one DC-free frame.
///
/// Searches lags for `[min_hz, max_hz]` and scores each with the normalized
/// cross-correlation of the overlapping parts. Returns the pitch in Hz when
/// the best score reaches `threshold`, otherwise `None` (unvoiced).
pub(crate) fn estimate_pitch(
    frame: &[f64],
    sample_rate: usize,
    min_hz: f64,
    max_hz: f64,
    threshold: f64,
) -> Option<f64> {
    if min_hz <= 0.0 || max_hz <= min_hz {
        return None;
    }
    let fs = sample_rate as f64;
    let lag_min = ((fs / max_hz).floor() as usize).max(1);
    let lag_max = ((fs / min_hz).ceil() as usize).min(frame.len().saturating_sub(2));
    if lag_min > lag_max {
        return None;
    }

    let mut best_lag = 0usize;
    let mut best_score = f64::NEG_INFINITY;
    for lag in lag_min..=lag_max {
        let head = &frame[..frame.len() - lag];
        let tail = &frame[lag..];
        let mut cross = 0.0;
        let mut e_head = 0.0;
        let mut e_tail = 0.0;
        for (a, b) in head.iter().zip(tail) {
            cross += a * b;
            e_head += a * a;
            e_tail += b * b;
        }
        let norm = (e_head * e_tail).sqrt();
        if norm <= f64::EPSILON {
            continue;
        }
        let score = cross / norm;
        // Ties keep the shorter lag so exact multiples of the period lose.
        if score > best_score + 1e-6 {
            best_score = score;
            best_lag = lag;
        }
    }

    if best_lag == 0 || best_score < threshold {
        return None;
    }
    let pitch = fs / best_lag as f64;
    (pitch >= min_hz && pitch <= max_hz).then_some(pitch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn tone(hz: f64, n: usize, fs: f64) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * hz * i as f64 / fs).sin()).collect()
    }

    #[test]
    fn detects_200hz_tone() {
        let frame = tone(200.0, 200, 8000.0);
        let pitch = estimate_pitch(&frame, 8000, 50.0, 500.0, 0.3).unwrap();
        assert!((pitch - 200.0).abs() < 5.0, "got {pitch}");
    }

    #[test]
    fn silence_is_unvoiced() {
        assert!(estimate_pitch(&[0.0; 200], 8000, 50.0, 500.0, 0.3).is_none());
    }

    #[test]
    fn invalid_range_is_unvoiced() {
        let frame = tone(200.0, 200, 8000.0);
        assert!(estimate_pitch(&frame, 8000, 500.0, 50.0, 0.3).is_none());
    }
}
