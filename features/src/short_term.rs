//! Per-frame short-time descriptors.

/// Number of short-time descriptors produced per frame (MFCCs excluded).
pub const SHORT_TERM_FEATURES: usize = 8;

const EPS: f64 = 1e-8;

pub(crate) fn zero_crossing_rate(frame: &[f64]) -> f64 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f64 / (frame.len() - 1) as f64
}

pub(crate) fn energy(frame: &[f64]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    frame.iter().map(|v| v * v).sum::<f64>() / frame.len() as f64
}

/// Entropy (bits) of the energy distribution over `n_blocks` sub-blocks.
pub(crate) fn energy_entropy(frame: &[f64], n_blocks: usize) -> f64 {
    let squares: Vec<f64> = frame.iter().map(|v| v * v).collect();
    block_entropy(&squares, n_blocks)
}

fn block_entropy(values: &[f64], n_blocks: usize) -> f64 {
    if n_blocks == 0 || values.len() < n_blocks {
        return 0.0;
    }
    let total: f64 = values.iter().sum();
    let block_len = values.len() / n_blocks;
    (0..n_blocks)
        .map(|b| {
            let sum: f64 = values[b * block_len..(b + 1) * block_len].iter().sum();
            let p = sum / (total + EPS);
            -p * (p + EPS).log2()
        })
        .sum()
}

/// Spectral centroid and spread, both normalized by the Nyquist frequency.
pub(crate) fn centroid_and_spread(magnitude: &[f64], sample_rate: usize) -> (f64, f64) {
    let n = magnitude.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let nyquist = sample_rate as f64 / 2.0;
    let max = magnitude.iter().cloned().fold(0.0, f64::max);
    if max <= 0.0 {
        return (0.0, 0.0);
    }
    let freq = |k: usize| (k + 1) as f64 * nyquist / n as f64;

    let mut num = 0.0;
    let mut den = EPS;
    for (k, &m) in magnitude.iter().enumerate() {
        let w = m / max;
        num += freq(k) * w;
        den += w;
    }
    let centroid = num / den;

    let spread_num: f64 = magnitude
        .iter()
        .enumerate()
        .map(|(k, &m)| (freq(k) - centroid).powi(2) * m / max)
        .sum();
    let spread = (spread_num / den).sqrt();
    (centroid / nyquist, spread / nyquist)
}

/// Entropy (bits) of the spectral energy over `n_blocks` sub-bands.
pub(crate) fn spectral_entropy(magnitude: &[f64], n_blocks: usize) -> f64 {
    let power: Vec<f64> = magnitude.iter().map(|m| m * m).collect();
    block_entropy(&power, n_blocks)
}

/// Squared difference between the sum-normalized current and previous spectra.
pub(crate) fn spectral_flux(magnitude: &[f64], previous: &[f64]) -> f64 {
    let sum: f64 = magnitude.iter().sum::<f64>() + EPS;
    let prev_sum: f64 = previous.iter().sum::<f64>() + EPS;
    magnitude
        .iter()
        .zip(previous)
        .map(|(m, p)| (m / sum - p / prev_sum).powi(2))
        .sum()
}

/// Fraction of the spectrum below which `ratio` of the energy lies.
pub(crate) fn spectral_rolloff(magnitude: &[f64], ratio: f64) -> f64 {
    let n = magnitude.len();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = magnitude.iter().map(|m| m * m).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let threshold = ratio * total;
    let mut cumulative = 0.0;
    for (k, m) in magnitude.iter().enumerate() {
        cumulative += m * m;
        if cumulative > threshold {
            return k as f64 / n as f64;
        }
    }
    1.0
}
