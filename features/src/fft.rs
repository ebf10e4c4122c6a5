use std::f64::consts::PI;

/// Complex sample as `(real, imag)`.
pub(crate) type Complex = (f64, f64);

pub(crate) fn next_pow2(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p <<= 1;
    }
    p
}

/// Symmetric Hamming window of length `n`.
pub(crate) fn hamming_window(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Subtracts the frame mean in place.
pub(crate) fn remove_dc(frame: &mut [f64]) {
    if frame.is_empty() {
        return;
    }
    let mean = frame.iter().sum::<f64>() / frame.len() as f64;
    for v in frame.iter_mut() {
        *v -= mean;
    }
}

/// First-order pre-emphasis filter `y[n] = x[n] - coef * x[n-1]`, in place.
pub(crate) fn pre_emphasize(frame: &mut [f64], coef: f64) {
    if coef <= 0.0 || frame.is_empty() {
        return;
    }
    for i in (1..frame.len()).rev() {
        frame[i] -= coef * frame[i - 1];
    }
    frame[0] *= 1.0 - coef;
}

/// Zero-pads `frame` to `fft_size` and returns the one-sided power spectrum
/// `|X[k]|^2` for `k` in `0..=fft_size/2`.
pub(crate) fn power_spectrum(frame: &[f64], fft_size: usize) -> Vec<f64> {
    let mut buf: Vec<Complex> = vec![(0.0, 0.0); fft_size];
    for (slot, &v) in buf.iter_mut().zip(frame.iter()) {
        slot.0 = v;
    }
    fft(&mut buf);
    buf[..fft_size / 2 + 1]
        .iter()
        .map(|&(re, im)| re * re + im * im)
        .collect()
}

/// In-place iterative radix-2 FFT. `x.len()` must be a power of 2.
pub(crate) fn fft(x: &mut [Complex]) {
    let n = x.len();
    if n <= 1 {
        return;
    }
    debug_assert!(n.is_power_of_two(), "fft length must be a power of 2");

    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            x.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let theta = -2.0 * PI / len as f64;
        let step = (theta.cos(), theta.sin());
        for chunk in x.chunks_mut(len) {
            let mut tw: Complex = (1.0, 0.0);
            for k in 0..half {
                let a = chunk[k];
                let b = mul(tw, chunk[k + half]);
                chunk[k] = (a.0 + b.0, a.1 + b.1);
                chunk[k + half] = (a.0 - b.0, a.1 - b.1);
                tw = mul(tw, step);
            }
        }
        len <<= 1;
    }
}

fn mul(a: Complex, b: Complex) -> Complex {
    (a.0 * b.0 - a.1 * b.1, a.0 * b.1 + a.1 * b.0)
}
