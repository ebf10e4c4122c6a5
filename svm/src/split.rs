use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::rng::{entropy_seed, Xoshiro256ss};
use crate::SvmError;

/// Configures [`train_test_split`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of samples held out for testing (default: 0.25).
    pub test_size: f64,
    /// Shuffle seed; drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.25,
            seed: None,
        }
    }
}

/// Shuffled train/test partition of a labelled matrix.
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Array2<f64>,
    pub y_train: Vec<usize>,
    pub x_test: Array2<f64>,
    pub y_test: Vec<usize>,
    /// Seed that produced this shuffle.
    pub seed: u64,
}

/// Shuffles rows and splits them into `ceil(n * test_size)` test rows and the
/// remaining training rows. Rows of `x` and `y` stay paired.
pub fn train_test_split(
    x: ArrayView2<'_, f64>,
    y: &[usize],
    cfg: &SplitConfig,
) -> Result<Split, SvmError> {
    let n = x.nrows();
    if n != y.len() {
        return Err(SvmError::LengthMismatch {
            samples: n,
            labels: y.len(),
        });
    }
    if !(cfg.test_size > 0.0 && cfg.test_size < 1.0) {
        return Err(SvmError::InvalidSplit(format!(
            "test_size must be within (0, 1), got {}",
            cfg.test_size
        )));
    }

    let n_test = (n as f64 * cfg.test_size).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(SvmError::InvalidSplit(format!(
            "{n} samples with test_size {} leaves an empty partition",
            cfg.test_size
        )));
    }

    let seed = match cfg.seed {
        Some(s) => s,
        None => entropy_seed()?,
    };
    let order = Xoshiro256ss::new(seed).permutation(n);
    let (test_idx, train_idx) = order.split_at(n_test);

    Ok(Split {
        x_train: x.select(Axis(0), train_idx),
        y_train: train_idx.iter().map(|&i| y[i]).collect(),
        x_test: x.select(Axis(0), test_idx),
        y_test: test_idx.iter().map(|&i| y[i]).collect(),
        seed,
    })
}
