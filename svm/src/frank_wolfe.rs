use ndarray::{Array1, ArrayView2};
use tracing::{debug, warn};

use crate::learner::StructuredLearner;
use crate::model::{find_constraint, LinearModel, MultiClassModel};
use crate::rng::Xoshiro256ss;
use crate::SvmError;

/// Guards the line-search denominator.
const EPS: f64 = 1e-15;

/// Frank-Wolfe structured SVM, block-coordinate (BCFW) or batch.
///
/// Optimizes `1/2 |w|^2 + c * sum_i H_i(w)` through its dual, scaled so the
/// iterate is the primal weight vector. The block-coordinate mode updates one
/// sample's block at a time in a random order each pass; batch mode updates
/// all blocks at once. Both stop when the duality gap drops below `tol`.
#[derive(Debug, Clone)]
pub struct FrankWolfeSsvm {
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub batch_mode: bool,
    /// Exact line search; otherwise the standard `2 / (k + 2)` step.
    pub line_search: bool,
    /// Seeds the sample order of block-coordinate passes.
    pub random_state: u64,
    fitted: Option<LinearModel>,
}

impl Default for FrankWolfeSsvm {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-3,
            batch_mode: false,
            line_search: true,
            random_state: 0,
            fitted: None,
        }
    }
}

impl FrankWolfeSsvm {
    pub fn new(c: f64, max_iter: usize, batch_mode: bool) -> Self {
        Self {
            c,
            max_iter,
            batch_mode,
            ..Self::default()
        }
    }

    /// Batch Frank-Wolfe corner: `(c * sum_i dpsi_i, mean loss)`.
    fn batch_corner(
        &self,
        model: &MultiClassModel,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        w: &Array1<f64>,
    ) -> (Array1<f64>, f64) {
        let mut ws = Array1::<f64>::zeros(model.size());
        let mut ls = 0.0;
        for (row, &label) in x.outer_iter().zip(y) {
            let c = find_constraint(model, row, label, w.view());
            ws.scaled_add(self.c, &c.dpsi);
            ls += c.loss;
        }
        (ws, ls / x.nrows() as f64)
    }

    /// Duality gap of `(w, l)` given the batch corner `(ws, ls)`.
    fn gap(&self, n: f64, w: &Array1<f64>, l: f64, ws: &Array1<f64>, ls: f64) -> f64 {
        let diff = w - ws;
        diff.dot(w) / (self.c * n) - l + ls
    }

    fn fit_batch(&self, model: &MultiClassModel, x: ArrayView2<'_, f64>, y: &[usize]) -> Array1<f64> {
        let n = x.nrows() as f64;
        let mut w = Array1::<f64>::zeros(model.size());
        let mut l = 0.0;

        for iteration in 0..self.max_iter {
            let (ws, ls) = self.batch_corner(model, x, y, &w);
            let gap = self.gap(n, &w, l, &ws, ls);
            debug!("frank-wolfe batch iteration {}: gap {:.6}", iteration, gap);
            if gap < self.tol {
                return w;
            }

            let gamma = if self.line_search {
                let diff = &w - &ws;
                (gap / (diff.dot(&diff) / (self.c * n) + EPS)).clamp(0.0, 1.0)
            } else {
                2.0 / (iteration as f64 + 2.0)
            };
            w *= 1.0 - gamma;
            w.scaled_add(gamma, &ws);
            l = (1.0 - gamma) * l + gamma * ls;
        }
        warn!(
            "batch Frank-Wolfe SSVM did not converge within {} iterations",
            self.max_iter
        );
        w
    }

    fn fit_block_coordinate(
        &self,
        model: &MultiClassModel,
        x: ArrayView2<'_, f64>,
        y: &[usize],
    ) -> Array1<f64> {
        let n = x.nrows();
        let nf = n as f64;
        let mut w = Array1::<f64>::zeros(model.size());
        let mut l = 0.0;
        let mut w_blocks = vec![Array1::<f64>::zeros(model.size()); n];
        let mut l_blocks = vec![0.0; n];
        let mut rng = Xoshiro256ss::new(self.random_state);
        let mut k = 0.0;

        for iteration in 0..self.max_iter {
            for i in rng.permutation(n) {
                let c = find_constraint(model, x.row(i), y[i], w.view());
                let ws = c.dpsi * self.c;
                let ls = c.loss / nf;

                let gamma = if self.line_search {
                    let diff = &w_blocks[i] - &ws;
                    ((diff.dot(&w) - self.c * nf * (l_blocks[i] - ls)) / (diff.dot(&diff) + EPS))
                        .clamp(0.0, 1.0)
                } else {
                    2.0 * nf / (k + 2.0 * nf)
                };

                w -= &w_blocks[i];
                w_blocks[i] *= 1.0 - gamma;
                w_blocks[i].scaled_add(gamma, &ws);
                w += &w_blocks[i];

                l -= l_blocks[i];
                l_blocks[i] = (1.0 - gamma) * l_blocks[i] + gamma * ls;
                l += l_blocks[i];
                k += 1.0;
            }

            let (ws, ls) = self.batch_corner(model, x, y, &w);
            let gap = self.gap(nf, &w, l, &ws, ls);
            debug!("frank-wolfe iteration {}: gap {:.6}", iteration, gap);
            if gap < self.tol {
                return w;
            }
        }
        warn!(
            "block-coordinate Frank-Wolfe SSVM did not converge within {} iterations",
            self.max_iter
        );
        w
    }
}

impl StructuredLearner for FrankWolfeSsvm {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<(), SvmError> {
        if !(self.c > 0.0) {
            return Err(SvmError::InvalidParam(format!("C must be positive, got {}", self.c)));
        }
        let (model, classes, encoded) = MultiClassModel::for_data(x, y)?;
        let y = encoded.as_slice();
        model.check(x, y)?;

        let w = if self.batch_mode {
            self.fit_batch(&model, x, y)
        } else {
            self.fit_block_coordinate(&model, x, y)
        };
        self.fitted = Some(LinearModel { model, classes, w });
        Ok(())
    }

    fn fitted(&self) -> Option<&LinearModel> {
        self.fitted.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy() -> (ndarray::Array2<f64>, Vec<usize>) {
        let x = array![
            [2.0, 0.0, 1.0],
            [3.0, 0.5, 1.0],
            [0.0, 2.0, 1.0],
            [0.5, 3.0, 1.0],
            [-2.0, -2.0, 1.0],
            [-3.0, -2.5, 1.0],
        ];
        (x, vec![0, 0, 1, 1, 2, 2])
    }

    #[test]
    fn block_coordinate_separates_toy_classes() {
        let (x, y) = toy();
        let mut svm = FrankWolfeSsvm::new(10.0, 200, false);
        StructuredLearner::fit(&mut svm, x.view(), &y).unwrap();
        assert_eq!(StructuredLearner::predict(&svm, x.view()).unwrap(), y);
    }

    #[test]
    fn batch_separates_toy_classes() {
        let (x, y) = toy();
        let mut svm = FrankWolfeSsvm::new(10.0, 500, true);
        StructuredLearner::fit(&mut svm, x.view(), &y).unwrap();
        assert_eq!(StructuredLearner::predict(&svm, x.view()).unwrap(), y);
    }

    #[test]
    fn gap_is_zero_at_matching_corner() {
        let svm = FrankWolfeSsvm::default();
        let w = array![1.0, 2.0];
        assert_eq!(svm.gap(4.0, &w, 0.5, &w, 0.5), 0.0);
    }
}
