use ndarray::{s, Array2, ArrayView1, ArrayView2};
use tracing::{debug, warn};

use crate::learner::Classifier;
use crate::model::{argmax, check_training};
use crate::rng::Xoshiro256ss;
use crate::SvmError;

/// Crammer-Singer multiclass linear SVM.
///
/// Minimizes `1/2 sum_m |w_m|^2 + c * sum_i xi_i` with one weight vector per
/// class, solved by sequential dual coordinate ascent over samples. Each
/// sample's subproblem has a closed-form solution. The intercept is learned
/// as the weight of an extra constant feature `intercept_scaling`.
#[derive(Debug, Clone)]
pub struct LinearSvc {
    pub c: f64,
    pub tol: f64,
    pub max_iter: usize,
    pub fit_intercept: bool,
    pub intercept_scaling: f64,
    /// Seeds the per-pass sample order.
    pub random_state: u64,
    fitted: Option<FittedSvc>,
}

#[derive(Debug, Clone)]
struct FittedSvc {
    classes: Vec<usize>,
    /// One row per class; the last column is the intercept weight when
    /// `fit_intercept` was set.
    w: Array2<f64>,
    n_features: usize,
}

impl Default for LinearSvc {
    fn default() -> Self {
        Self {
            c: 1.0,
            tol: 1e-4,
            max_iter: 1000,
            fit_intercept: true,
            intercept_scaling: 1.0,
            random_state: 0,
            fitted: None,
        }
    }
}

impl LinearSvc {
    pub fn new(c: f64, tol: f64, max_iter: usize) -> Self {
        Self {
            c,
            tol,
            max_iter,
            ..Self::default()
        }
    }

    /// Class labels seen during fit, in ascending order.
    pub fn classes(&self) -> Option<&[usize]> {
        self.fitted.as_ref().map(|f| f.classes.as_slice())
    }

    /// Per-class weights, `n_classes x n_features`, without the intercept.
    pub fn coef(&self) -> Option<ArrayView2<'_, f64>> {
        self.fitted
            .as_ref()
            .map(|f| f.w.slice(s![.., ..f.n_features]))
    }

    /// Per-class intercepts (zero when `fit_intercept` is off).
    pub fn intercept(&self) -> Option<Vec<f64>> {
        self.fitted.as_ref().map(|f| {
            if self.fit_intercept {
                f.w.column(f.n_features)
                    .iter()
                    .map(|b| b * self.intercept_scaling)
                    .collect()
            } else {
                vec![0.0; f.classes.len()]
            }
        })
    }

    fn augmented(&self, x: ArrayView1<'_, f64>, out: &mut Vec<f64>) {
        out.clear();
        out.extend(x.iter().copied());
        if self.fit_intercept {
            out.push(self.intercept_scaling);
        }
    }

    fn train(&self, x: ArrayView2<'_, f64>, y: &[usize], classes: &[usize]) -> Array2<f64> {
        let n = x.nrows();
        let k = classes.len();
        let dim = x.ncols() + usize::from(self.fit_intercept);

        let rows: Vec<Vec<f64>> = x
            .outer_iter()
            .map(|row| {
                let mut v = Vec::with_capacity(dim);
                self.augmented(row, &mut v);
                v
            })
            .collect();
        let targets: Vec<usize> = y
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or(0))
            .collect();
        let sq_norms: Vec<f64> = rows.iter().map(|r| r.iter().map(|v| v * v).sum()).collect();

        let mut w = Array2::<f64>::zeros((k, dim));
        let mut alpha = vec![0.0; n * k];
        let mut g = vec![0.0; k];
        let mut b = vec![0.0; k];
        let mut alpha_new = vec![0.0; k];
        let mut rng = Xoshiro256ss::new(self.random_state);

        for iter in 0..self.max_iter {
            let mut worst = f64::NEG_INFINITY;

            for i in rng.permutation(n) {
                let a_i = sq_norms[i];
                if a_i <= 0.0 {
                    continue;
                }
                let yi = targets[i];
                let row = &rows[i];
                let alpha_i = &mut alpha[i * k..(i + 1) * k];

                for m in 0..k {
                    let dot: f64 = w.row(m).iter().zip(row).map(|(a, b)| a * b).sum();
                    g[m] = dot + if m == yi { 0.0 } else { 1.0 };
                }

                let mut min_g = f64::INFINITY;
                let mut max_g = f64::NEG_INFINITY;
                for m in 0..k {
                    let below_bound = if m == yi { alpha_i[m] < self.c } else { alpha_i[m] < 0.0 };
                    if below_bound && g[m] < min_g {
                        min_g = g[m];
                    }
                    if g[m] > max_g {
                        max_g = g[m];
                    }
                }
                worst = worst.max(max_g - min_g);
                if max_g - min_g <= 1e-12 {
                    continue;
                }

                for m in 0..k {
                    b[m] = g[m] - a_i * alpha_i[m];
                }
                solve_sub_problem(a_i, yi, self.c, &b, &mut alpha_new);

                for m in 0..k {
                    let d = alpha_new[m] - alpha_i[m];
                    alpha_i[m] = alpha_new[m];
                    if d.abs() > 1e-12 {
                        for (wv, xv) in w.row_mut(m).iter_mut().zip(row) {
                            *wv += d * xv;
                        }
                    }
                }
            }

            debug!("crammer-singer pass {}: max violation {:.6}", iter, worst);
            if worst < self.tol {
                return w;
            }
        }
        warn!(
            "Crammer-Singer solver did not converge within {} iterations; consider raising max_iter",
            self.max_iter
        );
        w
    }
}

/// Closed-form solution of one sample's Crammer-Singer subproblem:
///
/// ```text
/// min  1/2 a |alpha|^2 + b . alpha
/// s.t. alpha_m <= c * [m == yi],  sum_m alpha_m = 0
/// ```
fn solve_sub_problem(a: f64, yi: usize, c: f64, b: &[f64], alpha_new: &mut [f64]) {
    let mut d = b.to_vec();
    d[yi] += a * c;
    d.sort_unstable_by(|p, q| q.total_cmp(p));

    let mut beta = d[0] - a * c;
    let mut r = 1;
    while r < d.len() && beta < r as f64 * d[r] {
        beta += d[r];
        r += 1;
    }
    beta /= r as f64;

    for (m, out) in alpha_new.iter_mut().enumerate() {
        let v = (beta - b[m]) / a;
        *out = if m == yi { v.min(c) } else { v.min(0.0) };
    }
}

impl Classifier for LinearSvc {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<(), SvmError> {
        if !(self.c > 0.0) {
            return Err(SvmError::InvalidParam(format!("C must be positive, got {}", self.c)));
        }
        if !(self.tol > 0.0) {
            return Err(SvmError::InvalidParam(format!("tol must be positive, got {}", self.tol)));
        }
        check_training(x, y)?;

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(SvmError::TooFewClasses(classes.len()));
        }

        let w = self.train(x, y, &classes);
        self.fitted = Some(FittedSvc {
            classes,
            w,
            n_features: x.ncols(),
        });
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>, SvmError> {
        let fitted = self.fitted.as_ref().ok_or(SvmError::NotFitted)?;
        if x.ncols() != fitted.n_features {
            return Err(SvmError::DimensionMismatch {
                expected: fitted.n_features,
                got: x.ncols(),
            });
        }

        let mut row = Vec::with_capacity(fitted.w.ncols());
        let mut scores = vec![0.0; fitted.classes.len()];
        Ok(x.outer_iter()
            .map(|xr| {
                self.augmented(xr, &mut row);
                for (s, wm) in scores.iter_mut().zip(fitted.w.outer_iter()) {
                    *s = wm.iter().zip(&row).map(|(a, b)| a * b).sum();
                }
                fitted.classes[argmax(&scores)]
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn sub_problem_respects_constraints() {
        let b = [0.5, -0.2, 1.0];
        let mut alpha = [0.0; 3];
        solve_sub_problem(2.0, 1, 0.5, &b, &mut alpha);
        let sum: f64 = alpha.iter().sum();
        assert!(sum.abs() < 1e-12, "alphas must sum to zero: {alpha:?}");
        assert!(alpha[1] <= 0.5 + 1e-12);
        assert!(alpha[0] <= 0.0 && alpha[2] <= 0.0);
    }

    #[test]
    fn sub_problem_zero_when_margin_met() {
        // b = G at alpha = 0: the true class already wins by more than 1
        let b = [-5.0, 1.0];
        let mut alpha = [9.0; 2];
        solve_sub_problem(1.0, 1, 1.0, &b, &mut alpha);
        assert!(alpha.iter().all(|a| a.abs() < 1e-12), "{alpha:?}");
    }

    #[test]
    fn separates_three_classes() {
        let x = array![
            [2.0, 0.0],
            [3.0, 0.5],
            [0.0, 2.0],
            [0.5, 3.0],
            [-2.0, -2.0],
            [-3.0, -2.5],
        ];
        let y = vec![4, 4, 7, 7, 9, 9];
        let mut svc = LinearSvc::new(10.0, 1e-4, 1000);
        svc.fit(x.view(), &y).unwrap();
        assert_eq!(svc.predict(x.view()).unwrap(), y);
        assert_eq!(svc.classes().unwrap(), &[4, 7, 9]);
        assert_eq!(svc.coef().unwrap().dim(), (3, 2));
        assert_eq!(svc.intercept().unwrap().len(), 3);
        assert_eq!(svc.score(x.view(), &y).unwrap(), 1.0);
    }

    #[test]
    fn single_class_is_rejected() {
        let x = array![[1.0], [2.0]];
        let mut svc = LinearSvc::default();
        assert!(matches!(svc.fit(x.view(), &[3, 3]), Err(SvmError::TooFewClasses(1))));
    }

    #[test]
    fn predict_checks_state_and_width() {
        let x = array![[1.0, 0.0], [-1.0, 0.0]];
        let mut svc = LinearSvc::default();
        assert!(matches!(svc.predict(x.view()), Err(SvmError::NotFitted)));
        svc.fit(x.view(), &[0, 1]).unwrap();
        assert!(matches!(
            svc.predict(array![[1.0]].view()),
            Err(SvmError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }
}
