//! Dual QP shared by the cutting-plane learners.
//!
//! Solves
//!
//! ```text
//! max  sum_k a_k l_k - 1/2 |sum_k a_k d_k|^2
//! s.t. a_k >= 0,  sum_{k in g} a_k <= budget_g  for every group g
//! ```
//!
//! by pairwise coordinate ascent. Each group carries an implicit slack
//! variable with zero loss and zero direction, turning the budget into an
//! equality so every step moves mass between two variables of one group.

use ndarray::Array1;
use tracing::debug;

/// Steps taken on one group before moving on to the next.
const INNER_STEPS: usize = 8;

#[derive(Debug)]
struct Group {
    budget: f64,
    members: Vec<usize>,
}

#[derive(Debug)]
pub(crate) struct DualQp {
    w: Array1<f64>,
    dpsi: Vec<Array1<f64>>,
    loss: Vec<f64>,
    alpha: Vec<f64>,
    groups: Vec<Group>,
}

impl DualQp {
    pub fn new(dim: usize) -> Self {
        Self {
            w: Array1::zeros(dim),
            dpsi: Vec::new(),
            loss: Vec::new(),
            alpha: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn add_group(&mut self, budget: f64) -> usize {
        self.groups.push(Group {
            budget,
            members: Vec::new(),
        });
        self.groups.len() - 1
    }

    /// Adds an inactive constraint (`a = 0`) to `group`.
    pub fn push(&mut self, group: usize, dpsi: Array1<f64>, loss: f64) {
        let k = self.dpsi.len();
        self.dpsi.push(dpsi);
        self.loss.push(loss);
        self.alpha.push(0.0);
        self.groups[group].members.push(k);
    }

    /// Number of constraints in the working set.
    pub fn len(&self) -> usize {
        self.dpsi.len()
    }

    /// Primal weights `sum_k a_k d_k`.
    pub fn w(&self) -> &Array1<f64> {
        &self.w
    }

    /// Primal slack of `group`: its largest constraint violation, at least 0.
    pub fn slack(&self, group: usize) -> f64 {
        self.groups[group]
            .members
            .iter()
            .map(|&k| self.gradient(k))
            .fold(0.0, f64::max)
    }

    pub fn dual_objective(&self) -> f64 {
        let linear: f64 = self.alpha.iter().zip(&self.loss).map(|(a, l)| a * l).sum();
        linear - 0.5 * self.w.dot(&self.w)
    }

    /// Runs sweeps until no group has a pair violating optimality by more
    /// than `eps`. Returns false if `max_sweeps` ran out first.
    pub fn solve(&mut self, eps: f64, max_sweeps: usize) -> bool {
        for sweep in 0..max_sweeps {
            let mut worst: f64 = 0.0;
            for g in 0..self.groups.len() {
                if self.groups[g].members.is_empty() {
                    continue;
                }
                let first = self.step(g, eps);
                worst = worst.max(first);
                if first > eps {
                    for _ in 1..INNER_STEPS {
                        if self.step(g, eps) <= eps {
                            break;
                        }
                    }
                }
            }
            if worst <= eps {
                debug!(
                    "qp converged after {} sweeps, {} constraints, dual {:.6}",
                    sweep + 1,
                    self.len(),
                    self.dual_objective()
                );
                return true;
            }
        }
        debug!("qp stopped at {} sweeps without converging", max_sweeps);
        false
    }

    fn gradient(&self, k: usize) -> f64 {
        self.loss[k] - self.w.dot(&self.dpsi[k])
    }

    /// One pairwise step on `group`. Returns the violation found before the
    /// step; no step is taken when it is within `eps`.
    fn step(&mut self, group: usize, eps: f64) -> f64 {
        let g = &self.groups[group];
        let used: f64 = g.members.iter().map(|&k| self.alpha[k]).sum();
        let slack_alpha = (g.budget - used).max(0.0);

        // None stands for the group's slack variable, whose gradient is 0.
        let mut up: (Option<usize>, f64) = (None, 0.0);
        let mut down: Option<(Option<usize>, f64)> = (slack_alpha > 0.0).then_some((None, 0.0));
        for &k in &g.members {
            let gk = self.gradient(k);
            if gk > up.1 {
                up = (Some(k), gk);
            }
            if self.alpha[k] > 0.0 && down.is_none_or(|(_, gd)| gk < gd) {
                down = Some((Some(k), gk));
            }
        }

        let Some((dn, gd)) = down else {
            return 0.0;
        };
        let violation = up.1 - gd;
        if violation <= eps || up.0 == dn {
            return violation.max(0.0);
        }

        let q = match (up.0, dn) {
            (Some(a), Some(b)) => {
                let diff = &self.dpsi[a] - &self.dpsi[b];
                diff.dot(&diff)
            }
            (Some(a), None) => self.dpsi[a].dot(&self.dpsi[a]),
            (None, Some(b)) => self.dpsi[b].dot(&self.dpsi[b]),
            (None, None) => return 0.0,
        };
        let available = dn.map_or(slack_alpha, |b| self.alpha[b]);
        let t = if q > 1e-12 {
            (violation / q).min(available)
        } else {
            available
        };

        if let Some(a) = up.0 {
            self.alpha[a] += t;
            self.w.scaled_add(t, &self.dpsi[a]);
        }
        if let Some(b) = dn {
            self.alpha[b] = if t >= available { 0.0 } else { self.alpha[b] - t };
            self.w.scaled_add(-t, &self.dpsi[b]);
        }
        violation
    }
}
