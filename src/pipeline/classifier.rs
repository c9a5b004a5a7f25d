//! Binary logistic regression
//!
//! Full-batch gradient descent with backtracking line search on the
//! L2-regularized logistic loss. The objective is the usual
//! `C * sum(log_loss) + ||w||^2 / 2` divided through by `C * n`, so `c`
//! has the same meaning as an inverse regularization strength.
//! Gradient and loss sums are accumulated in parallel over row chunks.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::preprocess::FeatureMatrix;

/// Rows per parallel work item
const ROW_CHUNK: usize = 1024;

/// Maximum halvings of the step size within one iteration
const MAX_BACKTRACKS: usize = 40;

/// Optimizer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticRegression {
    /// Iteration cap
    pub max_iter: usize,
    /// Initial step size; adapted by the line search
    pub learning_rate: f64,
    /// Stop when the largest absolute gradient component falls below this
    pub tolerance: f64,
    /// Inverse L2 regularization strength
    pub c: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            learning_rate: 1.0,
            tolerance: 1e-4,
            c: 1.0,
        }
    }
}

/// A fitted linear decision function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
    /// Iterations actually run
    pub iterations: usize,
    /// Whether the gradient tolerance was met; false when the cap was hit
    /// or the line search stalled
    pub converged: bool,
}

/// Row-major copy of the matrix, so chunks can be shared across threads
struct Rows {
    data: Vec<f64>,
    width: usize,
}

impl Rows {
    fn from_matrix(x: &FeatureMatrix) -> Self {
        let (n, d) = (x.nrows(), x.ncols());
        let mut data = Vec::with_capacity(n * d);
        for i in 0..n {
            for j in 0..d {
                data.push(x.values()[(i, j)]);
            }
        }
        Self { data, width: d }
    }

    fn chunks(&self) -> rayon::slice::Chunks<'_, f64> {
        self.data.par_chunks(self.width * ROW_CHUNK)
    }
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `log(1 + exp(z))` without overflow
#[inline]
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

#[inline]
fn decision(row: &[f64], weights: &[f64], intercept: f64) -> f64 {
    intercept + row.iter().zip(weights).map(|(x, w)| x * w).sum::<f64>()
}

impl LogisticRegression {
    /// Fit on a feature matrix and 0/1 labels
    pub fn fit(&self, x: &FeatureMatrix, y: &[u8]) -> PipelineResult<LogisticModel> {
        let n = x.nrows();
        let d = x.ncols();

        if n != y.len() {
            return Err(PipelineError::Schema(format!(
                "feature matrix has {} rows but {} labels were given",
                n,
                y.len()
            )));
        }
        if n == 0 || d == 0 {
            return Err(PipelineError::InsufficientData(format!(
                "cannot fit a classifier on a {}x{} matrix",
                n, d
            )));
        }
        let positives = y.iter().filter(|&&v| v == 1).count();
        if positives == 0 || positives == n {
            return Err(PipelineError::InsufficientData(
                "training labels contain a single class; both 0 and 1 are required".to_string(),
            ));
        }
        if !(self.c > 0.0) || !(self.learning_rate > 0.0) {
            return Err(PipelineError::Numeric(format!(
                "c and learning_rate must be positive (c={}, learning_rate={})",
                self.c, self.learning_rate
            )));
        }

        let rows = Rows::from_matrix(x);
        let targets: Vec<f64> = y.iter().map(|&v| f64::from(v)).collect();
        let penalty = 1.0 / (self.c * n as f64);

        let mut weights = vec![0.0; d];
        let mut intercept = 0.0;
        let mut step = self.learning_rate;
        let mut loss = self.loss(&rows, &targets, &weights, intercept, penalty);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iter {
            iterations += 1;

            let (grad_w, grad_b) = self.gradient(&rows, &targets, &weights, intercept, penalty);
            let max_grad = grad_w
                .iter()
                .fold(grad_b.abs(), |acc, g| acc.max(g.abs()));
            if max_grad < self.tolerance {
                converged = true;
                break;
            }

            let grad_sq: f64 = grad_w.iter().map(|g| g * g).sum::<f64>() + grad_b * grad_b;
            let mut accepted = false;

            for _ in 0..MAX_BACKTRACKS {
                let trial_w: Vec<f64> = weights
                    .iter()
                    .zip(&grad_w)
                    .map(|(w, g)| w - step * g)
                    .collect();
                let trial_b = intercept - step * grad_b;
                let trial_loss = self.loss(&rows, &targets, &trial_w, trial_b, penalty);

                // Armijo sufficient decrease
                if trial_loss <= loss - 0.5 * step * grad_sq {
                    weights = trial_w;
                    intercept = trial_b;
                    loss = trial_loss;
                    accepted = true;
                    step *= 1.5;
                    break;
                }
                step *= 0.5;
            }

            if !accepted {
                // stalled: no decrease is possible at machine precision
                break;
            }
        }

        if !loss.is_finite() {
            return Err(PipelineError::Numeric(
                "logistic loss diverged to a non-finite value".to_string(),
            ));
        }

        Ok(LogisticModel {
            weights,
            intercept,
            iterations,
            converged,
        })
    }

    fn loss(&self, rows: &Rows, y: &[f64], weights: &[f64], intercept: f64, penalty: f64) -> f64 {
        let d = rows.width;
        let n = y.len() as f64;
        let data_loss: f64 = rows
            .chunks()
            .zip(y.par_chunks(ROW_CHUNK))
            .map(|(chunk, ys)| {
                chunk
                    .chunks(d)
                    .zip(ys)
                    .map(|(row, &t)| {
                        let z = decision(row, weights, intercept);
                        softplus(z) - t * z
                    })
                    .sum::<f64>()
            })
            .sum();
        let reg: f64 = weights.iter().map(|w| w * w).sum::<f64>();
        data_loss / n + 0.5 * penalty * reg
    }

    fn gradient(
        &self,
        rows: &Rows,
        y: &[f64],
        weights: &[f64],
        intercept: f64,
        penalty: f64,
    ) -> (Vec<f64>, f64) {
        let d = rows.width;
        let n = y.len() as f64;

        let (mut grad_w, grad_b) = rows
            .chunks()
            .zip(y.par_chunks(ROW_CHUNK))
            .map(|(chunk, ys)| {
                let mut g = vec![0.0; d];
                let mut b = 0.0;
                for (row, &t) in chunk.chunks(d).zip(ys) {
                    let err = sigmoid(decision(row, weights, intercept)) - t;
                    for (gj, xj) in g.iter_mut().zip(row) {
                        *gj += err * xj;
                    }
                    b += err;
                }
                (g, b)
            })
            .reduce(
                || (vec![0.0; d], 0.0),
                |(mut a, ab), (b, bb)| {
                    for (x, y) in a.iter_mut().zip(&b) {
                        *x += y;
                    }
                    (a, ab + bb)
                },
            );

        for (g, w) in grad_w.iter_mut().zip(weights) {
            *g = *g / n + penalty * w;
        }
        (grad_w, grad_b / n)
    }
}

impl LogisticModel {
    fn check_width(&self, x: &FeatureMatrix) -> PipelineResult<()> {
        if x.ncols() != self.weights.len() {
            return Err(PipelineError::Schema(format!(
                "model expects {} features, matrix has {}",
                self.weights.len(),
                x.ncols()
            )));
        }
        Ok(())
    }

    /// Probability of the positive class per row
    pub fn predict_proba(&self, x: &FeatureMatrix) -> PipelineResult<Vec<f64>> {
        self.check_width(x)?;
        let rows = Rows::from_matrix(x);
        if rows.width == 0 {
            return Ok(vec![sigmoid(self.intercept); x.nrows()]);
        }
        Ok(rows
            .data
            .par_chunks(rows.width)
            .map(|row| sigmoid(decision(row, &self.weights, self.intercept)))
            .collect())
    }

    /// Hard 0/1 predictions (positive when the decision function is above zero)
    pub fn predict(&self, x: &FeatureMatrix) -> PipelineResult<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }
}
