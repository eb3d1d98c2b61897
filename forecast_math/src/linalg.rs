//! Weighted least squares for linear regressors
//!
//! Solves the (optionally ridge penalised) normal equations on centered data
//! through a Cholesky factorisation. The intercept is never penalised.

use crate::{MathError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Relative jitter added to the diagonal when an unpenalised system is singular
const SINGULAR_JITTER: f64 = 1e-8;

/// Pivots below this fraction of the largest diagonal entry count as zero
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Coefficients and intercept of a least squares fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeastSquaresFit {
    /// One coefficient per column of the design matrix
    pub coefficients: Array1<f64>,
    /// Intercept (0.0 when the fit has no intercept)
    pub intercept: f64,
}

impl LeastSquaresFit {
    /// Predict the response for every row of `x`
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(MathError::InvalidInput(format!(
                "Design matrix has {} columns but the fit has {} coefficients",
                x.ncols(),
                self.coefficients.len()
            )));
        }
        Ok(x.dot(&self.coefficients) + self.intercept)
    }
}

/// Fit `y ~ x` by weighted least squares with an L2 penalty `alpha`.
///
/// With `alpha == 0.0` and a rank deficient design, a tiny diagonal jitter is
/// used so that collinear predictors (common with lags of trending series)
/// still yield the minimum-norm-like solution instead of failing.
pub fn weighted_least_squares(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    weights: Option<ArrayView1<f64>>,
    alpha: f64,
    fit_intercept: bool,
) -> Result<LeastSquaresFit> {
    let (n, p) = x.dim();
    if n == 0 {
        return Err(MathError::InsufficientData(
            "Cannot fit least squares without observations".to_string(),
        ));
    }
    if y.len() != n {
        return Err(MathError::InvalidInput(format!(
            "Design matrix has {} rows but the response has {} values",
            n,
            y.len()
        )));
    }
    if alpha < 0.0 || !alpha.is_finite() {
        return Err(MathError::InvalidInput(format!(
            "Penalty must be a finite non-negative value, got {}",
            alpha
        )));
    }

    let w = match weights {
        Some(w) if w.len() != n => {
            return Err(MathError::InvalidInput(format!(
                "Weights length ({}) doesn't match number of rows ({})",
                w.len(),
                n
            )))
        }
        Some(w) => w.to_owned(),
        None => Array1::ones(n),
    };
    let total = w.sum();
    if total <= 0.0 {
        return Err(MathError::InvalidInput(
            "Weights must sum to a strictly positive value".to_string(),
        ));
    }

    let (x_mean, y_mean) = if fit_intercept {
        let x_mean = x.t().dot(&w) / total;
        let y_mean = y.dot(&w) / total;
        (x_mean, y_mean)
    } else {
        (Array1::zeros(p), 0.0)
    };

    let mut gram = Array2::<f64>::zeros((p, p));
    let mut rhs = Array1::<f64>::zeros(p);
    for i in 0..n {
        let xc = &x.row(i) - &x_mean;
        let yc = y[i] - y_mean;
        for a in 0..p {
            rhs[a] += w[i] * xc[a] * yc;
            for b in a..p {
                gram[[a, b]] += w[i] * xc[a] * xc[b];
            }
        }
    }
    for a in 0..p {
        for b in 0..a {
            gram[[a, b]] = gram[[b, a]];
        }
        gram[[a, a]] += alpha;
    }

    let coefficients = match cholesky_solve(&gram, &rhs) {
        Ok(coef) => coef,
        Err(MathError::SingularMatrix(_)) if alpha == 0.0 => {
            let scale = gram.diag().iter().fold(1.0_f64, |acc, &d| acc.max(d.abs()));
            let mut jittered = gram.clone();
            for a in 0..p {
                jittered[[a, a]] += SINGULAR_JITTER * scale;
            }
            cholesky_solve(&jittered, &rhs)?
        }
        Err(err) => return Err(err),
    };

    let intercept = if fit_intercept {
        y_mean - x_mean.dot(&coefficients)
    } else {
        0.0
    };

    Ok(LeastSquaresFit {
        coefficients,
        intercept,
    })
}

/// Solve `a * x = b` for a symmetric positive definite `a`
pub fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let p = a.nrows();
    if a.ncols() != p || b.len() != p {
        return Err(MathError::InvalidInput(format!(
            "Expected a square system, got {}x{} with rhs of length {}",
            a.nrows(),
            a.ncols(),
            b.len()
        )));
    }

    let scale = a.diag().iter().fold(0.0_f64, |acc, &d| acc.max(d.abs()));
    let tolerance = PIVOT_TOLERANCE * scale.max(1.0) * p.max(1) as f64;

    let mut l = Array2::<f64>::zeros((p, p));
    for j in 0..p {
        let mut d = a[[j, j]];
        for k in 0..j {
            d -= l[[j, k]] * l[[j, k]];
        }
        if d.is_nan() || d <= tolerance {
            return Err(MathError::SingularMatrix(format!(
                "Non-positive pivot {:e} at column {}",
                d, j
            )));
        }
        let d = d.sqrt();
        l[[j, j]] = d;
        for i in (j + 1)..p {
            let mut s = a[[i, j]];
            for k in 0..j {
                s -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = s / d;
        }
    }

    // Forward substitution: L z = b
    let mut z = Array1::<f64>::zeros(p);
    for i in 0..p {
        let mut s = b[i];
        for k in 0..i {
            s -= l[[i, k]] * z[k];
        }
        z[i] = s / l[[i, i]];
    }

    // Back substitution: L^T x = z
    let mut x = Array1::<f64>::zeros(p);
    for i in (0..p).rev() {
        let mut s = z[i];
        for k in (i + 1)..p {
            s -= l[[k, i]] * x[k];
        }
        x[i] = s / l[[i, i]];
    }

    Ok(x)
}
