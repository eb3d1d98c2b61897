//! Residual bootstrap: Monte Carlo replicates and empirical quantile bounds

use crate::error::{ForecastError, Result};
use crate::residuals::ResidualStore;
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bootstrap replicates, one row per requested step and `n_boot` columns.
///
/// Row `i` is `point[i]` plus `n_boot` residuals of `steps[i]` drawn with
/// replacement. A single generator seeded with `seed` is consumed in step
/// order, so the same inputs always yield the same matrix. Residuals are not
/// correlated across steps.
pub fn bootstrap_replicates(
    point: &[f64],
    steps: &[usize],
    store: &ResidualStore,
    n_boot: usize,
    seed: u64,
) -> Result<Array2<f64>> {
    if point.len() != steps.len() {
        return Err(ForecastError::ValidationError(format!(
            "Got {} point predictions for {} steps",
            point.len(),
            steps.len()
        )));
    }
    if n_boot == 0 {
        return Err(ForecastError::InvalidParameter(
            "`n_boot` must be greater than 0.".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut replicates = Array2::<f64>::zeros((steps.len(), n_boot));
    for (i, (&step, &prediction)) in steps.iter().zip(point).enumerate() {
        let residuals = store
            .get(step)
            .filter(|residuals| !residuals.is_empty())
            .ok_or_else(|| {
                ForecastError::MissingResiduals(format!("No residuals stored for step {}.", step))
            })?;
        for b in 0..n_boot {
            replicates[[i, b]] = prediction + residuals[rng.gen_range(0..residuals.len())];
        }
    }
    Ok(replicates)
}

/// Row-wise empirical quantiles `interval[0] / 100` and `interval[1] / 100`
pub fn quantile_bounds(
    samples: ArrayView2<f64>,
    interval: [f64; 2],
) -> Result<(Vec<f64>, Vec<f64>)> {
    let (lo, hi) = (interval[0] / 100.0, interval[1] / 100.0);
    let mut lower = Vec::with_capacity(samples.nrows());
    let mut upper = Vec::with_capacity(samples.nrows());
    for row in samples.rows() {
        let row = row.to_vec();
        lower.push(forecast_math::quantile(&row, lo)?);
        upper.push(forecast_math::quantile(&row, hi)?);
    }
    Ok((lower, upper))
}
