//! Expansion of exogenous covariates to one column per horizon

use crate::error::{ForecastError, Result};
use ndarray::{Array2, ArrayView2};

/// Expand an `(n, k)` exogenous matrix to `(n - steps + 1, k * steps)`.
///
/// Block `j` of the output holds, for row `i`, the values of column `j` at
/// rows `i..i + steps`. Columns are variable-major, step-minor.
pub fn exog_to_direct(exog: ArrayView2<f64>, steps: usize) -> Result<Array2<f64>> {
    let (n, k) = exog.dim();
    if steps == 0 {
        return Err(ForecastError::InvalidParameter(
            "`steps` must be greater than or equal to 1.".to_string(),
        ));
    }
    let n_rows = (n + 1).checked_sub(steps).filter(|&rows| rows > 0).ok_or_else(|| {
        ForecastError::ValidationError(format!(
            "`exog` must have at least as many rows as `steps` ({}). Got {}.",
            steps, n
        ))
    })?;

    let mut expanded = Array2::<f64>::zeros((n_rows, k * steps));
    for column in 0..k {
        for step in 0..steps {
            for i in 0..n_rows {
                expanded[[i, column * steps + step]] = exog[[i + step, column]];
            }
        }
    }

    Ok(expanded)
}

/// Column names `{name}_step_{s}` in the layout of [`exog_to_direct`]
pub fn exog_direct_names(columns: &[String], steps: usize) -> Vec<String> {
    columns
        .iter()
        .flat_map(|name| (1..=steps).map(move |step| format!("{}_step_{}", name, step)))
        .collect()
}
