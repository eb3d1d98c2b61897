//! Lag matrix and multi-horizon target matrix

use crate::config::Lags;
use crate::error::{ForecastError, Result};
use ndarray::Array2;

/// Number of training rows a series of length `n` yields, if any
pub fn n_training_rows(n: usize, max_lag: usize, steps: usize) -> Option<usize> {
    n.checked_sub(max_lag + steps - 1).filter(|&rows| rows > 0)
}

/// Turn a series into a lag matrix `X` and a target matrix `Y`.
///
/// Row `i` of `X` holds, for each lag `l` (in the order of `lags`), the
/// observation `l` positions before the first target of the row. Row `i` of
/// `Y` holds the `steps` consecutive observations that follow, so `Y[i, s]`
/// lies `s + 1` positions after lag 1.
///
/// Both matrices have `n - max_lag - steps + 1` rows.
pub fn create_lags(y: &[f64], lags: &Lags, steps: usize) -> Result<(Array2<f64>, Array2<f64>)> {
    let max_lag = lags.max_lag();
    let n_rows = n_training_rows(y.len(), max_lag, steps).ok_or_else(|| {
        ForecastError::ValidationError(format!(
            "The maximum lag ({}) must be less than the length of the series minus the number \
             of steps ({}). Minimum length of the series is {}, got {}.",
            max_lag,
            (y.len() + 1).saturating_sub(steps),
            max_lag + steps,
            y.len()
        ))
    })?;

    let mut x = Array2::<f64>::zeros((n_rows, lags.len()));
    for (j, &lag) in lags.as_slice().iter().enumerate() {
        let offset = max_lag - lag;
        for i in 0..n_rows {
            x[[i, j]] = y[offset + i];
        }
    }

    let mut targets = Array2::<f64>::zeros((n_rows, steps));
    for step in 0..steps {
        for i in 0..n_rows {
            targets[[i, step]] = y[max_lag + step + i];
        }
    }

    Ok((x, targets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_rows_for_short_series() {
        assert_eq!(n_training_rows(10, 3, 1), Some(7));
        assert_eq!(n_training_rows(10, 3, 8), None);
        assert_eq!(n_training_rows(4, 3, 2), None);
        assert_eq!(n_training_rows(5, 3, 2), Some(1));
    }

    #[test]
    fn test_multi_step_targets() {
        let y: Vec<f64> = (0..10).map(f64::from).collect();
        let (x, targets) = create_lags(&y, &Lags::range(5).unwrap(), 2).unwrap();

        assert_eq!(x.dim(), (4, 5));
        assert_eq!(x.row(0).to_vec(), vec![4.0, 3.0, 2.0, 1.0, 0.0]);
        assert_eq!(
            targets,
            array![[5.0, 6.0], [6.0, 7.0], [7.0, 8.0], [8.0, 9.0]]
        );
    }
}
