//! Descriptive statistics over slices of floats
//!
//! Contains:
//! - Mean, weighted mean, variance and standard deviation
//! - Median and empirical quantiles (linear interpolation between order statistics)

use crate::{MathError, Result};
use num_traits::Float;

fn as_float<T: Float>(n: usize) -> Result<T> {
    T::from(n).ok_or_else(|| MathError::CalculationError(format!("Cannot represent {} as float", n)))
}

/// Arithmetic mean of the values
pub fn mean<T: Float>(values: &[T]) -> Result<T> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the mean of an empty slice".to_string(),
        ));
    }

    let sum = values.iter().fold(T::zero(), |acc, &v| acc + v);
    Ok(sum / as_float(values.len())?)
}

/// Mean of the values weighted by `weights`
pub fn weighted_mean<T: Float>(values: &[T], weights: &[T]) -> Result<T> {
    if values.len() != weights.len() {
        return Err(MathError::InvalidInput(format!(
            "Values length ({}) doesn't match weights length ({})",
            values.len(),
            weights.len()
        )));
    }

    let total = weights.iter().fold(T::zero(), |acc, &w| acc + w);
    if total <= T::zero() {
        return Err(MathError::InvalidInput(
            "Weights must sum to a strictly positive value".to_string(),
        ));
    }

    let sum = values
        .iter()
        .zip(weights.iter())
        .fold(T::zero(), |acc, (&v, &w)| acc + v * w);
    Ok(sum / total)
}

/// Variance with `ddof` delta degrees of freedom (0 = population, 1 = sample)
pub fn variance<T: Float>(values: &[T], ddof: usize) -> Result<T> {
    if values.len() <= ddof {
        return Err(MathError::InsufficientData(format!(
            "Need more than {} observations to compute the variance, got {}",
            ddof,
            values.len()
        )));
    }

    let m = mean(values)?;
    let ss = values.iter().fold(T::zero(), |acc, &v| acc + (v - m) * (v - m));
    Ok(ss / as_float(values.len() - ddof)?)
}

/// Standard deviation with `ddof` delta degrees of freedom
pub fn std_dev<T: Float>(values: &[T], ddof: usize) -> Result<T> {
    Ok(variance(values, ddof)?.sqrt())
}

/// Median of the values
pub fn median<T: Float>(values: &[T]) -> Result<T> {
    quantile(values, 0.5)
}

/// Empirical quantile `q` in `[0, 1]`.
///
/// Uses linear interpolation between the two closest order statistics,
/// i.e. position `(n - 1) * q` of the sorted sample.
pub fn quantile<T: Float>(values: &[T], q: f64) -> Result<T> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute a quantile of an empty slice".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Quantile must be between 0 and 1, got {}",
            q
        )));
    }
    if values.iter().any(|v| v.is_nan()) {
        return Err(MathError::InvalidInput(
            "Cannot compute a quantile of values containing NaN".to_string(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = T::from(position - lower as f64).unwrap_or_else(T::zero);

    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
