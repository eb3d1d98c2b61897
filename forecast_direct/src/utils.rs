//! Utility functions for the forecast_direct crate

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::fmt;

/// Split a series chronologically into training and test parts.
///
/// The test part holds the last `round(len * test_ratio)` observations.
pub fn train_test_split(series: &TimeSeries, test_ratio: f64) -> Result<(TimeSeries, TimeSeries)> {
    if test_ratio.is_nan() || test_ratio <= 0.0 || test_ratio >= 1.0 {
        return Err(ForecastError::InvalidParameter(format!(
            "`test_ratio` must be between 0 and 1 (exclusive). Got {}.",
            test_ratio
        )));
    }
    let test_size = (series.len() as f64 * test_ratio).round() as usize;
    let train_size = series.len() - test_size;
    Ok((
        series.slice(0, train_size)?,
        series.slice(train_size, series.len())?,
    ))
}

/// Calculate accuracy metrics for a forecast vs actual values
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::ValidationError(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = forecast.len() as f64;
    let errors: Vec<f64> = forecast
        .iter()
        .zip(actual.iter())
        .map(|(&f, &a)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;

    Ok(ForecastAccuracy {
        mae,
        mse,
        rmse: mse.sqrt(),
    })
}

/// Forecast accuracy metrics
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
}

impl fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)
    }
}

/// Seeded AR(1) series `y[t] = intercept + phi * y[t-1] + e[t]`,
/// `e ~ N(0, sigma)`, started at the process mean.
pub fn synthetic_ar1(n: usize, phi: f64, intercept: f64, sigma: f64, seed: u64) -> Result<TimeSeries> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(ForecastError::InvalidParameter(format!(
            "Noise standard deviation must be finite and non-negative. Got {}.",
            sigma
        )));
    }
    let noise = Normal::new(0.0, sigma).map_err(|e| {
        ForecastError::InvalidParameter(format!("Invalid noise standard deviation: {}", e))
    })?;
    let mut rng = StdRng::seed_from_u64(seed);
    let start = if (phi - 1.0).abs() > f64::EPSILON {
        intercept / (1.0 - phi)
    } else {
        intercept
    };

    let mut values = Vec::with_capacity(n);
    let mut previous = start;
    for _ in 0..n {
        let value = intercept + phi * previous + noise.sample(&mut rng);
        values.push(value);
        previous = value;
    }
    Ok(TimeSeries::new("y", values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_train_test_split() {
        let series = TimeSeries::new("y", (0..10).map(f64::from).collect());
        let (train, test) = train_test_split(&series, 0.2).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.values(), &[8.0, 9.0]);
        assert!(train_test_split(&series, 1.0).is_err());
    }

    #[test]
    fn test_forecast_accuracy() {
        let accuracy = forecast_accuracy(&[1.0, 2.0], &[2.0, 4.0]).unwrap();
        assert_abs_diff_eq!(accuracy.mae, 1.5);
        assert_abs_diff_eq!(accuracy.mse, 2.5);
        assert!(forecast_accuracy(&[], &[]).is_err());
    }

    #[test]
    fn test_synthetic_ar1_is_seeded() {
        let a = synthetic_ar1(100, 0.7, 1.0, 0.5, 3).unwrap();
        let b = synthetic_ar1(100, 0.7, 1.0, 0.5, 3).unwrap();
        assert_eq!(a, b);
        assert!((a.mean().unwrap() - 1.0 / 0.3).abs() < 1.0);
        assert!(synthetic_ar1(10, 0.5, 0.0, -1.0, 3).is_err());
    }

    #[test]
    fn test_synthetic_ar1_rejects_invalid_sigma() {
        for sigma in [-0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                synthetic_ar1(10, 0.5, 0.0, sigma, 3),
                Err(ForecastError::InvalidParameter(_))
            ));
        }
        let flat = synthetic_ar1(5, 0.5, 1.0, 0.0, 3).unwrap();
        assert!(flat.values().iter().all(|v| (v - 2.0).abs() < 1e-12));
    }
}
