//! Invertible transformations applied to the series and exogenous columns

use crate::error::{ForecastError, Result};
use std::fmt::Debug;

/// Invertible transformation of a one dimensional sequence of values.
///
/// Every transformer must be able to map predictions back to the original
/// scale, so `inverse_transform` is part of the contract.
pub trait Transformer: Debug + Send + Sync {
    /// Name of the transformer
    fn name(&self) -> &str;

    /// Learn the transformation parameters
    fn fit(&mut self, values: &[f64]) -> Result<()>;

    /// Apply a fitted transformation
    fn transform(&self, values: &[f64]) -> Result<Vec<f64>>;

    /// Undo a fitted transformation
    fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>>;

    /// Fit, then transform the same values
    fn fit_transform(&mut self, values: &[f64]) -> Result<Vec<f64>> {
        self.fit(values)?;
        self.transform(values)
    }

    /// Boxed copy (fitted state included)
    fn box_clone(&self) -> Box<dyn Transformer>;
}

impl Clone for Box<dyn Transformer> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

fn not_fitted(name: &str) -> ForecastError {
    ForecastError::NotFitted(format!(
        "{} is not fitted yet. Call `fit` before transforming data.",
        name
    ))
}

/// Standardize values by removing the mean and scaling to unit variance
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    with_mean: bool,
    with_std: bool,
    mean: Option<f64>,
    scale: Option<f64>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::with_options(true, true)
    }

    /// Choose whether to center and/or scale
    pub fn with_options(with_mean: bool, with_std: bool) -> Self {
        Self {
            with_mean,
            with_std,
            mean: None,
            scale: None,
        }
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for StandardScaler {
    fn name(&self) -> &str {
        "StandardScaler"
    }

    fn fit(&mut self, values: &[f64]) -> Result<()> {
        let mean = forecast_math::mean(values)?;
        let std = forecast_math::std_dev(values, 0)?;
        self.mean = Some(if self.with_mean { mean } else { 0.0 });
        // Constant input keeps its scale
        self.scale = Some(if self.with_std && std > 0.0 { std } else { 1.0 });
        Ok(())
    }

    fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        match (self.mean, self.scale) {
            (Some(mean), Some(scale)) => Ok(values.iter().map(|v| (v - mean) / scale).collect()),
            _ => Err(not_fitted(self.name())),
        }
    }

    fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        match (self.mean, self.scale) {
            (Some(mean), Some(scale)) => Ok(values.iter().map(|v| v * scale + mean).collect()),
            _ => Err(not_fitted(self.name())),
        }
    }

    fn box_clone(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

/// Scale values to a given range, `[0, 1]` by default
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    feature_range: (f64, f64),
    min: Option<f64>,
    span: Option<f64>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self {
            feature_range: (0.0, 1.0),
            min: None,
            span: None,
        }
    }

    /// Scale to `[low, high]`
    pub fn with_range(low: f64, high: f64) -> Result<Self> {
        if low.is_nan() || high.is_nan() || low >= high {
            return Err(ForecastError::InvalidParameter(format!(
                "Minimum of desired feature range must be smaller than maximum. Got ({}, {}).",
                low, high
            )));
        }
        Ok(Self {
            feature_range: (low, high),
            min: None,
            span: None,
        })
    }
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for MinMaxScaler {
    fn name(&self) -> &str {
        "MinMaxScaler"
    }

    fn fit(&mut self, values: &[f64]) -> Result<()> {
        if values.is_empty() {
            return Err(ForecastError::DataError(
                "Cannot fit MinMaxScaler on an empty sequence".to_string(),
            ));
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        self.min = Some(min);
        self.span = Some(if max > min { max - min } else { 1.0 });
        Ok(())
    }

    fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        let (low, high) = self.feature_range;
        match (self.min, self.span) {
            (Some(min), Some(span)) => Ok(values
                .iter()
                .map(|v| (v - min) / span * (high - low) + low)
                .collect()),
            _ => Err(not_fitted(self.name())),
        }
    }

    fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        let (low, high) = self.feature_range;
        match (self.min, self.span) {
            (Some(min), Some(span)) => Ok(values
                .iter()
                .map(|v| (v - low) / (high - low) * span + min)
                .collect()),
            _ => Err(not_fitted(self.name())),
        }
    }

    fn box_clone(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_standard_scaler_roundtrip() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut scaler = StandardScaler::new();

        assert!(scaler.transform(&values).is_err());
        let transformed = scaler.fit_transform(&values).unwrap();
        assert_abs_diff_eq!(transformed[2], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(transformed[4], 2.0_f64.sqrt(), epsilon = 1e-12);

        let restored = scaler.inverse_transform(&transformed).unwrap();
        for (r, v) in restored.iter().zip(values.iter()) {
            assert_abs_diff_eq!(*r, *v, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_min_max_scaler() {
        let mut scaler = MinMaxScaler::with_range(-1.0, 1.0).unwrap();
        let transformed = scaler.fit_transform(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(transformed, vec![-1.0, 0.0, 1.0]);
        assert_eq!(scaler.inverse_transform(&[0.5]).unwrap(), vec![25.0]);
        assert!(MinMaxScaler::with_range(1.0, 1.0).is_err());
    }

    #[test]
    fn test_boxed_clone_keeps_fit() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&[0.0, 2.0]).unwrap();
        let boxed: Box<dyn Transformer> = Box::new(scaler);
        let copy = boxed.clone();
        assert_eq!(copy.transform(&[2.0]).unwrap(), vec![1.0]);
    }
}
