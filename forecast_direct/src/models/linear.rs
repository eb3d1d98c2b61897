//! Linear regressors fitted by weighted least squares

use crate::error::{ForecastError, Result};
use crate::models::Regressor;
use forecast_math::{weighted_least_squares, LeastSquaresFit};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Hyperparameters of [`LinearRegression`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegressionParams {
    /// Fit an unpenalised intercept
    pub fit_intercept: bool,
}

impl Default for LinearRegressionParams {
    fn default() -> Self {
        Self {
            fit_intercept: true,
        }
    }
}

/// Ordinary least squares regression
#[derive(Debug, Clone)]
pub struct LinearRegression {
    params: LinearRegressionParams,
    fit: Option<LeastSquaresFit>,
}

impl LinearRegression {
    /// Create a new linear regression with an intercept
    pub fn new() -> Self {
        Self::with_params(LinearRegressionParams::default())
    }

    /// Create a new linear regression with explicit hyperparameters
    pub fn with_params(params: LinearRegressionParams) -> Self {
        Self { params, fit: None }
    }

    /// Fitted intercept, if any
    pub fn intercept(&self) -> Option<f64> {
        self.fit.as_ref().map(|fit| fit.intercept)
    }
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

fn predict_with(fit: Option<&LeastSquaresFit>, name: &str, x: ArrayView2<f64>) -> Result<Array1<f64>> {
    let fit = fit.ok_or_else(|| {
        ForecastError::NotFitted(format!("{} has not been fitted to data", name))
    })?;
    Ok(fit.predict(x)?)
}

impl Regressor for LinearRegression {
    type Params = LinearRegressionParams;

    fn name(&self) -> &str {
        "LinearRegression"
    }

    fn fit(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        sample_weight: Option<ArrayView1<f64>>,
    ) -> Result<()> {
        self.fit = Some(weighted_least_squares(
            x,
            y,
            sample_weight,
            0.0,
            self.params.fit_intercept,
        )?);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        predict_with(self.fit.as_ref(), self.name(), x)
    }

    fn params(&self) -> Self::Params {
        self.params
    }

    fn set_params(&mut self, params: Self::Params) -> Result<()> {
        self.params = params;
        self.fit = None;
        Ok(())
    }

    fn clone_unfitted(&self) -> Self {
        Self::with_params(self.params)
    }

    fn coefficients(&self) -> Option<Vec<f64>> {
        self.fit.as_ref().map(|fit| fit.coefficients.to_vec())
    }
}

/// Hyperparameters of [`Ridge`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RidgeParams {
    /// L2 penalty strength
    pub alpha: f64,
    /// Fit an unpenalised intercept
    pub fit_intercept: bool,
}

impl Default for RidgeParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            fit_intercept: true,
        }
    }
}

/// Least squares with an L2 penalty
#[derive(Debug, Clone)]
pub struct Ridge {
    params: RidgeParams,
    fit: Option<LeastSquaresFit>,
}

impl Ridge {
    /// Create a new ridge regression with penalty `alpha`
    pub fn new(alpha: f64) -> Result<Self> {
        let params = RidgeParams {
            alpha,
            ..Default::default()
        };
        Self::validate(&params)?;
        Ok(Self { params, fit: None })
    }

    fn validate(params: &RidgeParams) -> Result<()> {
        if params.alpha < 0.0 || !params.alpha.is_finite() {
            return Err(ForecastError::InvalidParameter(format!(
                "alpha must be a finite non-negative value, got {}",
                params.alpha
            )));
        }
        Ok(())
    }
}

impl Regressor for Ridge {
    type Params = RidgeParams;

    fn name(&self) -> &str {
        "Ridge"
    }

    fn fit(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        sample_weight: Option<ArrayView1<f64>>,
    ) -> Result<()> {
        self.fit = Some(weighted_least_squares(
            x,
            y,
            sample_weight,
            self.params.alpha,
            self.params.fit_intercept,
        )?);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        predict_with(self.fit.as_ref(), self.name(), x)
    }

    fn params(&self) -> Self::Params {
        self.params
    }

    fn set_params(&mut self, params: Self::Params) -> Result<()> {
        Self::validate(&params)?;
        self.params = params;
        self.fit = None;
        Ok(())
    }

    fn clone_unfitted(&self) -> Self {
        Self {
            params: self.params,
            fit: None,
        }
    }

    fn coefficients(&self) -> Option<Vec<f64>> {
        self.fit.as_ref().map(|fit| fit.coefficients.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_linear_regression_fit_predict() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![3.0, 5.0, 7.0, 9.0];
        let mut model = LinearRegression::new();

        assert!(model.predict(x.view()).is_err());
        model.fit(x.view(), y.view(), None).unwrap();

        assert_abs_diff_eq!(model.intercept().unwrap(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(model.coefficients().unwrap()[0], 2.0, epsilon = 1e-9);
        let predictions = model.predict(array![[5.0]].view()).unwrap();
        assert_abs_diff_eq!(predictions[0], 11.0, epsilon = 1e-9);
    }

    #[test]
    fn test_set_params_resets_fit() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 2.0, 3.0];
        let mut model = Ridge::new(1.0).unwrap();
        model.fit(x.view(), y.view(), None).unwrap();
        assert!(model.coefficients().is_some());

        model
            .set_params(RidgeParams {
                alpha: 2.0,
                fit_intercept: true,
            })
            .unwrap();
        assert!(model.coefficients().is_none());
        assert_eq!(model.params().alpha, 2.0);
        assert!(model
            .set_params(RidgeParams {
                alpha: -1.0,
                fit_intercept: true
            })
            .is_err());
    }

    #[test]
    fn test_clone_unfitted_keeps_params() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 2.0, 3.0];
        let mut model = Ridge::new(0.5).unwrap();
        model.fit(x.view(), y.view(), None).unwrap();

        let fresh = model.clone_unfitted();
        assert_eq!(fresh.params(), model.params());
        assert!(fresh.coefficients().is_none());
    }
}
