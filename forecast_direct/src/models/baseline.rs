//! Baseline regressor predicting the (weighted) mean of the training target

use crate::error::{ForecastError, Result};
use crate::models::Regressor;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Regressor that ignores its features and predicts the training mean.
///
/// It exposes neither importances nor coefficients.
#[derive(Debug, Clone, Default)]
pub struct MeanRegressor {
    mean: Option<f64>,
}

impl MeanRegressor {
    pub fn new() -> Self {
        Self { mean: None }
    }
}

impl Regressor for MeanRegressor {
    type Params = ();

    fn name(&self) -> &str {
        "MeanRegressor"
    }

    fn fit(
        &mut self,
        _x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        sample_weight: Option<ArrayView1<f64>>,
    ) -> Result<()> {
        let values = y.to_vec();
        let mean = match sample_weight {
            Some(w) => forecast_math::weighted_mean(&values, &w.to_vec())?,
            None => forecast_math::mean(&values)?,
        };
        self.mean = Some(mean);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let mean = self.mean.ok_or_else(|| {
            ForecastError::NotFitted("MeanRegressor has not been fitted to data".to_string())
        })?;
        Ok(Array1::from_elem(x.nrows(), mean))
    }

    fn params(&self) -> Self::Params {}

    fn set_params(&mut self, _params: Self::Params) -> Result<()> {
        self.mean = None;
        Ok(())
    }

    fn clone_unfitted(&self) -> Self {
        Self::new()
    }
}
