//! One independently owned regressor per forecast step

use crate::direct::weights::validate_sample_weight;
use crate::error::{ForecastError, Result};
use crate::models::Regressor;
use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Importance of one predictor of a step model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Estimators indexed by step. Sized once, never resized.
#[derive(Debug, Clone)]
pub struct StepRegistry<R: Regressor> {
    models: Vec<R>,
}

impl<R: Regressor> StepRegistry<R> {
    /// `steps` unfitted clones of `template`
    pub fn new(template: &R, steps: usize) -> Self {
        Self {
            models: (0..steps).map(|_| template.clone_unfitted()).collect(),
        }
    }

    /// Number of steps
    pub fn steps(&self) -> usize {
        self.models.len()
    }

    fn position(&self, step: usize) -> Result<usize> {
        if step < 1 || step > self.models.len() {
            return Err(ForecastError::StepOutOfRange {
                step,
                max: self.models.len(),
            });
        }
        Ok(step - 1)
    }

    /// Estimator of `step` (1-based)
    pub fn get(&self, step: usize) -> Result<&R> {
        let position = self.position(step)?;
        Ok(&self.models[position])
    }

    /// Fit the estimator of `step`. Weights are checked before the
    /// estimator is touched.
    pub fn fit(
        &mut self,
        step: usize,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        sample_weight: Option<&[f64]>,
    ) -> Result<()> {
        let position = self.position(step)?;
        if let Some(weights) = sample_weight {
            validate_sample_weight(weights, x.nrows())?;
        }
        debug!(step, rows = x.nrows(), columns = x.ncols(), "fitting step model");
        self.models[position].fit(x, y, sample_weight.map(ArrayView1::from))
    }

    /// Prediction of `step` for a single row of predictors
    pub fn predict(&self, step: usize, row: ArrayView1<f64>) -> Result<f64> {
        let predictions = self.predict_batch(step, row.insert_axis(Axis(0)))?;
        predictions.first().copied().ok_or_else(|| {
            ForecastError::ModelError(format!("Model of step {} returned no prediction", step))
        })
    }

    /// Predictions of `step` for every row of `x`
    pub fn predict_batch(&self, step: usize, x: ArrayView2<f64>) -> Result<Vec<f64>> {
        let model = self.get(step)?;
        let predictions = model.predict(x)?;
        if predictions.len() != x.nrows() {
            return Err(ForecastError::ModelError(format!(
                "{} returned {} predictions for {} rows",
                model.name(),
                predictions.len(),
                x.nrows()
            )));
        }
        Ok(predictions.to_vec())
    }

    /// Importances of the model of `step`, paired with `feature_names`.
    ///
    /// Impurity importances are preferred over linear coefficients. `None`
    /// (with a warning) when the estimator exposes neither.
    pub fn feature_importance(
        &self,
        step: usize,
        feature_names: &[String],
    ) -> Result<Option<Vec<FeatureImportance>>> {
        let model = self.get(step)?;
        let values = match model.feature_importances().or_else(|| model.coefficients()) {
            Some(values) => values,
            None => {
                warn!(
                    regressor = model.name(),
                    "Impossible to access feature importances for regressor. This method is only \
                     valid when the regressor stores internally the feature importances or the \
                     coefficients."
                );
                return Ok(None);
            }
        };
        if values.len() != feature_names.len() {
            return Err(ForecastError::ModelError(format!(
                "{} reports {} importances for {} features",
                model.name(),
                values.len(),
                feature_names.len()
            )));
        }

        Ok(Some(
            feature_names
                .iter()
                .zip(values)
                .map(|(feature, importance)| FeatureImportance {
                    feature: feature.clone(),
                    importance,
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinearRegression, MeanRegressor};
    use ndarray::array;

    #[test]
    fn test_models_are_independent() {
        let mut registry = StepRegistry::new(&MeanRegressor::new(), 2);
        let x = array![[0.0], [1.0]];
        registry.fit(1, x.view(), array![1.0, 3.0].view(), None).unwrap();
        registry.fit(2, x.view(), array![10.0, 30.0].view(), None).unwrap();

        assert_eq!(registry.predict(1, array![5.0].view()).unwrap(), 2.0);
        assert_eq!(registry.predict(2, array![5.0].view()).unwrap(), 20.0);
        assert!(registry.predict(3, array![5.0].view()).is_err());
    }

    #[test]
    fn test_bad_weights_leave_model_unfitted() {
        let mut registry = StepRegistry::new(&MeanRegressor::new(), 1);
        let x = array![[0.0], [1.0]];
        let result = registry.fit(1, x.view(), array![1.0, 3.0].view(), Some(&[0.0, 0.0]));
        assert!(result.is_err());
        assert!(registry.predict(1, array![0.0].view()).is_err());
    }

    #[test]
    fn test_feature_importance_fallbacks() {
        let names = vec!["lag_1".to_string()];
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![1.0, 3.0, 5.0];

        let mut linear = StepRegistry::new(&LinearRegression::new(), 1);
        linear.fit(1, x.view(), y.view(), None).unwrap();
        let importance = linear.feature_importance(1, &names).unwrap().unwrap();
        assert_eq!(importance[0].feature, "lag_1");
        assert!((importance[0].importance - 2.0).abs() < 1e-9);

        let mut mean = StepRegistry::new(&MeanRegressor::new(), 1);
        mean.fit(1, x.view(), y.view(), None).unwrap();
        assert!(mean.feature_importance(1, &names).unwrap().is_none());
    }
}
