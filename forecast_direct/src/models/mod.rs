//! Regressors consumed by the direct forecaster
//!
//! The forecaster never looks inside a regressor: it only relies on the
//! [`Regressor`] contract below. Any estimator implementing it can be plugged
//! into [`crate::ForecasterDirect`].

use crate::error::Result;
use ndarray::{Array1, ArrayView1, ArrayView2};
use std::fmt::Debug;

/// Capability interface of a regression estimator
pub trait Regressor: Debug + Clone {
    /// Hyperparameters shared by every clone of the regressor
    type Params: Debug + Clone + PartialEq;

    /// Name of the regressor
    fn name(&self) -> &str;

    /// Fit the regressor on `x` (rows = samples) and `y`
    fn fit(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        sample_weight: Option<ArrayView1<f64>>,
    ) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>>;

    /// Current hyperparameters
    fn params(&self) -> Self::Params;

    /// Replace the hyperparameters, discarding any fitted state
    fn set_params(&mut self, params: Self::Params) -> Result<()>;

    /// Unfitted copy with the same hyperparameters
    fn clone_unfitted(&self) -> Self;

    /// Whether `fit` makes use of `sample_weight`
    fn supports_sample_weight(&self) -> bool {
        true
    }

    /// Impurity based importances, one per feature
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }

    /// Linear coefficients, one per feature
    fn coefficients(&self) -> Option<Vec<f64>> {
        None
    }
}

pub mod baseline;
pub mod linear;
pub mod tree;

pub use baseline::MeanRegressor;
pub use linear::{LinearRegression, LinearRegressionParams, Ridge, RidgeParams};
pub use tree::{DecisionTreeParams, DecisionTreeRegressor};
