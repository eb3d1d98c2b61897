//! # Forecast Direct
//!
//! Direct multi-step forecasting: any regression estimator becomes a
//! forecaster that trains one independent model per horizon.
//!
//! ## Features
//!
//! - Lag and exogenous predictor tables, one target column per step
//! - Per-step column filtering and an owned model per step
//! - Optional series/exogenous transformers and sample weights
//! - In-sample and out-of-sample residual reservoirs
//! - Bootstrap replicates, percentile intervals and fitted distributions
//!
//! ## Quick Start
//!
//! ```rust
//! use forecast_direct::{BootstrapOptions, ForecasterDirect, Lags, Ridge, StandardScaler};
//! use forecast_direct::utils::synthetic_ar1;
//!
//! let y = synthetic_ar1(200, 0.8, 2.0, 1.0, 42)?;
//!
//! let mut forecaster = ForecasterDirect::new(Ridge::new(0.1)?, 5, Lags::range(3)?)?
//!     .with_transformer_y(StandardScaler::new());
//! forecaster.fit(&y, None)?;
//!
//! let interval = forecaster.predict_interval(
//!     5,
//!     None,
//!     None,
//!     [10.0, 90.0],
//!     &BootstrapOptions::new(100),
//! )?;
//! assert_eq!(interval.len(), 5);
//! # Ok::<(), forecast_direct::ForecastError>(())
//! ```

pub mod bootstrap;
pub mod config;
pub mod data;
pub mod direct;
pub mod distributions;
pub mod error;
pub mod models;
pub mod prediction;
pub mod residuals;
pub mod transformers;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use crate::config::{BootstrapOptions, ForecasterConfig, Lags};
pub use crate::data::{DataLoader, ExogFrame, Frequency, IndexLabel, SeriesIndex, TimeSeries};
pub use crate::direct::registry::FeatureImportance;
pub use crate::direct::table::TrainingTable;
pub use crate::direct::{ForecasterDirect, Steps};
pub use crate::distributions::{DistributionFamily, FittedDistribution};
pub use crate::error::{ForecastError, Result};
pub use crate::models::{
    DecisionTreeParams, DecisionTreeRegressor, LinearRegression, MeanRegressor, Regressor, Ridge,
};
pub use crate::prediction::{
    BootstrapPredictions, DistributionForecast, Prediction, PredictionInterval,
};
pub use crate::residuals::ResidualStore;
pub use crate::transformers::{MinMaxScaler, StandardScaler, Transformer};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
