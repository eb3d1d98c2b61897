//! Error types for the forecast_direct crate

use forecast_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the forecast_direct crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Invalid construction or configuration parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input with the wrong shape, length or alignment
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Input with unusable content (missing values, unparsable fields)
    #[error("Data error: {0}")]
    DataError(String),

    /// Step outside the horizons handled by the forecaster
    #[error("Invalid value `step`. For this forecaster, minimum value is 1 and the maximum step is {max}. Got {step}.")]
    StepOutOfRange { step: usize, max: usize },

    /// Forecaster (or transformer) used before fitting
    #[error("Not fitted: {0}")]
    NotFitted(String),

    /// Out-of-sample residuals requested but never set
    #[error("Missing residuals: {0}")]
    MissingResiduals(String),

    /// Failure reported by a regressor or transformer
    #[error("Model error: {0}")]
    ModelError(String),

    /// Error from numeric routines
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error from JSON (de)serialization
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}
