//! # Forecast Math
//!
//! Numeric building blocks shared by the direct forecaster.
//! This crate provides descriptive statistics, empirical quantiles and
//! a weighted least squares solver used by the bundled linear regressors.

use thiserror::Error;

pub mod linalg;
pub mod stats;

pub use linalg::{weighted_least_squares, LeastSquaresFit};
pub use stats::{mean, median, quantile, std_dev, variance, weighted_mean};

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Singular matrix: {0}")]
    SingularMatrix(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
