//! Sample weights for the per-step fits

use crate::data::IndexLabel;
use crate::error::{ForecastError, Result};
use std::sync::Arc;

/// Maps the row labels of the training table to one weight per row
pub type WeightFn = Arc<dyn Fn(&[IndexLabel]) -> Vec<f64> + Send + Sync>;

/// Weights must be finite, non-negative, have one value per row and a
/// strictly positive sum.
pub fn validate_sample_weight(weights: &[f64], n_rows: usize) -> Result<()> {
    if weights.len() != n_rows {
        return Err(ForecastError::ValidationError(format!(
            "The resulting `sample_weight` has {} values but the training table has {} rows.",
            weights.len(),
            n_rows
        )));
    }
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(ForecastError::ValidationError(
            "The resulting `sample_weight` cannot have NaN or infinite values.".to_string(),
        ));
    }
    if weights.iter().any(|&w| w < 0.0) {
        return Err(ForecastError::ValidationError(
            "The resulting `sample_weight` cannot have negative values.".to_string(),
        ));
    }
    if weights.iter().sum::<f64>() <= 0.0 {
        return Err(ForecastError::ValidationError(
            "The resulting `sample_weight` cannot be normalized because the sum of the weights \
             is zero."
                .to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec![1.0, f64::NAN])]
    #[case(vec![1.0, -0.5])]
    #[case(vec![0.0, 0.0])]
    #[case(vec![1.0])]
    fn test_rejected_weights(#[case] weights: Vec<f64>) {
        assert!(validate_sample_weight(&weights, 2).is_err());
    }

    #[test]
    fn test_accepted_weights() {
        assert!(validate_sample_weight(&[0.0, 2.0], 2).is_ok());
    }
}
