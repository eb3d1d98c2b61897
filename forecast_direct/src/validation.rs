//! Input checks run before any computation

use crate::data::{ExogFrame, SeriesIndex, TimeSeries};
use crate::error::{ForecastError, Result};

/// `y` must be non-empty and free of missing or infinite values
pub fn check_y(y: &TimeSeries) -> Result<()> {
    if y.is_empty() {
        return Err(ForecastError::ValidationError("`y` is empty.".to_string()));
    }
    if y.values().iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::DataError(format!(
            "`{}` has missing values.",
            y.name()
        )));
    }
    Ok(())
}

/// `exog` must be free of missing or infinite values
pub fn check_exog(exog: &ExogFrame) -> Result<()> {
    if exog.is_empty() {
        return Err(ForecastError::ValidationError("`exog` is empty.".to_string()));
    }
    for (j, name) in exog.columns().iter().enumerate() {
        if exog.column(j).iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "`exog` column '{}' has missing values.",
                name
            )));
        }
    }
    Ok(())
}

/// Percentiles in `[0, 100]` with `lower < upper`
pub fn check_interval(interval: [f64; 2]) -> Result<()> {
    let [lower, upper] = interval;
    if !(0.0..=100.0).contains(&lower) {
        return Err(ForecastError::InvalidParameter(format!(
            "Lower interval bound ({}) must be >= 0 and < 100.",
            lower
        )));
    }
    if !(0.0..=100.0).contains(&upper) {
        return Err(ForecastError::InvalidParameter(format!(
            "Upper interval bound ({}) must be > 0 and <= 100.",
            upper
        )));
    }
    if lower >= upper {
        return Err(ForecastError::InvalidParameter(format!(
            "Lower interval bound ({}) must be less than the upper interval bound ({}).",
            lower, upper
        )));
    }
    Ok(())
}

/// Everything a prediction call is checked against
#[derive(Debug, Clone, Copy)]
pub struct PredictInput<'a> {
    /// Requested steps (1-based)
    pub steps: &'a [usize],
    /// Number of step models
    pub max_steps: usize,
    /// Observations needed to build the predictors
    pub window_size: usize,
    /// Index of the training series
    pub training_index: &'a SeriesIndex,
    /// Exogenous columns seen during training, if any
    pub exog_columns: Option<&'a [String]>,
    pub last_window: &'a TimeSeries,
    pub exog: Option<&'a ExogFrame>,
}

/// Check steps, last window and exogenous inputs of a prediction call
pub fn check_predict_input(input: &PredictInput<'_>) -> Result<()> {
    if input.steps.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "At least one step must be requested.".to_string(),
        ));
    }
    if let Some(&step) = input
        .steps
        .iter()
        .find(|&&step| step < 1 || step > input.max_steps)
    {
        return Err(ForecastError::StepOutOfRange {
            step,
            max: input.max_steps,
        });
    }

    let last_window = input.last_window;
    if last_window.len() < input.window_size {
        return Err(ForecastError::ValidationError(format!(
            "`last_window` must have as many values as needed to generate the predictors. \
             For this forecaster it is {}. Got {}.",
            input.window_size,
            last_window.len()
        )));
    }
    if last_window.values().iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::DataError(
            "`last_window` has missing values.".to_string(),
        ));
    }
    if !last_window.index().same_layout(input.training_index) {
        return Err(ForecastError::ValidationError(format!(
            "Expected index of type {} with frequency {} for `last_window`. Got {} with frequency {}.",
            input.training_index.kind(),
            input.training_index.frequency(),
            last_window.index().kind(),
            last_window.index().frequency()
        )));
    }

    match (input.exog_columns, input.exog) {
        (None, None) => Ok(()),
        (Some(_), None) => Err(ForecastError::ValidationError(
            "Forecaster trained with exogenous variable/s. Same variable/s must be provided \
             when predicting."
                .to_string(),
        )),
        (None, Some(_)) => Err(ForecastError::ValidationError(
            "Forecaster trained without exogenous variable/s. `exog` must be `None` when \
             predicting."
                .to_string(),
        )),
        (Some(columns), Some(exog)) => check_predict_exog(input, columns, exog),
    }
}

fn check_predict_exog(input: &PredictInput<'_>, columns: &[String], exog: &ExogFrame) -> Result<()> {
    check_exog(exog)?;
    if exog.columns() != columns {
        return Err(ForecastError::ValidationError(format!(
            "Missing or unordered columns in `exog`. Expected {:?}. Got {:?}.",
            columns,
            exog.columns()
        )));
    }
    let needed = input.steps.iter().copied().max().unwrap_or(0);
    if exog.len() < needed {
        return Err(ForecastError::ValidationError(format!(
            "`exog` must have at least as many values as the maximum step requested, {}. Got {}.",
            needed,
            exog.len()
        )));
    }
    if !exog.index().same_layout(input.training_index) {
        return Err(ForecastError::ValidationError(format!(
            "Expected index of type {} with frequency {} for `exog`. Got {} with frequency {}.",
            input.training_index.kind(),
            input.training_index.frequency(),
            exog.index().kind(),
            exog.index().frequency()
        )));
    }
    let expected_start = input.last_window.index().expand(1).first();
    if exog.index().first() != expected_start {
        return Err(ForecastError::ValidationError(format!(
            "To make predictions `exog` must start one step ahead of `last_window`. \
             Expected {}. Got {}.",
            label_or_none(expected_start),
            label_or_none(exog.index().first())
        )));
    }
    Ok(())
}

fn label_or_none(label: Option<crate::data::IndexLabel>) -> String {
    label.map_or_else(|| "None".to_string(), |l| l.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case([5.0, 95.0], true)]
    #[case([0.0, 100.0], true)]
    #[case([-1.0, 90.0], false)]
    #[case([10.0, 101.0], false)]
    #[case([90.0, 10.0], false)]
    #[case([50.0, 50.0], false)]
    fn test_check_interval(#[case] interval: [f64; 2], #[case] valid: bool) {
        assert_eq!(check_interval(interval).is_ok(), valid);
    }

    #[test]
    fn test_check_y_missing_values() {
        assert!(check_y(&TimeSeries::new("y", vec![1.0, f64::NAN])).is_err());
        assert!(check_y(&TimeSeries::new("y", vec![])).is_err());
        assert!(check_y(&TimeSeries::new("y", vec![1.0])).is_ok());
    }

    fn input<'a>(
        steps: &'a [usize],
        training_index: &'a SeriesIndex,
        columns: Option<&'a [String]>,
        last_window: &'a TimeSeries,
        exog: Option<&'a ExogFrame>,
    ) -> PredictInput<'a> {
        PredictInput {
            steps,
            max_steps: 3,
            window_size: 2,
            training_index,
            exog_columns: columns,
            last_window,
            exog,
        }
    }

    #[test]
    fn test_predict_steps_and_window() {
        let index = SeriesIndex::range(10);
        let window = TimeSeries::with_index("y", SeriesIndex::range(10).tail(2), vec![1.0, 2.0])
            .unwrap();
        assert!(check_predict_input(&input(&[1, 3], &index, None, &window, None)).is_ok());
        assert!(matches!(
            check_predict_input(&input(&[4], &index, None, &window, None)),
            Err(ForecastError::StepOutOfRange { step: 4, max: 3 })
        ));

        let short = window.tail(1);
        assert!(check_predict_input(&input(&[1], &index, None, &short, None)).is_err());
    }

    #[test]
    fn test_predict_exog_alignment() {
        let index = SeriesIndex::range(10);
        let columns = vec!["temp".to_string()];
        let window = TimeSeries::with_index("y", index.tail(2), vec![1.0, 2.0]).unwrap();

        let aligned = ExogFrame::from_columns(index.expand(3), vec![("temp", vec![1.0; 3])]).unwrap();
        assert!(
            check_predict_input(&input(&[1, 2, 3], &index, Some(&columns), &window, Some(&aligned)))
                .is_ok()
        );

        let late = ExogFrame::from_columns(
            SeriesIndex::range_with_step(11, 1, 3).unwrap(),
            vec![("temp", vec![1.0; 3])],
        )
        .unwrap();
        assert!(
            check_predict_input(&input(&[1], &index, Some(&columns), &window, Some(&late)))
                .is_err()
        );

        let short = aligned.head(1).unwrap();
        assert!(
            check_predict_input(&input(&[2], &index, Some(&columns), &window, Some(&short)))
                .is_err()
        );
        assert!(check_predict_input(&input(&[1], &index, Some(&columns), &window, None)).is_err());
        assert!(check_predict_input(&input(&[1], &index, None, &window, Some(&aligned))).is_err());
    }
}
