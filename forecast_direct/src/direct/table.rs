//! Training table assembly and per-step column filtering

use crate::config::Lags;
use crate::data::{ExogFrame, IndexLabel, TimeSeries};
use crate::direct::exog::{exog_direct_names, exog_to_direct};
use crate::direct::lags::create_lags;
use crate::error::{ForecastError, Result};
use crate::transformers::Transformer;
use ndarray::{concatenate, Array1, Array2, ArrayView2, Axis};
use polars::prelude::{DataFrame, NamedFrom, Series};

/// Column layout of a training (or prediction) table: lag columns first,
/// then `steps` columns per exogenous variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub n_lags: usize,
    pub n_exog: usize,
    pub steps: usize,
}

impl ColumnLayout {
    /// Total number of columns
    pub fn n_columns(&self) -> usize {
        self.n_lags + self.n_exog * self.steps
    }

    /// Positions of the columns used by the model of `step` (1-based).
    ///
    /// All lag columns, plus the exogenous columns whose position inside the
    /// exogenous block is congruent to `step - 1` modulo `steps`.
    pub fn step_columns(&self, step: usize) -> Result<Vec<usize>> {
        if step < 1 || step > self.steps {
            return Err(ForecastError::StepOutOfRange {
                step,
                max: self.steps,
            });
        }
        let lags = 0..self.n_lags;
        let exog = (0..self.n_exog * self.steps)
            .filter(|position| position % self.steps == step - 1)
            .map(|position| self.n_lags + position);
        Ok(lags.chain(exog).collect())
    }
}

/// Predictors and target of a single step
#[derive(Debug, Clone, PartialEq)]
pub struct StepTrainingData {
    pub index: Vec<IndexLabel>,
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub feature_names: Vec<String>,
}

/// Lag and exogenous predictors with one target column per step
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingTable {
    index: Vec<IndexLabel>,
    x: Array2<f64>,
    y: Array2<f64>,
    x_names: Vec<String>,
    y_names: Vec<String>,
    layout: ColumnLayout,
}

impl TrainingTable {
    /// Build the table from already transformed values.
    ///
    /// `exog`, when present, is the transformed exogenous matrix with its
    /// column names; it must have as many rows as `y`.
    pub fn build(
        y: &TimeSeries,
        lags: &Lags,
        steps: usize,
        exog: Option<(ArrayView2<f64>, &[String])>,
    ) -> Result<Self> {
        let (x_lags, targets) = create_lags(y.values(), lags, steps)?;
        let n_rows = x_lags.nrows();
        let mut x_names = lags.column_names();

        let (x, n_exog) = match exog {
            None => (x_lags, 0),
            Some((values, columns)) => {
                if values.nrows() != y.len() {
                    return Err(ForecastError::ValidationError(format!(
                        "`exog` must have same number of samples as `y`. length `exog`: ({}), length `y`: ({})",
                        values.nrows(),
                        y.len()
                    )));
                }
                let expanded = exog_to_direct(values, steps)?;
                // Expanded row `max_lag + i` holds the covariates of the targets of lag row `i`
                let aligned = expanded.slice(ndarray::s![expanded.nrows() - n_rows.., ..]);
                x_names.extend(exog_direct_names(columns, steps));
                let x = concatenate(Axis(1), &[x_lags.view(), aligned])
                    .map_err(|e| ForecastError::ValidationError(e.to_string()))?;
                (x, columns.len())
            }
        };

        let first_row = lags.max_lag() + steps - 1;
        let index = y.index().labels()[first_row..].to_vec();

        Ok(Self {
            index,
            x,
            y: targets,
            x_names,
            y_names: (1..=steps).map(|step| format!("y_step_{}", step)).collect(),
            layout: ColumnLayout {
                n_lags: lags.len(),
                n_exog,
                steps,
            },
        })
    }

    /// Row labels
    pub fn index(&self) -> &[IndexLabel] {
        &self.index
    }

    /// Predictor matrix
    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    /// Target matrix, one column per step
    pub fn y(&self) -> ArrayView2<'_, f64> {
        self.y.view()
    }

    pub fn x_names(&self) -> &[String] {
        &self.x_names
    }

    pub fn y_names(&self) -> &[String] {
        &self.y_names
    }

    pub fn layout(&self) -> ColumnLayout {
        self.layout
    }

    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    /// Columns and target needed to train the model of `step` (1-based)
    pub fn filter_for_step(&self, step: usize) -> Result<StepTrainingData> {
        let columns = self.layout.step_columns(step)?;
        Ok(StepTrainingData {
            index: self.index.clone(),
            x: self.x.select(Axis(1), &columns),
            y: self.y.column(step - 1).to_owned(),
            feature_names: columns.iter().map(|&j| self.x_names[j].clone()).collect(),
        })
    }

    /// Predictors and targets side by side as a polars DataFrame
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![Series::new(
            "index",
            self.index.iter().map(|l| l.to_string()).collect::<Vec<String>>(),
        )];
        for (j, name) in self.x_names.iter().enumerate() {
            columns.push(Series::new(name.as_str(), self.x.column(j).to_vec()));
        }
        for (j, name) in self.y_names.iter().enumerate() {
            columns.push(Series::new(name.as_str(), self.y.column(j).to_vec()));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Transformers fitted while assembling a training table
#[derive(Debug, Clone)]
pub struct FittedTransformers {
    pub y: Option<Box<dyn Transformer>>,
    pub exog: Option<Vec<Box<dyn Transformer>>>,
}

/// Training table together with the transformers fitted to build it
#[derive(Debug, Clone)]
pub struct AssembledTraining {
    pub table: TrainingTable,
    pub transformers: FittedTransformers,
}

/// Apply the series/exogenous transformers and build the training table
#[derive(Debug, Clone, Copy)]
pub struct TableAssembler<'a> {
    pub lags: &'a Lags,
    pub steps: usize,
    pub transformer_y: Option<&'a dyn Transformer>,
    pub transformer_exog: Option<&'a dyn Transformer>,
}

impl<'a> TableAssembler<'a> {
    /// Fit the transformers on `y`/`exog`, check alignment, build the table
    pub fn assemble(&self, y: &TimeSeries, exog: Option<&ExogFrame>) -> Result<AssembledTraining> {
        let min_len = self.lags.max_lag() + self.steps;
        if y.len() < min_len {
            return Err(ForecastError::ValidationError(format!(
                "Minimum length of `y` for training this forecaster is {}. Got {}.",
                min_len,
                y.len()
            )));
        }

        if let Some(exog) = exog {
            if exog.len() != y.len() {
                return Err(ForecastError::ValidationError(format!(
                    "`exog` must have same number of samples as `y`. length `exog`: ({}), length `y`: ({})",
                    exog.len(),
                    y.len()
                )));
            }
            if !exog.index().same_layout(y.index()) || exog.index().first() != y.index().first() {
                return Err(ForecastError::ValidationError(
                    "Different index for `y` and `exog`. They must be equal to ensure the \
                     correct alignment of values."
                        .to_string(),
                ));
            }
        }

        let (y_transformed, fitted_y) = match self.transformer_y {
            Some(transformer) => {
                let mut fitted = transformer.box_clone();
                let values = fitted.fit_transform(y.values())?;
                (y.with_values(values)?, Some(fitted))
            }
            None => (y.clone(), None),
        };

        let (exog_values, fitted_exog) = match exog {
            Some(exog) => {
                let (values, fitted) = fit_transform_exog(self.transformer_exog, exog.values())?;
                (Some(values), fitted)
            }
            None => (None, None),
        };

        let table = TrainingTable::build(
            &y_transformed,
            self.lags,
            self.steps,
            exog_values
                .as_ref()
                .zip(exog)
                .map(|(values, frame)| (values.view(), frame.columns())),
        )?;

        Ok(AssembledTraining {
            table,
            transformers: FittedTransformers {
                y: fitted_y,
                exog: fitted_exog,
            },
        })
    }
}

/// Fit one clone of `transformer` per column and transform the columns
fn fit_transform_exog(
    transformer: Option<&dyn Transformer>,
    values: ArrayView2<f64>,
) -> Result<(Array2<f64>, Option<Vec<Box<dyn Transformer>>>)> {
    let transformer = match transformer {
        Some(transformer) => transformer,
        None => return Ok((values.to_owned(), None)),
    };

    let mut transformed = values.to_owned();
    let mut fitted = Vec::with_capacity(values.ncols());
    for j in 0..values.ncols() {
        let mut column_transformer = transformer.box_clone();
        let column = column_transformer.fit_transform(&values.column(j).to_vec())?;
        transformed.column_mut(j).assign(&Array1::from(column));
        fitted.push(column_transformer);
    }
    Ok((transformed, Some(fitted)))
}

/// Transform exogenous columns with transformers fitted during training
pub fn transform_exog(
    transformers: Option<&[Box<dyn Transformer>]>,
    values: ArrayView2<f64>,
) -> Result<Array2<f64>> {
    let transformers = match transformers {
        Some(transformers) => transformers,
        None => return Ok(values.to_owned()),
    };
    if transformers.len() != values.ncols() {
        return Err(ForecastError::ValidationError(format!(
            "Expected {} exogenous columns, got {}",
            transformers.len(),
            values.ncols()
        )));
    }

    let mut transformed = values.to_owned();
    for (j, transformer) in transformers.iter().enumerate() {
        let column = transformer.transform(&values.column(j).to_vec())?;
        transformed.column_mut(j).assign(&Array1::from(column));
    }
    Ok(transformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_columns_without_exog() {
        let layout = ColumnLayout {
            n_lags: 3,
            n_exog: 0,
            steps: 2,
        };
        assert_eq!(layout.step_columns(2).unwrap(), vec![0, 1, 2]);
        assert!(matches!(
            layout.step_columns(3),
            Err(ForecastError::StepOutOfRange { step: 3, max: 2 })
        ));
        assert!(layout.step_columns(0).is_err());
    }

    #[test]
    fn test_step_columns_with_exog() {
        let layout = ColumnLayout {
            n_lags: 2,
            n_exog: 2,
            steps: 3,
        };
        assert_eq!(layout.n_columns(), 8);
        assert_eq!(layout.step_columns(1).unwrap(), vec![0, 1, 2, 5]);
        assert_eq!(layout.step_columns(3).unwrap(), vec![0, 1, 4, 7]);
    }
}
