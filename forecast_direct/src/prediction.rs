//! Forecast outputs: point predictions, bootstrap replicates, intervals and
//! per-step distribution parameters

use crate::data::IndexLabel;
use crate::distributions::DistributionFamily;
use crate::error::{ForecastError, Result};
use ndarray::Array2;
use polars::prelude::{DataFrame, NamedFrom, Series};
use serde::{Deserialize, Serialize};
use std::fmt;

fn index_series(index: &[IndexLabel]) -> Series {
    Series::new(
        "index",
        index.iter().map(|l| l.to_string()).collect::<Vec<String>>(),
    )
}

/// Point predictions, one per requested step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub index: Vec<IndexLabel>,
    pub steps: Vec<usize>,
    pub values: Vec<f64>,
}

impl Prediction {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Mean absolute error against observed values
    pub fn mean_absolute_error(&self, actual: &[f64]) -> Result<f64> {
        if actual.len() != self.values.len() || actual.is_empty() {
            return Err(ForecastError::ValidationError(
                "Forecast and actual values must have the same non-zero length".to_string(),
            ));
        }
        let total: f64 = self
            .values
            .iter()
            .zip(actual)
            .map(|(p, a)| (a - p).abs())
            .sum();
        Ok(total / actual.len() as f64)
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            index_series(&self.index),
            Series::new("pred", self.values.clone()),
        ])?)
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.index.iter().zip(&self.values) {
            writeln!(f, "{}  {:.4}", label, value)?;
        }
        Ok(())
    }
}

/// Bootstrap replicates in the original scale, one row per step
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapPredictions {
    pub index: Vec<IndexLabel>,
    pub steps: Vec<usize>,
    pub samples: Array2<f64>,
}

impl BootstrapPredictions {
    /// Number of replicates
    pub fn n_boot(&self) -> usize {
        self.samples.ncols()
    }

    /// Columns `pred_boot_{i}`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![index_series(&self.index)];
        for (i, column) in self.samples.columns().into_iter().enumerate() {
            columns.push(Series::new(&format!("pred_boot_{}", i), column.to_vec()));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Point prediction with empirical quantile bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInterval {
    pub index: Vec<IndexLabel>,
    pub steps: Vec<usize>,
    pub pred: Vec<f64>,
    pub lower_bound: Vec<f64>,
    pub upper_bound: Vec<f64>,
}

impl PredictionInterval {
    pub fn len(&self) -> usize {
        self.pred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pred.is_empty()
    }

    /// Share of `actual` values falling inside the bounds
    pub fn coverage(&self, actual: &[f64]) -> Result<f64> {
        if actual.len() != self.pred.len() || actual.is_empty() {
            return Err(ForecastError::ValidationError(
                "Interval and actual values must have the same non-zero length".to_string(),
            ));
        }
        let inside = actual
            .iter()
            .zip(self.lower_bound.iter().zip(&self.upper_bound))
            .filter(|(a, (lo, hi))| *lo <= *a && *a <= *hi)
            .count();
        Ok(inside as f64 / actual.len() as f64)
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            index_series(&self.index),
            Series::new("pred", self.pred.clone()),
            Series::new("lower_bound", self.lower_bound.clone()),
            Series::new("upper_bound", self.upper_bound.clone()),
        ])?)
    }
}

/// Parameters of a distribution fitted to each step's replicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionForecast {
    pub index: Vec<IndexLabel>,
    pub steps: Vec<usize>,
    pub family: DistributionFamily,
    pub param_names: Vec<String>,
    /// One row per step, ordered as `param_names`
    pub params: Vec<Vec<f64>>,
}

impl DistributionForecast {
    /// Values of parameter `name` across steps
    pub fn param(&self, name: &str) -> Option<Vec<f64>> {
        let j = self.param_names.iter().position(|n| n == name)?;
        Some(self.params.iter().map(|row| row[j]).collect())
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![index_series(&self.index)];
        for (j, name) in self.param_names.iter().enumerate() {
            let values: Vec<f64> = self.params.iter().map(|row| row[j]).collect();
            columns.push(Series::new(name.as_str(), values));
        }
        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn labels(n: i64) -> Vec<IndexLabel> {
        (10..10 + n).map(IndexLabel::Position).collect()
    }

    #[test]
    fn test_prediction_json_and_error() {
        let prediction = Prediction {
            index: labels(2),
            steps: vec![1, 2],
            values: vec![1.0, 2.0],
        };
        let json = prediction.to_json().unwrap();
        let back: Prediction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, prediction);
        assert_eq!(prediction.mean_absolute_error(&[2.0, 2.0]).unwrap(), 0.5);
        assert!(prediction.mean_absolute_error(&[1.0]).is_err());
    }

    #[test]
    fn test_bootstrap_dataframe_columns() {
        let boot = BootstrapPredictions {
            index: labels(2),
            steps: vec![1, 2],
            samples: array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
        };
        let df = boot.to_dataframe().unwrap();
        assert_eq!(df.shape(), (2, 4));
        assert_eq!(
            df.get_column_names(),
            vec!["index", "pred_boot_0", "pred_boot_1", "pred_boot_2"]
        );
    }

    #[test]
    fn test_interval_coverage() {
        let interval = PredictionInterval {
            index: labels(2),
            steps: vec![1, 2],
            pred: vec![1.0, 2.0],
            lower_bound: vec![0.0, 1.0],
            upper_bound: vec![2.0, 3.0],
        };
        assert_eq!(interval.coverage(&[1.5, 5.0]).unwrap(), 0.5);
    }
}
