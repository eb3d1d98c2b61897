//! Direct multi-step forecaster
//!
//! One regressor is trained per horizon on a lag (and optional exogenous)
//! table. Step `s` predicts the observation `s` periods after the last
//! window without ever feeding its own predictions back.

pub mod exog;
pub mod lags;
pub mod registry;
pub mod table;
pub mod weights;

use crate::bootstrap::{bootstrap_replicates, quantile_bounds};
use crate::config::{BootstrapOptions, ForecasterConfig, Lags};
use crate::data::{ExogFrame, IndexLabel, SeriesIndex, TimeSeries};
use crate::distributions::DistributionFamily;
use crate::error::{ForecastError, Result};
use crate::models::Regressor;
use crate::prediction::{
    BootstrapPredictions, DistributionForecast, Prediction, PredictionInterval,
};
use crate::residuals::ResidualStore;
use crate::transformers::Transformer;
use crate::validation::{check_exog, check_interval, check_predict_input, check_y, PredictInput};
use chrono::{DateTime, Local};
use ndarray::{Array1, Array2, Axis};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use self::exog::exog_to_direct;
use self::registry::{FeatureImportance, StepRegistry};
use self::table::{
    transform_exog, AssembledTraining, ColumnLayout, StepTrainingData, TableAssembler,
    TrainingTable,
};
use self::weights::{validate_sample_weight, WeightFn};

/// Steps requested from a prediction method
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Steps {
    /// Every step the forecaster was built for
    #[default]
    All,
    /// Steps `1..=n`
    UpTo(usize),
    /// Explicit steps, predicted in the given order
    List(Vec<usize>),
}

impl Steps {
    /// Concrete step numbers for a forecaster with `max_steps` models
    pub fn resolve(&self, max_steps: usize) -> Vec<usize> {
        match self {
            Steps::All => (1..=max_steps).collect(),
            Steps::UpTo(n) => (1..=*n).collect(),
            Steps::List(steps) => steps.clone(),
        }
    }
}

impl From<usize> for Steps {
    fn from(n: usize) -> Self {
        Steps::UpTo(n)
    }
}

impl From<Vec<usize>> for Steps {
    fn from(steps: Vec<usize>) -> Self {
        Steps::List(steps)
    }
}

impl From<&[usize]> for Steps {
    fn from(steps: &[usize]) -> Self {
        Steps::List(steps.to_vec())
    }
}

/// Everything learned by a successful fit, replaced as a whole
#[derive(Debug, Clone)]
struct FittedState {
    last_window: TimeSeries,
    training_index: SeriesIndex,
    x_train_col_names: Vec<String>,
    exog_columns: Option<Vec<String>>,
    transformer_y: Option<Box<dyn Transformer>>,
    transformer_exog: Option<Vec<Box<dyn Transformer>>>,
    fit_date: DateTime<Local>,
}

/// Point predictions in the transformed scale with their labels
struct RawPrediction {
    steps: Vec<usize>,
    index: Vec<IndexLabel>,
    values: Vec<f64>,
}

/// Turns any [`Regressor`] into a direct multi-step forecaster.
///
/// # Example
///
/// ```
/// use forecast_direct::{ForecasterDirect, Lags, LinearRegression, TimeSeries};
///
/// let y = TimeSeries::new("y", (0..50).map(|i| (i as f64 * 0.3).sin()).collect());
/// let mut forecaster = ForecasterDirect::new(LinearRegression::new(), 3, Lags::range(5)?)?;
/// forecaster.fit(&y, None)?;
///
/// let prediction = forecaster.predict(3, None, None)?;
/// assert_eq!(prediction.len(), 3);
/// # Ok::<(), forecast_direct::ForecastError>(())
/// ```
#[derive(Clone)]
pub struct ForecasterDirect<R: Regressor> {
    regressor: R,
    config: ForecasterConfig,
    transformer_y: Option<Box<dyn Transformer>>,
    transformer_exog: Option<Box<dyn Transformer>>,
    weight_func: Option<WeightFn>,
    registry: StepRegistry<R>,
    in_sample_residuals: ResidualStore,
    out_sample_residuals: Option<ResidualStore>,
    fitted: Option<FittedState>,
    creation_date: DateTime<Local>,
}

impl<R: Regressor> ForecasterDirect<R> {
    /// Forecaster with `steps` models and the given lags
    pub fn new(regressor: R, steps: usize, lags: Lags) -> Result<Self> {
        Self::from_config(regressor, ForecasterConfig::new(steps, lags)?)
    }

    /// Forecaster from a (deserialized) configuration
    pub fn from_config(regressor: R, config: ForecasterConfig) -> Result<Self> {
        config.validate()?;
        let registry = StepRegistry::new(&regressor, config.steps);
        let in_sample_residuals = ResidualStore::new(config.residual_cap);
        Ok(Self {
            regressor,
            config,
            transformer_y: None,
            transformer_exog: None,
            weight_func: None,
            registry,
            in_sample_residuals,
            out_sample_residuals: None,
            fitted: None,
            creation_date: Local::now(),
        })
    }

    /// Transformer applied to the series before building the lags
    pub fn with_transformer_y<T: Transformer + 'static>(mut self, transformer: T) -> Self {
        self.transformer_y = Some(Box::new(transformer));
        self
    }

    /// Transformer fitted independently on each exogenous column
    pub fn with_transformer_exog<T: Transformer + 'static>(mut self, transformer: T) -> Self {
        self.transformer_exog = Some(Box::new(transformer));
        self
    }

    /// Function mapping training row labels to sample weights.
    ///
    /// Ignored, with a warning, when the regressor cannot use sample weights.
    pub fn with_weight_func<F>(mut self, weight_func: F) -> Self
    where
        F: Fn(&[IndexLabel]) -> Vec<f64> + Send + Sync + 'static,
    {
        if self.regressor.supports_sample_weight() {
            self.weight_func = Some(Arc::new(weight_func));
        } else {
            warn!(
                regressor = self.regressor.name(),
                "Argument `weight_func` is ignored since regressor does not accept \
                 `sample_weight`."
            );
        }
        self
    }

    pub fn config(&self) -> &ForecasterConfig {
        &self.config
    }

    /// Number of step models
    pub fn steps(&self) -> usize {
        self.config.steps
    }

    pub fn lags(&self) -> &Lags {
        &self.config.lags
    }

    /// Observations needed to create the predictors
    pub fn window_size(&self) -> usize {
        self.config.window_size()
    }

    /// Regressor template every step model is cloned from
    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    /// Fitted model of `step`
    pub fn step_model(&self, step: usize) -> Result<&R> {
        self.registry.get(step)
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Trailing observations of the training series
    pub fn last_window(&self) -> Option<&TimeSeries> {
        self.fitted.as_ref().map(|f| &f.last_window)
    }

    /// First and last label of the training series
    pub fn training_range(&self) -> Option<(IndexLabel, IndexLabel)> {
        let index = &self.fitted.as_ref()?.training_index;
        index.first().zip(index.last())
    }

    /// Names of the exogenous variables seen during training
    pub fn exog_columns(&self) -> Option<&[String]> {
        self.fitted.as_ref()?.exog_columns.as_deref()
    }

    /// Column names of the full training predictor matrix
    pub fn x_train_col_names(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|f| f.x_train_col_names.as_slice())
    }

    pub fn in_sample_residuals(&self) -> &ResidualStore {
        &self.in_sample_residuals
    }

    pub fn out_sample_residuals(&self) -> Option<&ResidualStore> {
        self.out_sample_residuals.as_ref()
    }

    pub fn creation_date(&self) -> DateTime<Local> {
        self.creation_date
    }

    pub fn fit_date(&self) -> Option<DateTime<Local>> {
        self.fitted.as_ref().map(|f| f.fit_date)
    }

    fn fitted_state(&self) -> Result<&FittedState> {
        self.fitted.as_ref().ok_or_else(|| {
            ForecastError::NotFitted(
                "This Forecaster instance is not fitted yet. Call `fit` with appropriate \
                 arguments before using predict."
                    .to_string(),
            )
        })
    }

    fn assemble(&self, y: &TimeSeries, exog: Option<&ExogFrame>) -> Result<AssembledTraining> {
        check_y(y)?;
        if let Some(exog) = exog {
            check_exog(exog)?;
        }
        TableAssembler {
            lags: &self.config.lags,
            steps: self.config.steps,
            transformer_y: self.transformer_y.as_deref(),
            transformer_exog: self.transformer_exog.as_deref(),
        }
        .assemble(y, exog)
    }

    /// Training table (transformed scale) the step models are fitted on
    pub fn create_train_x_y(&self, y: &TimeSeries, exog: Option<&ExogFrame>) -> Result<TrainingTable> {
        Ok(self.assemble(y, exog)?.table)
    }

    /// Predictors and target of the model of `step`
    pub fn filter_train_x_y_for_step(
        &self,
        table: &TrainingTable,
        step: usize,
    ) -> Result<StepTrainingData> {
        if step < 1 || step > self.config.steps {
            return Err(ForecastError::StepOutOfRange {
                step,
                max: self.config.steps,
            });
        }
        table.filter_for_step(step)
    }

    /// Train one model per step.
    ///
    /// Every input is validated and every model fitted before the
    /// forecaster's state is replaced; a failed fit leaves it untouched.
    pub fn fit(&mut self, y: &TimeSeries, exog: Option<&ExogFrame>) -> Result<()> {
        let AssembledTraining {
            table,
            transformers,
        } = self.assemble(y, exog)?;

        let sample_weight = match &self.weight_func {
            Some(weight_func) => {
                let weights = weight_func(table.index());
                validate_sample_weight(&weights, table.n_rows())?;
                Some(weights)
            }
            None => None,
        };

        let mut registry = StepRegistry::new(&self.regressor, self.config.steps);
        let mut residuals = ResidualStore::new(self.config.residual_cap);
        for step in 1..=self.config.steps {
            let data = table.filter_for_step(step)?;
            registry.fit(step, data.x.view(), data.y.view(), sample_weight.as_deref())?;
            let fitted_values = registry.predict_batch(step, data.x.view())?;
            let step_residuals = data
                .y
                .iter()
                .zip(&fitted_values)
                .map(|(observed, fitted)| observed - fitted)
                .collect();
            residuals.store_sampled(step, step_residuals, self.config.in_sample_seed);
        }

        let state = FittedState {
            last_window: y.tail(self.window_size()),
            training_index: y.index().clone(),
            x_train_col_names: table.x_names().to_vec(),
            exog_columns: exog.map(|e| e.columns().to_vec()),
            transformer_y: transformers.y,
            transformer_exog: transformers.exog,
            fit_date: Local::now(),
        };

        self.registry = registry;
        self.in_sample_residuals = residuals;
        self.fitted = Some(state);
        info!(
            regressor = self.regressor.name(),
            steps = self.config.steps,
            rows = table.n_rows(),
            "forecaster fitted"
        );
        Ok(())
    }

    fn predict_raw(
        &self,
        steps: Steps,
        last_window: Option<&TimeSeries>,
        exog: Option<&ExogFrame>,
    ) -> Result<RawPrediction> {
        let fitted = self.fitted_state()?;
        let steps = steps.resolve(self.config.steps);
        let last_window = last_window.unwrap_or(&fitted.last_window);
        check_predict_input(&PredictInput {
            steps: &steps,
            max_steps: self.config.steps,
            window_size: self.window_size(),
            training_index: &fitted.training_index,
            exog_columns: fitted.exog_columns.as_deref(),
            last_window,
            exog,
        })?;

        let window_size = self.window_size();
        let window = last_window.tail(window_size);
        let window = match &fitted.transformer_y {
            Some(transformer) => transformer.transform(window.values())?,
            None => window.values().to_vec(),
        };
        let mut row: Vec<f64> = self
            .config
            .lags
            .as_slice()
            .iter()
            .map(|&lag| window[window_size - lag])
            .collect();

        let max_step = steps.iter().copied().max().unwrap_or(1);
        let mut n_exog = 0;
        if let Some(exog) = exog {
            let head = exog.head(max_step)?;
            let values = transform_exog(fitted.transformer_exog.as_deref(), head.values())?;
            let expanded = exog_to_direct(values.view(), max_step)?;
            row.extend(expanded.row(0).iter().copied());
            n_exog = exog.n_columns();
        }
        let row = Array1::from(row);
        let layout = ColumnLayout {
            n_lags: self.config.lags.len(),
            n_exog,
            steps: max_step,
        };

        let labels = last_window.index().expand(max_step).labels();
        let mut index = Vec::with_capacity(steps.len());
        let mut values = Vec::with_capacity(steps.len());
        for &step in &steps {
            let columns = layout.step_columns(step)?;
            let x = row.select(Axis(0), &columns);
            values.push(self.registry.predict(step, x.view())?);
            index.push(labels[step - 1]);
        }

        Ok(RawPrediction {
            steps,
            index,
            values,
        })
    }

    fn inverse_transform_y(&self, values: &[f64]) -> Result<Vec<f64>> {
        match self.fitted.as_ref().and_then(|f| f.transformer_y.as_ref()) {
            Some(transformer) => transformer.inverse_transform(values),
            None => Ok(values.to_vec()),
        }
    }

    /// Point predictions for the requested steps.
    ///
    /// `last_window` defaults to the end of the training series. `exog`
    /// must start right after the last window and cover the largest step.
    pub fn predict(
        &self,
        steps: impl Into<Steps>,
        last_window: Option<&TimeSeries>,
        exog: Option<&ExogFrame>,
    ) -> Result<Prediction> {
        let raw = self.predict_raw(steps.into(), last_window, exog)?;
        Ok(Prediction {
            values: self.inverse_transform_y(&raw.values)?,
            index: raw.index,
            steps: raw.steps,
        })
    }

    fn residual_store(&self, in_sample: bool) -> Result<&ResidualStore> {
        if in_sample {
            return Ok(&self.in_sample_residuals);
        }
        self.out_sample_residuals.as_ref().ok_or_else(|| {
            ForecastError::MissingResiduals(
                "`forecaster.out_sample_residuals` is `None`. Use `in_sample_residuals=true` or \
                 method `set_out_sample_residuals()` before `predict_interval()`, \
                 `predict_bootstrapping()` or `predict_dist()`."
                    .to_string(),
            )
        })
    }

    // Point predictions and replicates, both back in the original scale
    fn bootstrap(
        &self,
        steps: Steps,
        last_window: Option<&TimeSeries>,
        exog: Option<&ExogFrame>,
        options: &BootstrapOptions,
    ) -> Result<(RawPrediction, Array2<f64>)> {
        let raw = self.predict_raw(steps, last_window, exog)?;
        let store = self.residual_store(options.in_sample_residuals)?;
        let mut samples =
            bootstrap_replicates(&raw.values, &raw.steps, store, options.n_boot, options.seed)?;

        for mut column in samples.columns_mut() {
            let restored = self.inverse_transform_y(&column.to_vec())?;
            column.assign(&Array1::from(restored));
        }
        let point = RawPrediction {
            values: self.inverse_transform_y(&raw.values)?,
            ..raw
        };
        debug!(
            n_boot = options.n_boot,
            steps = point.steps.len(),
            "bootstrap replicates drawn"
        );
        Ok((point, samples))
    }

    /// `n_boot` bootstrap replicates per step: the point prediction plus a
    /// residual drawn with replacement, in the original scale.
    pub fn predict_bootstrapping(
        &self,
        steps: impl Into<Steps>,
        last_window: Option<&TimeSeries>,
        exog: Option<&ExogFrame>,
        options: &BootstrapOptions,
    ) -> Result<BootstrapPredictions> {
        let (point, samples) = self.bootstrap(steps.into(), last_window, exog, options)?;
        Ok(BootstrapPredictions {
            index: point.index,
            steps: point.steps,
            samples,
        })
    }

    /// Point predictions with bootstrap percentile bounds.
    ///
    /// `interval` holds the lower and upper percentiles, e.g. `[5.0, 95.0]`.
    pub fn predict_interval(
        &self,
        steps: impl Into<Steps>,
        last_window: Option<&TimeSeries>,
        exog: Option<&ExogFrame>,
        interval: [f64; 2],
        options: &BootstrapOptions,
    ) -> Result<PredictionInterval> {
        check_interval(interval)?;
        let (point, samples) = self.bootstrap(steps.into(), last_window, exog, options)?;
        let (lower_bound, upper_bound) = quantile_bounds(samples.view(), interval)?;
        Ok(PredictionInterval {
            index: point.index,
            steps: point.steps,
            pred: point.values,
            lower_bound,
            upper_bound,
        })
    }

    /// Parameters of `family` fitted to each step's bootstrap replicates
    pub fn predict_dist(
        &self,
        steps: impl Into<Steps>,
        family: DistributionFamily,
        last_window: Option<&TimeSeries>,
        exog: Option<&ExogFrame>,
        options: &BootstrapOptions,
    ) -> Result<DistributionForecast> {
        let (point, samples) = self.bootstrap(steps.into(), last_window, exog, options)?;
        let mut params = Vec::with_capacity(samples.nrows());
        for row in samples.rows() {
            params.push(family.fit(&row.to_vec())?.params);
        }
        Ok(DistributionForecast {
            index: point.index,
            steps: point.steps,
            family,
            param_names: family.param_names().iter().map(|n| n.to_string()).collect(),
            params,
        })
    }

    // Back to the unfitted state; out-of-sample residuals are kept
    fn reset(&mut self) {
        self.registry = StepRegistry::new(&self.regressor, self.config.steps);
        self.in_sample_residuals = ResidualStore::new(self.config.residual_cap);
        self.fitted = None;
    }

    /// New regressor hyperparameters. Every step model is re-cloned, so the
    /// forecaster must be fitted again.
    pub fn set_params(&mut self, params: R::Params) -> Result<()> {
        self.regressor.set_params(params)?;
        self.reset();
        Ok(())
    }

    /// New lags. The forecaster must be fitted again.
    pub fn set_lags(&mut self, lags: Lags) -> Result<()> {
        let config = ForecasterConfig {
            lags,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        self.reset();
        Ok(())
    }

    /// Store residuals observed outside the training data, keyed by step.
    ///
    /// Batches larger than the reservoir cap are subsampled with `seed`.
    /// With `append`, new values only fill the remaining capacity. With
    /// `transform`, values go through the fitted series transformer first.
    /// Steps the forecaster does not have are ignored with a warning.
    pub fn set_out_sample_residuals(
        &mut self,
        residuals: BTreeMap<usize, Vec<f64>>,
        append: bool,
        transform: bool,
        seed: u64,
    ) -> Result<()> {
        if residuals
            .values()
            .any(|values| values.iter().any(|v| !v.is_finite()))
        {
            return Err(ForecastError::DataError(
                "`residuals` cannot contain missing or infinite values.".to_string(),
            ));
        }

        let mut residuals = residuals;
        if let Some(transformer_y) = &self.transformer_y {
            if transform {
                let fitted = self
                    .fitted
                    .as_ref()
                    .and_then(|f| f.transformer_y.as_ref())
                    .ok_or_else(|| {
                        ForecastError::NotFitted(format!(
                            "Residuals cannot be transformed with {} before the forecaster is \
                             fitted.",
                            transformer_y.name()
                        ))
                    })?;
                warn!(
                    transformer = fitted.name(),
                    "Residuals will be transformed using the same transformer used when training \
                     the forecaster. Make sure that the residuals are in the same scale as the \
                     training data."
                );
                for values in residuals.values_mut() {
                    *values = fitted.transform(values)?;
                }
            } else {
                warn!(
                    transformer = transformer_y.name(),
                    "Argument `transform` is false but the forecaster was trained using a \
                     transformer. Ensure that the new residuals are already transformed or set \
                     `transform=true`."
                );
            }
        }

        let known: BTreeSet<usize> = (1..=self.config.steps).collect();
        let given: BTreeSet<usize> = residuals.keys().copied().collect();
        if given != known {
            let kept: Vec<usize> = given.intersection(&known).copied().collect();
            warn!(
                kept = ?kept,
                "Only residuals of models (steps) {:?} are stored.",
                kept
            );
            residuals.retain(|step, _| known.contains(step));
        }

        let store = self
            .out_sample_residuals
            .get_or_insert_with(|| ResidualStore::new(self.config.residual_cap));
        for (step, values) in residuals {
            store.update(step, values, append, seed);
        }
        Ok(())
    }

    /// Importances of the model of `step`, named after its predictors.
    ///
    /// Exogenous names are reported without their `_step_{s}` suffix.
    /// `None` when the regressor exposes no importances or coefficients.
    pub fn get_feature_importance(&self, step: usize) -> Result<Option<Vec<FeatureImportance>>> {
        let fitted = self.fitted.as_ref().ok_or_else(|| {
            ForecastError::NotFitted(
                "This forecaster is not fitted yet. Call `fit` with appropriate arguments \
                 before using `get_feature_importance()`."
                    .to_string(),
            )
        })?;
        let layout = ColumnLayout {
            n_lags: self.config.lags.len(),
            n_exog: fitted.exog_columns.as_ref().map_or(0, Vec::len),
            steps: self.config.steps,
        };
        let suffix = format!("_step_{}", step);
        let names: Vec<String> = layout
            .step_columns(step)?
            .into_iter()
            .map(|j| {
                let name = &fitted.x_train_col_names[j];
                match (j >= layout.n_lags, name.strip_suffix(&suffix)) {
                    (true, Some(stripped)) => stripped.to_string(),
                    _ => name.clone(),
                }
            })
            .collect();
        self.registry.feature_importance(step, &names)
    }
}

fn describe_transformer(transformer: Option<&dyn Transformer>) -> String {
    transformer.map_or_else(|| "None".to_string(), |t| t.name().to_string())
}

impl<R: Regressor> fmt::Debug for ForecasterDirect<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecasterDirect")
            .field("regressor", &self.regressor)
            .field("config", &self.config)
            .field("transformer_y", &self.transformer_y)
            .field("transformer_exog", &self.transformer_exog)
            .field("weight_func", &self.weight_func.is_some())
            .field("fitted", &self.fitted.is_some())
            .finish()
    }
}

impl<R: Regressor> fmt::Display for ForecasterDirect<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ForecasterDirect")?;
        writeln!(f, "================")?;
        writeln!(f, "Regressor: {}", self.regressor.name())?;
        writeln!(f, "Lags: {}", self.config.lags)?;
        writeln!(
            f,
            "Transformer for y: {}",
            describe_transformer(self.transformer_y.as_deref())
        )?;
        writeln!(
            f,
            "Transformer for exog: {}",
            describe_transformer(self.transformer_exog.as_deref())
        )?;
        writeln!(f, "Weight function included: {}", self.weight_func.is_some())?;
        writeln!(f, "Window size: {}", self.window_size())?;
        writeln!(f, "Maximum steps predicted: {}", self.config.steps)?;

        match &self.fitted {
            Some(fitted) => {
                writeln!(f, "Exogenous included: {}", fitted.exog_columns.is_some())?;
                if let Some(columns) = &fitted.exog_columns {
                    writeln!(f, "Exogenous variables: {}", columns.join(", "))?;
                }
                if let Some((first, last)) = self.training_range() {
                    writeln!(f, "Training range: [{}, {}]", first, last)?;
                }
                writeln!(f, "Training index type: {}", fitted.training_index.kind())?;
                writeln!(
                    f,
                    "Training index frequency: {}",
                    fitted.training_index.frequency()
                )?;
            }
            None => writeln!(f, "Exogenous included: false")?,
        }

        writeln!(f, "Regressor parameters: {:?}", self.regressor.params())?;
        writeln!(
            f,
            "Creation date: {}",
            self.creation_date.format("%Y-%m-%d %H:%M:%S")
        )?;
        match self.fit_date() {
            Some(date) => writeln!(f, "Last fit date: {}", date.format("%Y-%m-%d %H:%M:%S"))?,
            None => writeln!(f, "Last fit date: None")?,
        }
        write!(f, "Version: {}", crate::VERSION)
    }
}
