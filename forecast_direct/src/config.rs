//! Forecaster configuration: lags, horizon count and bootstrap options

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Maximum number of residuals stored per step
pub const DEFAULT_RESIDUAL_CAP: usize = 1000;

/// Seed used to subsample in-sample residuals
pub const DEFAULT_SEED: u64 = 123;

/// Number of bootstrap replicates drawn by default
pub const DEFAULT_N_BOOT: usize = 500;

/// Ordered set of lag offsets used as predictors. Lag 1 is the previous
/// observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LagsRepr", into = "Vec<usize>")]
pub struct Lags(Vec<usize>);

/// Either a lag count (`n` means lags `1..=n`) or an explicit list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LagsRepr {
    Count(usize),
    List(Vec<usize>),
}

impl Lags {
    /// Lags `1..=n`
    pub fn range(n: usize) -> Result<Self> {
        if n < 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "Minimum value of lags allowed is 1. Got {}.",
                n
            )));
        }
        Ok(Self((1..=n).collect()))
    }

    /// Explicit lags, kept in the given order
    pub fn new(lags: Vec<usize>) -> Result<Self> {
        if lags.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Argument `lags` must contain at least one value.".to_string(),
            ));
        }
        if let Some(&min) = lags.iter().min() {
            if min < 1 {
                return Err(ForecastError::InvalidParameter(format!(
                    "Minimum value of lags allowed is 1. Got {}.",
                    min
                )));
            }
        }
        let unique: BTreeSet<usize> = lags.iter().copied().collect();
        if unique.len() != lags.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Argument `lags` must not contain duplicated values. Got {:?}.",
                lags
            )));
        }
        Ok(Self(lags))
    }

    /// Lag offsets in column order
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Number of lag columns
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, a lag set holds at least one lag
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest lag offset
    pub fn max_lag(&self) -> usize {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Column names `lag_{l}`
    pub fn column_names(&self) -> Vec<String> {
        self.0.iter().map(|lag| format!("lag_{}", lag)).collect()
    }
}

impl TryFrom<LagsRepr> for Lags {
    type Error = ForecastError;

    fn try_from(raw: LagsRepr) -> Result<Self> {
        match raw {
            LagsRepr::Count(n) => Lags::range(n),
            LagsRepr::List(lags) => Lags::new(lags),
        }
    }
}

impl From<Lags> for Vec<usize> {
    fn from(lags: Lags) -> Self {
        lags.0
    }
}

impl fmt::Display for Lags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

fn default_residual_cap() -> usize {
    DEFAULT_RESIDUAL_CAP
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Construction parameters of a direct forecaster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecasterConfig {
    /// Number of horizons, one regressor each
    pub steps: usize,
    /// Lags used as predictors
    pub lags: Lags,
    /// Maximum residuals stored per step
    #[serde(default = "default_residual_cap")]
    pub residual_cap: usize,
    /// Seed for in-sample residual subsampling
    #[serde(default = "default_seed")]
    pub in_sample_seed: u64,
}

impl ForecasterConfig {
    /// Create a validated configuration with default residual policy
    pub fn new(steps: usize, lags: Lags) -> Result<Self> {
        let config = Self {
            steps,
            lags,
            residual_cap: DEFAULT_RESIDUAL_CAP,
            in_sample_seed: DEFAULT_SEED,
        };
        config.validate()?;
        Ok(config)
    }

    /// Override the residual reservoir cap
    pub fn with_residual_cap(mut self, residual_cap: usize) -> Result<Self> {
        self.residual_cap = residual_cap;
        self.validate()?;
        Ok(self)
    }

    /// Check every field
    pub fn validate(&self) -> Result<()> {
        if self.steps < 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "`steps` argument must be greater than or equal to 1. Got {}.",
                self.steps
            )));
        }
        if self.lags.is_empty() || self.lags.as_slice().iter().any(|&l| l < 1) {
            return Err(ForecastError::InvalidParameter(
                "Lags must be positive integers.".to_string(),
            ));
        }
        if self.residual_cap < 1 {
            return Err(ForecastError::InvalidParameter(
                "`residual_cap` must be at least 1.".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Size of the window needed to build predictors
    pub fn window_size(&self) -> usize {
        self.lags.max_lag()
    }
}

/// Options shared by the bootstrap based prediction methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapOptions {
    /// Number of bootstrap replicates
    pub n_boot: usize,
    /// Seed of the resampling generator
    pub seed: u64,
    /// Resample in-sample residuals (otherwise the out-of-sample ones)
    pub in_sample_residuals: bool,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            n_boot: DEFAULT_N_BOOT,
            seed: DEFAULT_SEED,
            in_sample_residuals: true,
        }
    }
}

impl BootstrapOptions {
    /// Options with a given number of replicates
    pub fn new(n_boot: usize) -> Self {
        Self {
            n_boot,
            ..Default::default()
        }
    }

    /// Set the resampling seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Resample the out-of-sample residuals instead of the in-sample ones
    pub fn with_out_sample_residuals(mut self) -> Self {
        self.in_sample_residuals = false;
        self
    }
}
