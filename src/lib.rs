//! # Forecast Direct Workspace
//!
//! Facade over the workspace crates:
//!
//! - [`direct`]: the direct multi-step forecaster (`forecast_direct`)
//! - [`math`]: statistics, quantiles and least squares (`forecast_math`)
//!
//! ## Example
//!
//! ```
//! use forecast_direct_workspace::direct::{ForecasterDirect, Lags, LinearRegression, TimeSeries};
//!
//! let y = TimeSeries::new("y", (0..30).map(|i| 2.0 * i as f64).collect());
//! let mut forecaster = ForecasterDirect::new(LinearRegression::new(), 2, Lags::range(1)?)?;
//! forecaster.fit(&y, None)?;
//!
//! let prediction = forecaster.predict(2, None, None)?;
//! assert!((prediction.values[0] - 60.0).abs() < 1e-6);
//! assert!((prediction.values[1] - 62.0).abs() < 1e-6);
//! # Ok::<(), forecast_direct_workspace::direct::ForecastError>(())
//! ```

pub use forecast_direct as direct;
pub use forecast_math as math;
