//! Parametric families fitted to bootstrap replicates

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Exp, Gamma, Laplace, LogNormal, Normal, Uniform};
use statrs::function::gamma::digamma;
use std::fmt;

const GAMMA_NEWTON_ITERATIONS: usize = 20;

/// Supported continuous families.
///
/// Parameter names follow the `shape..., loc, scale` convention. Gamma and
/// LogNormal are fitted with `loc` fixed at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistributionFamily {
    Normal,
    Laplace,
    Uniform,
    Exponential,
    Gamma,
    LogNormal,
}

impl DistributionFamily {
    /// Names of the fitted parameters, in order
    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            DistributionFamily::Normal
            | DistributionFamily::Laplace
            | DistributionFamily::Uniform
            | DistributionFamily::Exponential => &["loc", "scale"],
            DistributionFamily::Gamma => &["a", "loc", "scale"],
            DistributionFamily::LogNormal => &["s", "loc", "scale"],
        }
    }

    /// Maximum likelihood fit over `values`
    pub fn fit(&self, values: &[f64]) -> Result<FittedDistribution> {
        if values.is_empty() {
            return Err(ForecastError::DataError(format!(
                "Cannot fit a {} distribution to an empty sample",
                self
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Cannot fit a {} distribution to non finite values",
                self
            )));
        }

        let params = match self {
            DistributionFamily::Normal => {
                vec![forecast_math::mean(values)?, forecast_math::std_dev(values, 0)?]
            }
            DistributionFamily::Laplace => {
                let loc = forecast_math::median(values)?;
                let deviations: Vec<f64> = values.iter().map(|v| (v - loc).abs()).collect();
                vec![loc, forecast_math::mean(&deviations)?]
            }
            DistributionFamily::Uniform => {
                let (min, max) = min_max(values);
                vec![min, max - min]
            }
            DistributionFamily::Exponential => {
                let (min, _) = min_max(values);
                vec![min, forecast_math::mean(values)? - min]
            }
            DistributionFamily::Gamma => {
                let logs = positive_logs(values, self)?;
                let mean = forecast_math::mean(values)?;
                let shape = gamma_shape(mean.ln() - forecast_math::mean(&logs)?)?;
                vec![shape, 0.0, mean / shape]
            }
            DistributionFamily::LogNormal => {
                let logs = positive_logs(values, self)?;
                vec![
                    forecast_math::std_dev(&logs, 0)?,
                    0.0,
                    forecast_math::mean(&logs)?.exp(),
                ]
            }
        };

        Ok(FittedDistribution {
            family: *self,
            params,
        })
    }
}

impl fmt::Display for DistributionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistributionFamily::Normal => "norm",
            DistributionFamily::Laplace => "laplace",
            DistributionFamily::Uniform => "uniform",
            DistributionFamily::Exponential => "expon",
            DistributionFamily::Gamma => "gamma",
            DistributionFamily::LogNormal => "lognorm",
        };
        write!(f, "{}", name)
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
            (min.min(v), max.max(v))
        })
}

fn positive_logs(values: &[f64], family: &DistributionFamily) -> Result<Vec<f64>> {
    if values.iter().any(|&v| v <= 0.0) {
        return Err(ForecastError::DataError(format!(
            "The {} distribution with loc 0 requires strictly positive values",
            family
        )));
    }
    Ok(values.iter().map(|v| v.ln()).collect())
}

// Minka's closed form start refined with Newton steps on
// ln(a) - digamma(a) = s
fn gamma_shape(s: f64) -> Result<f64> {
    if s <= 0.0 || !s.is_finite() {
        return Err(ForecastError::DataError(
            "Cannot fit a gamma distribution to a constant sample".to_string(),
        ));
    }
    let mut shape = (3.0 - s + ((s - 3.0).powi(2) + 24.0 * s).sqrt()) / (12.0 * s);
    for _ in 0..GAMMA_NEWTON_ITERATIONS {
        let h = 1e-5 * shape;
        let trigamma = (digamma(shape + h) - digamma(shape - h)) / (2.0 * h);
        let step = (shape.ln() - digamma(shape) - s) / (1.0 / shape - trigamma);
        let next = shape - step;
        if next <= 0.0 || !next.is_finite() {
            break;
        }
        let converged = (next - shape).abs() < 1e-10 * shape;
        shape = next;
        if converged {
            break;
        }
    }
    Ok(shape)
}

/// A family with fitted parameters (named by [`DistributionFamily::param_names`])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedDistribution {
    pub family: DistributionFamily,
    pub params: Vec<f64>,
}

fn invalid(err: statrs::StatsError) -> ForecastError {
    ForecastError::ModelError(format!("Invalid distribution parameters: {}", err))
}

impl FittedDistribution {
    /// Log-likelihood of `values` under the fitted distribution
    pub fn log_likelihood(&self, values: &[f64]) -> Result<f64> {
        let p = &self.params;
        if p.len() != self.family.param_names().len() {
            return Err(ForecastError::ValidationError(format!(
                "A {} distribution takes {} parameters, got {}",
                self.family,
                self.family.param_names().len(),
                p.len()
            )));
        }
        let ln_pdf: Box<dyn Fn(f64) -> f64> = match self.family {
            DistributionFamily::Normal => {
                let d = Normal::new(p[0], p[1]).map_err(invalid)?;
                Box::new(move |x| d.ln_pdf(x))
            }
            DistributionFamily::Laplace => {
                let d = Laplace::new(p[0], p[1]).map_err(invalid)?;
                Box::new(move |x| d.ln_pdf(x))
            }
            DistributionFamily::Uniform => {
                let d = Uniform::new(p[0], p[0] + p[1]).map_err(invalid)?;
                Box::new(move |x| d.ln_pdf(x))
            }
            DistributionFamily::Exponential => {
                let (loc, d) = (p[0], Exp::new(1.0 / p[1]).map_err(invalid)?);
                Box::new(move |x| d.ln_pdf(x - loc))
            }
            DistributionFamily::Gamma => {
                let d = Gamma::new(p[0], 1.0 / p[2]).map_err(invalid)?;
                Box::new(move |x| d.ln_pdf(x))
            }
            DistributionFamily::LogNormal => {
                let d = LogNormal::new(p[2].ln(), p[0]).map_err(invalid)?;
                Box::new(move |x| d.ln_pdf(x))
            }
        };
        Ok(values.iter().map(|&x| ln_pdf(x)).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::Distribution;

    #[test]
    fn test_normal_fit() {
        let fitted = DistributionFamily::Normal.fit(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_relative_eq!(fitted.params[0], 3.0);
        assert_relative_eq!(fitted.params[1], 2.0_f64.sqrt());
        assert!(fitted.log_likelihood(&[3.0]).unwrap().is_finite());
    }

    #[test]
    fn test_laplace_and_uniform_fit() {
        let values = [1.0, 2.0, 3.0, 4.0, 10.0];
        let laplace = DistributionFamily::Laplace.fit(&values).unwrap();
        assert_eq!(laplace.params, vec![3.0, 2.2]);

        let uniform = DistributionFamily::Uniform.fit(&values).unwrap();
        assert_eq!(uniform.params, vec![1.0, 9.0]);
    }

    #[test]
    fn test_gamma_fit_recovers_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        let gamma = rand_distr::Gamma::new(4.0, 2.0).unwrap();
        let values: Vec<f64> = (0..5000).map(|_| gamma.sample(&mut rng)).collect();

        let fitted = DistributionFamily::Gamma.fit(&values).unwrap();
        assert_eq!(DistributionFamily::Gamma.param_names(), &["a", "loc", "scale"]);
        assert!((fitted.params[0] - 4.0).abs() < 0.4);
        assert_eq!(fitted.params[1], 0.0);
        assert!((fitted.params[2] - 2.0).abs() < 0.3);
    }

    #[test]
    fn test_positive_families_reject_negative_values() {
        assert!(DistributionFamily::Gamma.fit(&[-1.0, 2.0]).is_err());
        assert!(DistributionFamily::LogNormal.fit(&[0.0, 2.0]).is_err());
        assert!(DistributionFamily::Normal.fit(&[]).is_err());
    }

    #[test]
    fn test_lognormal_fit() {
        let values = [1.0_f64.exp(), 3.0_f64.exp()];
        let fitted = DistributionFamily::LogNormal.fit(&values).unwrap();
        assert_relative_eq!(fitted.params[0], 1.0);
        assert_relative_eq!(fitted.params[2], 2.0_f64.exp(), epsilon = 1e-12);
    }
}
