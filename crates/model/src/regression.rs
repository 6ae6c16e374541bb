//! Single-portfolio OLS regression with Newey-West inference.

use famafrench_math::{NeweyWest, ordinary_least_squares, standard_errors};
use famafrench_primitives::{Coefficient, FactorModel, PortfolioId, RegressionResult};
use famafrench_traits::{EstimatorError, SeriesEstimate, TimeSeriesEstimator};
use ndarray::{Array1, Array2, s};
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Configuration for the regression engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Newey-West truncation lag. Clamped to `n - 1` per regression.
    pub max_lags: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_lags: 3 }
    }
}

/// OLS time-series regression engine with HAC standard errors.
///
/// The engine is a pure function of its configuration and inputs and can be
/// shared across threads.
#[derive(Debug, Clone, Default)]
pub struct RegressionEngine {
    config: EngineConfig,
    hac: NeweyWest,
}

impl RegressionEngine {
    /// Create a new engine with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Regress one portfolio's excess returns on the factors of a model.
    ///
    /// # Arguments
    /// * `portfolio` - Identifier carried into the result
    /// * `excess` - Portfolio excess returns (n_months,)
    /// * `factors` - Factor returns in model order (n_months x n_factors)
    /// * `model` - Model whose factors label the betas
    ///
    /// # Errors
    /// Returns `ModelError` if the factor matrix does not match the model or
    /// the fit fails.
    pub fn regress(
        &self,
        portfolio: PortfolioId,
        excess: &Array1<f64>,
        factors: &Array2<f64>,
        model: FactorModel,
    ) -> Result<RegressionResult, ModelError> {
        let labels = model.factors();
        if factors.ncols() != labels.len() {
            return Err(EstimatorError::DimensionMismatch {
                expected: labels.len(),
                actual: factors.ncols(),
                context: format!("{model} factor columns"),
            }
            .into());
        }

        let estimate = self.estimate_single(excess, factors)?;
        let coefficient = |j: usize| Coefficient::new(estimate.coefficients[j], estimate.std_errors[j]);

        let result = RegressionResult {
            portfolio,
            n: estimate.n_obs,
            alpha: coefficient(0),
            betas: labels.iter().enumerate().map(|(j, f)| (*f, coefficient(j + 1))).collect(),
            r2: estimate.r_squared,
        };

        tracing::debug!(
            portfolio = %result.portfolio,
            model = %model,
            n = result.n,
            alpha = result.alpha.estimate,
            alpha_t = result.alpha.t_stat,
            r2 = result.r2,
            "fitted portfolio"
        );
        Ok(result)
    }
}

impl TimeSeriesEstimator for RegressionEngine {
    type Config = EngineConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config, hac: NeweyWest::new(config.max_lags) }
    }

    fn estimate_single(
        &self,
        response: &Array1<f64>,
        factors: &Array2<f64>,
    ) -> Result<SeriesEstimate, EstimatorError> {
        let n = response.len();
        if factors.nrows() != n {
            return Err(EstimatorError::DimensionMismatch {
                expected: n,
                actual: factors.nrows(),
                context: "factor rows".to_string(),
            });
        }

        let design = with_intercept(factors);
        let fit = ordinary_least_squares(response, &design)?;
        let cov = self.hac.covariance(&design, &fit.residuals, &fit.xtx_inv)?;

        Ok(SeriesEstimate {
            n_obs: n,
            std_errors: standard_errors(&cov),
            coefficients: fit.coefficients,
            r_squared: fit.r_squared,
        })
    }
}

/// Prepend a column of ones.
fn with_intercept(factors: &Array2<f64>) -> Array2<f64> {
    let mut design = Array2::ones((factors.nrows(), factors.ncols() + 1));
    design.slice_mut(s![.., 1..]).assign(factors);
    design
}
