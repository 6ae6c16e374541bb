//! Regression estimator trait definitions.

use famafrench_math::MathError;
use famafrench_primitives::{FactorModel, RegressionResult};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Errors that can occur during estimation.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    /// Dimension mismatch in input data.
    #[error("dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
        /// Context description.
        context: String,
    },

    /// Numerical failure in the solver.
    #[error("numerical error: {0}")]
    Math(#[from] MathError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] PolarsError),

    /// Missing required column.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Estimation of one portfolio failed.
    #[error("regression for portfolio `{portfolio}` failed: {source}")]
    Portfolio {
        /// Portfolio whose regression failed.
        portfolio: String,
        /// Underlying failure.
        source: Box<EstimatorError>,
    },
}

impl EstimatorError {
    /// Returns whether this error is a numerical failure of a regression, as
    /// opposed to a schema or configuration problem.
    #[must_use]
    pub fn is_numerical(&self) -> bool {
        match self {
            Self::Math(_) => true,
            Self::Portfolio { source, .. } => source.is_numerical(),
            _ => false,
        }
    }
}

/// Point estimates and HAC inference from one time-series regression.
///
/// Coefficients are in design-matrix order: intercept first, then factors.
#[derive(Debug, Clone)]
pub struct SeriesEstimate {
    /// Number of observations.
    pub n_obs: usize,
    /// Estimated coefficients.
    pub coefficients: Array1<f64>,
    /// HAC standard errors.
    pub std_errors: Array1<f64>,
    /// Coefficient of determination.
    pub r_squared: f64,
}

/// Trait for a single time-series regression of one response on a set of
/// factors.
pub trait TimeSeriesEstimator: Send + Sync {
    /// Configuration type for this estimator.
    type Config: Default + Clone + Send + Sync;

    /// Create a new estimator with the given configuration.
    fn with_config(config: Self::Config) -> Self;

    /// Regress a response on factor exposures plus an intercept.
    ///
    /// # Arguments
    /// * `response` - Excess returns (n_months,)
    /// * `factors` - Factor returns without the constant (n_months x n_factors)
    ///
    /// # Errors
    /// Returns `EstimatorError` if dimensions mismatch or the fit fails.
    fn estimate_single(
        &self,
        response: &Array1<f64>,
        factors: &Array2<f64>,
    ) -> Result<SeriesEstimate, EstimatorError>;
}

/// Trait for estimating a factor model for every portfolio of a panel.
pub trait PanelEstimator: Send + Sync {
    /// Estimate the model for each response column of an estimation panel.
    ///
    /// # Arguments
    /// * `panel` - Merged panel with | date | responses... | factors... | RF |
    /// * `responses` - Names of the portfolio return columns
    /// * `model` - Factor model whose factors enter the regression
    ///
    /// # Returns
    /// One result per response, sorted by portfolio.
    ///
    /// # Errors
    /// Returns `EstimatorError` if a column is missing or any regression fails.
    fn estimate(
        &self,
        panel: &DataFrame,
        responses: &[String],
        model: FactorModel,
    ) -> Result<Vec<RegressionResult>, EstimatorError>;

    /// Returns the Newey-West truncation lag.
    fn max_lags(&self) -> usize;
}
