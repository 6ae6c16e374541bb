//! Regression and comparison records.

use serde::{Deserialize, Serialize};

use crate::{Factor, PortfolioId};

/// A point estimate with its HAC standard error and t-statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Point estimate.
    pub estimate: f64,
    /// Standard error.
    pub std_error: f64,
    /// `estimate / std_error`.
    pub t_stat: f64,
}

impl Coefficient {
    /// Build a coefficient from its estimate and standard error.
    ///
    /// The t-statistic follows IEEE division, so a zero standard error on a
    /// noise-free fit yields an infinite statistic rather than an error.
    #[must_use]
    pub fn new(estimate: f64, std_error: f64) -> Self {
        Self { estimate, std_error, t_stat: estimate / std_error }
    }

    /// Rebuild a coefficient from a persisted estimate and t-statistic.
    ///
    /// The standard error is recovered as `estimate / t_stat`.
    #[must_use]
    pub fn from_t_stat(estimate: f64, t_stat: f64) -> Self {
        Self { estimate, std_error: estimate / t_stat, t_stat }
    }
}

/// Outcome of one time-series regression of a portfolio's excess return on
/// the factors of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Portfolio the response series belongs to.
    pub portfolio: PortfolioId,
    /// Number of monthly observations used.
    pub n: usize,
    /// Intercept.
    pub alpha: Coefficient,
    /// Factor loadings in design-matrix order.
    pub betas: Vec<(Factor, Coefficient)>,
    /// Coefficient of determination.
    pub r2: f64,
}

impl RegressionResult {
    /// Loading on a given factor, if the factor was part of the model.
    #[must_use]
    pub fn beta(&self, factor: Factor) -> Option<&Coefficient> {
        self.betas.iter().find(|(f, _)| *f == factor).map(|(_, c)| c)
    }

    /// Factors in the order they were estimated.
    pub fn factors(&self) -> impl Iterator<Item = Factor> + '_ {
        self.betas.iter().map(|(f, _)| *f)
    }
}

/// Alpha and R² of one portfolio under two models, with their differences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    /// Portfolio both results refer to.
    pub portfolio: PortfolioId,
    /// Alpha under the baseline model.
    pub alpha_a: f64,
    /// Alpha under the alternative model.
    pub alpha_b: f64,
    /// `alpha_b - alpha_a`.
    pub delta_alpha: f64,
    /// R² under the baseline model.
    pub r2_a: f64,
    /// R² under the alternative model.
    pub r2_b: f64,
    /// `r2_b - r2_a`.
    pub delta_r2: f64,
}
