//! Error types for factor-model estimation.

use famafrench_math::MathError;
use famafrench_panel::PanelError;
use famafrench_primitives::PortfolioId;
use famafrench_traits::EstimatorError;

/// Errors that can occur during factor model estimation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Estimator error.
    #[error("estimator error: {0}")]
    Estimator(#[from] EstimatorError),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Panel error.
    #[error("panel error: {0}")]
    Panel(#[from] PanelError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Missing required column.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// A column holds a value the model cannot use.
    #[error("invalid column `{column}`: {reason}")]
    InvalidColumn {
        /// Column name.
        column: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The panel has no response columns.
    #[error("no portfolio return columns to regress")]
    NoResponses,

    /// A portfolio id occurs more than once in a run or a result table.
    #[error("duplicate portfolio `{0}`")]
    DuplicatePortfolio(PortfolioId),

    /// Two result tables share no portfolio.
    #[error("result tables have no portfolio in common")]
    NoCommonPortfolios,

    /// Regression of one portfolio failed; the run is aborted.
    #[error("regression for portfolio `{portfolio}` failed: {source}")]
    Portfolio {
        /// Portfolio whose regression failed.
        portfolio: PortfolioId,
        /// Underlying failure.
        source: Box<ModelError>,
    },
}

impl ModelError {
    /// Returns whether this error means the inputs share no usable data, as
    /// opposed to a schema or numerical problem.
    #[must_use]
    pub fn is_data_availability(&self) -> bool {
        match self {
            Self::NoCommonPortfolios | Self::NoResponses => true,
            Self::Panel(e) => e.is_data_availability(),
            Self::Portfolio { source, .. } => source.is_data_availability(),
            _ => false,
        }
    }

    /// Returns whether this error is a numerical failure of a regression.
    #[must_use]
    pub fn is_numerical(&self) -> bool {
        match self {
            Self::Math(_) => true,
            Self::Estimator(e) => e.is_numerical(),
            Self::Portfolio { source, .. } => source.is_numerical(),
            _ => false,
        }
    }

    pub(crate) fn for_portfolio(portfolio: &PortfolioId, source: Self) -> Self {
        Self::Portfolio { portfolio: portfolio.clone(), source: Box::new(source) }
    }
}

impl From<ModelError> for EstimatorError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Estimator(e) => e,
            ModelError::Math(e) => Self::Math(e),
            ModelError::Polars(e) => Self::Polars(e),
            ModelError::MissingColumn(c) | ModelError::Panel(PanelError::MissingColumn(c)) => {
                Self::MissingColumn(c)
            }
            ModelError::Portfolio { portfolio, source } => Self::Portfolio {
                portfolio: portfolio.to_string(),
                source: Box::new((*source).into()),
            },
            other => Self::InvalidConfig(other.to_string()),
        }
    }
}
