//! Design-matrix construction from an estimation panel.

use famafrench_panel::{PanelError, require_columns, value_columns};
use famafrench_primitives::{Factor, FactorModel, RISK_FREE_COLUMN};
use ndarray::{Array1, Array2};
use polars::prelude::*;

use crate::ModelError;

/// Factor matrix and risk-free series shared by every portfolio regression.
#[derive(Debug, Clone)]
pub struct Design {
    model: FactorModel,
    factors: Array2<f64>,
    risk_free: Array1<f64>,
}

impl Design {
    /// Model the design was built for.
    #[must_use]
    pub const fn model(&self) -> FactorModel {
        self.model
    }

    /// Factor returns without the constant column (n_months x n_factors),
    /// columns in model order.
    #[must_use]
    pub const fn factors(&self) -> &Array2<f64> {
        &self.factors
    }

    /// Risk-free rate per month.
    #[must_use]
    pub const fn risk_free(&self) -> &Array1<f64> {
        &self.risk_free
    }

    /// Number of months.
    #[must_use]
    pub fn n_obs(&self) -> usize {
        self.risk_free.len()
    }

    /// Excess return of a raw portfolio return series.
    #[must_use]
    pub fn excess(&self, returns: &Array1<f64>) -> Array1<f64> {
        returns - &self.risk_free
    }
}

/// Validating builder for [`Design`].
///
/// All factor columns of the model and `RF` must be present and numeric
/// before any regression runs.
#[derive(Debug, Clone, Copy)]
pub struct DesignMatrixBuilder {
    model: FactorModel,
}

impl DesignMatrixBuilder {
    /// Builder for the given model.
    #[must_use]
    pub const fn new(model: FactorModel) -> Self {
        Self { model }
    }

    /// Columns the panel must carry besides `date` and the responses.
    #[must_use]
    pub fn required_columns(&self) -> Vec<&'static str> {
        self.model.factors().iter().map(Factor::column).chain([RISK_FREE_COLUMN]).collect()
    }

    /// Check that the panel carries every required column.
    ///
    /// # Errors
    /// Returns [`ModelError::MissingColumn`] for the first absent column.
    pub fn validate(&self, panel: &DataFrame) -> Result<(), ModelError> {
        require_columns(panel, &self.required_columns()).map_err(|e| match e {
            PanelError::MissingColumn(name) => ModelError::MissingColumn(name),
            other => other.into(),
        })
    }

    /// Build the design from a merged estimation panel.
    ///
    /// # Errors
    /// Returns an error if a required column is missing or not numeric.
    pub fn build(&self, panel: &DataFrame) -> Result<Design, ModelError> {
        self.validate(panel)?;

        let factors = self.model.factors();
        let mut matrix = Array2::zeros((panel.height(), factors.len()));
        for (j, factor) in factors.iter().enumerate() {
            matrix.column_mut(j).assign(&column_array(panel, factor.column())?);
        }

        Ok(Design {
            model: self.model,
            factors: matrix,
            risk_free: column_array(panel, RISK_FREE_COLUMN)?,
        })
    }

    /// Response columns of a panel: every value column that is neither a
    /// factor of any model nor `RF`.
    #[must_use]
    pub fn response_columns(panel: &DataFrame) -> Vec<String> {
        value_columns(panel).into_iter().filter(|c| !is_reserved(c)).collect()
    }
}

/// Whether a column name belongs to the factor set rather than a portfolio.
pub(crate) fn is_reserved(name: &str) -> bool {
    name == RISK_FREE_COLUMN || Factor::ALL.iter().any(|f| f.column() == name)
}

/// Extract a numeric column; nulls become NaN so the solver rejects them.
pub(crate) fn column_array(panel: &DataFrame, name: &str) -> Result<Array1<f64>, ModelError> {
    let column = panel.column(name).map_err(|_| ModelError::MissingColumn(name.to_string()))?;
    let values = column.strict_cast(&DataType::Float64).map_err(|e| ModelError::InvalidColumn {
        column: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(values.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}
