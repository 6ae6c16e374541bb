//! Sanity bound on decimal-unit panels.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{PanelError, value_columns};

/// Configuration for the decimal-unit check.
///
/// Monthly returns in decimals stay well inside `[-1, 1]`; values above the
/// bound usually mean a percent table was not converted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitCheck {
    /// Largest admissible absolute value.
    pub max_abs_value: f64,
    /// Fail instead of warning when the bound is exceeded.
    pub strict: bool,
}

impl Default for UnitCheck {
    fn default() -> Self {
        Self { max_abs_value: 1.0, strict: false }
    }
}

/// A column whose values exceed the bound.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitViolation {
    /// Column name.
    pub column: String,
    /// Number of values above the bound.
    pub count: usize,
    /// Largest absolute value in the column.
    pub max_abs: f64,
}

/// Outcome of a unit check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitReport {
    /// Offending columns, in frame order.
    pub violations: Vec<UnitViolation>,
}

impl UnitReport {
    /// Returns true if no column exceeded the bound.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

impl UnitCheck {
    /// Create a check with the given bound.
    #[must_use]
    pub const fn new(max_abs_value: f64, strict: bool) -> Self {
        Self { max_abs_value, strict }
    }

    /// Check every `Float64` value column of a panel against the bound.
    ///
    /// Nulls and non-numeric columns are ignored. In non-strict mode each
    /// violation is logged at `warn` and reported.
    ///
    /// # Errors
    /// In strict mode returns [`PanelError::UnitBound`] for the first
    /// offending column.
    pub fn check(&self, df: &DataFrame) -> Result<UnitReport, PanelError> {
        let mut report = UnitReport::default();

        for name in value_columns(df) {
            let column = df.column(&name)?;
            if column.dtype() != &DataType::Float64 {
                continue;
            }

            let mut count = 0usize;
            let mut max_abs = 0.0_f64;
            for v in column.f64()?.into_iter().flatten() {
                let abs = v.abs();
                max_abs = max_abs.max(abs);
                if abs > self.max_abs_value {
                    count += 1;
                }
            }
            if count == 0 {
                continue;
            }

            if self.strict {
                return Err(PanelError::UnitBound {
                    column: name,
                    value: max_abs,
                    bound: self.max_abs_value,
                });
            }
            tracing::warn!(
                column = %name,
                count,
                max_abs,
                bound = self.max_abs_value,
                "values exceed decimal-unit bound"
            );
            report.violations.push(UnitViolation { column: name, count, max_abs });
        }

        Ok(report)
    }
}
