//! Error types for panel construction.

use famafrench_primitives::Date;

/// Errors that can occur while loading or merging panels.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV tokenizer error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// No data table header was found in a source file.
    #[error("no table header found (expected a line starting with ',' followed by column names)")]
    NoTable,

    /// A date cell is not `YYYYMM` or `YYYYMMDD`.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// A panel lacks a required column.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// Two panels to be merged share a non-key column name.
    #[error("column `{0}` exists in both panels")]
    ColumnCollision(String),

    /// The date key has the wrong dtype.
    #[error("date key must have dtype Date, found {0}")]
    DateKey(String),

    /// A date is not the first day of a month.
    #[error("panel is not monthly: found {0}")]
    NotMonthly(Date),

    /// A date occurs more than once.
    #[error("duplicate date in panel: {0}")]
    DuplicateDate(Date),

    /// The inner join left no rows.
    #[error("no overlapping months between panels ({left} and {right} rows)")]
    NoOverlap {
        /// Rows in the left panel.
        left: usize,
        /// Rows in the right panel.
        right: usize,
    },

    /// A table has no rows.
    #[error("empty table: {0}")]
    EmptyTable(String),

    /// A value exceeds the decimal-unit sanity bound.
    #[error("column `{column}` has |value| {value} above {bound}; percent data not converted?")]
    UnitBound {
        /// Offending column.
        column: String,
        /// Largest absolute value in the column.
        value: f64,
        /// Configured bound.
        bound: f64,
    },
}

impl PanelError {
    /// Returns whether this error means the inputs simply do not cover a
    /// common period, as opposed to a malformed input.
    #[must_use]
    pub const fn is_data_availability(&self) -> bool {
        matches!(self, Self::NoOverlap { .. } | Self::EmptyTable(_))
    }
}
