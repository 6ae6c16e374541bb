//! Error types for numerical operations.

/// Errors that can occur during regression arithmetic.
#[derive(Debug, thiserror::Error)]
pub enum MathError {
    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Empty data.
    #[error("empty data provided")]
    EmptyData,

    /// Fewer observations than regressors.
    #[error("insufficient observations: {observations} rows for {regressors} regressors")]
    InsufficientObservations {
        /// Number of rows.
        observations: usize,
        /// Number of regressors including the intercept.
        regressors: usize,
    },

    /// The cross-product matrix cannot be inverted.
    #[error("singular design matrix: column {column} is collinear with the others")]
    Singular {
        /// Column at which elimination broke down.
        column: usize,
    },

    /// Numerical instability (NaN or Inf).
    #[error("numerical instability: {0}")]
    NonFinite(String),
}

impl MathError {
    /// Returns whether the error stems from the data rather than the call.
    #[must_use]
    pub const fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::Singular { .. } | Self::InsufficientObservations { .. } | Self::NonFinite(_)
        )
    }
}
