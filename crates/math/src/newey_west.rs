//! Newey-West HAC (heteroskedasticity and autocorrelation consistent)
//! covariance of OLS coefficients.
//!
//! With scores `u_t = x_t * e_t` the estimator is the sandwich
//! ```text
//! S      = Σ_t u_t u_t' + Σ_{l=1}^{L} w_l Σ_{t=l}^{n-1} (u_t u_{t-l}' + u_{t-l} u_t')
//! w_l    = 1 - l/(L+1)                        (Bartlett kernel)
//! Cov(b) = (X'X)^-1 S (X'X)^-1 * n/(n-k)
//! ```
//!
//! # References
//! - Newey, W. K., & West, K. D. (1987). "A Simple, Positive Semi-Definite,
//!   Heteroskedasticity and Autocorrelation Consistent Covariance Matrix."
//!   Econometrica, 55(3), 703-708.

use ndarray::{Array1, Array2, s};

use crate::MathError;

/// Newey-West estimator with a fixed truncation lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeweyWest {
    max_lags: usize,
}

impl NeweyWest {
    /// Create an estimator truncating the autocovariances at `max_lags`.
    #[must_use]
    pub const fn new(max_lags: usize) -> Self {
        Self { max_lags }
    }

    /// Configured truncation lag.
    #[must_use]
    pub const fn max_lags(&self) -> usize {
        self.max_lags
    }

    /// Bartlett kernel weight for a lag.
    ///
    /// Formula: `w_l = 1 - l/(L+1)` for `l <= L`, zero beyond.
    #[must_use]
    pub fn weight(&self, lag: usize) -> f64 {
        if lag == 0 {
            1.0
        } else if lag <= self.max_lags {
            1.0 - (lag as f64) / (self.max_lags as f64 + 1.0)
        } else {
            0.0
        }
    }

    /// Compute the meat matrix `S` from the design matrix and OLS residuals.
    ///
    /// The lag is clamped to `n - 1`.
    ///
    /// # Errors
    /// Returns an error if the residuals do not match the rows of `x`.
    pub fn meat(&self, x: &Array2<f64>, residuals: &Array1<f64>) -> Result<Array2<f64>, MathError> {
        let (n, k) = x.dim();
        if residuals.len() != n {
            return Err(MathError::DimensionMismatch { expected: n, actual: residuals.len() });
        }
        if n == 0 {
            return Err(MathError::EmptyData);
        }

        let scores = Array2::from_shape_fn((n, k), |(t, j)| x[[t, j]] * residuals[t]);
        let mut meat = scores.t().dot(&scores);

        let max_lag = self.max_lags.min(n - 1);
        for lag in 1..=max_lag {
            let weight = self.weight(lag);
            // Σ_t u_t u_{t-l}'
            let gamma = scores.slice(s![lag.., ..]).t().dot(&scores.slice(s![..n - lag, ..]));
            meat.scaled_add(weight, &gamma);
            meat.scaled_add(weight, &gamma.t());
        }

        Ok(meat)
    }

    /// Compute the HAC covariance of the coefficients.
    ///
    /// # Arguments
    /// * `x` - Design matrix (n x k)
    /// * `residuals` - OLS residuals (n,)
    /// * `xtx_inv` - `(X'X)^-1` (k x k)
    ///
    /// # Errors
    /// Returns an error on mismatched dimensions or when `n <= k`.
    pub fn covariance(
        &self,
        x: &Array2<f64>,
        residuals: &Array1<f64>,
        xtx_inv: &Array2<f64>,
    ) -> Result<Array2<f64>, MathError> {
        let (n, k) = x.dim();
        check_bread(xtx_inv, k)?;
        if n <= k {
            return Err(MathError::InsufficientObservations { observations: n, regressors: k });
        }

        let meat = self.meat(x, residuals)?;
        let sandwich = xtx_inv.dot(&meat).dot(xtx_inv);
        let dof = n as f64 / (n - k) as f64;

        Ok(symmetrize(&sandwich) * dof)
    }
}

impl Default for NeweyWest {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Classical homoskedastic OLS covariance `s² (X'X)^-1` with `s² = SSR/(n-k)`.
///
/// # Errors
/// Returns an error on mismatched dimensions or when `n <= k`.
pub fn classical_covariance(
    residuals: &Array1<f64>,
    xtx_inv: &Array2<f64>,
) -> Result<Array2<f64>, MathError> {
    let n = residuals.len();
    let k = xtx_inv.nrows();
    check_bread(xtx_inv, k)?;
    if n <= k {
        return Err(MathError::InsufficientObservations { observations: n, regressors: k });
    }

    let s2 = residuals.dot(residuals) / (n - k) as f64;
    Ok(xtx_inv * s2)
}

/// Standard errors from the diagonal of a covariance matrix.
///
/// Rounding can push a variance of an exact fit a hair below zero; such
/// entries are floored at zero.
#[must_use]
pub fn standard_errors(cov: &Array2<f64>) -> Array1<f64> {
    cov.diag().mapv(|v| v.max(0.0).sqrt())
}

fn check_bread(xtx_inv: &Array2<f64>, k: usize) -> Result<(), MathError> {
    if xtx_inv.nrows() != k {
        return Err(MathError::DimensionMismatch { expected: k, actual: xtx_inv.nrows() });
    }
    if xtx_inv.ncols() != k {
        return Err(MathError::DimensionMismatch { expected: k, actual: xtx_inv.ncols() });
    }
    Ok(())
}

fn symmetrize(m: &Array2<f64>) -> Array2<f64> {
    (m + &m.t()) * 0.5
}
