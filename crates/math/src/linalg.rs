//! Least squares through the normal equations.

use ndarray::{Array1, Array2};

use crate::MathError;

/// Smallest pivot accepted once the cross-product matrix has a unit diagonal.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Result of an ordinary least squares fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Estimated coefficients, in design-matrix column order.
    pub coefficients: Array1<f64>,
    /// Fitted values `X * beta`.
    pub fitted: Array1<f64>,
    /// Residuals `y - X * beta`.
    pub residuals: Array1<f64>,
    /// `(X'X)^-1`, the bread of every sandwich covariance.
    pub xtx_inv: Array2<f64>,
    /// R-squared around the mean of `y`.
    pub r_squared: f64,
}

/// Perform ordinary least squares regression.
///
/// Solves `beta = (X'X)^-1 X'y`.
///
/// # Arguments
/// * `y` - Response vector (n,)
/// * `x` - Design matrix (n x k); include a column of ones for an intercept
///
/// # Errors
/// Returns [`MathError::InsufficientObservations`] when `n <= k`,
/// [`MathError::Singular`] when the columns of `x` are (nearly) collinear and
/// [`MathError::NonFinite`] when an input holds NaN or infinity.
pub fn ordinary_least_squares(y: &Array1<f64>, x: &Array2<f64>) -> Result<OlsFit, MathError> {
    let n = y.len();
    let k = x.ncols();

    if x.nrows() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: x.nrows() });
    }
    if n == 0 || k == 0 {
        return Err(MathError::EmptyData);
    }
    if n <= k {
        return Err(MathError::InsufficientObservations { observations: n, regressors: k });
    }
    if y.iter().chain(x.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::NonFinite("regression input contains NaN or Inf".to_string()));
    }

    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);
    let xtx_inv = invert_symmetric(&xtx)?;

    let mut coefficients = xtx_inv.dot(&xty);
    // One step of iterative refinement.
    let correction = xtx_inv.dot(&(&xty - &xtx.dot(&coefficients)));
    coefficients += &correction;

    let fitted = x.dot(&coefficients);
    let residuals = y - &fitted;

    let y_mean = y.mean().unwrap_or(0.0);
    let ss_tot: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();
    let ss_res: f64 = residuals.iter().map(|r| r.powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    Ok(OlsFit { coefficients, fitted, residuals, xtx_inv, r_squared })
}

/// Invert a symmetric positive definite matrix.
///
/// The matrix is first scaled to a unit diagonal, so the singularity test does
/// not depend on the units of the regressors, then inverted by Gauss-Jordan
/// elimination with partial pivoting.
///
/// # Errors
/// Returns [`MathError::Singular`] if a diagonal entry is not positive or a
/// pivot falls below tolerance.
pub fn invert_symmetric(a: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    let n = a.nrows();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if a.ncols() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: a.ncols() });
    }

    let mut scale = Array1::zeros(n);
    for i in 0..n {
        let d = a[[i, i]];
        if !d.is_finite() || d <= 0.0 {
            return Err(MathError::Singular { column: i });
        }
        scale[i] = d.sqrt().recip();
    }

    // Augmented matrix [D A D | I]
    let mut aug = Array2::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]] * scale[i] * scale[j];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[[col, col]].abs();
        for row in (col + 1)..n {
            if aug[[row, col]].abs() > max_val {
                max_val = aug[[row, col]].abs();
                max_row = row;
            }
        }

        if max_val < PIVOT_TOLERANCE {
            return Err(MathError::Singular { column: col });
        }

        if max_row != col {
            for j in 0..(2 * n) {
                aug.swap([col, j], [max_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        for j in 0..(2 * n) {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for j in 0..(2 * n) {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    let mut inverse = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inverse[[i, j]] = aug[[i, n + j]] * scale[i] * scale[j];
        }
    }

    Ok(inverse)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    use super::*;

    fn design(columns: &[&[f64]]) -> Array2<f64> {
        let n = columns[0].len();
        Array2::from_shape_fn((n, columns.len() + 1), |(i, j)| {
            if j == 0 { 1.0 } else { columns[j - 1][i] }
        })
    }

    #[test]
    fn ols_simple_regression() {
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let x = design(&[&[1.0, 2.0, 3.0, 4.0, 5.0]]);

        let fit = ordinary_least_squares(&y, &x).unwrap();

        // Perfect fit: y = 0 + 1*x
        assert_relative_eq!(fit.coefficients[0], 0.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[1], 1.0, epsilon = 1e-10);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn ols_residuals_sum_to_zero_and_reconstruct_y() {
        let y = array![0.012, -0.004, 0.031, 0.007, -0.018, 0.022, 0.001];
        let x = design(&[
            &[0.010, -0.020, 0.040, 0.000, -0.030, 0.025, 0.005],
            &[0.003, 0.001, -0.002, 0.004, 0.000, -0.001, 0.002],
        ]);

        let fit = ordinary_least_squares(&y, &x).unwrap();

        assert_relative_eq!(fit.residuals.sum(), 0.0, epsilon = 1e-14);
        for i in 0..y.len() {
            assert_relative_eq!(fit.fitted[i] + fit.residuals[i], y[i], epsilon = 1e-15);
        }
        assert!((0.0..=1.0).contains(&fit.r_squared));
    }

    #[test]
    fn ols_residuals_orthogonal_to_regressors() {
        let y = array![0.5, 1.7, 2.1, 3.9, 4.2, 6.1];
        let x = design(&[&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[0.3, -0.1, 0.4, 0.2, -0.5, 0.0]]);

        let fit = ordinary_least_squares(&y, &x).unwrap();
        let xte = x.t().dot(&fit.residuals);

        for v in xte {
            assert_relative_eq!(v, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn ols_identical_columns_are_singular() {
        let f = [0.01, 0.02, -0.01, 0.03, 0.00, -0.02];
        let y = array![0.02, 0.03, -0.01, 0.05, 0.01, -0.02];
        let x = design(&[&f, &f]);

        let err = ordinary_least_squares(&y, &x).unwrap_err();
        assert!(matches!(err, MathError::Singular { .. }));
    }

    #[test]
    fn ols_constant_factor_is_singular() {
        // A constant factor duplicates the intercept.
        let y = array![0.02, 0.03, -0.01, 0.05];
        let x = design(&[&[0.5, 0.5, 0.5, 0.5]]);

        assert!(matches!(ordinary_least_squares(&y, &x), Err(MathError::Singular { .. })));
    }

    #[test]
    fn ols_insufficient_observations() {
        let y = array![0.01, 0.02, 0.03];
        let x = design(&[&[0.1, 0.2, 0.4], &[0.3, 0.1, 0.2]]);

        let err = ordinary_least_squares(&y, &x).unwrap_err();
        assert!(matches!(
            err,
            MathError::InsufficientObservations { observations: 3, regressors: 3 }
        ));
    }

    #[test]
    fn ols_dimension_mismatch() {
        let y = array![0.01, 0.02, 0.03];
        let x = design(&[&[0.1, 0.2, 0.4, 0.5]]);

        assert!(matches!(
            ordinary_least_squares(&y, &x),
            Err(MathError::DimensionMismatch { expected: 3, actual: 4 })
        ));
    }

    #[test]
    fn ols_rejects_nan() {
        let y = array![0.01, f64::NAN, 0.03, 0.04];
        let x = design(&[&[0.1, 0.2, 0.4, 0.5]]);

        assert!(matches!(ordinary_least_squares(&y, &x), Err(MathError::NonFinite(_))));
    }

    #[test]
    fn invert_known_matrix() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let inv = invert_symmetric(&a).unwrap();

        // det = 8, inverse = [[3, -2], [-2, 4]] / 8
        assert_relative_eq!(inv[[0, 0]], 0.375, epsilon = 1e-14);
        assert_relative_eq!(inv[[0, 1]], -0.25, epsilon = 1e-14);
        assert_relative_eq!(inv[[1, 0]], -0.25, epsilon = 1e-14);
        assert_relative_eq!(inv[[1, 1]], 0.5, epsilon = 1e-14);
    }

    #[test]
    fn invert_is_scale_free() {
        // Badly scaled but well conditioned after equilibration.
        let a = array![[1e8, 1e-2], [1e-2, 1e-8]];
        let det = 1e8 * 1e-8 - 1e-4;
        let inv = invert_symmetric(&a).unwrap();

        assert_relative_eq!(inv[[0, 0]], 1e-8 / det, max_relative = 1e-12);
        assert_relative_eq!(inv[[1, 1]], 1e8 / det, max_relative = 1e-12);
        assert_relative_eq!(inv[[0, 1]], -1e-2 / det, max_relative = 1e-12);
    }

    #[test]
    fn invert_zero_diagonal_is_singular() {
        let a = array![[1.0, 0.0], [0.0, 0.0]];
        assert!(matches!(invert_symmetric(&a), Err(MathError::Singular { column: 1 })));
    }
}
