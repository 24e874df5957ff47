//! Small dense linear-algebra helpers for the minimizer.
//!
//! Each minimizer iteration solves a damped normal-equation system
//!
//! ```text
//! (I + λ diag(I)) δ = s
//! ```
//!
//! where `I` is the Fisher information and `s` the score. The system is tiny
//! (3×3 for a Gaussian), so SVD is cheap and tolerates the near-singular
//! information matrices that show up on sparse histograms.

use nalgebra::{DMatrix, DVector};

/// Solve `a · x = b` using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = a.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(x) = svd.solve(b, tol) {
            if x.iter().all(|v| v.is_finite()) {
                return Some(x);
            }
        }
    }

    None
}

/// Invert a symmetric positive-definite matrix (covariance from information).
///
/// Cholesky first; falls back to a general inverse for matrices that are
/// symmetric but only semi-definite within rounding.
pub fn invert_spd(a: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let inv = match a.clone().cholesky() {
        Some(chol) => chol.inverse(),
        None => a.clone().try_inverse()?,
    };
    if inv.iter().all(|v| v.is_finite()) {
        Some(inv)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_simple_system() {
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let b = DVector::from_row_slice(&[3.0, 5.0]);

        let x = solve_linear_system(&a, &b).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-10);
        assert!((x[1] - 1.4).abs() < 1e-10);
    }

    #[test]
    fn inverts_diagonal_matrix() {
        let a = DMatrix::from_diagonal(&DVector::from_row_slice(&[4.0, 0.25, 1.0]));
        let inv = invert_spd(&a).unwrap();
        assert!((inv[(0, 0)] - 0.25).abs() < 1e-12);
        assert!((inv[(1, 1)] - 4.0).abs() < 1e-12);
        assert!((inv[(2, 2)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert!(invert_spd(&a).is_none());
    }
}
