//! Least squares solver.
//!
//! The forecast fits one small linear regression per run:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - We use SVD to solve the least-squares problem robustly even when the
//!   design matrix is tall (more rows than columns).
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic
//!   for non-square matrices.)
//! - Date ordinals make the two design columns differ by ~6 orders of
//!   magnitude; SVD with a relaxed tolerance ladder copes with the
//!   resulting conditioning without manual rescaling.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y = intercept + slope * x` and return `(intercept, slope)`.
///
/// Returns `None` when the fit is unidentifiable (fewer than two points, or
/// a numerically unsolvable design).
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let n = xs.len();
    if n < 2 || ys.len() != n {
        return None;
    }

    let mut design = DMatrix::zeros(n, 2);
    for (i, &x) in xs.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = x;
    }
    let y = DVector::from_column_slice(ys);

    let beta = solve_least_squares(&design, &y)?;
    Some((beta[0], beta[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_recovers_trend_at_ordinal_scale() {
        // Date-ordinal-sized x values: intercept/slope must still come back.
        let xs: Vec<f64> = (0..10).map(|i| 739_000.0 + i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 5.0 * x - 1000.0).collect();

        let (intercept, slope) = fit_line(&xs, &ys).unwrap();
        assert!((slope - 5.0).abs() < 1e-6, "slope {slope}");
        let y_hat = intercept + slope * xs[0];
        assert!((y_hat - ys[0]).abs() < 1e-4);
    }

    #[test]
    fn fit_line_rejects_single_point() {
        assert!(fit_line(&[1.0], &[2.0]).is_none());
    }
}
