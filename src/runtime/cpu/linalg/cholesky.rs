//! Cholesky factorization and solve for symmetric positive definite systems

use super::super::jacobi::LinalgElement;
use crate::error::{Error, Result};

/// Solve `A · X = B` for symmetric positive definite `A`
///
/// `a` is the `n × n` matrix (only the lower triangle is read), `rhs` holds
/// `n_rhs` right-hand sides as consecutive columns of length `n`. The
/// solution overwrites `rhs`.
///
/// Fails with a numerical error when a pivot is not strictly positive.
pub fn cholesky_solve<T: LinalgElement>(
    a: &[T],
    n: usize,
    rhs: &mut [T],
    n_rhs: usize,
) -> Result<()> {
    debug_assert_eq!(a.len(), n * n);
    debug_assert_eq!(rhs.len(), n * n_rhs);

    // L stored column-major; A is symmetric so row/column order coincide
    let mut l = vec![T::zero(); n * n];
    for j in 0..n {
        let mut d = a[j * n + j];
        for k in 0..j {
            d = d - l[k * n + j] * l[k * n + j];
        }
        if !(d.to_f64() > 0.0) {
            return Err(Error::numerical(
                "cholesky_solve",
                format!("matrix is not positive definite (pivot {j})"),
            ));
        }
        let d = d.sqrt_val();
        l[j * n + j] = d;
        for i in (j + 1)..n {
            let mut sum = a[j * n + i];
            for k in 0..j {
                sum = sum - l[k * n + i] * l[k * n + j];
            }
            l[j * n + i] = sum / d;
        }
    }

    for x in rhs.chunks_exact_mut(n.max(1)).take(n_rhs) {
        // L · y = b
        for i in 0..n {
            let mut sum = x[i];
            for k in 0..i {
                sum = sum - l[k * n + i] * x[k];
            }
            x[i] = sum / l[i * n + i];
        }
        // Lᵀ · x = y
        for i in (0..n).rev() {
            let mut sum = x[i];
            for k in (i + 1)..n {
                sum = sum - l[i * n + k] * x[k];
            }
            x[i] = sum / l[i * n + i];
        }
    }
    Ok(())
}
