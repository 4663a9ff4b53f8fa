//! Dense linear algebra used by the algorithm families
//!
//! All routines here work on column-major buffers and take the level-1
//! kernels they should use as a [`KernelTable`]. Conversions to and from the
//! row-major layout of dense tables live in this module as well.

mod cholesky;
mod qr;
mod svd;

pub use cholesky::cholesky_solve;
pub use qr::{QrFactors, householder_qr_thin};
pub use svd::{SvdFactors, jacobi_svd};

use super::jacobi::LinalgElement;
use super::kernels::KernelTable;

/// Transpose row-major `rows × cols` data into column-major storage
pub fn to_column_major<T: Copy>(row_major: &[T], rows: usize, cols: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(rows * cols);
    for j in 0..cols {
        out.extend((0..rows).map(|i| row_major[i * cols + j]));
    }
    out
}

/// Transpose column-major `rows × cols` data into row-major storage
pub fn from_column_major<T: Copy>(col_major: &[T], rows: usize, cols: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        out.extend((0..cols).map(|j| col_major[j * rows + i]));
    }
    out
}

/// Column-major product `C = A · B` with `A: m × inner`, `B: inner × n`
///
/// Each output column is accumulated as a sequence of axpy updates.
pub fn matmul<T: LinalgElement>(
    kernels: &KernelTable<T>,
    a: &[T],
    b: &[T],
    m: usize,
    inner: usize,
    n: usize,
) -> Vec<T> {
    let mut c = vec![T::zero(); m * n];
    for (j, c_col) in c.chunks_exact_mut(m.max(1)).take(n).enumerate() {
        for l in 0..inner {
            let coef = b[j * inner + l];
            if coef != T::zero() {
                (kernels.axpy)(coef, &a[l * m..(l + 1) * m], c_col);
            }
        }
    }
    c
}
