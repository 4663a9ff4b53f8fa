//! Thin Householder QR decomposition

use super::super::jacobi::LinalgElement;
use super::super::kernels::KernelTable;
use crate::error::{Error, Result};

/// Thin QR factors of a `rows × cols` matrix, both column-major
#[derive(Debug, Clone)]
pub struct QrFactors<T> {
    /// Orthonormal columns, `rows × cols`
    pub q: Vec<T>,
    /// Upper triangular factor, `cols × cols`
    pub r: Vec<T>,
}

/// Householder QR of a column-major `rows × cols` matrix with `rows >= cols`
///
/// Algorithm:
/// 1. FOR each column j: build the reflector `H_j = I - τ v vᵀ` that zeroes
///    A[j+1.., j], store v below the diagonal, apply H_j to columns j+1..
/// 2. R is the upper triangle of the reduced matrix
/// 3. Q = H_0 · H_1 ⋯ H_{cols-1} · I[:, ..cols], applied in reverse order
pub fn householder_qr_thin<T: LinalgElement>(
    kernels: &KernelTable<T>,
    a: &[T],
    rows: usize,
    cols: usize,
) -> Result<QrFactors<T>> {
    if rows < cols {
        return Err(Error::numerical(
            "householder_qr_thin",
            format!("{rows} rows cannot factor {cols} columns"),
        ));
    }
    debug_assert_eq!(a.len(), rows * cols);

    let mut work = a.to_vec();
    let mut taus = vec![T::zero(); cols];

    for j in 0..cols {
        let (head, tail) = work.split_at_mut((j + 1) * rows);
        let col = &mut head[j * rows + j..];
        let alpha = col[0];
        let x_norm = kernels.norm(&col[1..]);
        if x_norm == T::zero() {
            continue;
        }

        let norm = (alpha * alpha + x_norm * x_norm).sqrt_val();
        let beta = if alpha >= T::zero() { norm.neg_val() } else { norm };
        taus[j] = (beta - alpha) / beta;
        (kernels.scale)(T::one() / (alpha - beta), &mut col[1..]);
        col[0] = beta;

        let v_tail = &col[1..];
        let tau = taus[j];
        for ck in tail.chunks_exact_mut(rows) {
            let ck = &mut ck[j..];
            let w = ck[0] + (kernels.dot)(v_tail, &ck[1..]);
            ck[0] = ck[0] - tau * w;
            (kernels.axpy)((tau * w).neg_val(), v_tail, &mut ck[1..]);
        }
    }

    let mut r = vec![T::zero(); cols * cols];
    for j in 0..cols {
        for i in 0..=j {
            r[j * cols + i] = work[j * rows + i];
        }
    }

    let mut q = vec![T::zero(); rows * cols];
    for j in 0..cols {
        q[j * rows + j] = T::one();
    }
    for j in (0..cols).rev() {
        let tau = taus[j];
        if tau == T::zero() {
            continue;
        }
        let v_tail = &work[j * rows + j + 1..(j + 1) * rows];
        for qc in q.chunks_exact_mut(rows) {
            let qc = &mut qc[j..];
            let w = qc[0] + (kernels.dot)(v_tail, &qc[1..]);
            qc[0] = qc[0] - tau * w;
            (kernels.axpy)((tau * w).neg_val(), v_tail, &mut qc[1..]);
        }
    }

    Ok(QrFactors { q, r })
}
