//! Singular Value Decomposition (SVD) using One-Sided Jacobi algorithm

use super::super::jacobi::{JacobiRotation, LinalgElement, argsort_desc, column_pair_mut, identity_matrix};
use super::super::kernels::KernelTable;
use crate::error::{Error, Result};

/// Sweep limit for the Jacobi iteration
const MAX_SWEEPS: usize = 60;

/// Thin SVD factors, all buffers column-major
#[derive(Debug, Clone)]
pub struct SvdFactors<T> {
    /// Left singular vectors, `rows × cols`
    pub u: Vec<T>,
    /// Singular values in descending order, length `cols`
    pub s: Vec<T>,
    /// Transposed right singular vectors, `cols × cols`
    pub vt: Vec<T>,
}

/// One-sided Jacobi SVD of a column-major `rows × cols` matrix, `rows >= cols`
///
/// Algorithm:
/// 1. Initialize: B = A (working copy), V = I
/// 2. REPEAT (max 60 sweeps):
///    FOR each pair (p, q) where p < q:
///      - Gram elements a_pp, a_qq, a_pq from columns p and q of B
///      - If |a_pq| > tol·sqrt(a_pp·a_qq): rotate columns p, q of B and V
///    Stop after a sweep that performs no rotation
/// 3. Extract: S[j] = ||B[:,j]||, U[:,j] = B[:,j]/S[j]
/// 4. Sort S descending, reorder U and V columns accordingly
///
/// Columns of U belonging to negligible singular values (below
/// `s_max·rows·ε`) are completed to an orthonormal set, so U always has
/// orthonormal columns.
pub fn jacobi_svd<T: LinalgElement>(
    kernels: &KernelTable<T>,
    a: &[T],
    rows: usize,
    cols: usize,
) -> Result<SvdFactors<T>> {
    if rows < cols {
        return Err(Error::numerical(
            "jacobi_svd",
            format!("{rows} rows cannot factor {cols} columns"),
        ));
    }
    debug_assert_eq!(a.len(), rows * cols);
    if !a.iter().all(|v| v.is_finite_val()) {
        return Err(Error::numerical("jacobi_svd", "matrix has non-finite entries"));
    }

    let mut b = a.to_vec();
    let mut v: Vec<T> = identity_matrix(cols);
    let tol = (cols.max(1) as f64) * T::epsilon_val();

    let mut converged = false;
    for _sweep in 0..MAX_SWEEPS {
        let mut rotated = false;
        for p in 0..cols {
            for q in (p + 1)..cols {
                let (bp, bq) = column_pair_mut(&mut b, rows, p, q);
                let a_pp = (kernels.dot)(bp, bp).to_f64();
                let a_qq = (kernels.dot)(bq, bq).to_f64();
                let a_pq = (kernels.dot)(bp, bq).to_f64();

                if a_pq.abs() <= tol * (a_pp * a_qq).sqrt() {
                    continue;
                }
                rotated = true;

                let rot = JacobiRotation::compute(a_pp, a_qq, a_pq);
                rot.apply(bp, bq);
                let (vp, vq) = column_pair_mut(&mut v, cols, p, q);
                rot.apply(vp, vq);
            }
        }
        if !rotated {
            converged = true;
            break;
        }
    }
    if !converged {
        log::warn!("jacobi_svd: {rows}x{cols} did not converge in {MAX_SWEEPS} sweeps");
    }

    let norms: Vec<T> = b.chunks_exact(rows.max(1)).take(cols).map(|c| kernels.norm(c)).collect();
    let order = argsort_desc(&norms);
    let s_max = norms.iter().map(|s| s.to_f64()).fold(0.0, f64::max);
    let cutoff = s_max * (rows as f64) * T::epsilon_val();

    let mut u = vec![T::zero(); rows * cols];
    let mut s = Vec::with_capacity(cols);
    let mut vt = vec![T::zero(); cols * cols];
    let mut filled = vec![false; cols];
    for (new_idx, &old_idx) in order.iter().enumerate() {
        let sigma = norms[old_idx];
        s.push(sigma);

        if sigma.to_f64() > cutoff && sigma.to_f64() > 0.0 {
            let dst = &mut u[new_idx * rows..(new_idx + 1) * rows];
            dst.copy_from_slice(&b[old_idx * rows..(old_idx + 1) * rows]);
            (kernels.scale)(T::one() / sigma, dst);
            filled[new_idx] = true;
        }

        // Row new_idx of Vᵀ is column old_idx of V
        for j in 0..cols {
            vt[j * cols + new_idx] = v[old_idx * cols + j];
        }
    }

    if filled.iter().any(|&f| !f) {
        complete_columns(kernels, &mut u, rows, &mut filled);
    }

    Ok(SvdFactors { u, s, vt })
}

/// Fill the unset columns of column-major `u` with unit vectors orthogonal
/// to every set column
///
/// Candidates are the standard basis vectors in order, orthogonalized with
/// two Gram-Schmidt passes. A candidate is kept when its residual norm
/// exceeds `sqrt(0.5 / rows)`; the residuals over all `rows` candidates sum
/// to the free dimension, so an unscanned candidate always clears that bar.
fn complete_columns<T: LinalgElement>(
    kernels: &KernelTable<T>,
    u: &mut [T],
    rows: usize,
    filled: &mut [bool],
) {
    let threshold = (0.5 / rows as f64).sqrt();
    let mut w = vec![T::zero(); rows];
    let mut candidate = 0;
    for j in 0..filled.len() {
        if filled[j] {
            continue;
        }
        while candidate < rows {
            w.fill(T::zero());
            w[candidate] = T::one();
            candidate += 1;
            for _pass in 0..2 {
                for k in (0..filled.len()).filter(|&k| filled[k]) {
                    let col = &u[k * rows..(k + 1) * rows];
                    let c = (kernels.dot)(col, &w);
                    (kernels.axpy)(c.neg_val(), col, &mut w);
                }
            }
            let norm = kernels.norm(&w);
            if norm.to_f64() > threshold {
                (kernels.scale)(T::one() / norm, &mut w);
                u[j * rows..(j + 1) * rows].copy_from_slice(&w);
                filled[j] = true;
                break;
            }
        }
        if !filled[j] {
            log::warn!("jacobi_svd: could not complete column {j} of U");
        }
    }
}
