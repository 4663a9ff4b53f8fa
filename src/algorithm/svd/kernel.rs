//! Block factorization and merge kernels for the dense default method
//!
//! All kernels read tables as row-major `T` and run the column-major
//! factorizations from the CPU backend.

use super::partial::{Block, PartialResult, PartialResultId};
use super::result::{Result, ResultId};
use super::types::Parameter;
use crate::error;
use crate::runtime::cpu::linalg::{
    SvdFactors, from_column_major, householder_qr_thin, jacobi_svd, matmul, to_column_major,
};
use crate::runtime::cpu::{CpuEnv, KernelElement};
use crate::table::{HomogenTable, NumericTable, TableRef, dense_mut, read_dense};
use std::sync::Arc;

/// QR-factorize one block of observations
pub(crate) fn compute_block<T: KernelElement>(
    env: &CpuEnv,
    data: &dyn NumericTable,
    parameter: &Parameter,
) -> error::Result<Block> {
    let (n, m) = (data.n_rows(), data.n_columns());
    let kernels = env.kernels::<T>();
    let a = to_column_major(&read_dense::<T>(data), n, m);
    let qr = householder_qr_thin(&kernels, &a, n, m)?;

    let r: TableRef = Arc::new(HomogenTable::from_vec(m, m, from_column_major(&qr.r, m, m)));
    let q = parameter.requires_left().then(|| {
        Arc::new(HomogenTable::from_vec(n, m, from_column_major(&qr.q, n, m))) as TableRef
    });
    Ok(Block { r, q })
}

/// Stack `m × m` factors vertically into a column-major `(k·m) × m` buffer
pub(crate) fn stack_factors<'a, T: KernelElement>(
    factors: impl ExactSizeIterator<Item = &'a TableRef>,
    m: usize,
) -> Vec<T> {
    let k = factors.len();
    let rows = k * m;
    let mut stacked = vec![T::zero(); rows * m];
    for (b, factor) in factors.enumerate() {
        let values = read_dense::<T>(&**factor);
        for i in 0..m {
            for j in 0..m {
                stacked[j * rows + b * m + i] = values[i * m + j];
            }
        }
    }
    stacked
}

/// Block `b` of the left factor of a stacked SVD as a column-major `m × m`
/// matrix
pub(crate) fn stacked_block<T: KernelElement>(u: &[T], n_blocks: usize, m: usize, b: usize) -> Vec<T> {
    let rows = n_blocks * m;
    let mut out = Vec::with_capacity(m * m);
    for j in 0..m {
        out.extend_from_slice(&u[j * rows + b * m..j * rows + (b + 1) * m]);
    }
    out
}

/// `Q · T` for a row-major `n_i × m` factor and column-major `m × m`
/// transform, returned row-major
pub(crate) fn apply_transform<T: KernelElement>(
    env: &CpuEnv,
    q: &dyn NumericTable,
    transform: &[T],
    m: usize,
) -> Vec<T> {
    let n_i = q.n_rows();
    let kernels = env.kernels::<T>();
    let q_cm = to_column_major(&read_dense::<T>(q), n_i, m);
    from_column_major(&matmul(&kernels, &q_cm, transform, n_i, m, m), n_i, m)
}

/// SVD of the stacked R factors
pub(crate) fn stacked_svd<T: KernelElement>(
    env: &CpuEnv,
    r_factors: &[&TableRef],
    m: usize,
) -> error::Result<SvdFactors<T>> {
    let stacked = stack_factors::<T>(r_factors.iter().copied(), m);
    jacobi_svd(&env.kernels::<T>(), &stacked, r_factors.len() * m, m)
}

/// Write singular values and Vᵀ into an allocated result
pub(crate) fn fill_sigma_and_v<T: KernelElement>(
    result: &mut Result,
    factors: &SvdFactors<T>,
    m: usize,
) -> error::Status {
    if let Some(table) = result.table_mut(ResultId::SingularValues) {
        dense_mut::<T>(table, "singularValues")?
            .as_mut_slice()
            .copy_from_slice(&factors.s);
    }
    if let Some(table) = result.table_mut(ResultId::RightSingularMatrix) {
        dense_mut::<T>(table, "rightSingularMatrix")?
            .as_mut_slice()
            .copy_from_slice(&from_column_major(&factors.vt, m, m));
    }
    Ok(())
}

/// Merge accumulated blocks into the final result
///
/// Algorithm:
/// 1. Stack the k R factors into a `(k·m) × m` matrix
/// 2. Jacobi SVD of the stack: `R_stack = Ũ Σ Vᵀ`
/// 3. For each block i, rows of U are `Q_i · Ũ_i` where `Ũ_i` is block i
///    of Ũ; blocks are written in accumulation order
pub(crate) fn finalize<T: KernelElement>(
    env: &CpuEnv,
    partial: &PartialResult,
    parameter: &Parameter,
) -> error::Result<Result> {
    let r_factors: Vec<&TableRef> = partial
        .get(PartialResultId::OutputOfStep1ForStep2)
        .map(|c| c.tables().collect())
        .unwrap_or_default();
    let m = partial.n_features().unwrap_or(0);
    let k = r_factors.len();

    let factors = stacked_svd::<T>(env, &r_factors, m)?;

    let mut result = Result::new();
    result.allocate_from_partial(T::DTYPE, partial, parameter);
    fill_sigma_and_v(&mut result, &factors, m)?;

    if parameter.requires_left() {
        let q_factors: Vec<&dyn NumericTable> = partial
            .get(PartialResultId::OutputOfStep1ForStep3)
            .map(|c| c.tables().map(|t| &**t).collect())
            .unwrap_or_default();
        let blocks = env.map_blocks(&q_factors, |b, q| {
            let transform = stacked_block(&factors.u, k, m, b);
            Ok::<_, error::Error>(apply_transform(env, *q, &transform, m))
        })?;

        if let Some(table) = result.table_mut(ResultId::LeftSingularMatrix) {
            let left = dense_mut::<T>(table, "leftSingularMatrix")?.as_mut_slice();
            let mut offset = 0;
            for rows in blocks {
                left[offset..offset + rows.len()].copy_from_slice(&rows);
                offset += rows.len();
            }
        }
    }
    Ok(result)
}
