//! Ridge regression training, online
//!
//! Each block contributes `ZᵀZ` and `YᵀZ`, where `Z = [1 | X]`. Sums are
//! order independent, so blocks and node partial results can be merged in
//! any order. Finalization solves, per response j,
//!
//! ```text
//! (ZᵀZ + λ_j · D) β_j = Zᵀ y_j        D = diag(0, 1, ..., 1)
//! ```
//!
//! by Cholesky. Without an intercept the first row and column are dropped
//! and β_j[0] is zero.

mod types;

pub use types::{
    Block, Input, InputId, Method, Parameter, PartialResult, PartialResultId, Result, ResultId,
};

use crate::algorithm::OnlineAlgorithm;
use crate::error::{self, Bound, Dimension, Error, Status};
use crate::runtime::cpu::linalg::{cholesky_solve, to_column_major};
use crate::runtime::cpu::{CpuEnv, KernelElement};
use crate::table::{HomogenTable, NumericTable, TableRef, read_dense};
use std::sync::Arc;
use types::PartialResultId::{PartialModelXtx, PartialModelXty};

/// Ridge regression training marker
#[derive(Copy, Clone, Debug, Default)]
pub struct RidgeRegression;

impl OnlineAlgorithm for RidgeRegression {
    const NAME: &'static str = "ridge_regression";

    type Method = Method;
    type Parameter = Parameter;
    type Input = Input;
    type PartialResult = PartialResult;
    type Result = Result;
    type Block = Block;

    fn check_input(input: &Input, parameter: &Parameter, method: Method) -> Status {
        input.check(parameter, method)
    }

    fn check_partial(
        partial: &PartialResult,
        input: Option<&Input>,
        _parameter: &Parameter,
        _method: Method,
    ) -> Status {
        partial.check(input)
    }

    fn compute_block(
        env: &CpuEnv,
        input: &Input,
        _parameter: &Parameter,
        method: Method,
    ) -> error::Result<Block> {
        let data = input.get(InputId::Data).ok_or(Error::null("data"))?;
        let y = input
            .get(InputId::DependentVariables)
            .ok_or(Error::null("dependentVariables"))?;
        match method {
            Method::NormEqDense => Ok(crate::dispatch_dtype!(data.dtype(), T => {
                cross_products::<T>(env, &**data, &**y)
            })),
        }
    }

    fn accumulate(partial: &mut PartialResult, block: Block) {
        let xtx = match partial.get(PartialModelXtx) {
            Some(sum) => add_tables(&**sum, &*block.xtx),
            None => block.xtx,
        };
        let xty = match partial.get(PartialModelXty) {
            Some(sum) => add_tables(&**sum, &*block.xty),
            None => block.xty,
        };
        partial.args.set(PartialModelXtx, xtx);
        partial.args.set(PartialModelXty, xty);
        partial.n_observations += block.n_observations;
    }

    fn merge(
        partial: &mut PartialResult,
        other: &PartialResult,
        _parameter: &Parameter,
        _method: Method,
    ) -> Status {
        if let (Some(expected), Some(got)) = (partial.n_features(), other.n_features()) {
            if expected != got {
                return Err(Error::shape(
                    "partialModelXtx",
                    Dimension::Columns,
                    Bound::Exactly(expected + 1),
                    got + 1,
                ));
            }
        }
        if let (Some(expected), Some(got)) = (partial.n_responses(), other.n_responses()) {
            if expected != got {
                return Err(Error::shape(
                    "partialModelXty",
                    Dimension::Rows,
                    Bound::Exactly(expected),
                    got,
                ));
            }
        }
        if let (Some(xtx), Some(xty)) = (other.get(PartialModelXtx), other.get(PartialModelXty)) {
            Self::accumulate(
                partial,
                Block {
                    xtx: Arc::clone(xtx),
                    xty: Arc::clone(xty),
                    n_observations: other.n_observations,
                },
            );
        }
        Ok(())
    }

    fn finalize(
        _env: &CpuEnv,
        partial: &PartialResult,
        parameter: &Parameter,
        method: Method,
    ) -> error::Result<Result> {
        let xtx = partial
            .get(PartialModelXtx)
            .ok_or(Error::null("partialModelXtx"))?;
        let xty = partial
            .get(PartialModelXty)
            .ok_or(Error::null("partialModelXty"))?;
        let r = xty.n_rows();
        if parameter.ridge.len() != 1 && parameter.ridge.len() != r {
            return Err(Error::parameter(
                types::RIDGE,
                format!("expected 1 or {r} values, got {}", parameter.ridge.len()),
            ));
        }
        let beta = match method {
            Method::NormEqDense => crate::dispatch_dtype!(xtx.dtype(), T => {
                solve_normal_equations::<T>(&**xtx, &**xty, parameter)
            })?,
        };
        log::debug!(
            "ridge_regression: finalized {} observations, {} features, {} responses",
            partial.n_observations(),
            xtx.n_columns() - 1,
            r
        );
        Ok(Result::from_beta(beta))
    }
}

/// `ZᵀZ` and `YᵀZ` of one block
fn cross_products<T: KernelElement>(
    env: &CpuEnv,
    data: &dyn NumericTable,
    y: &dyn NumericTable,
) -> Block {
    let (n, p, r) = (data.n_rows(), data.n_columns(), y.n_columns());
    let d = p + 1;
    let kernels = env.kernels::<T>();

    let mut z = vec![T::one(); n];
    z.extend(to_column_major(&read_dense::<T>(data), n, p));
    let y_cm = to_column_major(&read_dense::<T>(y), n, r);

    let mut xtx = vec![T::zero(); d * d];
    for a in 0..d {
        for b in a..d {
            let v = (kernels.dot)(&z[a * n..(a + 1) * n], &z[b * n..(b + 1) * n]);
            xtx[a * d + b] = v;
            xtx[b * d + a] = v;
        }
    }
    let mut xty = vec![T::zero(); r * d];
    for j in 0..r {
        let yj = &y_cm[j * n..(j + 1) * n];
        for a in 0..d {
            xty[j * d + a] = (kernels.dot)(yj, &z[a * n..(a + 1) * n]);
        }
    }

    Block {
        xtx: Arc::new(HomogenTable::from_vec(d, d, xtx)),
        xty: Arc::new(HomogenTable::from_vec(r, d, xty)),
        n_observations: n,
    }
}

/// Elementwise sum of two tables of equal shape, in the precision of `a`
fn add_tables(a: &dyn NumericTable, b: &dyn NumericTable) -> TableRef {
    let (rows, cols) = (a.n_rows(), a.n_columns());
    crate::dispatch_dtype!(a.dtype(), T => {
        let sum: Vec<T> = read_dense::<T>(a)
            .iter()
            .zip(read_dense::<T>(b).iter())
            .map(|(&x, &y)| x + y)
            .collect();
        Arc::new(HomogenTable::from_vec(rows, cols, sum)) as TableRef
    })
}

fn solve_normal_equations<T: KernelElement>(
    xtx: &dyn NumericTable,
    xty: &dyn NumericTable,
    parameter: &Parameter,
) -> error::Result<TableRef> {
    let d = xtx.n_columns();
    let r = xty.n_rows();
    let a = read_dense::<T>(xtx);
    let rhs = read_dense::<T>(xty);
    let first = if parameter.intercept { 0 } else { 1 };
    let dim = d - first;

    let mut beta = vec![T::zero(); r * d];
    for j in 0..r {
        let lambda = T::from_f64(parameter.ridge_for(j));
        let mut system = Vec::with_capacity(dim * dim);
        for row in first..d {
            for col in first..d {
                let mut v = a[row * d + col];
                if row == col && row != 0 {
                    v = v + lambda;
                }
                system.push(v);
            }
        }
        let x = &mut beta[j * d + first..(j + 1) * d];
        x.copy_from_slice(&rhs[j * d + first..(j + 1) * d]);
        cholesky_solve(&system, dim, x, 1)?;
    }
    Ok(Arc::new(HomogenTable::from_vec(r, d, beta)))
}
