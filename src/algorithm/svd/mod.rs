//! Singular value decomposition
//!
//! Every block of observations is QR-factorized on its own; the partial
//! result keeps one R factor per block and, when left singular vectors are
//! requested, the matching Q factor. Finalization decomposes the stacked R
//! factors, which is equivalent to decomposing the concatenated data:
//!
//! ```text
//! [X_1; ...; X_k] = diag(Q_1, ..., Q_k) · [R_1; ...; R_k]
//!                 = diag(Q_1, ..., Q_k) · Ũ · Σ · Vᵀ
//! ```
//!
//! so Σ and Vᵀ come from the small `(k·m) × m` stack and the rows of U owned
//! by block i are `Q_i · Ũ_i`.
//!
//! Batch mode is a single-block online computation. The distributed
//! protocol is available both through [`Session`](crate::algorithm::Session)
//! in `Distributed` mode and through the explicit
//! [`DistributedStep2Master`] / [`distributed_step3_local`] steps.

mod distributed;
mod kernel;
mod partial;
mod result;
mod types;

pub use distributed::{DistributedPartialResult, DistributedStep2Master, distributed_step3_local};
pub use partial::{Block, PartialResult, PartialResultId};
pub use result::{Result, ResultId};
pub use types::{Input, InputId, Method, Parameter, ResultFormat};

use crate::algorithm::OnlineAlgorithm;
use crate::error::{self, Bound, Dimension, Error, Status};
use crate::runtime::cpu::CpuEnv;

/// SVD algorithm marker
#[derive(Copy, Clone, Debug, Default)]
pub struct Svd;

impl OnlineAlgorithm for Svd {
    const NAME: &'static str = "svd";

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
        parameter: &Parameter,
        _method: Method,
    ) -> Status {
        match input {
            Some(input) => partial.check_with_input(input, parameter),
            None => partial.check(parameter),
        }
    }

    fn compute_block(
        env: &CpuEnv,
        input: &Input,
        parameter: &Parameter,
        method: Method,
    ) -> error::Result<Block> {
        let data = input.get(InputId::Data).ok_or(Error::null("data"))?;
        match method {
            Method::DefaultDense => {
                crate::dispatch_dtype!(data.dtype(), T => {
                    kernel::compute_block::<T>(env, &**data, parameter)
                })
            }
        }
    }

    fn accumulate(partial: &mut PartialResult, block: Block) {
        partial.push_block(block);
    }

    fn merge(
        partial: &mut PartialResult,
        other: &PartialResult,
        parameter: &Parameter,
        _method: Method,
    ) -> Status {
        if let (Some(expected), Some(got)) = (partial.n_features(), other.n_features()) {
            if expected != got {
                return Err(Error::shape(
                    "rCollection",
                    Dimension::Columns,
                    Bound::Exactly(expected),
                    got,
                ));
            }
        }
        partial.append(other, parameter.requires_left());
        Ok(())
    }

    fn finalize(
        env: &CpuEnv,
        partial: &PartialResult,
        parameter: &Parameter,
        method: Method,
    ) -> error::Result<Result> {
        let dtype = partial
            .get(PartialResultId::OutputOfStep1ForStep2)
            .and_then(|c| c.table(0))
            .map(|t| t.dtype())
            .ok_or(Error::element_count("outputOfStep1ForStep2", Bound::AtLeast(1), 0))?;
        let result = match method {
            Method::DefaultDense => {
                crate::dispatch_dtype!(dtype, T => { kernel::finalize::<T>(env, partial, parameter) })?
            }
        };
        log::debug!(
            "svd: finalized {} blocks, {} features, {} rows",
            partial.n_blocks(),
            partial.n_features().unwrap_or(0),
            partial.n_rows()
        );
        Ok(result)
    }
}
