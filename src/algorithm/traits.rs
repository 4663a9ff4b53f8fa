//! Algorithm contracts driven by sessions
//!
//! An algorithm is a set of associated types plus the checks and compute
//! steps a [`Session`](super::Session) sequences. Implementations are plain
//! unit structs; all state lives in the input, partial result and result
//! objects.

use crate::error::{self, Status};
use crate::runtime::cpu::CpuEnv;
use std::fmt::Debug;

/// Method-specific parameter set
pub trait Parameter: Clone + Debug + Default + Send + Sync {
    /// Validate parameter values
    fn check(&self) -> Status {
        Ok(())
    }
}

/// Closed enumeration of computation methods
pub trait Method: Copy + Debug + Default + PartialEq + Send + Sync {}

/// Algorithm computing its result from a single input
pub trait BatchAlgorithm {
    /// Name used in diagnostics
    const NAME: &'static str;

    /// Computation method
    type Method: Method;
    /// Parameter set
    type Parameter: Parameter;
    /// Input arguments
    type Input;
    /// Final result
    type Result;

    /// Validate the input against the parameter and method
    fn check_input(input: &Self::Input, parameter: &Self::Parameter, method: Self::Method)
    -> Status;

    /// Compute the result for a validated input
    fn compute(
        env: &CpuEnv,
        input: &Self::Input,
        parameter: &Self::Parameter,
        method: Self::Method,
    ) -> error::Result<Self::Result>;

    /// Validate a produced result against its input
    fn check_result(
        _result: &Self::Result,
        _input: &Self::Input,
        _parameter: &Self::Parameter,
        _method: Self::Method,
    ) -> Status {
        Ok(())
    }
}

/// Algorithm that accumulates per-block state before producing its result
///
/// Every block goes through `check_input`, `check_partial` (against the
/// block's shape), `compute_block` and `accumulate`. Only `accumulate`
/// mutates the partial result and it cannot fail, so a rejected block leaves
/// the accumulated state untouched.
pub trait OnlineAlgorithm {
    /// Name used in diagnostics
    const NAME: &'static str;

    /// Computation method
    type Method: Method;
    /// Parameter set
    type Parameter: Parameter;
    /// Input arguments of one block
    type Input;
    /// Accumulated state
    type PartialResult: Clone + Debug + Default + Send + Sync;
    /// Final result
    type Result;
    /// Output of one block, appended by `accumulate`
    type Block;

    /// Validate a block's input against the parameter and method
    fn check_input(input: &Self::Input, parameter: &Self::Parameter, method: Self::Method)
    -> Status;

    /// Validate accumulated state
    ///
    /// With `input` the check validates consistency with the block about to
    /// be appended and an empty partial result is acceptable. Without it the
    /// accumulated state must be complete enough to finalize.
    fn check_partial(
        partial: &Self::PartialResult,
        input: Option<&Self::Input>,
        parameter: &Self::Parameter,
        method: Self::Method,
    ) -> Status;

    /// Process one validated block
    fn compute_block(
        env: &CpuEnv,
        input: &Self::Input,
        parameter: &Self::Parameter,
        method: Self::Method,
    ) -> error::Result<Self::Block>;

    /// Append a processed block
    fn accumulate(partial: &mut Self::PartialResult, block: Self::Block);

    /// Fold another node's partial result into `partial`
    ///
    /// Compatibility is checked before any mutation.
    fn merge(
        partial: &mut Self::PartialResult,
        other: &Self::PartialResult,
        parameter: &Self::Parameter,
        method: Self::Method,
    ) -> Status;

    /// Produce the result from validated accumulated state
    fn finalize(
        env: &CpuEnv,
        partial: &Self::PartialResult,
        parameter: &Self::Parameter,
        method: Self::Method,
    ) -> error::Result<Self::Result>;
}
