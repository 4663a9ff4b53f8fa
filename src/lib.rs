//! # numalg
//!
//! **Incremental and distributed numerical algorithms over numeric tables.**
//!
//! numalg runs an algorithm in one of three modes through the same argument
//! objects:
//!
//! - **Batch**: one input, one result
//! - **Online**: blocks arrive one at a time and are folded into a partial
//!   result, which is finalized once the data stream ends
//! - **Distributed**: nodes accumulate partial results independently, a
//!   master merges them and finalizes
//!
//! Every argument is validated before any state changes, so a rejected block
//! leaves a session exactly as it was.
//!
//! ## Algorithms
//!
//! - **SVD**: blockwise QR with merge by SVD of the stacked R factors
//! - **Ridge regression**: accumulated normal equations, Cholesky solve
//! - **Sorting**, **linear kernel function**, **softmax**: batch only
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use numalg::prelude::*;
//! use numalg::algorithm::svd::{self, Svd};
//!
//! let mut session = Session::<Svd>::new(ComputeMode::Online, svd::Method::DefaultDense);
//! session.configure(svd::Parameter::default())?;
//! for block in blocks {
//!     session.compute(&svd::Input::from_data(block))?;
//! }
//! session.finalize_compute()?;
//! let sigma = session.result().and_then(|r| r.get(svd::ResultId::SingularValues));
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): per-block work in finalize runs on the rayon pool

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod algorithm;
pub mod dtype;
pub mod error;
pub mod runtime;
pub mod table;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::algorithm::{
        BatchAlgorithm, BatchSession, ComputeMode, OnlineAlgorithm, Session, SessionState,
        TypeRegistry,
    };
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, ErrorKind, Result, Status};
    pub use crate::runtime::cpu::CpuEnv;
    pub use crate::table::{
        CsrTable, HomogenTable, NumericTable, PackedTable, StorageLayout, TableCollection,
        TableRef,
    };
}
