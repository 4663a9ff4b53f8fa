//! CPU compute backend
//!
//! Dense factorizations ([`linalg`]) and the Jacobi helpers they share are
//! generic over the element type. Level-1 kernels are picked per SIMD tier
//! through a [`KernelTable`] resolved from a [`CpuEnv`].

mod env;
pub mod jacobi;
pub mod kernels;
pub mod linalg;

pub use env::{CpuEnv, DEFAULT_PARALLEL_MIN_BLOCKS};
pub use kernels::simd::{SimdLevel, detect_simd};
pub use kernels::{KernelElement, KernelTable};
