//! Compute backends
//!
//! Only the CPU backend exists. Algorithms reach it through
//! [`cpu::CpuEnv`], which selects the kernels every factorization uses.

pub mod cpu;
