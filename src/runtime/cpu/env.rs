//! CPU execution environment

use super::kernels::simd::{SimdLevel, detect_simd};
use super::kernels::{KernelElement, KernelTable};

/// Default block count from which per-block loops run in parallel
pub const DEFAULT_PARALLEL_MIN_BLOCKS: usize = 4;

/// Execution settings shared by every computation of a session
///
/// Holds the SIMD tier kernels are selected for and the threshold above
/// which per-block loops are spread across the rayon pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuEnv {
    simd_level: SimdLevel,
    parallel_min_blocks: usize,
}

impl Default for CpuEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuEnv {
    /// Environment using the detected SIMD level
    pub fn new() -> Self {
        Self {
            simd_level: detect_simd(),
            parallel_min_blocks: DEFAULT_PARALLEL_MIN_BLOCKS,
        }
    }

    /// Request a SIMD level; levels above the detected one are clamped
    pub fn with_simd_level(mut self, level: SimdLevel) -> Self {
        let detected = detect_simd();
        if level > detected {
            log::warn!("requested SIMD level {level} exceeds detected {detected}, using {detected}");
            self.simd_level = detected;
        } else {
            self.simd_level = level;
        }
        self
    }

    /// Set the block count from which loops run in parallel
    pub fn with_parallel_min_blocks(mut self, blocks: usize) -> Self {
        self.parallel_min_blocks = blocks.max(1);
        self
    }

    /// SIMD level kernels are selected for
    #[inline]
    pub fn simd_level(&self) -> SimdLevel {
        self.simd_level
    }

    /// Block count from which loops run in parallel
    #[inline]
    pub fn parallel_min_blocks(&self) -> usize {
        self.parallel_min_blocks
    }

    /// Kernel table for element type `T`
    #[inline]
    pub fn kernels<T: KernelElement>(&self) -> KernelTable<T> {
        T::kernel_table(self.simd_level)
    }

    /// Apply `f` to every item, in parallel when the rayon feature is enabled
    /// and there are enough items. Output order matches input order.
    pub fn map_blocks<I, R, E, F>(&self, items: &[I], f: F) -> Result<Vec<R>, E>
    where
        I: Sync,
        R: Send,
        E: Send,
        F: Fn(usize, &I) -> Result<R, E> + Sync + Send,
    {
        #[cfg(feature = "rayon")]
        {
            if items.len() >= self.parallel_min_blocks {
                use rayon::prelude::*;
                return items.par_iter().enumerate().map(|(i, item)| f(i, item)).collect();
            }
        }
        items.iter().enumerate().map(|(i, item)| f(i, item)).collect()
    }
}
