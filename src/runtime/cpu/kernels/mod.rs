//! CPU kernel dispatch
//!
//! A [`KernelTable`] bundles the level-1 kernels for one element type at one
//! SIMD level. Tables are resolved once per call site from the environment's
//! SIMD level and then passed by value into the decompositions.

pub mod simd;

use crate::dtype::DType;
use crate::runtime::cpu::jacobi::LinalgElement;
use simd::blas1;
use simd::{SimdLevel, detect_simd};

/// Dot product kernel signature
pub type DotFn<T> = fn(&[T], &[T]) -> T;
/// `y += alpha * x` kernel signature
pub type AxpyFn<T> = fn(T, &[T], &mut [T]);
/// `x *= alpha` kernel signature
pub type ScaleFn<T> = fn(T, &mut [T]);

/// Level-1 kernels selected for an element type and SIMD level
#[derive(Clone, Copy)]
pub struct KernelTable<T> {
    /// Level the kernels were selected for
    pub level: SimdLevel,
    /// Dot product over the common prefix of both slices
    pub dot: DotFn<T>,
    /// `y += alpha * x` over the common prefix
    pub axpy: AxpyFn<T>,
    /// In-place scaling
    pub scale: ScaleFn<T>,
}

impl<T> std::fmt::Debug for KernelTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelTable")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl<T: LinalgElement> KernelTable<T> {
    /// Portable kernels with no SIMD
    pub fn scalar() -> Self {
        Self {
            level: SimdLevel::Scalar,
            dot: blas1::dot_scalar::<T>,
            axpy: blas1::axpy_scalar::<T>,
            scale: blas1::scale_scalar::<T>,
        }
    }

    /// Portable kernels with four independent accumulators
    pub fn unrolled(level: SimdLevel) -> Self {
        Self {
            level,
            dot: blas1::dot_unrolled::<T>,
            axpy: blas1::axpy_unrolled::<T>,
            scale: blas1::scale_scalar::<T>,
        }
    }

    /// Euclidean norm of `x`
    #[inline]
    pub fn norm(&self, x: &[T]) -> T {
        (self.dot)(x, x).sqrt_val()
    }
}

/// Element types with a kernel table per SIMD level
pub trait KernelElement: LinalgElement {
    /// Select kernels for `level`, clamped to the detected level
    fn kernel_table(level: SimdLevel) -> KernelTable<Self> {
        let detected = detect_simd();
        // SAFETY: the level never exceeds what the CPU reported
        unsafe { Self::kernel_table_unchecked(level.min(detected)) }
    }

    /// Select kernels for `level` as requested
    ///
    /// # Safety
    /// `level` must not exceed [`detect_simd()`]; higher levels install
    /// kernels using instructions the CPU may lack.
    unsafe fn kernel_table_unchecked(level: SimdLevel) -> KernelTable<Self>;
}

// ============================================================================
// AVX2 wrappers
// ============================================================================

// SAFETY for all wrappers below: they are only installed by
// `kernel_table_unchecked` for levels with AVX2+FMA, whose callers guarantee
// the CPU supports that level.

#[cfg(target_arch = "x86_64")]
fn dot_avx2_f64(a: &[f64], b: &[f64]) -> f64 {
    unsafe { blas1::x86_64::dot_f64(a, b) }
}

#[cfg(target_arch = "x86_64")]
fn dot_avx2_f32(a: &[f32], b: &[f32]) -> f32 {
    unsafe { blas1::x86_64::dot_f32(a, b) }
}

#[cfg(target_arch = "x86_64")]
fn axpy_avx2_f64(alpha: f64, x: &[f64], y: &mut [f64]) {
    unsafe { blas1::x86_64::axpy_f64(alpha, x, y) }
}

#[cfg(target_arch = "x86_64")]
fn axpy_avx2_f32(alpha: f32, x: &[f32], y: &mut [f32]) {
    unsafe { blas1::x86_64::axpy_f32(alpha, x, y) }
}

impl KernelElement for f64 {
    unsafe fn kernel_table_unchecked(level: SimdLevel) -> KernelTable<Self> {
        let table = match level {
            #[cfg(target_arch = "x86_64")]
            l if l.has_avx2() => KernelTable {
                level: l,
                dot: dot_avx2_f64,
                axpy: axpy_avx2_f64,
                scale: blas1::scale_scalar::<f64>,
            },
            SimdLevel::Scalar => KernelTable::scalar(),
            l => KernelTable::unrolled(l),
        };
        log::trace!("kernel table for {}: {}", DType::F64, table.level);
        table
    }
}

impl KernelElement for f32 {
    unsafe fn kernel_table_unchecked(level: SimdLevel) -> KernelTable<Self> {
        let table = match level {
            #[cfg(target_arch = "x86_64")]
            l if l.has_avx2() => KernelTable {
                level: l,
                dot: dot_avx2_f32,
                axpy: axpy_avx2_f32,
                scale: blas1::scale_scalar::<f32>,
            },
            SimdLevel::Scalar => KernelTable::scalar(),
            l => KernelTable::unrolled(l),
        };
        log::trace!("kernel table for {}: {}", DType::F32, table.level);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_level_agrees() {
        let a: Vec<f64> = (0..23).map(|i| i as f64 * 0.5 - 3.0).collect();
        let b: Vec<f64> = (0..23).map(|i| (i as f64).cos()).collect();
        let reference = blas1::dot_scalar(&a, &b);

        let detected = detect_simd();
        for level in [SimdLevel::Scalar, SimdLevel::Neon, detected] {
            if level > detected {
                continue;
            }
            let k = f64::kernel_table(level);
            assert!(((k.dot)(&a, &b) - reference).abs() < 1e-12);

            let mut y = b.clone();
            (k.axpy)(2.0, &a, &mut y);
            for i in 0..a.len() {
                assert!((y[i] - (b[i] + 2.0 * a[i])).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_requested_level_is_clamped() {
        let detected = detect_simd();
        assert!(f64::kernel_table(SimdLevel::Avx512).level <= detected);
        assert!(f32::kernel_table(SimdLevel::Avx2Fma).level <= detected);
        assert_eq!(f64::kernel_table(SimdLevel::Scalar).level, SimdLevel::Scalar);

        let a = [1.0f32, 2.0, 3.0, 4.0, 5.0];
        let k = f32::kernel_table(SimdLevel::Avx512);
        assert_eq!((k.dot)(&a, &a), 55.0);
    }

    #[test]
    fn test_norm() {
        let k = f32::kernel_table(SimdLevel::Scalar);
        assert_eq!(k.norm(&[3.0, 4.0]), 5.0);
    }
}
