//! AVX2+FMA level-1 kernels
//!
//! Callers must only select these after `detect_simd()` reported AVX2+FMA.

#![allow(unsafe_op_in_unsafe_fn)]

use std::arch::x86_64::*;

/// # Safety
/// The CPU must support AVX2 and FMA.
#[target_feature(enable = "avx2,fma")]
pub unsafe fn dot_f64(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    let chunks = n / 4;
    let mut acc = _mm256_setzero_pd();
    for i in 0..chunks {
        let va = _mm256_loadu_pd(a.as_ptr().add(i * 4));
        let vb = _mm256_loadu_pd(b.as_ptr().add(i * 4));
        acc = _mm256_fmadd_pd(va, vb, acc);
    }
    let mut lanes = [0.0f64; 4];
    _mm256_storeu_pd(lanes.as_mut_ptr(), acc);
    let mut sum = (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]);
    for i in chunks * 4..n {
        sum += a[i] * b[i];
    }
    sum
}

/// # Safety
/// The CPU must support AVX2 and FMA.
#[target_feature(enable = "avx2,fma")]
pub unsafe fn dot_f32(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    let chunks = n / 8;
    let mut acc = _mm256_setzero_ps();
    for i in 0..chunks {
        let va = _mm256_loadu_ps(a.as_ptr().add(i * 8));
        let vb = _mm256_loadu_ps(b.as_ptr().add(i * 8));
        acc = _mm256_fmadd_ps(va, vb, acc);
    }
    let mut lanes = [0.0f32; 8];
    _mm256_storeu_ps(lanes.as_mut_ptr(), acc);
    let mut sum = lanes.iter().sum::<f32>();
    for i in chunks * 8..n {
        sum += a[i] * b[i];
    }
    sum
}

/// # Safety
/// The CPU must support AVX2 and FMA.
#[target_feature(enable = "avx2,fma")]
pub unsafe fn axpy_f64(alpha: f64, x: &[f64], y: &mut [f64]) {
    let n = x.len().min(y.len());
    let chunks = n / 4;
    let va = _mm256_set1_pd(alpha);
    for i in 0..chunks {
        let px = x.as_ptr().add(i * 4);
        let py = y.as_mut_ptr().add(i * 4);
        let r = _mm256_fmadd_pd(va, _mm256_loadu_pd(px), _mm256_loadu_pd(py));
        _mm256_storeu_pd(py, r);
    }
    for i in chunks * 4..n {
        y[i] += alpha * x[i];
    }
}

/// # Safety
/// The CPU must support AVX2 and FMA.
#[target_feature(enable = "avx2,fma")]
pub unsafe fn axpy_f32(alpha: f32, x: &[f32], y: &mut [f32]) {
    let n = x.len().min(y.len());
    let chunks = n / 8;
    let va = _mm256_set1_ps(alpha);
    for i in 0..chunks {
        let px = x.as_ptr().add(i * 8);
        let py = y.as_mut_ptr().add(i * 8);
        let r = _mm256_fmadd_ps(va, _mm256_loadu_ps(px), _mm256_loadu_ps(py));
        _mm256_storeu_ps(py, r);
    }
    for i in chunks * 8..n {
        y[i] += alpha * x[i];
    }
}
