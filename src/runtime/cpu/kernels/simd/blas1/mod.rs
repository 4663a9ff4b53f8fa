//! Level-1 vector kernels: dot product, axpy and scaling
//!
//! Each kernel exists as a scalar reference, a 4-way unrolled portable
//! version, and on x86-64 an AVX2+FMA version for f32 and f64.

#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_64;

use crate::runtime::cpu::jacobi::LinalgElement;

/// Scalar dot product over the common prefix of `a` and `b`
#[inline]
pub fn dot_scalar<T: LinalgElement>(a: &[T], b: &[T]) -> T {
    let mut sum = T::zero();
    for (&x, &y) in a.iter().zip(b) {
        sum = sum + x * y;
    }
    sum
}

/// Dot product with four independent accumulators
#[inline]
pub fn dot_unrolled<T: LinalgElement>(a: &[T], b: &[T]) -> T {
    let n = a.len().min(b.len());
    let (a, b) = (&a[..n], &b[..n]);
    let mut acc = [T::zero(); 4];
    let mut chunks_a = a.chunks_exact(4);
    let mut chunks_b = b.chunks_exact(4);
    for (ca, cb) in (&mut chunks_a).zip(&mut chunks_b) {
        acc[0] = acc[0] + ca[0] * cb[0];
        acc[1] = acc[1] + ca[1] * cb[1];
        acc[2] = acc[2] + ca[2] * cb[2];
        acc[3] = acc[3] + ca[3] * cb[3];
    }
    let tail = dot_scalar(chunks_a.remainder(), chunks_b.remainder());
    (acc[0] + acc[1]) + (acc[2] + acc[3]) + tail
}

/// Scalar `y += alpha * x`
#[inline]
pub fn axpy_scalar<T: LinalgElement>(alpha: T, x: &[T], y: &mut [T]) {
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = *yi + alpha * xi;
    }
}

/// `y += alpha * x` processed four elements at a time
#[inline]
pub fn axpy_unrolled<T: LinalgElement>(alpha: T, x: &[T], y: &mut [T]) {
    let n = x.len().min(y.len());
    let (x, y) = (&x[..n], &mut y[..n]);
    let mut chunks_y = y.chunks_exact_mut(4);
    let mut chunks_x = x.chunks_exact(4);
    for (cy, cx) in (&mut chunks_y).zip(&mut chunks_x) {
        cy[0] = cy[0] + alpha * cx[0];
        cy[1] = cy[1] + alpha * cx[1];
        cy[2] = cy[2] + alpha * cx[2];
        cy[3] = cy[3] + alpha * cx[3];
    }
    axpy_scalar(alpha, chunks_x.remainder(), chunks_y.into_remainder());
}

/// Scalar `x *= alpha`
#[inline]
pub fn scale_scalar<T: LinalgElement>(alpha: T, x: &mut [T]) {
    for xi in x.iter_mut() {
        *xi = *xi * alpha;
    }
}
