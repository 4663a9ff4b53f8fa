//! Jacobi rotation utilities for the one-sided SVD
//!
//! Matrices handled here are column-major: column `j` of an `rows × cols`
//! matrix occupies `data[j * rows..(j + 1) * rows]`. The rotation parameters
//! use the LAPACK formula to avoid catastrophic cancellation.

use crate::dtype::Element;

/// Table element usable by the factorization routines
///
/// Adds the few float operations the Householder, Jacobi and Cholesky
/// routines need on top of [`Element`].
pub trait LinalgElement: Element {
    /// Machine epsilon, widened to `f64`
    fn epsilon_val() -> f64;
    /// Absolute value
    fn abs_val(&self) -> Self;
    /// Square root
    fn sqrt_val(&self) -> Self;
    /// Negation
    fn neg_val(&self) -> Self;
}

macro_rules! impl_linalg_element {
    ($($t:ident),*) => {$(
        impl LinalgElement for $t {
            #[inline]
            fn epsilon_val() -> f64 {
                $t::EPSILON as f64
            }
            #[inline]
            fn abs_val(&self) -> Self {
                self.abs()
            }
            #[inline]
            fn sqrt_val(&self) -> Self {
                self.sqrt()
            }
            #[inline]
            fn neg_val(&self) -> Self {
                -*self
            }
        }
    )*};
}

impl_linalg_element!(f32, f64);

/// Jacobi rotation parameters (cosine and sine of rotation angle).
///
/// ```text
/// J = [ c  s ]
///     [-s  c ]
/// ```
#[derive(Debug, Clone, Copy)]
pub struct JacobiRotation {
    /// Cosine of rotation angle
    pub c: f64,
    /// Sine of rotation angle
    pub s: f64,
}

impl JacobiRotation {
    /// Compute the rotation that diagonalizes the 2×2 Gram block
    /// `[[a_pp, a_pq], [a_pq, a_qq]]`.
    ///
    /// # Algorithm
    /// ```text
    /// τ = (a_qq - a_pp) / (2 * a_pq)
    /// t = sign(τ) / (|τ| + sqrt(1 + τ²))
    /// c = 1 / sqrt(1 + t²)
    /// s = t * c
    /// ```
    #[inline]
    pub fn compute(a_pp: f64, a_qq: f64, a_pq: f64) -> Self {
        let tau_den = 2.0 * a_pq;
        if tau_den.abs() < 1e-300 {
            return Self { c: 1.0, s: 0.0 };
        }

        let tau = (a_qq - a_pp) / tau_den;
        let t = if tau >= 0.0 {
            1.0 / (tau + (1.0 + tau * tau).sqrt())
        } else {
            -1.0 / (-tau + (1.0 + tau * tau).sqrt())
        };

        let c = 1.0 / (1.0 + t * t).sqrt();
        Self { c, s: t * c }
    }

    /// Returns typed rotation parameters.
    #[inline]
    pub fn typed<T: LinalgElement>(&self) -> (T, T) {
        (T::from_f64(self.c), T::from_f64(self.s))
    }

    /// Rotate a pair of columns in place:
    /// `[p', q'] = [c·p - s·q, s·p + c·q]`.
    #[inline]
    pub fn apply<T: LinalgElement>(&self, col_p: &mut [T], col_q: &mut [T]) {
        let (c, s): (T, T) = self.typed();
        for (vp, vq) in col_p.iter_mut().zip(col_q.iter_mut()) {
            let (p, q) = (*vp, *vq);
            *vp = c * p - s * q;
            *vq = s * p + c * q;
        }
    }
}

/// Borrow columns `p < q` of a column-major matrix mutably at the same time.
#[inline]
pub fn column_pair_mut<T>(data: &mut [T], rows: usize, p: usize, q: usize) -> (&mut [T], &mut [T]) {
    debug_assert!(p < q);
    let (head, tail) = data.split_at_mut(q * rows);
    (&mut head[p * rows..(p + 1) * rows], &mut tail[..rows])
}

/// Sort indices by value (descending).
#[inline]
pub fn argsort_desc<T: LinalgElement>(values: &[T]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&i, &j| {
        values[j]
            .to_f64()
            .partial_cmp(&values[i].to_f64())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

/// Initialize an identity matrix [n × n].
#[inline]
pub fn identity_matrix<T: LinalgElement>(n: usize) -> Vec<T> {
    let mut result = vec![T::zero(); n * n];
    for i in 0..n {
        result[i * n + i] = T::one();
    }
    result
}
