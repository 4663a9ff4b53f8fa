//! Common test utilities
#![allow(dead_code)]

use numalg::table::{HomogenTable, NumericTable, TableRef};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Seeded uniform `[-1, 1)` table of `rows × cols`
pub fn random_table(rows: usize, cols: usize, seed: u64) -> HomogenTable<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..rows * cols).map(|_| rng.gen_range(-1.0..1.0)).collect();
    HomogenTable::from_vec(rows, cols, data)
}

/// Seeded table wrapped in a shared handle
pub fn random_ref(rows: usize, cols: usize, seed: u64) -> TableRef {
    Arc::new(random_table(rows, cols, seed))
}

/// Row-major `f64` copy of any table
pub fn dense(table: &TableRef) -> Vec<f64> {
    table.to_dense_f64()
}

/// Shape of a table as `(rows, columns)`
pub fn shape(table: &TableRef) -> (usize, usize) {
    (table.n_rows(), table.n_columns())
}

/// Vertical concatenation of row-major tables with equal column counts
pub fn vstack(tables: &[TableRef]) -> Vec<f64> {
    tables.iter().flat_map(|t| t.to_dense_f64()).collect()
}

/// Assert the columns of a row-major `rows × cols` matrix are orthonormal
pub fn assert_orthonormal_columns(a: &[f64], rows: usize, cols: usize, tol: f64, msg: &str) {
    for p in 0..cols {
        for q in p..cols {
            let dot: f64 = (0..rows).map(|i| a[i * cols + p] * a[i * cols + q]).sum();
            let expected = if p == q { 1.0 } else { 0.0 };
            assert!(
                (dot - expected).abs() <= tol,
                "{}: columns {} and {} have inner product {}",
                msg,
                p,
                q,
                dot
            );
        }
    }
}

/// Assert the rows of a row-major `rows × cols` matrix are orthonormal
pub fn assert_orthonormal_rows(a: &[f64], rows: usize, cols: usize, tol: f64, msg: &str) {
    let transposed: Vec<f64> = (0..cols * rows)
        .map(|k| a[(k % rows) * cols + k / rows])
        .collect();
    assert_orthonormal_columns(&transposed, cols, rows, tol, msg);
}

/// `U · diag(σ) · Vᵀ` for row-major `u` (`n × m`) and `vt` (`m × m`)
pub fn reconstruct(u: &[f64], sigma: &[f64], vt: &[f64], n: usize, m: usize) -> Vec<f64> {
    let mut out = vec![0.0; n * m];
    for i in 0..n {
        for j in 0..m {
            out[i * m + j] = (0..m).map(|k| u[i * m + k] * sigma[k] * vt[k * m + j]).sum();
        }
    }
    out
}

/// `Σᵀ Σ` reconstruction check without U: `Xᵀ X = V · diag(σ²) · Vᵀ`
pub fn gram_from_factors(sigma: &[f64], vt: &[f64], m: usize) -> Vec<f64> {
    let mut out = vec![0.0; m * m];
    for a in 0..m {
        for b in 0..m {
            out[a * m + b] = (0..m).map(|k| vt[k * m + a] * sigma[k] * sigma[k] * vt[k * m + b]).sum();
        }
    }
    out
}

/// `Xᵀ X` of a row-major `n × m` matrix
pub fn gram(x: &[f64], n: usize, m: usize) -> Vec<f64> {
    let mut out = vec![0.0; m * m];
    for a in 0..m {
        for b in 0..m {
            out[a * m + b] = (0..n).map(|i| x[i * m + a] * x[i * m + b]).sum();
        }
    }
    out
}
