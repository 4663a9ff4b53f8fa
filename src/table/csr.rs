//! Compressed sparse row table

use super::{NumericTable, StorageLayout};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use std::any::Any;

/// Sparse table in compressed sparse row format (zero-based indices)
#[derive(Clone, Debug, PartialEq)]
pub struct CsrTable<T: Element> {
    n_rows: usize,
    n_columns: usize,
    values: Vec<T>,
    column_indices: Vec<usize>,
    row_offsets: Vec<usize>,
}

impl<T: Element> CsrTable<T> {
    /// Create a CSR table, validating the index structure
    ///
    /// `row_offsets` has `n_rows + 1` non-decreasing entries starting at 0 and
    /// ending at `values.len()`; every column index is below `n_columns`.
    pub fn new(
        n_rows: usize,
        n_columns: usize,
        values: Vec<T>,
        column_indices: Vec<usize>,
        row_offsets: Vec<usize>,
    ) -> Result<Self> {
        if row_offsets.len() != n_rows + 1 {
            return Err(Error::element_count(
                "rowOffsets",
                crate::error::Bound::Exactly(n_rows + 1),
                row_offsets.len(),
            ));
        }
        if column_indices.len() != values.len() {
            return Err(Error::element_count(
                "columnIndices",
                crate::error::Bound::Exactly(values.len()),
                column_indices.len(),
            ));
        }
        if row_offsets[0] != 0
            || row_offsets[n_rows] != values.len()
            || row_offsets.windows(2).any(|w| w[0] > w[1])
        {
            return Err(Error::parameter(
                "rowOffsets",
                "offsets must start at 0, be non-decreasing and end at the value count",
            ));
        }
        if let Some(&bad) = column_indices.iter().find(|&&c| c >= n_columns) {
            return Err(Error::parameter(
                "columnIndices",
                format!("column index {bad} out of range for {n_columns} columns"),
            ));
        }
        Ok(Self {
            n_rows,
            n_columns,
            values,
            column_indices,
            row_offsets,
        })
    }

    /// Build from a dense row-major buffer, dropping exact zeros
    pub fn from_dense(n_rows: usize, n_columns: usize, dense: &[T]) -> Self {
        let mut values = Vec::new();
        let mut column_indices = Vec::new();
        let mut row_offsets = Vec::with_capacity(n_rows + 1);
        row_offsets.push(0);
        for i in 0..n_rows {
            for j in 0..n_columns {
                let v = dense[i * n_columns + j];
                if v != T::zero() {
                    values.push(v);
                    column_indices.push(j);
                }
            }
            row_offsets.push(values.len());
        }
        Self {
            n_rows,
            n_columns,
            values,
            column_indices,
            row_offsets,
        }
    }

    /// Stored (value, column) pairs of one row
    #[inline]
    pub fn row(&self, i: usize) -> (&[T], &[usize]) {
        let range = self.row_offsets[i]..self.row_offsets[i + 1];
        (&self.values[range.clone()], &self.column_indices[range])
    }

    /// Number of stored entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }
}

impl<T: Element> NumericTable for CsrTable<T> {
    fn n_rows(&self) -> usize {
        self.n_rows
    }

    fn n_columns(&self) -> usize {
        self.n_columns
    }

    fn layout(&self) -> StorageLayout {
        StorageLayout::CSR
    }

    fn dtype(&self) -> DType {
        T::DTYPE
    }

    fn to_dense_f64(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.n_rows * self.n_columns];
        for i in 0..self.n_rows {
            let (values, columns) = self.row(i);
            for (&v, &j) in values.iter().zip(columns) {
                out[i * self.n_columns + j] = v.to_f64();
            }
        }
        out
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
