//! Dense row-major table

use super::{NumericTable, StorageLayout};
use crate::dtype::{DType, Element};
use std::any::Any;

/// Dense table of a single precision, stored row-major
#[derive(Clone, Debug, PartialEq)]
pub struct HomogenTable<T: Element> {
    n_rows: usize,
    n_columns: usize,
    data: Vec<T>,
}

impl<T: Element> HomogenTable<T> {
    /// Create a zero-filled table
    pub fn zeros(n_rows: usize, n_columns: usize) -> Self {
        Self {
            n_rows,
            n_columns,
            data: vec![T::zero(); n_rows * n_columns],
        }
    }

    /// Create a table from row-major data
    ///
    /// # Panics
    /// Panics if `data.len() != n_rows * n_columns`.
    pub fn from_vec(n_rows: usize, n_columns: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            n_rows * n_columns,
            "data length does not match {n_rows}x{n_columns} table"
        );
        Self {
            n_rows,
            n_columns,
            data,
        }
    }

    /// Create a table from equally long rows
    ///
    /// # Panics
    /// Panics if the rows differ in length.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Self {
        let n_columns = rows.first().map_or(0, |row| row.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * n_columns);
        for row in rows {
            let row = row.as_ref();
            assert_eq!(row.len(), n_columns, "ragged rows");
            data.extend_from_slice(row);
        }
        Self {
            n_rows: rows.len(),
            n_columns,
            data,
        }
    }

    /// Row-major contents
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable row-major contents
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Raw bytes of the contents
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// One row
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.n_columns..(i + 1) * self.n_columns]
    }

    /// Element at (row, column)
    #[inline]
    pub fn get(&self, row: usize, column: usize) -> T {
        self.data[row * self.n_columns + column]
    }

    /// Consume into row-major data
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Element> NumericTable for HomogenTable<T> {
    fn n_rows(&self) -> usize {
        self.n_rows
    }

    fn n_columns(&self) -> usize {
        self.n_columns
    }

    fn layout(&self) -> StorageLayout {
        StorageLayout::ROW_MAJOR
    }

    fn dtype(&self) -> DType {
        T::DTYPE
    }

    fn to_dense_f64(&self) -> Vec<f64> {
        self.data.iter().map(|v| v.to_f64()).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let t = HomogenTable::from_rows(&[[1.0f64, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.n_columns(), 2);
        assert_eq!(t.row(1), &[3.0, 4.0]);
        assert_eq!(t.get(2, 0), 5.0);
    }

    #[test]
    fn test_as_bytes_len() {
        let t = HomogenTable::<f32>::zeros(2, 3);
        assert_eq!(t.as_bytes().len(), 2 * 3 * 4);
    }

    #[test]
    #[should_panic(expected = "data length")]
    fn test_from_vec_length_mismatch() {
        let _ = HomogenTable::<f64>::from_vec(2, 2, vec![1.0; 3]);
    }
}
