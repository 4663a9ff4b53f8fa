//! Packed symmetric and triangular square tables

use super::{NumericTable, StorageLayout};
use crate::dtype::{DType, Element};
use std::any::Any;

/// Square table storing one triangle packed by rows
///
/// For an upper layout row `i` stores columns `i..n`; for a lower layout row
/// `i` stores columns `0..=i`. Symmetric layouts mirror the stored triangle,
/// triangular layouts read zeros outside it.
#[derive(Clone, Debug, PartialEq)]
pub struct PackedTable<T: Element> {
    n: usize,
    layout: StorageLayout,
    data: Vec<T>,
}

impl<T: Element> PackedTable<T> {
    /// Create a packed table
    ///
    /// # Panics
    /// Panics if `layout` is not a single packed layout or if
    /// `data.len() != n * (n + 1) / 2`.
    pub fn new(n: usize, layout: StorageLayout, data: Vec<T>) -> Self {
        assert!(
            layout.is_packed() && layout.without(StorageLayout::PACKED) == StorageLayout::NONE,
            "{layout} is not a packed layout"
        );
        assert_eq!(data.len(), n * (n + 1) / 2, "packed data length mismatch");
        Self { n, layout, data }
    }

    fn is_upper(&self) -> bool {
        self.layout.intersects(
            StorageLayout::UPPER_PACKED_SYMMETRIC | StorageLayout::UPPER_PACKED_TRIANGULAR,
        )
    }

    fn is_symmetric(&self) -> bool {
        self.layout.intersects(
            StorageLayout::UPPER_PACKED_SYMMETRIC | StorageLayout::LOWER_PACKED_SYMMETRIC,
        )
    }

    /// Element at (row, column) of the full square matrix
    pub fn get(&self, row: usize, column: usize) -> T {
        let (i, j) = if self.is_symmetric() && (self.is_upper() == (row > column)) {
            (column, row)
        } else {
            (row, column)
        };
        if self.is_upper() {
            if j < i {
                return T::zero();
            }
            // Rows 0..i hold n + (n-1) + ... + (n-i+1) elements
            let offset = i * self.n - i * (i.saturating_sub(1)) / 2;
            self.data[offset + (j - i)]
        } else {
            if j > i {
                return T::zero();
            }
            self.data[i * (i + 1) / 2 + j]
        }
    }
}

impl<T: Element> NumericTable for PackedTable<T> {
    fn n_rows(&self) -> usize {
        self.n
    }

    fn n_columns(&self) -> usize {
        self.n
    }

    fn layout(&self) -> StorageLayout {
        self.layout
    }

    fn dtype(&self) -> DType {
        T::DTYPE
    }

    fn to_dense_f64(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.n * self.n);
        for i in 0..self.n {
            for j in 0..self.n {
                out.push(self.get(i, j).to_f64());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_triangular_expansion() {
        // [[1, 2, 3], [0, 4, 5], [0, 0, 6]]
        let t = PackedTable::new(
            3,
            StorageLayout::UPPER_PACKED_TRIANGULAR,
            vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0],
        );
        assert_eq!(
            t.to_dense_f64(),
            vec![1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 0.0, 0.0, 6.0]
        );
    }

    #[test]
    fn test_lower_symmetric_expansion() {
        // lower rows: [1], [2, 3], [4, 5, 6]
        let t = PackedTable::new(
            3,
            StorageLayout::LOWER_PACKED_SYMMETRIC,
            vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0],
        );
        assert_eq!(
            t.to_dense_f64(),
            vec![1.0, 2.0, 4.0, 2.0, 3.0, 5.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_upper_symmetric_expansion() {
        let t = PackedTable::new(
            2,
            StorageLayout::UPPER_PACKED_SYMMETRIC,
            vec![1.0f64, 2.0, 3.0],
        );
        assert_eq!(t.to_dense_f64(), vec![1.0, 2.0, 2.0, 3.0]);
    }
}
