//! Numeric tables: the 2-D buffers algorithms consume and produce
//!
//! Algorithms only rely on the [`NumericTable`] contract: shape accessors, a
//! layout tag and a dense read-out. Tables are shared through [`TableRef`]
//! handles, so an input table handed to several algorithms is never copied.

mod collection;
mod csr;
mod homogen;
mod layout;
mod packed;

pub use collection::TableCollection;
pub use csr::CsrTable;
pub use homogen::HomogenTable;
pub use layout::StorageLayout;
pub use packed::PackedTable;

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use std::any::Any;
use std::borrow::Cow;
use std::fmt::Debug;
use std::sync::Arc;

/// Shared, reference-counted handle to a numeric table
pub type TableRef = Arc<dyn NumericTable>;

/// Contract every numeric table implements
pub trait NumericTable: Debug + Send + Sync + 'static {
    /// Number of rows (observations)
    fn n_rows(&self) -> usize;

    /// Number of columns (features)
    fn n_columns(&self) -> usize;

    /// Storage layout tag
    fn layout(&self) -> StorageLayout;

    /// Element precision
    fn dtype(&self) -> DType;

    /// Dense row-major copy of the table contents in f64
    fn to_dense_f64(&self) -> Vec<f64>;

    /// Upcast for concrete-type access
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for concrete-type access
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Allocate a zero-initialized dense table of the given precision and shape
pub fn allocate_table(dtype: DType, n_rows: usize, n_columns: usize) -> TableRef {
    match dtype {
        DType::F64 => Arc::new(HomogenTable::<f64>::zeros(n_rows, n_columns)),
        DType::F32 => Arc::new(HomogenTable::<f32>::zeros(n_rows, n_columns)),
    }
}

/// Read any table as dense row-major data of precision `T`
///
/// Dense tables of the same precision are borrowed; every other table is
/// converted.
pub fn read_dense<T: Element>(table: &dyn NumericTable) -> Cow<'_, [T]> {
    if let Some(dense) = table.as_any().downcast_ref::<HomogenTable<T>>() {
        return Cow::Borrowed(dense.as_slice());
    }
    Cow::Owned(table.to_dense_f64().into_iter().map(T::from_f64).collect())
}

/// Get mutable access to a dense table behind a uniquely owned handle
pub fn dense_mut<'a, T: Element>(
    table: &'a mut TableRef,
    arg: &'static str,
) -> Result<&'a mut HomogenTable<T>> {
    let table = Arc::get_mut(table)
        .ok_or_else(|| Error::Internal(format!("table '{arg}' is shared and cannot be filled")))?;
    table
        .as_any_mut()
        .downcast_mut::<HomogenTable<T>>()
        .ok_or_else(|| {
            Error::Internal(format!(
                "table '{arg}' is not a dense {} table",
                T::DTYPE
            ))
        })
}
