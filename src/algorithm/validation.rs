//! Shape and layout checks shared by every algorithm's `check`
//!
//! Checks short-circuit: the first violated rule is reported together with
//! the symbolic name of the offending argument.

use crate::dtype::Element;
use crate::error::{Bound, Dimension, Error, Status};
use crate::table::{NumericTable, StorageLayout, TableCollection, TableRef, read_dense};

/// Layouts rejected by algorithms that need dense input
pub const DENSE_FORBIDDEN: StorageLayout = StorageLayout::PACKED.union(StorageLayout::CSR);

/// Check a table reference against layout and minimum-size rules
///
/// `min_rows` and `min_columns` of zero leave that dimension unconstrained.
pub fn check_table(
    table: Option<&TableRef>,
    name: &'static str,
    forbidden: StorageLayout,
    min_rows: usize,
    min_columns: usize,
) -> Status {
    TableCheck::new(name)
        .forbid(forbidden)
        .rows(at_least(min_rows))
        .columns(at_least(min_columns))
        .check(table)
}

#[inline]
fn at_least(min: usize) -> Bound {
    if min == 0 { Bound::Any } else { Bound::AtLeast(min) }
}

/// Table validation rule set
///
/// Rules apply in order: presence, layout, rows, columns, values.
#[derive(Clone, Copy, Debug)]
pub struct TableCheck {
    name: &'static str,
    forbidden: StorageLayout,
    rows: Bound,
    columns: Bound,
    finite: bool,
}

impl TableCheck {
    /// Rule set for the argument `name` with no constraints
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            forbidden: StorageLayout::NONE,
            rows: Bound::Any,
            columns: Bound::Any,
            finite: false,
        }
    }

    /// Reject tables whose layout intersects `mask`
    pub fn forbid(mut self, mask: StorageLayout) -> Self {
        self.forbidden |= mask;
        self
    }

    /// Reject anything but dense layouts
    pub fn dense(self) -> Self {
        self.forbid(DENSE_FORBIDDEN)
    }

    /// Row count requirement
    pub fn rows(mut self, bound: Bound) -> Self {
        self.rows = bound;
        self
    }

    /// Column count requirement
    pub fn columns(mut self, bound: Bound) -> Self {
        self.columns = bound;
        self
    }

    /// Reject NaN and infinities
    ///
    /// Scans every value, so use it on inputs before they are accumulated
    /// rather than on every pass over stored factors.
    pub fn finite(mut self) -> Self {
        self.finite = true;
        self
    }

    /// Validate an optional table reference
    pub fn check(&self, table: Option<&TableRef>) -> Status {
        match table {
            Some(table) => self.check_table(&**table),
            None => Err(Error::null(self.name)),
        }
    }

    /// Validate a present table
    pub fn check_table(&self, table: &dyn NumericTable) -> Status {
        let layout = table.layout();
        if layout.intersects(self.forbidden) {
            return Err(Error::IncorrectLayout {
                arg: self.name,
                layout,
            });
        }
        if !self.rows.admits(table.n_rows()) {
            return Err(Error::shape(self.name, Dimension::Rows, self.rows, table.n_rows()));
        }
        if !self.columns.admits(table.n_columns()) {
            return Err(Error::shape(
                self.name,
                Dimension::Columns,
                self.columns,
                table.n_columns(),
            ));
        }
        if self.finite {
            if let Some(index) = first_non_finite(table) {
                let columns = table.n_columns().max(1);
                return Err(Error::NonFiniteValue {
                    arg: self.name,
                    row: index / columns,
                    column: index % columns,
                });
            }
        }
        Ok(())
    }

    /// Validate entry `index` of `collection` and return it
    ///
    /// Empty entries and nested collections are reported against
    /// `collection_name`; rule violations against this check's own name.
    pub fn check_entry<'a>(
        &self,
        collection: &'a TableCollection,
        collection_name: &'static str,
        index: usize,
    ) -> crate::error::Result<&'a TableRef> {
        let entry = collection.get(index).ok_or(Error::NullCollectionElement {
            arg: collection_name,
            index,
        })?;
        let table = entry.as_table().ok_or(Error::IncorrectElementType {
            arg: collection_name,
            index,
        })?;
        self.check_table(&**table)?;
        Ok(table)
    }
}

/// Row-major position of the first NaN or infinity in `table`
fn first_non_finite(table: &dyn NumericTable) -> Option<usize> {
    crate::dispatch_dtype!(table.dtype(), T => {
        read_dense::<T>(table).iter().position(|v| !v.is_finite_val())
    })
}
