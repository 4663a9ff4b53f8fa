//! SVD result and its allocation

use super::partial::PartialResult;
use super::types::{Input, Parameter};
use crate::algorithm::registry::ids;
use crate::algorithm::validation::TableCheck;
use crate::algorithm::{ArgumentContainer, Registered, SlotId};
use crate::dtype::DType;
use crate::error::{Bound, Status};
use crate::table::{TableRef, allocate_table};

slot_ids! {
    /// Result slots
    pub enum ResultId {
        /// Singular values, one row of `m` values in descending order
        SingularValues => "singularValues",
        /// Left singular vectors, `n × m`
        LeftSingularMatrix => "leftSingularMatrix",
        /// Transposed right singular vectors, `m × m`
        RightSingularMatrix => "rightSingularMatrix",
    }
}

/// Final SVD outputs
#[derive(Clone, Debug, Default)]
pub struct Result {
    args: ArgumentContainer<ResultId>,
}

impl Registered for Result {
    const SERIALIZATION_ID: u32 = ids::SVD_RESULT;
    const TYPE_NAME: &'static str = "svd::Result";
}

impl Result {
    /// Result with no tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Table in slot `id`
    pub fn get(&self, id: ResultId) -> Option<&TableRef> {
        self.args.table(id)
    }

    /// Set slot `id`
    pub fn set(&mut self, id: ResultId, table: TableRef) {
        self.args.set(id, table);
    }

    pub(crate) fn table_mut(&mut self, id: ResultId) -> Option<&mut TableRef> {
        self.args.table_mut(id)
    }

    /// Allocate zeroed outputs sized from a batch input
    pub fn allocate(&mut self, dtype: DType, input: &Input, _parameter: &Parameter) {
        self.allocate_impl(dtype, input.n_features(), input.n_vectors());
    }

    /// Allocate zeroed outputs sized from accumulated blocks
    ///
    /// The feature count comes from the first R factor and the row count is
    /// the total row count of the Q factors.
    pub fn allocate_from_partial(&mut self, dtype: DType, partial: &PartialResult, _parameter: &Parameter) {
        self.allocate_impl(dtype, partial.n_features().unwrap_or(0), partial.n_rows());
    }

    /// Replaces previously allocated tables. The left singular matrix is
    /// allocated only for a nonzero row count.
    pub(crate) fn allocate_impl(&mut self, dtype: DType, m: usize, n: usize) {
        self.set(ResultId::SingularValues, allocate_table(dtype, 1, m));
        self.set(ResultId::RightSingularMatrix, allocate_table(dtype, m, m));
        if n != 0 {
            self.set(ResultId::LeftSingularMatrix, allocate_table(dtype, n, m));
        } else {
            self.args.clear(ResultId::LeftSingularMatrix);
        }
    }

    /// Validate output shapes for `m` features and `n` rows
    ///
    /// The left singular matrix is checked only when requested.
    pub fn check(&self, parameter: &Parameter, m: usize, n: usize) -> Status {
        let exactly = Bound::Exactly;
        TableCheck::new(ResultId::SingularValues.name())
            .dense()
            .rows(exactly(1))
            .columns(exactly(m))
            .check(self.get(ResultId::SingularValues))?;
        TableCheck::new(ResultId::RightSingularMatrix.name())
            .dense()
            .rows(exactly(m))
            .columns(exactly(m))
            .check(self.get(ResultId::RightSingularMatrix))?;
        if parameter.requires_left() {
            TableCheck::new(ResultId::LeftSingularMatrix.name())
                .dense()
                .rows(exactly(n))
                .columns(exactly(m))
                .check(self.get(ResultId::LeftSingularMatrix))?;
        }
        Ok(())
    }
}
