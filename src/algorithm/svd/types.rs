//! SVD input, parameter and method

use crate::algorithm::validation::TableCheck;
use crate::algorithm::{self, ArgumentContainer, SlotId};
use crate::error::{Bound, Status};
use crate::table::TableRef;

slot_ids! {
    /// Input slots
    pub enum InputId {
        /// Observations, one row per vector
        Data => "data",
    }
}

/// Computation method
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// Dense Householder QR per block, Jacobi SVD on the stacked R factors
    #[default]
    DefaultDense,
}

impl algorithm::Method for Method {}

/// Whether an optional output is produced
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResultFormat {
    /// Output is skipped, its intermediate data is not retained
    NotRequired,
    /// Output is produced
    #[default]
    Required,
}

/// SVD parameters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Parameter {
    /// Whether the left singular matrix is computed
    pub left_singular_matrix: ResultFormat,
}

impl Parameter {
    /// Set whether the left singular matrix is computed
    pub fn with_left_singular_matrix(mut self, format: ResultFormat) -> Self {
        self.left_singular_matrix = format;
        self
    }

    /// Returns true if left singular vectors are requested
    #[inline]
    pub fn requires_left(&self) -> bool {
        self.left_singular_matrix != ResultFormat::NotRequired
    }
}

impl algorithm::Parameter for Parameter {}

/// SVD input
#[derive(Clone, Debug, Default)]
pub struct Input {
    args: ArgumentContainer<InputId>,
}

impl Input {
    /// Empty input
    pub fn new() -> Self {
        Self::default()
    }

    /// Input with `data` set
    pub fn from_data(data: TableRef) -> Self {
        let mut input = Self::new();
        input.set(InputId::Data, data);
        input
    }

    /// Table in slot `id`
    pub fn get(&self, id: InputId) -> Option<&TableRef> {
        self.args.table(id)
    }

    /// Set slot `id`
    pub fn set(&mut self, id: InputId, table: TableRef) {
        self.args.set(id, table);
    }

    /// Feature count of `data`, 0 if absent
    pub fn n_features(&self) -> usize {
        self.get(InputId::Data).map_or(0, |t| t.n_columns())
    }

    /// Row count of `data`, 0 if absent
    pub fn n_vectors(&self) -> usize {
        self.get(InputId::Data).map_or(0, |t| t.n_rows())
    }

    /// Validate `data`: dense, at least one column, no fewer rows than
    /// columns, every value finite
    pub fn check(&self, _parameter: &Parameter, method: Method) -> Status {
        match method {
            Method::DefaultDense => {
                let data = self.get(InputId::Data);
                TableCheck::new(InputId::Data.name())
                    .dense()
                    .columns(Bound::AtLeast(1))
                    .check(data)?;
                let n_features = self.n_features();
                TableCheck::new(InputId::Data.name())
                    .rows(Bound::AtLeast(n_features))
                    .finite()
                    .check(data)
            }
        }
    }
}
