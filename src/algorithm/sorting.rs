//! Column-wise sorting, batch
//!
//! Every column of `data` is sorted ascending independently. NaN values
//! compare equal to everything and keep no particular position.

use crate::algorithm::validation::TableCheck;
use crate::algorithm::{self, ArgumentContainer, BatchAlgorithm, Registered, SlotId, ids};
use crate::dtype::{DType, Element};
use crate::error::{self, Bound, Error, Status};
use crate::runtime::cpu::CpuEnv;
use crate::runtime::cpu::linalg::{from_column_major, to_column_major};
use crate::table::{HomogenTable, NumericTable, TableRef, allocate_table, read_dense};
use std::cmp::Ordering;
use std::sync::Arc;

slot_ids! {
    /// Input slots
    pub enum InputId {
        /// Observations to sort, `n × p`
        Data => "data",
    }
}

slot_ids! {
    /// Result slots
    pub enum ResultId {
        /// Sorted observations, same shape as `data`
        SortedData => "sortedData",
    }
}

/// Sorting method
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// Comparison sort of each dense column
    #[default]
    DefaultDense,
}

impl algorithm::Method for Method {}

/// Sorting has no parameters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Parameter;

impl algorithm::Parameter for Parameter {}

/// Sorting input
#[derive(Clone, Debug, Default)]
pub struct Input {
    args: ArgumentContainer<InputId>,
}

impl Input {
    /// Input with `data` set
    pub fn from_data(data: TableRef) -> Self {
        let mut args = ArgumentContainer::new();
        args.set(InputId::Data, data);
        Self { args }
    }

    /// Table in slot `id`
    pub fn get(&self, id: InputId) -> Option<&TableRef> {
        self.args.table(id)
    }

    /// Set slot `id`
    pub fn set(&mut self, id: InputId, table: TableRef) {
        self.args.set(id, table);
    }

    /// Validate `data`: dense and non-empty
    pub fn check(&self) -> Status {
        TableCheck::new(InputId::Data.name())
            .dense()
            .rows(Bound::AtLeast(1))
            .columns(Bound::AtLeast(1))
            .check(self.get(InputId::Data))
    }
}

/// Sorted observations
#[derive(Clone, Debug, Default)]
pub struct Result {
    args: ArgumentContainer<ResultId>,
}

impl Registered for Result {
    const SERIALIZATION_ID: u32 = ids::SORTING_RESULT;
    const TYPE_NAME: &'static str = "sorting::Result";
}

impl Result {
    /// Table in slot `id`
    pub fn get(&self, id: ResultId) -> Option<&TableRef> {
        self.args.table(id)
    }

    /// Set slot `id`
    pub fn set(&mut self, id: ResultId, table: TableRef) {
        self.args.set(id, table);
    }

    /// Allocate a zeroed output shaped like the input's `data`
    pub fn allocate(&mut self, dtype: DType, input: &Input) -> Status {
        let data = input.args.require_table(InputId::Data)?;
        self.set(
            ResultId::SortedData,
            allocate_table(dtype, data.n_rows(), data.n_columns()),
        );
        Ok(())
    }

    /// Validate the output against the input's shape
    pub fn check(&self, input: &Input) -> Status {
        let data = input.args.require_table(InputId::Data)?;
        TableCheck::new(ResultId::SortedData.name())
            .dense()
            .rows(Bound::Exactly(data.n_rows()))
            .columns(Bound::Exactly(data.n_columns()))
            .check(self.get(ResultId::SortedData))
    }
}

/// Column-wise sorting marker
#[derive(Copy, Clone, Debug, Default)]
pub struct Sorting;

impl BatchAlgorithm for Sorting {
    const NAME: &'static str = "sorting";

    type Method = Method;
    type Parameter = Parameter;
    type Input = Input;
    type Result = Result;

    fn check_input(input: &Input, _parameter: &Parameter, _method: Method) -> Status {
        input.check()
    }

    fn compute(
        env: &CpuEnv,
        input: &Input,
        _parameter: &Parameter,
        method: Method,
    ) -> error::Result<Result> {
        let data = input.get(InputId::Data).ok_or(Error::null("data"))?;
        let sorted = match method {
            Method::DefaultDense => crate::dispatch_dtype!(data.dtype(), T => {
                sort_columns::<T>(env, &**data)?
            }),
        };
        let mut result = Result::default();
        result.set(ResultId::SortedData, sorted);
        Ok(result)
    }

    fn check_result(result: &Result, input: &Input, _parameter: &Parameter, _method: Method) -> Status {
        result.check(input)
    }
}

fn sort_columns<T: Element>(env: &CpuEnv, data: &dyn NumericTable) -> error::Result<TableRef> {
    let (n, p) = (data.n_rows(), data.n_columns());
    let columns = to_column_major(&read_dense::<T>(data), n, p);
    let chunks: Vec<&[T]> = columns.chunks(n.max(1)).collect();

    let sorted = env.map_blocks(&chunks, |_, column| -> error::Result<Vec<T>> {
        let mut column = column.to_vec();
        column.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        Ok(column)
    })?;

    let flat: Vec<T> = sorted.into_iter().flatten().collect();
    log::trace!("sorting: {n} rows in {p} columns");
    Ok(Arc::new(HomogenTable::from_vec(n, p, from_column_major(&flat, n, p))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::table::CsrTable;

    #[test]
    fn test_sorts_each_column_ascending() {
        let data = HomogenTable::from_rows(&[[3.0f32, -1.0], [1.0, 5.0], [2.0, 0.0]]);
        let input = Input::from_data(Arc::new(data));
        let env = CpuEnv::new().with_parallel_min_blocks(1);
        let result = Sorting::compute(&env, &input, &Parameter, Method::DefaultDense).unwrap();
        let sorted = result.get(ResultId::SortedData).unwrap();
        assert_eq!(sorted.dtype(), DType::F32);
        assert_eq!(
            read_dense::<f32>(&**sorted).into_owned(),
            vec![1.0, -1.0, 2.0, 0.0, 3.0, 5.0]
        );
        assert!(Sorting::check_result(&result, &input, &Parameter, Method::DefaultDense).is_ok());
    }

    #[test]
    fn test_check_rejects_sparse_and_null() {
        assert_eq!(Input::default().check().unwrap_err(), Error::null("data"));

        let csr = CsrTable::from_dense(2, 2, &[1.0f64, 0.0, 0.0, 2.0]);
        let err = Input::from_data(Arc::new(csr)).check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncorrectLayout);
    }

    #[test]
    fn test_result_check_shape() {
        let input = Input::from_data(Arc::new(HomogenTable::<f64>::zeros(3, 2)));
        let mut result = Result::default();
        result.allocate(DType::F64, &input).unwrap();
        assert!(result.check(&input).is_ok());

        result.set(ResultId::SortedData, allocate_table(DType::F64, 2, 2));
        let err = result.check(&input).unwrap_err();
        assert_eq!(err.argument(), Some("sortedData"));
    }
}
