//! Row-wise softmax, batch
//!
//! ```text
//! softmax(x)[i] = exp(x[i] - max(x)) / sum(exp(x - max(x)))
//! ```
//!
//! Shifting by the row maximum keeps every exponent non-positive, so large
//! inputs do not overflow.

use crate::algorithm::validation::TableCheck;
use crate::algorithm::{self, ArgumentContainer, BatchAlgorithm, Registered, SlotId, ids};
use crate::dtype::{DType, Element};
use crate::error::{self, Bound, Error, Status};
use crate::runtime::cpu::CpuEnv;
use crate::table::{HomogenTable, NumericTable, TableRef, allocate_table, read_dense};
use std::sync::Arc;

slot_ids! {
    /// Input slots
    pub enum InputId {
        /// Scores, one row per observation
        Data => "data",
    }
}

slot_ids! {
    /// Result slots
    pub enum ResultId {
        /// Probabilities, same shape as `data`
        Value => "value",
    }
}

/// Softmax method
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// Dense row-wise evaluation
    #[default]
    DefaultDense,
}

impl algorithm::Method for Method {}

/// Softmax has no parameters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Parameter;

impl algorithm::Parameter for Parameter {}

/// Softmax input
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

    /// Validate `data`: present, dense, at least one column
    pub fn check(&self) -> Status {
        TableCheck::new(InputId::Data.name())
            .dense()
            .columns(Bound::AtLeast(1))
            .check(self.get(InputId::Data))
    }
}

/// Softmax output
#[derive(Clone, Debug, Default)]
pub struct Result {
    args: ArgumentContainer<ResultId>,
}

impl Registered for Result {
    const SERIALIZATION_ID: u32 = ids::SOFTMAX_RESULT;
    const TYPE_NAME: &'static str = "softmax::Result";
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

    /// Allocate a zeroed `value` table with the shape of the input's `data`
    pub fn allocate(&mut self, dtype: DType, input: &Input) -> Status {
        let data = input.args.require_table(InputId::Data)?;
        self.set(
            ResultId::Value,
            allocate_table(dtype, data.n_rows(), data.n_columns()),
        );
        Ok(())
    }

    /// Validate `value` against the input's shape
    pub fn check(&self, input: &Input) -> Status {
        let data = input.args.require_table(InputId::Data)?;
        TableCheck::new(ResultId::Value.name())
            .dense()
            .rows(Bound::Exactly(data.n_rows()))
            .columns(Bound::Exactly(data.n_columns()))
            .check(self.get(ResultId::Value))
    }
}

/// Softmax marker
#[derive(Copy, Clone, Debug, Default)]
pub struct Softmax;

impl BatchAlgorithm for Softmax {
    const NAME: &'static str = "softmax";

    type Method = Method;
    type Parameter = Parameter;
    type Input = Input;
    type Result = Result;

    fn check_input(input: &Input, _parameter: &Parameter, _method: Method) -> Status {
        input.check()
    }

    fn compute(
        _env: &CpuEnv,
        input: &Input,
        _parameter: &Parameter,
        method: Method,
    ) -> error::Result<Result> {
        let data = input.get(InputId::Data).ok_or(Error::null("data"))?;
        let value = match method {
            Method::DefaultDense => crate::dispatch_dtype!(data.dtype(), T => {
                softmax_rows::<T>(&**data)
            }),
        };
        let mut result = Result::default();
        result.set(ResultId::Value, value);
        Ok(result)
    }

    fn check_result(result: &Result, input: &Input, _parameter: &Parameter, _method: Method) -> Status {
        result.check(input)
    }
}

fn softmax_rows<T: Element>(data: &dyn NumericTable) -> TableRef {
    let (n, p) = (data.n_rows(), data.n_columns());
    let x = read_dense::<T>(data);
    let mut out = vec![T::zero(); n * p];

    for (row, dst) in x.chunks(p.max(1)).zip(out.chunks_mut(p.max(1))) {
        let max = row
            .iter()
            .map(|v| v.to_f64())
            .fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0f64;
        let exps: Vec<f64> = row
            .iter()
            .map(|v| {
                let e = (v.to_f64() - max).exp();
                sum += e;
                e
            })
            .collect();
        let inv_sum = 1.0 / sum;
        for (d, e) in dst.iter_mut().zip(exps) {
            *d = T::from_f64(e * inv_sum);
        }
    }
    Arc::new(HomogenTable::from_vec(n, p, out))
}
