//! Ridge regression input, parameter, partial result and result

use crate::algorithm::registry::ids;
use crate::algorithm::validation::TableCheck;
use crate::algorithm::{self, ArgumentContainer, Registered, SlotId};
use crate::error::{self, Bound, Error, Status};
use crate::runtime::cpu::{CpuEnv, KernelElement};
use crate::table::{HomogenTable, NumericTable, TableRef, read_dense};
use std::sync::Arc;

slot_ids! {
    /// Input slots
    pub enum InputId {
        /// Observations, `n × p`
        Data => "data",
        /// Responses, `n × r`
        DependentVariables => "dependentVariables",
    }
}

/// Training method
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// Normal equations accumulated per block, solved by Cholesky
    #[default]
    NormEqDense,
}

impl algorithm::Method for Method {}

/// Name reported for ridge values
pub(crate) const RIDGE: &str = "ridgeParameters";

/// Training parameters
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    /// Regularization strength: one value for every response or one per
    /// response. All values are non-negative.
    pub ridge: Vec<f64>,
    /// Whether an unpenalized intercept is fitted
    pub intercept: bool,
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            ridge: vec![1.0],
            intercept: true,
        }
    }
}

impl Parameter {
    /// Set the ridge values
    pub fn with_ridge(mut self, ridge: Vec<f64>) -> Self {
        self.ridge = ridge;
        self
    }

    /// Set whether an intercept is fitted
    pub fn with_intercept(mut self, intercept: bool) -> Self {
        self.intercept = intercept;
        self
    }

    /// Ridge value for response `j`
    #[inline]
    pub fn ridge_for(&self, j: usize) -> f64 {
        if self.ridge.len() == 1 { self.ridge[0] } else { self.ridge[j] }
    }
}

impl algorithm::Parameter for Parameter {
    fn check(&self) -> Status {
        if self.ridge.is_empty() {
            return Err(Error::parameter(RIDGE, "at least one value is required"));
        }
        if let Some(bad) = self.ridge.iter().find(|v| !(v.is_finite() && **v >= 0.0)) {
            return Err(Error::parameter(
                RIDGE,
                format!("values must be finite and non-negative, got {bad}"),
            ));
        }
        Ok(())
    }
}

/// Training input
#[derive(Clone, Debug, Default)]
pub struct Input {
    args: ArgumentContainer<InputId>,
}

impl Input {
    /// Empty input
    pub fn new() -> Self {
        Self::default()
    }

    /// Input with both tables set
    pub fn from_tables(data: TableRef, dependent_variables: TableRef) -> Self {
        let mut input = Self::new();
        input.set(InputId::Data, data);
        input.set(InputId::DependentVariables, dependent_variables);
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

    /// Feature count, 0 if `data` is absent
    pub fn n_features(&self) -> usize {
        self.get(InputId::Data).map_or(0, |t| t.n_columns())
    }

    /// Response count, 0 if `dependentVariables` is absent
    pub fn n_responses(&self) -> usize {
        self.get(InputId::DependentVariables).map_or(0, |t| t.n_columns())
    }

    /// Validate both tables and the ridge count against the response count
    pub fn check(&self, parameter: &Parameter, method: Method) -> Status {
        match method {
            Method::NormEqDense => {
                let data = self.args.require_table(InputId::Data)?;
                TableCheck::new(InputId::Data.name())
                    .dense()
                    .rows(Bound::AtLeast(1))
                    .columns(Bound::AtLeast(1))
                    .finite()
                    .check_table(&**data)?;
                TableCheck::new(InputId::DependentVariables.name())
                    .dense()
                    .rows(Bound::Exactly(data.n_rows()))
                    .columns(Bound::AtLeast(1))
                    .finite()
                    .check(self.get(InputId::DependentVariables))?;
            }
        }
        let r = self.n_responses();
        if parameter.ridge.len() != 1 && parameter.ridge.len() != r {
            return Err(Error::parameter(
                RIDGE,
                format!("expected 1 or {r} values, got {}", parameter.ridge.len()),
            ));
        }
        Ok(())
    }
}

slot_ids! {
    /// Partial result slots
    pub enum PartialResultId {
        /// Cross-product of the augmented data, `(p+1) × (p+1)`
        PartialModelXtx => "partialModelXtx",
        /// Cross-product of responses and augmented data, `r × (p+1)`
        PartialModelXty => "partialModelXty",
    }
}

/// Sums of the normal-equation terms over every block seen
///
/// Data rows are augmented with a leading 1, so entry (0, 0) of `xtx` is
/// the observation count.
#[derive(Clone, Debug, Default)]
pub struct PartialResult {
    pub(crate) args: ArgumentContainer<PartialResultId>,
    pub(crate) n_observations: usize,
}

impl Registered for PartialResult {
    const SERIALIZATION_ID: u32 = ids::RIDGE_REGRESSION_PARTIAL_RESULT;
    const TYPE_NAME: &'static str = "ridge_regression::PartialResult";
}

impl PartialResult {
    /// Table in slot `id`
    pub fn get(&self, id: PartialResultId) -> Option<&TableRef> {
        self.args.table(id)
    }

    /// Number of observations accumulated
    pub fn n_observations(&self) -> usize {
        self.n_observations
    }

    /// Feature count, if anything was accumulated
    pub fn n_features(&self) -> Option<usize> {
        self.get(PartialResultId::PartialModelXtx)
            .map(|t| t.n_columns().saturating_sub(1))
    }

    /// Response count, if anything was accumulated
    pub fn n_responses(&self) -> Option<usize> {
        self.get(PartialResultId::PartialModelXty).map(|t| t.n_rows())
    }

    /// Validate accumulated sums, optionally against the next block
    pub fn check(&self, input: Option<&Input>) -> Status {
        let xtx_id = PartialResultId::PartialModelXtx;
        let xty_id = PartialResultId::PartialModelXty;

        if self.n_observations == 0 {
            return match input {
                Some(_) => Ok(()),
                None => Err(Error::element_count("nObservations", Bound::AtLeast(1), 0)),
            };
        }

        let xtx = self.args.require_table(xtx_id)?;
        let d = match input {
            Some(input) => input.n_features() + 1,
            None => xtx.n_columns(),
        };
        TableCheck::new(xtx_id.name())
            .dense()
            .rows(Bound::Exactly(d))
            .columns(Bound::Exactly(d))
            .check_table(&**xtx)?;

        let r = input.map_or(Bound::Any, |i| Bound::Exactly(i.n_responses()));
        TableCheck::new(xty_id.name())
            .dense()
            .rows(r)
            .columns(Bound::Exactly(d))
            .check(self.get(xty_id))?;
        Ok(())
    }
}

/// Sums of one block
#[derive(Clone, Debug)]
pub struct Block {
    pub(crate) xtx: TableRef,
    pub(crate) xty: TableRef,
    pub(crate) n_observations: usize,
}

slot_ids! {
    /// Result slots
    pub enum ResultId {
        /// Coefficients, `r × (p+1)`, intercept in column 0
        Beta => "beta",
    }
}

/// Trained linear model
#[derive(Clone, Debug, Default)]
pub struct Result {
    args: ArgumentContainer<ResultId>,
}

impl Registered for Result {
    const SERIALIZATION_ID: u32 = ids::RIDGE_REGRESSION_RESULT;
    const TYPE_NAME: &'static str = "ridge_regression::Result";
}

impl Result {
    pub(crate) fn from_beta(beta: TableRef) -> Self {
        let mut args = ArgumentContainer::new();
        args.set(ResultId::Beta, beta);
        Self { args }
    }

    /// Table in slot `id`
    pub fn get(&self, id: ResultId) -> Option<&TableRef> {
        self.args.table(id)
    }

    /// Coefficient table
    pub fn beta(&self) -> Option<&TableRef> {
        self.get(ResultId::Beta)
    }

    /// Predict responses for `data` (`n × p`), returning `n × r`
    pub fn predict(&self, data: &dyn NumericTable) -> error::Result<TableRef> {
        let beta = self.args.require_table(ResultId::Beta)?;
        let p = beta.n_columns().saturating_sub(1);
        TableCheck::new(InputId::Data.name())
            .dense()
            .columns(Bound::Exactly(p))
            .check_table(data)?;
        crate::dispatch_dtype!(beta.dtype(), T => { Ok(predict_typed::<T>(&**beta, data)) })
    }
}

fn predict_typed<T: KernelElement>(beta: &dyn NumericTable, data: &dyn NumericTable) -> TableRef {
    let (r, d) = (beta.n_rows(), beta.n_columns());
    let (n, p) = (data.n_rows(), data.n_columns());
    let b = read_dense::<T>(beta);
    let x = read_dense::<T>(data);
    let dot = CpuEnv::new().kernels::<T>().dot;

    let mut out = vec![T::zero(); n * r];
    for i in 0..n {
        let row = &x[i * p..(i + 1) * p];
        for j in 0..r {
            let coef = &b[j * d..(j + 1) * d];
            out[i * r + j] = coef[0] + dot(&coef[1..], row);
        }
    }
    Arc::new(HomogenTable::from_vec(n, r, out))
}
