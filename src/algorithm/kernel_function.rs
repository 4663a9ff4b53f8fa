//! Linear kernel function, batch
//!
//! `K(x, y) = k · ⟨x, y⟩ + b` evaluated between rows of `X` and rows of `Y`.
//! The computation mode picks which rows take part:
//!
//! | Mode            | Rows of `X`       | Rows of `Y`       | `values`  |
//! |-----------------|-------------------|-------------------|-----------|
//! | `MatrixMatrix`  | all               | all               | `nx × ny` |
//! | `MatrixVector`  | all               | `row_index_y`     | `nx × 1`  |
//! | `VectorVector`  | `row_index_x`     | `row_index_y`     | `1 × 1`   |

use crate::algorithm::validation::{DENSE_FORBIDDEN, TableCheck};
use crate::algorithm::{self, ArgumentContainer, BatchAlgorithm, Registered, SlotId, ids};
use crate::dtype::DType;
use crate::error::{self, Bound, Error, Status};
use crate::runtime::cpu::{CpuEnv, KernelElement};
use crate::table::{
    CsrTable, HomogenTable, NumericTable, StorageLayout, TableRef, allocate_table, read_dense,
};
use std::borrow::Cow;
use std::sync::Arc;

slot_ids! {
    /// Input slots
    pub enum InputId {
        /// Left operand rows
        X => "X",
        /// Right operand rows
        Y => "Y",
    }
}

slot_ids! {
    /// Result slots
    pub enum ResultId {
        /// Kernel values
        Values => "values",
    }
}

/// Storage the kernel is evaluated on
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// Dense row-major tables
    #[default]
    DefaultDense,
    /// Compressed sparse row tables
    FastCsr,
}

impl algorithm::Method for Method {}

/// Which pairs of rows are evaluated
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ComputationMode {
    /// One row of `X` against one row of `Y`
    VectorVector,
    /// Every row of `X` against one row of `Y`
    MatrixVector,
    /// Every row of `X` against every row of `Y`
    #[default]
    MatrixMatrix,
}

/// Linear kernel parameters
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    /// Scale of the inner product
    pub k: f64,
    /// Shift added to every value
    pub b: f64,
    /// Rows taking part in the evaluation
    pub computation_mode: ComputationMode,
    /// Row of `X` used by `VectorVector`
    pub row_index_x: usize,
    /// Row of `Y` used by `VectorVector` and `MatrixVector`
    pub row_index_y: usize,
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            k: 1.0,
            b: 0.0,
            computation_mode: ComputationMode::default(),
            row_index_x: 0,
            row_index_y: 0,
        }
    }
}

impl Parameter {
    /// Set the kernel coefficients
    pub fn with_coefficients(mut self, k: f64, b: f64) -> Self {
        self.k = k;
        self.b = b;
        self
    }

    /// Set the computation mode
    pub fn with_mode(mut self, mode: ComputationMode) -> Self {
        self.computation_mode = mode;
        self
    }

    /// Set the rows used by the vector modes
    pub fn with_rows(mut self, row_index_x: usize, row_index_y: usize) -> Self {
        self.row_index_x = row_index_x;
        self.row_index_y = row_index_y;
        self
    }
}

impl algorithm::Parameter for Parameter {
    fn check(&self) -> Status {
        if !self.k.is_finite() {
            return Err(Error::parameter("k", format!("must be finite, got {}", self.k)));
        }
        if !self.b.is_finite() {
            return Err(Error::parameter("b", format!("must be finite, got {}", self.b)));
        }
        Ok(())
    }
}

/// Kernel function input
#[derive(Clone, Debug, Default)]
pub struct Input {
    args: ArgumentContainer<InputId>,
}

impl Input {
    /// Input with both operands set
    pub fn from_tables(x: TableRef, y: TableRef) -> Self {
        let mut args = ArgumentContainer::new();
        args.set(InputId::X, x);
        args.set(InputId::Y, y);
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

    /// Validate both operands for `method` and the row indices the mode uses
    pub fn check(&self, parameter: &Parameter, method: Method) -> Status {
        let forbidden = match method {
            Method::FastCsr => StorageLayout::ALL.without(StorageLayout::CSR),
            Method::DefaultDense => DENSE_FORBIDDEN,
        };
        self.check_operands(forbidden)?;

        let rows_x = self.args.require_table(InputId::X)?.n_rows();
        let rows_y = self.args.require_table(InputId::Y)?.n_rows();
        let mode = parameter.computation_mode;
        if mode == ComputationMode::VectorVector && parameter.row_index_x >= rows_x {
            return Err(Error::parameter(
                "rowIndexX",
                format!("row {} out of range for {rows_x} rows", parameter.row_index_x),
            ));
        }
        if mode != ComputationMode::MatrixMatrix && parameter.row_index_y >= rows_y {
            return Err(Error::parameter(
                "rowIndexY",
                format!("row {} out of range for {rows_y} rows", parameter.row_index_y),
            ));
        }
        Ok(())
    }

    fn check_operands(&self, forbidden: StorageLayout) -> Status {
        let x = self.get(InputId::X);
        TableCheck::new(InputId::X.name())
            .forbid(forbidden)
            .rows(Bound::AtLeast(1))
            .columns(Bound::AtLeast(1))
            .check(x)?;
        let p = x.map_or(0, |t| t.n_columns());
        TableCheck::new(InputId::Y.name())
            .forbid(forbidden)
            .rows(Bound::AtLeast(1))
            .columns(Bound::Exactly(p))
            .check(self.get(InputId::Y))
    }
}

/// Kernel values
#[derive(Clone, Debug, Default)]
pub struct Result {
    args: ArgumentContainer<ResultId>,
}

impl Registered for Result {
    const SERIALIZATION_ID: u32 = ids::KERNEL_FUNCTION_RESULT;
    const TYPE_NAME: &'static str = "kernel_function::Result";
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

    /// Allocate a zeroed `values` table shaped for the computation mode
    pub fn allocate(&mut self, dtype: DType, input: &Input, parameter: &Parameter) -> Status {
        let (rows, columns) = result_shape(input, parameter)?;
        self.set(ResultId::Values, allocate_table(dtype, rows, columns));
        Ok(())
    }

    /// Validate `values` against the shape the computation mode produces
    pub fn check(&self, input: &Input, parameter: &Parameter) -> Status {
        let (rows, columns) = result_shape(input, parameter)?;
        TableCheck::new(ResultId::Values.name())
            .dense()
            .rows(Bound::Exactly(rows))
            .columns(Bound::Exactly(columns))
            .check(self.get(ResultId::Values))
    }
}

fn result_shape(input: &Input, parameter: &Parameter) -> error::Result<(usize, usize)> {
    let rows_x = input.args.require_table(InputId::X)?.n_rows();
    let rows_y = input.args.require_table(InputId::Y)?.n_rows();
    Ok(match parameter.computation_mode {
        ComputationMode::MatrixMatrix => (rows_x, rows_y),
        ComputationMode::MatrixVector => (rows_x, 1),
        ComputationMode::VectorVector => (1, 1),
    })
}

/// Linear kernel marker
#[derive(Copy, Clone, Debug, Default)]
pub struct KernelFunction;

impl BatchAlgorithm for KernelFunction {
    const NAME: &'static str = "kernel_function";

    type Method = Method;
    type Parameter = Parameter;
    type Input = Input;
    type Result = Result;

    fn check_input(input: &Input, parameter: &Parameter, method: Method) -> Status {
        input.check(parameter, method)
    }

    fn compute(
        env: &CpuEnv,
        input: &Input,
        parameter: &Parameter,
        method: Method,
    ) -> error::Result<Result> {
        let x = input.args.require_table(InputId::X)?;
        let y = input.args.require_table(InputId::Y)?;
        let values = crate::dispatch_dtype!(x.dtype(), T => {
            match method {
                Method::DefaultDense => linear_dense::<T>(env, &**x, &**y, parameter),
                Method::FastCsr => linear_csr::<T>(&**x, &**y, parameter),
            }
        });
        let mut result = Result::default();
        result.set(ResultId::Values, values);
        Ok(result)
    }

    fn check_result(result: &Result, input: &Input, parameter: &Parameter, _method: Method) -> Status {
        result.check(input, parameter)
    }
}

/// Row ranges of `X` and `Y` taking part in the evaluation
fn row_ranges(
    parameter: &Parameter,
    rows_x: usize,
    rows_y: usize,
) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
    let (ix, iy) = (parameter.row_index_x, parameter.row_index_y);
    match parameter.computation_mode {
        ComputationMode::MatrixMatrix => (0..rows_x, 0..rows_y),
        ComputationMode::MatrixVector => (0..rows_x, iy..iy + 1),
        ComputationMode::VectorVector => (ix..ix + 1, iy..iy + 1),
    }
}

fn linear_dense<T: KernelElement>(
    env: &CpuEnv,
    x: &dyn NumericTable,
    y: &dyn NumericTable,
    parameter: &Parameter,
) -> TableRef {
    let p = x.n_columns();
    let (xs, ys) = (read_dense::<T>(x), read_dense::<T>(y));
    let (k, b) = (T::from_f64(parameter.k), T::from_f64(parameter.b));
    let dot = env.kernels::<T>().dot;
    let (rx, ry) = row_ranges(parameter, x.n_rows(), y.n_rows());
    let ny = ry.len();

    let mut out = Vec::with_capacity(rx.len() * ny);
    for i in rx.clone() {
        let row_x = &xs[i * p..(i + 1) * p];
        for j in ry.clone() {
            out.push(k * dot(row_x, &ys[j * p..(j + 1) * p]) + b);
        }
    }
    Arc::new(HomogenTable::from_vec(rx.len(), ny, out))
}

/// View `table` as CSR of precision `T`, converting when it is stored
/// differently
fn as_csr<T: KernelElement>(table: &dyn NumericTable) -> Cow<'_, CsrTable<T>> {
    match table.as_any().downcast_ref::<CsrTable<T>>() {
        Some(csr) => Cow::Borrowed(csr),
        None => Cow::Owned(CsrTable::from_dense(
            table.n_rows(),
            table.n_columns(),
            &read_dense::<T>(table),
        )),
    }
}

fn linear_csr<T: KernelElement>(
    x: &dyn NumericTable,
    y: &dyn NumericTable,
    parameter: &Parameter,
) -> TableRef {
    let p = x.n_columns();
    let (xs, ys) = (as_csr::<T>(x), as_csr::<T>(y));
    let (k, b) = (T::from_f64(parameter.k), T::from_f64(parameter.b));
    let (rx, ry) = row_ranges(parameter, x.n_rows(), y.n_rows());
    let (nx, ny) = (rx.len(), ry.len());

    // Each Y row is scattered once into a dense buffer and reused for every
    // X row, so unsorted column indices are fine.
    let mut out = vec![T::zero(); nx * ny];
    let mut scratch = vec![T::zero(); p];
    for (jj, j) in ry.enumerate() {
        let (values_y, columns_y) = ys.row(j);
        for (&v, &c) in values_y.iter().zip(columns_y) {
            scratch[c] = scratch[c] + v;
        }
        for (ii, i) in rx.clone().enumerate() {
            let (values_x, columns_x) = xs.row(i);
            let mut sum = T::zero();
            for (&v, &c) in values_x.iter().zip(columns_x) {
                sum = sum + v * scratch[c];
            }
            out[ii * ny + jj] = k * sum + b;
        }
        for &c in columns_y {
            scratch[c] = T::zero();
        }
    }
    Arc::new(HomogenTable::from_vec(nx, ny, out))
}
