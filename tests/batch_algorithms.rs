//! Integration tests for the batch-only algorithms and the type registry

mod common;

use common::{assert_allclose_f64, dense, random_ref, random_table};
use numalg::algorithm::kernel_function::{self, ComputationMode, KernelFunction};
use numalg::algorithm::softmax::{self, Softmax};
use numalg::algorithm::sorting::{self, Sorting};
use numalg::algorithm::{BatchSession, Registered, TypeRegistry, ids, svd};
use numalg::error::ErrorKind;
use numalg::table::{CsrTable, HomogenTable, NumericTable, TableRef};
use std::sync::Arc;

// ============================================================================
// Sorting
// ============================================================================

#[test]
fn test_sorting_session() {
    let data = Arc::new(HomogenTable::from_rows(&[
        [4.0, 0.5, -2.0],
        [-1.0, 0.5, 7.0],
        [2.0, -3.0, 1.0],
        [0.0, 9.0, 1.0],
    ])) as TableRef;
    let mut session = BatchSession::<Sorting>::new(sorting::Method::DefaultDense);
    session.configure(sorting::Parameter).unwrap();
    session.compute(&sorting::Input::from_data(data)).unwrap();
    let sorted = session.result().unwrap().get(sorting::ResultId::SortedData).unwrap();
    assert_eq!(
        dense(sorted),
        vec![-1.0, -3.0, -2.0, 0.0, 0.5, 1.0, 2.0, 0.5, 1.0, 4.0, 9.0, 7.0]
    );
}

#[test]
fn test_sorting_many_columns_in_parallel() {
    let data = random_ref(50, 16, 1);
    let env = numalg::runtime::cpu::CpuEnv::new().with_parallel_min_blocks(2);
    let mut session = BatchSession::<Sorting>::with_env(sorting::Method::DefaultDense, env);
    session.configure(sorting::Parameter).unwrap();
    session.compute(&sorting::Input::from_data(Arc::clone(&data))).unwrap();
    let sorted = dense(session.result().unwrap().get(sorting::ResultId::SortedData).unwrap());

    let original = dense(&data);
    for j in 0..16 {
        let mut expected: Vec<f64> = (0..50).map(|i| original[i * 16 + j]).collect();
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let got: Vec<f64> = (0..50).map(|i| sorted[i * 16 + j]).collect();
        assert_eq!(got, expected, "column {j}");
    }
}

// ============================================================================
// Kernel function
// ============================================================================

fn to_csr(table: &HomogenTable<f64>) -> TableRef {
    // sparsify: zero out small entries so the CSR path has real structure
    let data: Vec<f64> = table
        .as_slice()
        .iter()
        .map(|&v| if v.abs() < 0.4 { 0.0 } else { v })
        .collect();
    Arc::new(CsrTable::from_dense(table.n_rows(), table.n_columns(), &data))
}

#[test]
fn test_kernel_function_dense_and_csr_agree() {
    let (x, y) = (random_table(7, 5, 2), random_table(4, 5, 3));
    let (xs, ys) = (to_csr(&x), to_csr(&y));
    let xd = Arc::new(HomogenTable::from_vec(7, 5, xs.to_dense_f64())) as TableRef;
    let yd = Arc::new(HomogenTable::from_vec(4, 5, ys.to_dense_f64())) as TableRef;
    let parameter = kernel_function::Parameter::default().with_coefficients(0.5, -1.0);

    let run = |method, input: kernel_function::Input| {
        let mut session = BatchSession::<KernelFunction>::new(method);
        session.configure(parameter.clone()).unwrap();
        session.compute(&input).unwrap();
        dense(
            session
                .result()
                .unwrap()
                .get(kernel_function::ResultId::Values)
                .unwrap(),
        )
    };
    let from_dense = run(
        kernel_function::Method::DefaultDense,
        kernel_function::Input::from_tables(xd, yd),
    );
    let from_csr = run(
        kernel_function::Method::FastCsr,
        kernel_function::Input::from_tables(xs, ys),
    );
    assert_eq!(from_dense.len(), 28);
    assert_allclose_f64(&from_csr, &from_dense, 1e-12, 1e-12, "csr vs dense");
}

#[test]
fn test_kernel_function_modes_are_slices_of_the_full_matrix() {
    let (x, y) = (random_ref(3, 4, 4), random_ref(5, 4, 5));
    let input = kernel_function::Input::from_tables(x, y);
    let values = |parameter: kernel_function::Parameter| {
        let mut session =
            BatchSession::<KernelFunction>::new(kernel_function::Method::DefaultDense);
        session.configure(parameter).unwrap();
        session.compute(&input).unwrap();
        let values = session.take_result().unwrap();
        dense(values.get(kernel_function::ResultId::Values).unwrap())
    };
    let base = kernel_function::Parameter::default().with_coefficients(2.0, 0.5);
    let full = values(base.clone());
    let column = values(base.clone().with_mode(ComputationMode::MatrixVector).with_rows(0, 3));
    let single = values(base.with_mode(ComputationMode::VectorVector).with_rows(2, 4));

    assert_eq!(column, vec![full[3], full[8], full[13]]);
    assert_eq!(single, vec![full[14]]);
}

#[test]
fn test_kernel_function_rejects_out_of_range_row() {
    let input = kernel_function::Input::from_tables(random_ref(3, 2, 6), random_ref(2, 2, 7));
    let mut session = BatchSession::<KernelFunction>::new(kernel_function::Method::DefaultDense);
    session
        .configure(
            kernel_function::Parameter::default()
                .with_mode(ComputationMode::MatrixVector)
                .with_rows(0, 2),
        )
        .unwrap();
    let err = session.compute(&input).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    assert_eq!(err.argument(), Some("rowIndexY"));
}

// ============================================================================
// Softmax
// ============================================================================

#[test]
fn test_softmax_session() {
    let data = random_ref(6, 4, 8);
    let mut session = BatchSession::<Softmax>::new(softmax::Method::DefaultDense);
    session.configure(softmax::Parameter).unwrap();
    session.compute(&softmax::Input::from_data(Arc::clone(&data))).unwrap();
    let value = session.result().unwrap().get(softmax::ResultId::Value).unwrap();
    assert_eq!((value.n_rows(), value.n_columns()), (6, 4));

    let (x, p) = (dense(&data), dense(value));
    for i in 0..6 {
        let row = &p[i * 4..(i + 1) * 4];
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        // log-ratios are preserved
        let ratio = (row[0] / row[1]).ln();
        assert!((ratio - (x[i * 4] - x[i * 4 + 1])).abs() < 1e-12);
    }
}

#[test]
fn test_softmax_null_input() {
    let mut session = BatchSession::<Softmax>::new(softmax::Method::DefaultDense);
    session.configure(softmax::Parameter).unwrap();
    let err = session.compute(&softmax::Input::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NullArgument);
}

// ============================================================================
// Type registry
// ============================================================================

#[test]
fn test_registry_creates_builtin_types() {
    let registry = TypeRegistry::with_builtin().unwrap();
    assert_eq!(registry.len(), 8);

    let object = registry.create(ids::SVD_RESULT).unwrap();
    assert_eq!(object.serialization_id(), svd::Result::SERIALIZATION_ID);
    assert!(object.as_any().downcast_ref::<svd::Result>().is_some());

    let object = registry.create(ids::SOFTMAX_RESULT).unwrap();
    assert!(object.as_any().downcast_ref::<softmax::Result>().is_some());
    assert_eq!(registry.type_name(ids::SORTING_RESULT), Some("sorting::Result"));

    let err = registry.create(9999).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Registry);

    let mut registry = registry;
    let err = registry.register::<kernel_function::Result>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Registry);
}
