//! Integration tests for SVD argument validation and result allocation

mod common;

use common::{random_ref, shape};
use numalg::algorithm::svd::{self, PartialResult, PartialResultId, ResultFormat, ResultId};
use numalg::algorithm::{ComputeMode, Session, SessionState};
use numalg::dtype::DType;
use numalg::error::{Bound, Error, ErrorKind};
use numalg::table::{HomogenTable, PackedTable, StorageLayout, TableCollection, TableRef};
use std::sync::Arc;

fn collection(tables: &[TableRef]) -> TableCollection {
    tables.iter().cloned().collect()
}

fn square(m: usize) -> TableRef {
    Arc::new(HomogenTable::<f64>::zeros(m, m))
}

// ============================================================================
// Partial result validation
// ============================================================================

#[test]
fn test_q_length_mismatch_depends_on_left_flag() {
    let mut partial = PartialResult::new();
    partial.set(
        PartialResultId::OutputOfStep1ForStep2,
        collection(&[square(2), square(2)]),
    );
    partial.set(
        PartialResultId::OutputOfStep1ForStep3,
        collection(&[random_ref(3, 2, 1), random_ref(3, 2, 2), random_ref(3, 2, 3)]),
    );

    let err = partial.check(&svd::Parameter::default()).unwrap_err();
    assert_eq!(
        err,
        Error::element_count("outputOfStep1ForStep3", Bound::Exactly(2), 3)
    );

    let r_only = svd::Parameter::default().with_left_singular_matrix(ResultFormat::NotRequired);
    assert!(partial.check(&r_only).is_ok());
}

#[test]
fn test_q_factor_shorter_than_feature_count() {
    let mut partial = PartialResult::new();
    partial.set(PartialResultId::OutputOfStep1ForStep2, collection(&[square(5)]));
    partial.set(
        PartialResultId::OutputOfStep1ForStep3,
        collection(&[random_ref(3, 5, 4)]),
    );
    let err = partial.check(&svd::Parameter::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncorrectShape);
    assert_eq!(err.argument(), Some("qCollection"));
}

#[test]
fn test_empty_r_collection() {
    let partial = PartialResult::new();
    let parameter = svd::Parameter::default();
    let err = partial.check(&parameter).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncorrectElementCount);

    // A pending block substitutes for the accumulated shape
    let input = svd::Input::from_data(random_ref(4, 2, 5));
    assert!(partial.check_with_input(&input, &parameter).is_ok());
}

#[test]
fn test_merge_rejects_invalid_partial_without_change() {
    let mut master = Session::<svd::Svd>::new(ComputeMode::Distributed, svd::Method::DefaultDense);
    master.configure(svd::Parameter::default()).unwrap();
    master.compute(&svd::Input::from_data(random_ref(4, 2, 6))).unwrap();

    let mut bad = PartialResult::new();
    bad.set(PartialResultId::OutputOfStep1ForStep2, collection(&[square(2)]));
    let err = master.merge_partial(&bad).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncorrectElementCount);
    assert_eq!(master.partial_result().n_blocks(), 1);
    assert_eq!(master.state(), SessionState::Accumulating);
}

// ============================================================================
// Input validation
// ============================================================================

#[test]
fn test_packed_and_sparse_inputs_rejected() {
    let packed = PackedTable::new(2, StorageLayout::UPPER_PACKED_SYMMETRIC, vec![1.0, 2.0, 3.0]);
    let input = svd::Input::from_data(Arc::new(packed));
    let err = input
        .check(&svd::Parameter::default(), svd::Method::DefaultDense)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncorrectLayout);
    assert_eq!(err.argument(), Some("data"));

    let csr = numalg::table::CsrTable::from_dense(2, 2, &[1.0f64, 0.0, 0.0, 1.0]);
    let input = svd::Input::from_data(Arc::new(csr));
    let err = input
        .check(&svd::Parameter::default(), svd::Method::DefaultDense)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncorrectLayout);
}

#[test]
fn test_null_input_rejected_by_session() {
    let mut session = Session::<svd::Svd>::new(ComputeMode::Online, svd::Method::DefaultDense);
    session.configure(svd::Parameter::default()).unwrap();
    let err = session.compute(&svd::Input::new()).unwrap_err();
    assert_eq!(err, Error::null("data"));
    assert_eq!(session.state(), SessionState::Configured);
}

#[test]
fn test_non_finite_block_rejected_before_accumulation() {
    let mut session = Session::<svd::Svd>::new(ComputeMode::Online, svd::Method::DefaultDense);
    session.configure(svd::Parameter::default()).unwrap();
    session.compute(&svd::Input::from_data(random_ref(4, 2, 11))).unwrap();

    let poisoned: TableRef = Arc::new(HomogenTable::from_rows(&[
        [1.0, 2.0],
        [f64::NAN, 0.5],
        [3.0, -1.0],
    ]));
    let err = session.compute(&svd::Input::from_data(poisoned)).unwrap_err();
    assert_eq!(
        err,
        Error::NonFiniteValue {
            arg: "data",
            row: 1,
            column: 0
        }
    );
    assert_eq!(session.partial_result().n_blocks(), 1);

    session.compute(&svd::Input::from_data(random_ref(3, 2, 12))).unwrap();
    session.finalize_compute().unwrap();
    let result = session.take_result().unwrap();
    assert_eq!(shape(result.get(ResultId::LeftSingularMatrix).unwrap()), (7, 2));
}

// ============================================================================
// Allocation
// ============================================================================

#[test]
fn test_allocate_is_deterministic() {
    let input = svd::Input::from_data(random_ref(9, 3, 7));
    let parameter = svd::Parameter::default();
    let mut result = svd::Result::new();
    result.allocate(DType::F64, &input, &parameter);
    let first: Vec<_> = [
        ResultId::SingularValues,
        ResultId::LeftSingularMatrix,
        ResultId::RightSingularMatrix,
    ]
    .iter()
    .map(|&id| shape(result.get(id).unwrap()))
    .collect();
    assert_eq!(first, vec![(1, 3), (9, 3), (3, 3)]);

    result.allocate(DType::F64, &input, &parameter);
    let second: Vec<_> = [
        ResultId::SingularValues,
        ResultId::LeftSingularMatrix,
        ResultId::RightSingularMatrix,
    ]
    .iter()
    .map(|&id| shape(result.get(id).unwrap()))
    .collect();
    assert_eq!(first, second);
    assert!(result.check(&parameter, 3, 9).is_ok());
}

#[test]
fn test_allocate_from_partial_sums_q_rows() {
    let mut session = Session::<svd::Svd>::new(ComputeMode::Online, svd::Method::DefaultDense);
    session.configure(svd::Parameter::default()).unwrap();
    for (rows, seed) in [(6, 8), (5, 9), (3, 10)] {
        session.compute(&svd::Input::from_data(random_ref(rows, 3, seed))).unwrap();
    }
    let mut result = svd::Result::new();
    result.allocate_from_partial(DType::F32, session.partial_result(), session.parameter());
    assert_eq!(shape(result.get(ResultId::LeftSingularMatrix).unwrap()), (14, 3));
    assert_eq!(result.get(ResultId::SingularValues).unwrap().dtype(), DType::F32);
}
