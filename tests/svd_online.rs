//! Integration tests for online and batch SVD through sessions
//!
//! Tests verify:
//! - Result shapes for the documented two-block example
//! - Singular values descend, V and U are orthonormal
//! - U·Σ·Vᵀ reconstructs the concatenated blocks
//! - Online results match the batch result on the same data

mod common;

use common::{
    assert_allclose_f64, assert_orthonormal_columns, assert_orthonormal_rows, dense,
    gram, gram_from_factors, random_ref, reconstruct, shape, vstack,
};
use numalg::algorithm::svd::{self, PartialResultId, ResultFormat, ResultId, Svd};
use numalg::algorithm::{ComputeMode, Session, SessionState};
use numalg::dtype::DType;
use numalg::error::ErrorKind;
use numalg::table::{HomogenTable, NumericTable, TableRef};
use std::sync::Arc;

fn online_session(parameter: svd::Parameter) -> Session<Svd> {
    let mut session = Session::new(ComputeMode::Online, svd::Method::DefaultDense);
    session.configure(parameter).unwrap();
    session
}

fn run_online(blocks: &[TableRef], parameter: svd::Parameter) -> svd::Result {
    let mut session = online_session(parameter);
    for block in blocks {
        session.compute(&svd::Input::from_data(Arc::clone(block))).unwrap();
    }
    session.finalize_compute().unwrap();
    assert_eq!(session.state(), SessionState::Finalized);
    session.take_result().unwrap()
}

// ============================================================================
// Shapes
// ============================================================================

#[test]
fn test_two_block_example_shapes() {
    let blocks = [random_ref(6, 4, 1), random_ref(5, 4, 2)];
    let mut session = online_session(svd::Parameter::default());
    for block in &blocks {
        session.compute(&svd::Input::from_data(Arc::clone(block))).unwrap();
    }

    let partial = session.partial_result();
    assert_eq!(partial.n_blocks(), 2);
    let r = partial.get(PartialResultId::OutputOfStep1ForStep2).unwrap();
    let q = partial.get(PartialResultId::OutputOfStep1ForStep3).unwrap();
    assert_eq!(r.len(), 2);
    assert_eq!(q.len(), 2);
    assert_eq!(shape(r.table(0).unwrap()), (4, 4));
    assert_eq!(shape(q.table(0).unwrap()), (6, 4));
    assert_eq!(shape(q.table(1).unwrap()), (5, 4));

    session.finalize_compute().unwrap();
    let result = session.result().unwrap();
    assert_eq!(shape(result.get(ResultId::SingularValues).unwrap()), (1, 4));
    assert_eq!(shape(result.get(ResultId::RightSingularMatrix).unwrap()), (4, 4));
    assert_eq!(shape(result.get(ResultId::LeftSingularMatrix).unwrap()), (11, 4));
}

#[test]
fn test_left_not_required_skips_q_and_u() {
    let blocks = [random_ref(7, 3, 3), random_ref(4, 3, 4)];
    let parameter =
        svd::Parameter::default().with_left_singular_matrix(ResultFormat::NotRequired);
    let mut session = online_session(parameter.clone());
    for block in &blocks {
        session.compute(&svd::Input::from_data(Arc::clone(block))).unwrap();
    }
    let q = session
        .partial_result()
        .get(PartialResultId::OutputOfStep1ForStep3)
        .map_or(0, |c| c.len());
    assert_eq!(q, 0);

    let result = run_online(&blocks, parameter);
    assert!(result.get(ResultId::LeftSingularMatrix).is_none());
    assert_eq!(shape(result.get(ResultId::SingularValues).unwrap()), (1, 3));
}

// ============================================================================
// Numerical properties
// ============================================================================

#[test]
fn test_online_factors_reconstruct_data() {
    let blocks = [random_ref(8, 5, 10), random_ref(5, 5, 11), random_ref(9, 5, 12)];
    let (n, m) = (22, 5);
    let result = run_online(&blocks, svd::Parameter::default());

    let sigma = dense(result.get(ResultId::SingularValues).unwrap());
    let vt = dense(result.get(ResultId::RightSingularMatrix).unwrap());
    let u = dense(result.get(ResultId::LeftSingularMatrix).unwrap());

    assert!(sigma.windows(2).all(|w| w[0] >= w[1]), "not descending: {sigma:?}");
    assert!(sigma.iter().all(|&s| s >= 0.0));
    assert_orthonormal_rows(&vt, m, m, 1e-10, "V");
    assert_orthonormal_columns(&u, n, m, 1e-10, "U");

    let x = vstack(&blocks);
    assert_allclose_f64(&reconstruct(&u, &sigma, &vt, n, m), &x, 0.0, 1e-10, "U·Σ·Vᵀ");
}

#[test]
fn test_online_matches_batch() {
    let blocks = [random_ref(6, 4, 20), random_ref(10, 4, 21)];
    let online = run_online(&blocks, svd::Parameter::default());

    let all = Arc::new(HomogenTable::from_vec(16, 4, vstack(&blocks))) as TableRef;
    let mut batch = Session::<Svd>::new(ComputeMode::Batch, svd::Method::DefaultDense);
    batch.configure(svd::Parameter::default()).unwrap();
    batch.compute(&svd::Input::from_data(all)).unwrap();
    assert_eq!(batch.state(), SessionState::Finalized);
    let batch = batch.take_result().unwrap();

    let s_online = dense(online.get(ResultId::SingularValues).unwrap());
    let s_batch = dense(batch.get(ResultId::SingularValues).unwrap());
    assert_allclose_f64(&s_online, &s_batch, 1e-10, 1e-12, "singular values");

    // Singular vectors are unique up to sign; compare Vᵀ Σ² V instead
    let g_online = gram_from_factors(
        &s_online,
        &dense(online.get(ResultId::RightSingularMatrix).unwrap()),
        4,
    );
    let g_batch = gram(&vstack(&blocks), 16, 4);
    assert_allclose_f64(&g_online, &g_batch, 1e-10, 1e-10, "XᵀX");
}

#[test]
fn test_single_precision_blocks() {
    let to_f32 = |t: &TableRef| -> TableRef {
        let data: Vec<f32> = t.to_dense_f64().into_iter().map(|v| v as f32).collect();
        Arc::new(HomogenTable::from_vec(t.n_rows(), t.n_columns(), data))
    };
    let blocks = [to_f32(&random_ref(5, 3, 30)), to_f32(&random_ref(4, 3, 31))];
    let result = run_online(&blocks, svd::Parameter::default());

    let sigma = result.get(ResultId::SingularValues).unwrap();
    assert_eq!(sigma.dtype(), DType::F32);
    let u = dense(result.get(ResultId::LeftSingularMatrix).unwrap());
    let vt = dense(result.get(ResultId::RightSingularMatrix).unwrap());
    assert_allclose_f64(
        &reconstruct(&u, &dense(sigma), &vt, 9, 3),
        &vstack(&blocks),
        0.0,
        1e-4,
        "f32 reconstruction",
    );
}

#[test]
fn test_rank_deficient_data() {
    // Third column is the sum of the first two
    let rows: Vec<[f64; 3]> = (0..6)
        .map(|i| {
            let (a, b) = (i as f64, (i * i) as f64 * 0.1);
            [a, b, a + b]
        })
        .collect();
    let blocks = [Arc::new(HomogenTable::from_rows(&rows)) as TableRef];
    let result = run_online(&blocks, svd::Parameter::default());
    let sigma = dense(result.get(ResultId::SingularValues).unwrap());
    assert!(sigma[0] > 1.0);
    assert!(sigma[2].abs() < 1e-10 * sigma[0], "smallest value {}", sigma[2]);

    let u = dense(result.get(ResultId::LeftSingularMatrix).unwrap());
    let vt = dense(result.get(ResultId::RightSingularMatrix).unwrap());
    assert_orthonormal_columns(&u, 6, 3, 1e-9, "U of rank 2 data");
    assert_allclose_f64(&reconstruct(&u, &sigma, &vt, 6, 3), &vstack(&blocks), 0.0, 1e-9, "rank 2");
}

// ============================================================================
// Failure handling
// ============================================================================

#[test]
fn test_finalize_without_blocks_fails() {
    let mut session = online_session(svd::Parameter::default());
    let err = session.finalize_compute().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncorrectElementCount);
    assert_eq!(session.state(), SessionState::Configured);
}

#[test]
fn test_rejected_block_leaves_partial_unchanged() {
    let mut session = online_session(svd::Parameter::default());
    session.compute(&svd::Input::from_data(random_ref(6, 4, 40))).unwrap();

    // wrong feature count
    let err = session
        .compute(&svd::Input::from_data(random_ref(6, 3, 41)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncorrectShape);

    // fewer rows than features
    let err = session
        .compute(&svd::Input::from_data(random_ref(3, 4, 42)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncorrectShape);
    assert_eq!(err.argument(), Some("data"));

    assert_eq!(session.partial_result().n_blocks(), 1);
    assert_eq!(session.state(), SessionState::Accumulating);

    // the session is still usable
    session.compute(&svd::Input::from_data(random_ref(5, 4, 43))).unwrap();
    session.finalize_compute().unwrap();
    let u = session.result().unwrap().get(ResultId::LeftSingularMatrix).unwrap();
    assert_eq!(shape(u), (11, 4));
}
