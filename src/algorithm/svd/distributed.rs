//! Distributed SVD: master merge (step 2) and local left-vector assembly
//! (step 3)
//!
//! ```text
//! node i:  step 1 (online/batch compute)  -> PartialResult { R_i.., Q_i.. }
//! master:  step 2 over every node's R     -> Σ, Vᵀ and one m×m transform per block
//! node i:  step 3 with its Q and transforms -> node i's rows of U
//! ```

use super::kernel;
use super::partial::{PartialResult, PartialResultId, Q_COLLECTION, R_COLLECTION};
use super::result::Result;
use super::types::{Parameter, ResultFormat};
use crate::algorithm::registry::ids;
use crate::algorithm::validation::TableCheck;
use crate::algorithm::{Registered, SlotId};
use crate::error::{self, Bound, Dimension, Error, Status};
use crate::runtime::cpu::{CpuEnv, KernelElement};
use crate::runtime::cpu::linalg::{from_column_major, to_column_major};
use crate::table::{HomogenTable, NumericTable, TableCollection, TableRef, read_dense};
use std::sync::Arc;

/// Name of the step 2 input collection
const STEP2_INPUT: &str = "inputOfStep2FromStep1";
/// Name of the per-node transform collections
const STEP3_TRANSFORMS: &str = "outputOfStep2ForStep3";

/// Output of the master step
///
/// Holds the final singular values and right singular matrix, and for every
/// node the transforms its step 3 applies to its Q factors.
#[derive(Clone, Debug, Default)]
pub struct DistributedPartialResult {
    transforms: Vec<(usize, TableCollection)>,
    final_result: Result,
}

impl Registered for DistributedPartialResult {
    const SERIALIZATION_ID: u32 = ids::SVD_DISTRIBUTED_PARTIAL_RESULT;
    const TYPE_NAME: &'static str = "svd::DistributedPartialResult";
}

impl DistributedPartialResult {
    /// Transforms for `node_id`, one per block the node accumulated
    pub fn transforms(&self, node_id: usize) -> Option<&TableCollection> {
        self.transforms
            .iter()
            .find(|(id, _)| *id == node_id)
            .map(|(_, collection)| collection)
    }

    /// Node ids in master input order
    pub fn node_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.transforms.iter().map(|(id, _)| *id)
    }

    /// Singular values and right singular matrix
    pub fn final_result(&self) -> &Result {
        &self.final_result
    }
}

/// Master step of the distributed SVD
#[derive(Clone, Debug)]
pub struct DistributedStep2Master {
    parameter: Parameter,
    env: CpuEnv,
    nodes: Vec<(usize, TableCollection)>,
}

impl DistributedStep2Master {
    /// Master on the default environment
    pub fn new(parameter: Parameter) -> Self {
        Self::with_env(parameter, CpuEnv::new())
    }

    /// Master on `env`
    pub fn with_env(parameter: Parameter, env: CpuEnv) -> Self {
        Self {
            parameter,
            env,
            nodes: Vec::new(),
        }
    }

    /// Number of nodes added
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Feature count of the nodes added so far
    pub fn n_features(&self) -> Option<usize> {
        self.nodes
            .first()
            .and_then(|(_, r)| r.table(0))
            .map(|t| t.n_columns())
    }

    /// Add the R factors of node `node_id`
    ///
    /// Nodes are merged in the order they are added. Nothing is stored if
    /// validation fails.
    pub fn add_input(&mut self, node_id: usize, partial: &PartialResult) -> Status {
        if self.nodes.iter().any(|(id, _)| *id == node_id) {
            return Err(Error::parameter(
                STEP2_INPUT,
                format!("node {node_id} was already added"),
            ));
        }
        let r_only = self
            .parameter
            .clone()
            .with_left_singular_matrix(ResultFormat::NotRequired);
        partial.check(&r_only)?;

        if let (Some(expected), Some(got)) = (self.n_features(), partial.n_features()) {
            if expected != got {
                return Err(Error::shape(
                    R_COLLECTION,
                    Dimension::Columns,
                    Bound::Exactly(expected),
                    got,
                ));
            }
        }

        let r = partial
            .get(PartialResultId::OutputOfStep1ForStep2)
            .cloned()
            .unwrap_or_default();
        self.nodes.push((node_id, r));
        Ok(())
    }

    /// Merge every node's R factors
    pub fn compute(&self) -> error::Result<DistributedPartialResult> {
        let first = self
            .nodes
            .first()
            .and_then(|(_, r)| r.table(0))
            .ok_or(Error::element_count(STEP2_INPUT, Bound::AtLeast(1), 0))?;
        let dtype = first.dtype();
        let result = crate::dispatch_dtype!(dtype, T => { self.compute_typed::<T>() })?;
        log::debug!(
            "svd: distributed step 2 merged {} nodes",
            self.nodes.len()
        );
        Ok(result)
    }

    fn compute_typed<T: KernelElement>(&self) -> error::Result<DistributedPartialResult> {
        let m = self.n_features().unwrap_or(0);
        let r_factors: Vec<&TableRef> = self.nodes.iter().flat_map(|(_, r)| r.tables()).collect();
        let k = r_factors.len();
        let factors = kernel::stacked_svd::<T>(&self.env, &r_factors, m)?;

        let mut final_result = Result::new();
        final_result.allocate_impl(T::DTYPE, m, 0);
        kernel::fill_sigma_and_v(&mut final_result, &factors, m)?;

        let mut transforms = Vec::with_capacity(self.nodes.len());
        let mut block = 0;
        for (node_id, r) in &self.nodes {
            let mut collection = TableCollection::new();
            for _ in 0..r.len() {
                let t = kernel::stacked_block(&factors.u, k, m, block);
                collection.push(Arc::new(HomogenTable::from_vec(m, m, from_column_major(&t, m, m))));
                block += 1;
            }
            transforms.push((*node_id, collection));
        }

        Ok(DistributedPartialResult {
            transforms,
            final_result,
        })
    }
}

/// Local step 3: rows of the left singular matrix owned by one node
///
/// `partial` is the node's step 1 output and `transforms` the collection the
/// master produced for it. Block `i`'s Q factor is multiplied by transform
/// `i`; blocks are concatenated in accumulation order.
pub fn distributed_step3_local(
    env: &CpuEnv,
    partial: &PartialResult,
    transforms: &TableCollection,
) -> error::Result<TableRef> {
    let q_id = PartialResultId::OutputOfStep1ForStep3;
    let q = partial.get(q_id).ok_or_else(|| Error::null(q_id.name()))?;
    if q.is_empty() {
        return Err(Error::element_count(q_id.name(), Bound::AtLeast(1), 0));
    }
    if transforms.len() != q.len() {
        return Err(Error::element_count(
            STEP3_TRANSFORMS,
            Bound::Exactly(q.len()),
            transforms.len(),
        ));
    }

    let first = TableCheck::new(STEP3_TRANSFORMS)
        .dense()
        .check_entry(transforms, STEP3_TRANSFORMS, 0)?;
    let m = first.n_columns();
    let t_check = TableCheck::new(STEP3_TRANSFORMS)
        .dense()
        .rows(Bound::Exactly(m))
        .columns(Bound::Exactly(m));
    let q_check = TableCheck::new(Q_COLLECTION)
        .dense()
        .rows(Bound::AtLeast(m))
        .columns(Bound::Exactly(m));

    let mut pairs = Vec::with_capacity(q.len());
    for i in 0..q.len() {
        let t = t_check.check_entry(transforms, STEP3_TRANSFORMS, i)?;
        let qi = q_check.check_entry(q, q_id.name(), i)?;
        pairs.push((&**qi, &**t));
    }

    let dtype = pairs[0].0.dtype();
    crate::dispatch_dtype!(dtype, T => { step3_typed::<T>(env, &pairs, m) })
}

fn step3_typed<T: KernelElement>(
    env: &CpuEnv,
    pairs: &[(&dyn NumericTable, &dyn NumericTable)],
    m: usize,
) -> error::Result<TableRef> {
    let blocks = env.map_blocks(pairs, |_, (q, t)| {
        let transform = to_column_major(&read_dense::<T>(*t), m, m);
        Ok::<_, Error>(kernel::apply_transform(env, *q, &transform, m))
    })?;
    let n: usize = pairs.iter().map(|(q, _)| q.n_rows()).sum();
    let mut rows = Vec::with_capacity(n * m);
    for block in blocks {
        rows.extend_from_slice(&block);
    }
    log::debug!("svd: distributed step 3 assembled {n} rows");
    Ok(Arc::new(HomogenTable::<T>::from_vec(n, m, rows)))
}
