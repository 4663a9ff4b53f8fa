//! Online partial result: per-block R and Q factors

use super::types::{Input, Parameter};
use crate::algorithm::registry::ids;
use crate::algorithm::validation::TableCheck;
use crate::algorithm::{ArgumentContainer, Registered, SlotId};
use crate::error::{Bound, Dimension, Error, Status};
use crate::table::{TableCollection, TableRef};

slot_ids! {
    /// Partial result slots
    pub enum PartialResultId {
        /// One R factor per block
        OutputOfStep1ForStep2 => "outputOfStep1ForStep2",
        /// One Q factor per block, kept when left vectors are required
        OutputOfStep1ForStep3 => "outputOfStep1ForStep3",
    }
}

/// Name reported for entries of the R collection
pub(crate) const R_COLLECTION: &str = "rCollection";
/// Name reported for entries of the Q collection
pub(crate) const Q_COLLECTION: &str = "qCollection";

/// Factors of one processed block
#[derive(Clone, Debug)]
pub struct Block {
    /// `m × m` upper triangular factor
    pub r: TableRef,
    /// `n_i × m` orthonormal factor, present when left vectors are required
    pub q: Option<TableRef>,
}

/// Accumulated per-block factors of an online or distributed session
///
/// Both collections start empty. Entry `i` of the Q collection belongs to
/// entry `i` of the R collection.
#[derive(Clone, Debug)]
pub struct PartialResult {
    args: ArgumentContainer<PartialResultId>,
}

impl Default for PartialResult {
    fn default() -> Self {
        let mut args = ArgumentContainer::new();
        args.set(PartialResultId::OutputOfStep1ForStep2, TableCollection::new());
        args.set(PartialResultId::OutputOfStep1ForStep3, TableCollection::new());
        Self { args }
    }
}

impl Registered for PartialResult {
    const SERIALIZATION_ID: u32 = ids::SVD_ONLINE_PARTIAL_RESULT;
    const TYPE_NAME: &'static str = "svd::OnlinePartialResult";
}

impl PartialResult {
    /// Partial result with both collections empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection in slot `id`
    pub fn get(&self, id: PartialResultId) -> Option<&TableCollection> {
        self.args.collection(id)
    }

    /// Replace the collection in slot `id`
    pub fn set(&mut self, id: PartialResultId, collection: TableCollection) {
        self.args.set(id, collection);
    }

    /// Remove the collection in slot `id`
    pub fn clear(&mut self, id: PartialResultId) {
        self.args.clear(id);
    }

    /// Number of accumulated blocks
    pub fn n_blocks(&self) -> usize {
        self.get(PartialResultId::OutputOfStep1ForStep2)
            .map_or(0, TableCollection::len)
    }

    /// Feature count read from the first R factor
    pub fn n_features(&self) -> Option<usize> {
        self.get(PartialResultId::OutputOfStep1ForStep2)
            .and_then(|c| c.table(0))
            .map(|t| t.n_columns())
    }

    /// Total row count of the Q factors
    pub fn n_rows(&self) -> usize {
        self.get(PartialResultId::OutputOfStep1ForStep3)
            .map_or(0, |c| c.tables().map(|t| t.n_rows()).sum())
    }

    /// Validate the accumulated state for finalization
    pub fn check(&self, parameter: &Parameter) -> Status {
        self.check_impl(parameter, 0, 0)
    }

    /// Validate the accumulated state against the next block
    pub fn check_with_input(&self, input: &Input, parameter: &Parameter) -> Status {
        self.check_impl(parameter, input.n_features(), input.n_vectors())
    }

    /// Shared validation
    ///
    /// `n_features`/`n_vectors` of zero mean no block is pending; the feature
    /// count is then taken from the first R factor. An empty R collection is
    /// only valid with a pending block, and then the Q collection must be
    /// empty too.
    pub(crate) fn check_impl(&self, parameter: &Parameter, n_features: usize, n_vectors: usize) -> Status {
        let r_id = PartialResultId::OutputOfStep1ForStep2;
        let q_id = PartialResultId::OutputOfStep1ForStep3;
        let requires_left = parameter.requires_left();

        let q = if requires_left {
            Some(self.get(q_id).ok_or_else(|| Error::null(q_id.name()))?)
        } else {
            None
        };
        let r = self.get(r_id).ok_or_else(|| Error::null(r_id.name()))?;

        let n_blocks = r.len();
        if n_blocks == 0 {
            if n_features == 0 || n_vectors == 0 {
                return Err(Error::element_count(r_id.name(), Bound::AtLeast(1), 0));
            }
            if let Some(q) = q.filter(|q| !q.is_empty()) {
                return Err(Error::element_count(q_id.name(), Bound::Exactly(0), q.len()));
            }
            return Ok(());
        }

        if let Some(q) = q {
            if q.len() != n_blocks {
                return Err(Error::element_count(q_id.name(), Bound::Exactly(n_blocks), q.len()));
            }
        }

        let first = TableCheck::new(R_COLLECTION).dense().check_entry(r, r_id.name(), 0)?;
        let m = if n_features == 0 { first.n_columns() } else { n_features };
        if m == 0 {
            return Err(Error::shape(R_COLLECTION, Dimension::Columns, Bound::AtLeast(1), 0));
        }

        let r_check = TableCheck::new(R_COLLECTION)
            .dense()
            .rows(Bound::Exactly(m))
            .columns(Bound::Exactly(m));
        let q_check = TableCheck::new(Q_COLLECTION)
            .dense()
            .rows(Bound::AtLeast(m))
            .columns(Bound::Exactly(m));

        // Linear in the number of blocks; runs once per compute call
        for i in 0..n_blocks {
            r_check.check_entry(r, r_id.name(), i)?;
            if let Some(q) = q {
                q_check.check_entry(q, q_id.name(), i)?;
            }
        }
        Ok(())
    }

    /// Append one block's factors
    pub(crate) fn push_block(&mut self, block: Block) {
        if let Some(r) = self.args.collection_mut(PartialResultId::OutputOfStep1ForStep2) {
            r.push(block.r);
        }
        if let Some(q) = block.q {
            if let Some(qs) = self.args.collection_mut(PartialResultId::OutputOfStep1ForStep3) {
                qs.push(q);
            }
        }
    }

    /// Append every block of `other` after the blocks already held
    pub(crate) fn append(&mut self, other: &PartialResult, requires_left: bool) {
        for id in [
            PartialResultId::OutputOfStep1ForStep2,
            PartialResultId::OutputOfStep1ForStep3,
        ] {
            if id == PartialResultId::OutputOfStep1ForStep3 && !requires_left {
                continue;
            }
            if let (Some(src), Some(dst)) = (other.get(id), self.args.collection_mut(id)) {
                dst.extend_from(src);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Argument;
    use crate::error::ErrorKind;
    use crate::table::{HomogenTable, PackedTable, StorageLayout};
    use std::sync::Arc;

    fn dense(rows: usize, cols: usize) -> TableRef {
        Arc::new(HomogenTable::<f64>::zeros(rows, cols))
    }

    fn with_blocks(m: usize, q_rows: &[usize], n_r: usize) -> PartialResult {
        let mut p = PartialResult::new();
        p.set(
            PartialResultId::OutputOfStep1ForStep2,
            (0..n_r).map(|_| dense(m, m)).collect(),
        );
        p.set(
            PartialResultId::OutputOfStep1ForStep3,
            q_rows.iter().map(|&rows| dense(rows, m)).collect(),
        );
        p
    }

    fn required() -> Parameter {
        Parameter::default()
    }

    fn not_required() -> Parameter {
        Parameter::default().with_left_singular_matrix(super::super::ResultFormat::NotRequired)
    }

    #[test]
    fn test_empty_partial_fails_without_pending_block() {
        let p = PartialResult::new();
        let err = p.check(&required()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncorrectElementCount);
        assert_eq!(err.argument(), Some("outputOfStep1ForStep2"));
    }

    #[test]
    fn test_empty_partial_accepts_pending_block() {
        let p = PartialResult::new();
        assert!(p.check_impl(&required(), 4, 6).is_ok());
        assert!(p.check_impl(&required(), 4, 0).is_err());
        assert!(p.check_impl(&required(), 0, 6).is_err());
    }

    #[test]
    fn test_empty_r_with_q_entries_rejected() {
        let p = with_blocks(2, &[3], 0);
        let err = p.check_impl(&required(), 2, 3).unwrap_err();
        assert_eq!(err, Error::element_count("outputOfStep1ForStep3", Bound::Exactly(0), 1));
        // Q is ignored when left vectors are not required
        assert!(p.check_impl(&not_required(), 2, 3).is_ok());
    }

    #[test]
    fn test_collection_length_mismatch() {
        let p = with_blocks(2, &[3, 3, 3], 2);
        let err = p.check(&required()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncorrectElementCount);
        assert_eq!(err.argument(), Some("outputOfStep1ForStep3"));
        assert!(p.check(&not_required()).is_ok());
    }

    #[test]
    fn test_short_q_factor_rejected() {
        let p = with_blocks(5, &[3], 1);
        let err = p.check(&required()).unwrap_err();
        assert_eq!(err, Error::shape("qCollection", Dimension::Rows, Bound::AtLeast(5), 3));
    }

    #[test]
    fn test_missing_collections() {
        let mut p = PartialResult::new();
        p.clear(PartialResultId::OutputOfStep1ForStep3);
        assert_eq!(p.check(&required()).unwrap_err(), Error::null("outputOfStep1ForStep3"));

        let mut p = with_blocks(2, &[2], 1);
        p.clear(PartialResultId::OutputOfStep1ForStep2);
        assert_eq!(p.check(&not_required()).unwrap_err(), Error::null("outputOfStep1ForStep2"));
    }

    #[test]
    fn test_bad_entries() {
        let mut p = with_blocks(2, &[2, 2], 1);
        let mut r = p.get(PartialResultId::OutputOfStep1ForStep2).cloned().unwrap();
        r.push_entry(None);
        p.set(PartialResultId::OutputOfStep1ForStep2, r);
        let err = p.check(&required()).unwrap_err();
        assert_eq!(
            err,
            Error::NullCollectionElement {
                arg: "outputOfStep1ForStep2",
                index: 1
            }
        );

        let mut p = with_blocks(2, &[], 0);
        let mut r = TableCollection::new();
        r.push_entry(Some(Argument::from(TableCollection::new())));
        p.set(PartialResultId::OutputOfStep1ForStep2, r);
        let err = p.check(&not_required()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncorrectElementType);
    }

    #[test]
    fn test_r_factor_shape_and_layout() {
        let mut p = with_blocks(3, &[4, 4], 1);
        let mut r = p.get(PartialResultId::OutputOfStep1ForStep2).cloned().unwrap();
        r.push(dense(2, 3));
        p.set(PartialResultId::OutputOfStep1ForStep2, r);
        let err = p.check(&required()).unwrap_err();
        assert_eq!(err, Error::shape("rCollection", Dimension::Rows, Bound::Exactly(3), 2));

        let mut p = PartialResult::new();
        let packed: TableRef = Arc::new(PackedTable::<f64>::new(
            2,
            StorageLayout::UPPER_PACKED_TRIANGULAR,
            vec![1.0, 2.0, 3.0],
        ));
        p.set(PartialResultId::OutputOfStep1ForStep2, std::iter::once(packed).collect());
        assert_eq!(p.check(&not_required()).unwrap_err().kind(), ErrorKind::IncorrectLayout);
    }

    #[test]
    fn test_pending_block_feature_count_must_match() {
        let p = with_blocks(3, &[4], 1);
        let err = p.check_impl(&required(), 2, 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncorrectShape);
        assert!(p.check_impl(&required(), 3, 5).is_ok());
    }

    #[test]
    fn test_shape_accessors_and_append() {
        let mut a = with_blocks(4, &[6], 1);
        let b = with_blocks(4, &[5], 1);
        a.append(&b, true);
        assert_eq!(a.n_blocks(), 2);
        assert_eq!(a.n_features(), Some(4));
        assert_eq!(a.n_rows(), 11);
        assert!(a.check(&required()).is_ok());
        assert_eq!(b.n_blocks(), 1);

        a.push_block(Block {
            r: dense(4, 4),
            q: None,
        });
        assert_eq!(a.n_blocks(), 3);
        assert_eq!(a.n_rows(), 11);
        let q_len = a.get(PartialResultId::OutputOfStep1ForStep3).map(|c| c.len());
        assert_eq!(q_len, Some(2));
        assert_eq!(a.get(PartialResultId::OutputOfStep1ForStep2).and_then(|c| c.table(2)).map(|t| t.n_rows()), Some(4));
    }
}
