//! Ordered collections of arguments

use super::TableRef;
use crate::algorithm::Argument;

/// Ordered, growable list of optional arguments
///
/// Accumulating algorithms append one entry per processed block; entries may
/// be empty (`None`) or hold a nested collection, both of which validation
/// reports as errors rather than skipping.
#[derive(Clone, Debug, Default)]
pub struct TableCollection {
    items: Vec<Option<Argument>>,
}

impl TableCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the collection has no entries
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entry at `index`, `None` if empty or out of range
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.items.get(index).and_then(Option::as_ref)
    }

    /// Table at `index`, `None` if empty, out of range or not a table
    #[inline]
    pub fn table(&self, index: usize) -> Option<&TableRef> {
        self.get(index).and_then(Argument::as_table)
    }

    /// Append a table
    pub fn push(&mut self, table: TableRef) {
        self.items.push(Some(Argument::Table(table)));
    }

    /// Append an arbitrary, possibly empty, entry
    pub fn push_entry(&mut self, entry: Option<Argument>) {
        self.items.push(entry);
    }

    /// Append every entry of `other`, preserving order
    pub fn extend_from(&mut self, other: &TableCollection) {
        self.items.extend(other.items.iter().cloned());
    }

    /// Iterate over tables, skipping entries that are not tables
    pub fn tables(&self) -> impl Iterator<Item = &TableRef> {
        self.items
            .iter()
            .filter_map(|item| item.as_ref().and_then(Argument::as_table))
    }
}

impl FromIterator<TableRef> for TableCollection {
    fn from_iter<I: IntoIterator<Item = TableRef>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(|t| Some(Argument::Table(t))).collect(),
        }
    }
}
