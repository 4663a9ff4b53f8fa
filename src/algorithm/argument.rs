//! Argument containers: fixed-slot storage behind every input, partial
//! result and result object

use crate::error::{Error, Result};
use crate::table::{TableCollection, TableRef};
use smallvec::SmallVec;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

/// Handle stored in an argument slot
///
/// Both variants are reference counted. Setting a slot releases the previous
/// handle only once no other owner retains it.
#[derive(Clone, Debug)]
pub enum Argument {
    /// A single numeric table
    Table(TableRef),
    /// An ordered collection of tables
    Collection(Arc<TableCollection>),
}

impl Argument {
    /// The table, if this argument is one
    #[inline]
    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            Self::Table(table) => Some(table),
            Self::Collection(_) => None,
        }
    }

    /// The collection, if this argument is one
    #[inline]
    pub fn as_collection(&self) -> Option<&TableCollection> {
        match self {
            Self::Collection(collection) => Some(collection),
            Self::Table(_) => None,
        }
    }
}

impl From<TableRef> for Argument {
    fn from(table: TableRef) -> Self {
        Self::Table(table)
    }
}

impl From<TableCollection> for Argument {
    fn from(collection: TableCollection) -> Self {
        Self::Collection(Arc::new(collection))
    }
}

/// Identifier of a slot in an [`ArgumentContainer`]
///
/// Implemented by small closed enums through the `slot_ids!` macro.
pub trait SlotId: Copy + Debug + Send + Sync + 'static {
    /// Number of slots of the entity kind
    const COUNT: usize;

    /// Position of the slot
    fn index(self) -> usize;

    /// Symbolic name reported in errors
    fn name(self) -> &'static str;
}

/// Fixed-size slot storage keyed by `K`
///
/// The slot count is fixed at construction. Unset slots are `None`.
#[derive(Clone, Debug)]
pub struct ArgumentContainer<K: SlotId> {
    slots: SmallVec<[Option<Argument>; 4]>,
    _ids: PhantomData<K>,
}

impl<K: SlotId> Default for ArgumentContainer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SlotId> ArgumentContainer<K> {
    /// Container with every slot empty
    pub fn new() -> Self {
        Self {
            slots: SmallVec::from_elem(None, K::COUNT),
            _ids: PhantomData,
        }
    }

    /// Number of slots
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the entity kind has no slots
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Handle in slot `id`
    #[inline]
    pub fn get(&self, id: K) -> Option<&Argument> {
        self.slots[id.index()].as_ref()
    }

    /// Replace the handle in slot `id`, returning the previous one
    pub fn set(&mut self, id: K, value: impl Into<Argument>) -> Option<Argument> {
        self.slots[id.index()].replace(value.into())
    }

    /// Empty slot `id`, returning its handle
    pub fn clear(&mut self, id: K) -> Option<Argument> {
        self.slots[id.index()].take()
    }

    /// Table in slot `id`, `None` if empty or a collection
    #[inline]
    pub fn table(&self, id: K) -> Option<&TableRef> {
        self.get(id).and_then(Argument::as_table)
    }

    /// Collection in slot `id`, `None` if empty or a table
    #[inline]
    pub fn collection(&self, id: K) -> Option<&TableCollection> {
        self.get(id).and_then(Argument::as_collection)
    }

    /// Table in slot `id`, or a null-argument error naming the slot
    pub fn require_table(&self, id: K) -> Result<&TableRef> {
        self.table(id).ok_or_else(|| Error::null(id.name()))
    }

    /// Mutable table handle in slot `id`
    #[inline]
    pub fn table_mut(&mut self, id: K) -> Option<&mut TableRef> {
        match self.slots[id.index()].as_mut() {
            Some(Argument::Table(table)) => Some(table),
            _ => None,
        }
    }

    /// Mutable collection in slot `id`
    ///
    /// A collection shared with another container is copied first, so the
    /// other owner never observes the mutation.
    pub fn collection_mut(&mut self, id: K) -> Option<&mut TableCollection> {
        match self.slots[id.index()].as_mut() {
            Some(Argument::Collection(collection)) => Some(Arc::make_mut(collection)),
            _ => None,
        }
    }
}
