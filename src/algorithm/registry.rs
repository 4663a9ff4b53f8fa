//! Serialization identity of result and partial-result types
//!
//! A persistence layer reconstructs objects by id through a [`TypeRegistry`]
//! it is handed at initialization. The byte format itself is not defined
//! here.

use crate::error::{Error, Result, Status};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Debug};

/// Object-safe view of a serializable type
pub trait Serializable: Any + Debug + Send + Sync {
    /// Stable type identifier
    fn serialization_id(&self) -> u32;

    /// Upcast for downcasting to the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// Type with a stable serialization id that can be default-constructed
pub trait Registered: Debug + Default + Send + Sync + 'static {
    /// Stable identifier, never reused across types
    const SERIALIZATION_ID: u32;
    /// Type name reported on id conflicts
    const TYPE_NAME: &'static str;
}

impl<T: Registered> Serializable for T {
    fn serialization_id(&self) -> u32 {
        T::SERIALIZATION_ID
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Stable serialization ids of the crate's types
pub mod ids {
    /// SVD result
    pub const SVD_RESULT: u32 = 100;
    /// SVD online partial result
    pub const SVD_ONLINE_PARTIAL_RESULT: u32 = 101;
    /// SVD distributed step 2 partial result
    pub const SVD_DISTRIBUTED_PARTIAL_RESULT: u32 = 102;
    /// Ridge regression training partial result
    pub const RIDGE_REGRESSION_PARTIAL_RESULT: u32 = 110;
    /// Ridge regression training result
    pub const RIDGE_REGRESSION_RESULT: u32 = 111;
    /// Sorting result
    pub const SORTING_RESULT: u32 = 120;
    /// Kernel function result
    pub const KERNEL_FUNCTION_RESULT: u32 = 130;
    /// Softmax result
    pub const SOFTMAX_RESULT: u32 = 140;
}

type Factory = fn() -> Box<dyn Serializable>;

#[derive(Clone, Copy)]
struct Entry {
    name: &'static str,
    factory: Factory,
}

fn make<T: Registered>() -> Box<dyn Serializable> {
    Box::new(T::default())
}

/// Mapping from serialization id to a zero-argument factory
#[derive(Clone, Default)]
pub struct TypeRegistry {
    entries: HashMap<u32, Entry>,
}

impl TypeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every result and partial-result type of the crate
    pub fn with_builtin() -> Result<Self> {
        use super::{kernel_function, ridge_regression, softmax, sorting, svd};

        let mut registry = Self::new();
        registry.register::<svd::Result>()?;
        registry.register::<svd::PartialResult>()?;
        registry.register::<svd::DistributedPartialResult>()?;
        registry.register::<ridge_regression::PartialResult>()?;
        registry.register::<ridge_regression::Result>()?;
        registry.register::<sorting::Result>()?;
        registry.register::<kernel_function::Result>()?;
        registry.register::<softmax::Result>()?;
        Ok(registry)
    }

    /// Register `T` under its id
    pub fn register<T: Registered>(&mut self) -> Status {
        if let Some(existing) = self.entries.get(&T::SERIALIZATION_ID) {
            return Err(Error::DuplicateSerializationId {
                id: T::SERIALIZATION_ID,
                existing: existing.name,
            });
        }
        self.entries.insert(
            T::SERIALIZATION_ID,
            Entry {
                name: T::TYPE_NAME,
                factory: make::<T>,
            },
        );
        Ok(())
    }

    /// Default-construct the type registered under `id`
    pub fn create(&self, id: u32) -> Result<Box<dyn Serializable>> {
        self.entries
            .get(&id)
            .map(|entry| (entry.factory)())
            .ok_or(Error::UnknownSerializationId(id))
    }

    /// Type name registered under `id`
    pub fn type_name(&self, id: u32) -> Option<&'static str> {
        self.entries.get(&id).map(|entry| entry.name)
    }

    /// Returns true if `id` is registered
    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.entries.iter().map(|(id, e)| (*id, e.name)).collect();
        ids.sort_unstable();
        f.debug_struct("TypeRegistry").field("entries", &ids).finish()
    }
}
