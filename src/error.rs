//! Error types for numalg
//!
//! Every validating or mutating operation returns a [`Status`] (or a
//! [`Result`] carrying a value). An `Ok(())` status is success; an error carries
//! exactly one failure together with the symbolic name of the offending
//! argument.

use crate::table::StorageLayout;
use std::fmt;
use thiserror::Error;

/// Result type alias using numalg's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Empty-is-success status returned by checks and accumulation steps
pub type Status = Result<()>;

/// Requirement placed on a row or column count
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bound {
    /// No constraint
    Any,
    /// Count must be at least the given value
    AtLeast(usize),
    /// Count must equal the given value
    Exactly(usize),
}

impl Bound {
    /// Returns true if `value` satisfies this bound
    #[inline]
    pub fn admits(self, value: usize) -> bool {
        match self {
            Self::Any => true,
            Self::AtLeast(min) => value >= min,
            Self::Exactly(expected) => value == expected,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::AtLeast(min) => write!(f, ">= {min}"),
            Self::Exactly(expected) => write!(f, "{expected}"),
        }
    }
}

/// Table dimension named in shape errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dimension {
    /// Row count
    Rows,
    /// Column count
    Columns,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows => f.write_str("rows"),
            Self::Columns => f.write_str("columns"),
        }
    }
}

/// Error taxonomy, independent of the contextual data an [`Error`] carries
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required input, parameter, table or collection is absent
    NullArgument,
    /// An entry inside an accumulated collection is empty
    NullCollectionElement,
    /// A collection entry is not a numeric table
    IncorrectElementType,
    /// A table uses a layout forbidden for the algorithm
    IncorrectLayout,
    /// A row or column count violates its requirement
    IncorrectShape,
    /// A collection has the wrong number of entries
    IncorrectElementCount,
    /// A table holds NaN or an infinity
    NonFiniteValue,
    /// A parameter value is out of range
    InvalidParameter,
    /// A session operation was issued in the wrong state
    InvalidState,
    /// The numerical kernel could not produce a result
    Numerical,
    /// Serialization registry lookup or registration failed
    Registry,
    /// Broken internal invariant
    Internal,
}

/// Errors that can occur in numalg operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Required argument is absent
    #[error("Null argument '{arg}'")]
    NullArgument {
        /// Symbolic name of the argument
        arg: &'static str,
    },

    /// Collection entry is empty
    #[error("Element {index} of collection '{arg}' is null")]
    NullCollectionElement {
        /// Symbolic name of the collection
        arg: &'static str,
        /// Position of the empty entry
        index: usize,
    },

    /// Collection entry has the wrong kind
    #[error("Element {index} of collection '{arg}' is not a numeric table")]
    IncorrectElementType {
        /// Symbolic name of the collection
        arg: &'static str,
        /// Position of the offending entry
        index: usize,
    },

    /// Table layout is forbidden
    #[error("Table '{arg}' has unsupported layout {layout}")]
    IncorrectLayout {
        /// Symbolic name of the table
        arg: &'static str,
        /// Layout the table reported
        layout: StorageLayout,
    },

    /// Row or column count violates its requirement
    #[error("Table '{arg}' has incorrect number of {dim}: expected {expected}, got {got}")]
    IncorrectShape {
        /// Symbolic name of the table
        arg: &'static str,
        /// Offending dimension
        dim: Dimension,
        /// Requirement that was violated
        expected: Bound,
        /// Actual count
        got: usize,
    },

    /// Collection has the wrong number of entries
    #[error("Collection '{arg}' has incorrect number of elements: expected {expected}, got {got}")]
    IncorrectElementCount {
        /// Symbolic name of the collection
        arg: &'static str,
        /// Requirement that was violated
        expected: Bound,
        /// Actual entry count
        got: usize,
    },

    /// Table holds NaN or an infinity
    #[error("Table '{arg}' has a non-finite value at row {row}, column {column}")]
    NonFiniteValue {
        /// Symbolic name of the table
        arg: &'static str,
        /// Row of the first offending value
        row: usize,
        /// Column of the first offending value
        column: usize,
    },

    /// Parameter value is out of range
    #[error("Invalid parameter '{arg}': {reason}")]
    InvalidParameter {
        /// Symbolic name of the parameter
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Session operation issued in the wrong state
    #[error("Cannot {op} in {state} state")]
    InvalidState {
        /// Operation that was attempted
        op: &'static str,
        /// State the session was in
        state: &'static str,
    },

    /// Numerical kernel failure
    #[error("Numerical failure in {op}: {reason}")]
    Numerical {
        /// Operation that failed
        op: &'static str,
        /// Description of the failure
        reason: String,
    },

    /// No factory registered for the serialization id
    #[error("Serialization id {0} is not registered")]
    UnknownSerializationId(u32),

    /// Serialization id already claimed by another type
    #[error("Serialization id {id} is already registered for '{existing}'")]
    DuplicateSerializationId {
        /// Contested id
        id: u32,
        /// Type name holding the id
        existing: &'static str,
    },

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a null argument error
    pub fn null(arg: &'static str) -> Self {
        Self::NullArgument { arg }
    }

    /// Create a shape error
    pub fn shape(arg: &'static str, dim: Dimension, expected: Bound, got: usize) -> Self {
        Self::IncorrectShape {
            arg,
            dim,
            expected,
            got,
        }
    }

    /// Create an element count error
    pub fn element_count(arg: &'static str, expected: Bound, got: usize) -> Self {
        Self::IncorrectElementCount { arg, expected, got }
    }

    /// Create an invalid parameter error
    pub fn parameter(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            arg,
            reason: reason.into(),
        }
    }

    /// Create a numerical failure error
    pub fn numerical(op: &'static str, reason: impl Into<String>) -> Self {
        Self::Numerical {
            op,
            reason: reason.into(),
        }
    }

    /// Taxonomy of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NullArgument { .. } => ErrorKind::NullArgument,
            Self::NullCollectionElement { .. } => ErrorKind::NullCollectionElement,
            Self::IncorrectElementType { .. } => ErrorKind::IncorrectElementType,
            Self::IncorrectLayout { .. } => ErrorKind::IncorrectLayout,
            Self::IncorrectShape { .. } => ErrorKind::IncorrectShape,
            Self::IncorrectElementCount { .. } => ErrorKind::IncorrectElementCount,
            Self::NonFiniteValue { .. } => ErrorKind::NonFiniteValue,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::Numerical { .. } => ErrorKind::Numerical,
            Self::UnknownSerializationId(_) | Self::DuplicateSerializationId { .. } => {
                ErrorKind::Registry
            }
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Symbolic name of the offending argument, if the error carries one
    pub fn argument(&self) -> Option<&'static str> {
        match self {
            Self::NullArgument { arg }
            | Self::NullCollectionElement { arg, .. }
            | Self::IncorrectElementType { arg, .. }
            | Self::IncorrectLayout { arg, .. }
            | Self::IncorrectShape { arg, .. }
            | Self::IncorrectElementCount { arg, .. }
            | Self::NonFiniteValue { arg, .. }
            | Self::InvalidParameter { arg, .. } => Some(arg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_admits() {
        assert!(Bound::Any.admits(0));
        assert!(Bound::AtLeast(3).admits(3));
        assert!(!Bound::AtLeast(3).admits(2));
        assert!(Bound::Exactly(4).admits(4));
        assert!(!Bound::Exactly(4).admits(5));
    }

    #[test]
    fn test_kind_and_argument() {
        let err = Error::shape("rCollection", Dimension::Rows, Bound::Exactly(4), 3);
        assert_eq!(err.kind(), ErrorKind::IncorrectShape);
        assert_eq!(err.argument(), Some("rCollection"));
        assert_eq!(
            err.to_string(),
            "Table 'rCollection' has incorrect number of rows: expected 4, got 3"
        );

        let err = Error::NonFiniteValue {
            arg: "data",
            row: 2,
            column: 0,
        };
        assert_eq!(err.kind(), ErrorKind::NonFiniteValue);
        assert_eq!(err.argument(), Some("data"));

        let err = Error::UnknownSerializationId(7);
        assert_eq!(err.kind(), ErrorKind::Registry);
        assert_eq!(err.argument(), None);
    }
}
