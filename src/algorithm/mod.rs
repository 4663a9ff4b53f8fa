//! Algorithm framework and algorithm families
//!
//! Every algorithm is a set of argument objects (input, parameter, partial
//! result, result) plus a contract a session drives:
//!
//! - [`BatchAlgorithm`] - one input in, one result out
//! - [`OnlineAlgorithm`] - blocks are validated and accumulated into a
//!   partial result, which is finalized once all blocks are in
//!
//! Argument objects store their tables in an [`ArgumentContainer`] keyed by a
//! small enum of slot ids, declared with `slot_ids!`.
//!
//! # Families
//!
//! - [`svd`] - singular value decomposition, batch/online/distributed
//! - [`ridge_regression`] - ridge regression training, online
//! - [`sorting`], [`kernel_function`], [`softmax`] - batch only

/// Declare a slot id enum and implement [`SlotId`] for it
macro_rules! slot_ids {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::algorithm::SlotId for $name {
            const COUNT: usize = <[&str]>::len(&[$($label),+]);

            #[inline]
            fn index(self) -> usize {
                self as usize
            }

            #[inline]
            fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }
        }
    };
}

mod argument;
mod registry;
mod session;
mod traits;
pub mod validation;

pub mod kernel_function;
pub mod ridge_regression;
pub mod softmax;
pub mod sorting;
pub mod svd;

pub use argument::{Argument, ArgumentContainer, SlotId};
pub use registry::{Registered, Serializable, TypeRegistry, ids};
pub use session::{BatchSession, ComputeMode, Session, SessionState};
pub use traits::{BatchAlgorithm, Method, OnlineAlgorithm, Parameter};
