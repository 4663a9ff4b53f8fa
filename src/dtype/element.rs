//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::{Pod, Zeroable};
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Sub};

/// Scalar stored in a numeric table buffer
///
/// Ties a Rust type to its runtime [`DType`] tag so that tables can be
/// type-erased behind `dyn NumericTable` and recovered by algorithms through
/// [`DType`] dispatch. `Pod` lets a table expose its buffer as bytes.
pub trait Element:
    Copy
    + Debug
    + Send
    + Sync
    + Pod
    + Zeroable
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + PartialOrd
{
    /// Runtime tag of this type
    const DTYPE: DType;

    /// Widen to `f64`
    fn to_f64(self) -> f64;

    /// Narrow from `f64` with the usual rounding
    fn from_f64(v: f64) -> Self;

    /// Additive identity
    fn zero() -> Self;

    /// Multiplicative identity
    fn one() -> Self;

    /// False for NaN and infinities
    fn is_finite_val(self) -> bool;
}

macro_rules! impl_element {
    ($($t:ty => $dtype:expr),* $(,)?) => {$(
        impl Element for $t {
            const DTYPE: DType = $dtype;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn zero() -> Self {
                0.0
            }

            #[inline]
            fn one() -> Self {
                1.0
            }

            #[inline]
            fn is_finite_val(self) -> bool {
                self.is_finite()
            }
        }
    )*};
}

impl_element!(f32 => DType::F32, f64 => DType::F64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_narrowing() {
        assert_eq!(f32::from_f64(0.1), 0.1f32);
        assert_eq!(<f32 as Element>::DTYPE, DType::F32);
        assert!(!f32::NAN.is_finite_val());
        assert!(1.0f32.is_finite_val());
    }
}
