//! Numeric element types the GEMM can run on.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, MulAssign};

/// Scalar type stored in a matrix.
///
/// Implemented for `f32` and `f64`. The blocked path only needs a semiring
/// (`+`, `*`, zero, one), so the bound list stays small.
pub trait Element:
    Copy
    + Send
    + Sync
    + Debug
    + PartialEq
    + Add<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + MulAssign
    + 'static
{
    const ZERO: Self;
    const ONE: Self;

    /// Lossy conversion from `f64`, for building inputs in any precision.
    fn from_f64(value: f64) -> Self;

    /// Widening conversion, for comparing results across precisions.
    fn to_f64(self) -> f64;
}

macro_rules! impl_element {
    ($ty:ty) => {
        impl Element for $ty {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;

            #[inline(always)]
            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            #[inline(always)]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_element!(f32);
impl_element!(f64);
