//! Utilities related to numbers.

use num;
use std::fmt;

/// Floating point marker trait for easier control over trait bounds.
pub trait BFloat:
    Sync
    + Send
    + num::Float
    + num::traits::FloatConst
    + num::cast::FromPrimitive
    + fmt::Debug
    + fmt::Display
    + 'static
{
}

impl BFloat for f32 {}
impl BFloat for f64 {}

/// Converts the given integer to the floating point type.
pub fn from_usize<F: BFloat>(value: usize) -> F {
    F::from_usize(value).unwrap_or_else(F::nan)
}

/// Converts the given double precision value to the floating point type.
pub fn from_f64<F: BFloat>(value: f64) -> F {
    F::from_f64(value).unwrap_or_else(F::nan)
}

/// Converts the given signed integer to the floating point type.
pub fn from_isize<F: BFloat>(value: isize) -> F {
    F::from_isize(value).unwrap_or_else(F::nan)
}

/// Converts the given floating point value to the nearest integer not
/// larger than it, or `None` if the value is not representable.
pub fn floor_to_isize<F: BFloat>(value: F) -> Option<isize> {
    value.floor().to_isize()
}
