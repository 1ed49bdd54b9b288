//! Numeric element kinds a tensor can hold.
//!
//! This module provides:
//!
//! - [`Element`]: the closed set of numeric types usable as tensor elements
//! - [`Scalar`]: a tagged numeric value every conversion passes through
//!
//! Supported kinds are the primitive integers, `f32`, `f64`, and the
//! half-precision [`f16`] and [`bf16`] types from the `half` crate.
//!
//! Conversions follow Rust `as` semantics: integer narrowing wraps, float to
//! integer truncates toward zero and saturates, integer to float rounds to
//! nearest.

use core::fmt::Debug;
use core::ops::{Add, Div, Mul, Sub};

pub use half::{bf16, f16};

/// A numeric value tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point.
    Float(f64),
}

impl Scalar {
    /// The value as `f64`, rounding large integers.
    pub fn to_f64(self) -> f64 {
        match self {
            Scalar::Int(x) => x as f64,
            Scalar::UInt(x) => x as f64,
            Scalar::Float(x) => x,
        }
    }
}

/// A numeric type that can be stored in a tensor buffer.
pub trait Element:
    Copy
    + Send
    + Sync
    + PartialOrd
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + 'static
{
    /// Additive identity.
    const ZERO: Self;
    /// Multiplicative identity.
    const ONE: Self;

    /// Widens the value into a tagged scalar.
    fn to_scalar(self) -> Scalar;

    /// Narrows or widens a tagged scalar into this kind.
    fn from_scalar(value: Scalar) -> Self;

    /// Converts between any two element kinds.
    #[inline(always)]
    fn cast<U: Element>(self) -> U {
        U::from_scalar(self.to_scalar())
    }
}

macro_rules! impl_element_int {
    ($variant:ident, $wide:ty, $($t:ty),*) => {
        $(
            impl Element for $t {
                const ZERO: Self = 0;
                const ONE: Self = 1;

                #[inline(always)]
                fn to_scalar(self) -> Scalar {
                    Scalar::$variant(self as $wide)
                }

                #[inline(always)]
                fn from_scalar(value: Scalar) -> Self {
                    match value {
                        Scalar::Int(x) => x as $t,
                        Scalar::UInt(x) => x as $t,
                        Scalar::Float(x) => x as $t,
                    }
                }
            }
        )*
    };
}

impl_element_int!(Int, i64, i8, i16, i32, i64, isize);
impl_element_int!(UInt, u64, u8, u16, u32, u64, usize);

macro_rules! impl_element_float {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                const ZERO: Self = 0.0;
                const ONE: Self = 1.0;

                #[inline(always)]
                fn to_scalar(self) -> Scalar {
                    Scalar::Float(self as f64)
                }

                #[inline(always)]
                fn from_scalar(value: Scalar) -> Self {
                    match value {
                        Scalar::Int(x) => x as $t,
                        Scalar::UInt(x) => x as $t,
                        Scalar::Float(x) => x as $t,
                    }
                }
            }
        )*
    };
}

impl_element_float!(f32, f64);

macro_rules! impl_element_half {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                const ZERO: Self = <$t>::ZERO;
                const ONE: Self = <$t>::ONE;

                #[inline(always)]
                fn to_scalar(self) -> Scalar {
                    Scalar::Float(self.to_f64())
                }

                #[inline(always)]
                fn from_scalar(value: Scalar) -> Self {
                    <$t>::from_f64(value.to_f64())
                }
            }
        )*
    };
}

impl_element_half!(f16, bf16);
