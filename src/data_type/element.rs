use std::cmp::Ordering;

use num::traits::Bounded;

use crate::converter::Rounding;

use super::{DataArray, Value};

/// A sign-aware wide representation used to compare values of different types.
///
/// Integers of every width fit in an [`i128`] without loss, so signed and unsigned values compare exactly.
#[derive(Clone, Copy, Debug)]
pub enum Wide {
    /// An integer.
    Int(i128),
    /// A floating point value.
    Float(f64),
}

impl Wide {
    /// The value as an [`f64`].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }
}

impl PartialEq for Wide {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Wide {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

/// A numeric element type that can be stored in a [`DataArray`].
///
/// Implemented for every primitive backing a numeric [`DataType`](crate::DataType).
/// `char` and `ubyte` share [`u8`].
pub trait Element:
    Copy + PartialOrd + Default + bytemuck::Pod + Send + Sync + std::fmt::Debug + 'static
{
    /// True for floating point elements.
    const IS_FLOAT: bool;

    /// The element as an [`f64`].
    fn to_f64(self) -> f64;

    /// Convert an [`f64`] to the element, rounding integers as requested and saturating at the bounds.
    fn from_f64(value: f64, rounding: Rounding) -> Self;

    /// Convert an [`i128`] to the element, saturating at the bounds.
    fn from_i128(value: i128) -> Self;

    /// Returns the element if `value` holds this element type.
    fn from_value(value: &Value) -> Option<Self>;

    /// Returns the elements of `array` if it holds this element type.
    fn slice(array: &DataArray) -> Option<&[Self]>;

    /// Returns the mutable elements of `array` if it holds this element type.
    fn slice_mut(array: &mut DataArray) -> Option<&mut [Self]>;

    /// Returns true if the element is NaN.
    fn is_nan(self) -> bool {
        false
    }

    /// The element in its [`Wide`] representation.
    fn to_wide(self) -> Wide;

    /// Cast any element into this element type.
    ///
    /// Integer to integer casts are exact or saturating, never wrapping.
    fn cast_from<I: Element>(value: I, rounding: Rounding) -> Self {
        match value.to_wide() {
            Wide::Int(value) => Self::from_i128(value),
            Wide::Float(value) => Self::from_f64(value, rounding),
        }
    }

    /// Returns true if `self` and `other` are the same value, treating NaN as equal to NaN.
    fn same_value(self, other: Self) -> bool {
        self == other || (self.is_nan() && other.is_nan())
    }
}

macro_rules! impl_element_int {
    ($t:ty, $($variant:ident),+) => {
        impl Element for $t {
            const IS_FLOAT: bool = false;

            #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            fn from_f64(value: f64, rounding: Rounding) -> Self {
                // float to int `as` casts saturate and map NaN to zero
                rounding.apply(value) as $t
            }

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            fn from_i128(value: i128) -> Self {
                let min = i128::from(<$t as Bounded>::min_value());
                let max = i128::from(<$t as Bounded>::max_value());
                num::clamp(value, min, max) as $t
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    $(Value::$variant(value) => Some(*value),)+
                    _ => None,
                }
            }

            fn slice(array: &DataArray) -> Option<&[Self]> {
                match array {
                    $(DataArray::$variant(values) => Some(values.as_slice()),)+
                    _ => None,
                }
            }

            fn slice_mut(array: &mut DataArray) -> Option<&mut [Self]> {
                match array {
                    $(DataArray::$variant(values) => Some(values.as_mut_slice()),)+
                    _ => None,
                }
            }

            fn to_wide(self) -> Wide {
                Wide::Int(i128::from(self))
            }
        }
    };
}

macro_rules! impl_element_float {
    ($t:ty, $variant:ident) => {
        impl Element for $t {
            const IS_FLOAT: bool = true;

            #[allow(clippy::cast_lossless)]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[allow(clippy::cast_possible_truncation)]
            fn from_f64(value: f64, _rounding: Rounding) -> Self {
                value as $t
            }

            #[allow(clippy::cast_precision_loss)]
            fn from_i128(value: i128) -> Self {
                value as $t
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(value) => Some(*value),
                    _ => None,
                }
            }

            fn slice(array: &DataArray) -> Option<&[Self]> {
                match array {
                    DataArray::$variant(values) => Some(values.as_slice()),
                    _ => None,
                }
            }

            fn slice_mut(array: &mut DataArray) -> Option<&mut [Self]> {
                match array {
                    DataArray::$variant(values) => Some(values.as_mut_slice()),
                    _ => None,
                }
            }

            fn is_nan(self) -> bool {
                <$t>::is_nan(self)
            }

            #[allow(clippy::cast_lossless)]
            fn to_wide(self) -> Wide {
                Wide::Float(self as f64)
            }
        }
    };
}

impl_element_int!(u8, Char, UByte);
impl_element_int!(i8, Byte);
impl_element_int!(i16, Short);
impl_element_int!(i32, Int);
impl_element_int!(u16, UShort);
impl_element_int!(u32, UInt);
impl_element_int!(i64, Int64);
impl_element_int!(u64, UInt64);
impl_element_float!(f32, Float);
impl_element_float!(f64, Double);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_cast_saturates() {
        assert_eq!(u8::cast_from(-5i32, Rounding::Nearest), 0);
        assert_eq!(u8::cast_from(300i32, Rounding::Nearest), 255);
        assert_eq!(i16::cast_from(u64::MAX, Rounding::Nearest), i16::MAX);
        assert_eq!(u32::cast_from(-1i64, Rounding::Nearest), 0);
        assert_eq!(i8::cast_from(1.0e10f64, Rounding::Nearest), i8::MAX);
        assert_eq!(i32::cast_from(f32::NAN, Rounding::Nearest), 0);
    }

    #[test]
    fn element_cast_rounding() {
        assert_eq!(i32::cast_from(2.5f64, Rounding::Nearest), 3);
        assert_eq!(i32::cast_from(-2.5f64, Rounding::Nearest), -3);
        assert_eq!(i32::cast_from(2.7f64, Rounding::Truncate), 2);
        assert_eq!(i32::cast_from(-2.7f64, Rounding::Truncate), -2);
        assert!((f32::cast_from(7i64, Rounding::Nearest) - 7.0).abs() < f32::EPSILON);
    }

    #[test]
    fn wide_sign_aware() {
        assert!((-1i32).to_wide() < 0u32.to_wide());
        assert!(u64::MAX.to_wide() > i64::MAX.to_wide());
        assert!(1.5f32.to_wide() > 1u8.to_wide());
        assert!((-1i8).to_wide() < 0.0f64.to_wide());
    }

    #[test]
    fn element_same_value() {
        assert!(f64::NAN.same_value(f64::NAN));
        assert!(!1.0f64.same_value(f64::NAN));
        assert!(3u16.same_value(3));
    }
}
