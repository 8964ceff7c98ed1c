//! The data type catalog.
//!
//! The closed set of element types a [`Variable`](crate::hierarchy::Variable) or [`Attribute`](crate::hierarchy::Attribute) can hold,
//! with their sizes, representable ranges, and default fill values.
//!
//! The default fill values follow the NetCDF conventions.

mod data_array;
mod element;
mod value;

use std::{fmt, str::FromStr};

use derive_more::From;
use serde::de::Error as _;
use thiserror::Error;

pub(crate) use data_array::{data_array_apply, data_array_map};
pub use data_array::DataArray;
pub use element::{Element, Wide};
pub use value::Value;

/// Default fill value for `char`.
pub const FILL_CHAR: u8 = 0;
/// Default fill value for `byte`.
pub const FILL_BYTE: i8 = -127;
/// Default fill value for `short`.
pub const FILL_SHORT: i16 = -32767;
/// Default fill value for `int`.
pub const FILL_INT: i32 = -2_147_483_647;
/// Default fill value for `float`.
#[allow(clippy::cast_possible_truncation)]
pub const FILL_FLOAT: f32 = FILL_DOUBLE as f32;
/// Default fill value for `double`.
pub const FILL_DOUBLE: f64 = 9.969_209_968_386_869e36;
/// Default fill value for `ubyte`.
pub const FILL_UBYTE: u8 = 255;
/// Default fill value for `ushort`.
pub const FILL_USHORT: u16 = 65535;
/// Default fill value for `uint`.
pub const FILL_UINT: u32 = 4_294_967_295;
/// Default fill value for `int64`.
pub const FILL_INT64: i64 = -9_223_372_036_854_775_806;
/// Default fill value for `uint64`.
pub const FILL_UINT64: u64 = 18_446_744_073_709_551_614;

/// A data type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[rustfmt::skip]
pub enum DataType {
    /// Not a type.
    NotAType,
    /// `char` ASCII character, stored as a byte.
    Char,
    /// `byte` Integer in `[-2^7, 2^7-1]`.
    Byte,
    /// `short` Integer in `[-2^15, 2^15-1]`.
    Short,
    /// `int` Integer in `[-2^31, 2^31-1]`.
    Int,
    /// `float` IEEE 754 single-precision floating point.
    Float,
    /// `double` IEEE 754 double-precision floating point.
    Double,
    /// `ubyte` Integer in `[0, 2^8-1]`.
    UByte,
    /// `ushort` Integer in `[0, 2^16-1]`.
    UShort,
    /// `uint` Integer in `[0, 2^32-1]`.
    UInt,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    Int64,
    /// `uint64` Integer in `[0, 2^64-1]`.
    UInt64,
    /// `string` A UTF-8 encoded string.
    String,
}

/// An unsupported data type error.
#[derive(Debug, Error, From)]
#[error("unsupported data type {_0}")]
pub struct UnsupportedDataTypeError(String);

impl DataType {
    /// Every data type except [`DataType::NotAType`].
    pub const ALL: [Self; 12] = [
        Self::Char,
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Float,
        Self::Double,
        Self::UByte,
        Self::UShort,
        Self::UInt,
        Self::Int64,
        Self::UInt64,
        Self::String,
    ];

    /// Returns the data type named `name`, or [`DataType::NotAType`] if the name is unknown.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "char" => Self::Char,
            "byte" => Self::Byte,
            "short" => Self::Short,
            "int" => Self::Int,
            "float" => Self::Float,
            "double" => Self::Double,
            "ubyte" => Self::UByte,
            "ushort" => Self::UShort,
            "uint" => Self::UInt,
            "int64" => Self::Int64,
            "uint64" => Self::UInt64,
            "string" => Self::String,
            _ => Self::NotAType,
        }
    }

    /// Returns the name of the data type, or [`None`] for [`DataType::NotAType`].
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::NotAType => return None,
            Self::Char => "char",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
            Self::UByte => "ubyte",
            Self::UShort => "ushort",
            Self::UInt => "uint",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::String => "string",
        })
    }

    /// Returns the size of an element in bytes.
    ///
    /// The size of a `string` element is the size of its owned handle.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::NotAType => 0,
            Self::Char | Self::Byte | Self::UByte => 1,
            Self::Short | Self::UShort => 2,
            Self::Int | Self::Float | Self::UInt => 4,
            Self::Double | Self::Int64 | Self::UInt64 => 8,
            Self::String => std::mem::size_of::<String>(),
        }
    }

    /// Returns true if the data type holds numbers (this includes `char`).
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::NotAType | Self::String)
    }

    /// Returns true for `float` and `double`.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Returns the minimum representable value.
    #[must_use]
    pub fn min(self) -> Option<Value> {
        Some(match self {
            Self::NotAType | Self::String => return None,
            Self::Char => Value::Char(u8::MIN),
            Self::Byte => Value::Byte(i8::MIN),
            Self::Short => Value::Short(i16::MIN),
            Self::Int => Value::Int(i32::MIN),
            Self::Float => Value::Float(f32::MIN),
            Self::Double => Value::Double(f64::MIN),
            Self::UByte => Value::UByte(u8::MIN),
            Self::UShort => Value::UShort(u16::MIN),
            Self::UInt => Value::UInt(u32::MIN),
            Self::Int64 => Value::Int64(i64::MIN),
            Self::UInt64 => Value::UInt64(u64::MIN),
        })
    }

    /// Returns the maximum representable value.
    #[must_use]
    pub fn max(self) -> Option<Value> {
        Some(match self {
            Self::NotAType | Self::String => return None,
            Self::Char => Value::Char(u8::MAX),
            Self::Byte => Value::Byte(i8::MAX),
            Self::Short => Value::Short(i16::MAX),
            Self::Int => Value::Int(i32::MAX),
            Self::Float => Value::Float(f32::MAX),
            Self::Double => Value::Double(f64::MAX),
            Self::UByte => Value::UByte(u8::MAX),
            Self::UShort => Value::UShort(u16::MAX),
            Self::UInt => Value::UInt(u32::MAX),
            Self::Int64 => Value::Int64(i64::MAX),
            Self::UInt64 => Value::UInt64(u64::MAX),
        })
    }

    /// Returns the `(min, max)` representable range.
    #[must_use]
    pub fn range(self) -> Option<(Value, Value)> {
        Some((self.min()?, self.max()?))
    }

    /// Returns the library default fill value.
    #[must_use]
    pub fn default_fill(self) -> Option<Value> {
        Some(match self {
            Self::NotAType => return None,
            Self::Char => Value::Char(FILL_CHAR),
            Self::Byte => Value::Byte(FILL_BYTE),
            Self::Short => Value::Short(FILL_SHORT),
            Self::Int => Value::Int(FILL_INT),
            Self::Float => Value::Float(FILL_FLOAT),
            Self::Double => Value::Double(FILL_DOUBLE),
            Self::UByte => Value::UByte(FILL_UBYTE),
            Self::UShort => Value::UShort(FILL_USHORT),
            Self::UInt => Value::UInt(FILL_UINT),
            Self::Int64 => Value::Int64(FILL_INT64),
            Self::UInt64 => Value::UInt64(FILL_UINT64),
            Self::String => Value::String(String::new()),
        })
    }

    pub(crate) fn wide_min(self) -> Option<Wide> {
        self.min().as_ref().and_then(Value::to_wide)
    }

    pub(crate) fn wide_max(self) -> Option<Wide> {
        self.max().as_ref().and_then(Value::to_wide)
    }

    /// Returns whichever of `a` and `b` has the greater minimum value.
    ///
    /// The comparison is sign-aware, so `int` and `uint` compare correctly.
    #[must_use]
    pub fn max_type_min(a: Self, b: Self) -> Self {
        match (a.wide_min(), b.wide_min()) {
            (Some(min_a), Some(min_b)) if min_b > min_a => b,
            (None, Some(_)) => b,
            _ => a,
        }
    }

    /// Returns whichever of `a` and `b` has the smaller maximum value.
    #[must_use]
    pub fn min_type_max(a: Self, b: Self) -> Self {
        match (a.wide_max(), b.wide_max()) {
            (Some(max_a), Some(max_b)) if max_b < max_a => b,
            (None, Some(_)) => b,
            _ => a,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name().unwrap_or("NAT"))
    }
}

impl FromStr for DataType {
    type Err = UnsupportedDataTypeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match Self::from_name(name) {
            Self::NotAType => Err(UnsupportedDataTypeError(name.to_string())),
            data_type => Ok(data_type),
        }
    }
}

impl serde::Serialize for DataType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.name().unwrap_or("NAT"))
    }
}

impl<'de> serde::Deserialize<'de> for DataType {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let name = String::deserialize(d)?;
        Self::from_str(&name).map_err(|err| D::Error::custom(err.to_string()))
    }
}
