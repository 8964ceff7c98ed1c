use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{converter::Converter, CdsError, DataType};

use super::{DataArray, Wide};

/// A single typed value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// A `char`.
    Char(u8),
    /// A `byte`.
    Byte(i8),
    /// A `short`.
    Short(i16),
    /// An `int`.
    Int(i32),
    /// A `float`.
    Float(f32),
    /// A `double`.
    Double(f64),
    /// A `ubyte`.
    UByte(u8),
    /// A `ushort`.
    UShort(u16),
    /// A `uint`.
    UInt(u32),
    /// An `int64`.
    Int64(i64),
    /// A `uint64`.
    UInt64(u64),
    /// A `string`.
    String(String),
}

impl Value {
    /// Returns the data type of the value.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Char(_) => DataType::Char,
            Self::Byte(_) => DataType::Byte,
            Self::Short(_) => DataType::Short,
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::UByte(_) => DataType::UByte,
            Self::UShort(_) => DataType::UShort,
            Self::UInt(_) => DataType::UInt,
            Self::Int64(_) => DataType::Int64,
            Self::UInt64(_) => DataType::UInt64,
            Self::String(_) => DataType::String,
        }
    }

    /// Returns the value as an [`f64`], or [`None`] for a string.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.to_wide().map(Wide::as_f64)
    }

    pub(crate) fn to_wide(&self) -> Option<Wide> {
        Some(match *self {
            Self::Char(v) | Self::UByte(v) => Wide::Int(v.into()),
            Self::Byte(v) => Wide::Int(v.into()),
            Self::Short(v) => Wide::Int(v.into()),
            Self::Int(v) => Wide::Int(v.into()),
            Self::UShort(v) => Wide::Int(v.into()),
            Self::UInt(v) => Wide::Int(v.into()),
            Self::Int64(v) => Wide::Int(v.into()),
            Self::UInt64(v) => Wide::Int(v.into()),
            Self::Float(v) => Wide::Float(v.into()),
            Self::Double(v) => Wide::Float(v),
            Self::String(_) => return None,
        })
    }

    /// Cast the value to `data_type`, saturating at the bounds of the output type.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::TypeMismatch`] if exactly one of the types is `string`.
    pub fn cast(&self, data_type: DataType) -> Result<Self, CdsError> {
        if self.data_type() == data_type {
            return Ok(self.clone());
        }
        let converter = Converter::new(self.data_type(), None, data_type, None)?;
        converter.convert_value(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(v) => write!(f, "{}", char::from(*v)),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::UByte(v) => write!(f, "{v}"),
            Self::UShort(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_for_value {
    ($t:ty, $variant:ident) => {
        impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Self::$variant(value)
            }
        }
    };
}

impl_from_for_value!(i8, Byte);
impl_from_for_value!(i16, Short);
impl_from_for_value!(i32, Int);
impl_from_for_value!(f32, Float);
impl_from_for_value!(f64, Double);
impl_from_for_value!(u8, UByte);
impl_from_for_value!(u16, UShort);
impl_from_for_value!(u32, UInt);
impl_from_for_value!(i64, Int64);
impl_from_for_value!(u64, UInt64);
impl_from_for_value!(String, String);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Value> for DataArray {
    fn from(value: Value) -> Self {
        Self::from_value(&value, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_data_type() {
        assert_eq!(Value::from(1u8).data_type(), DataType::UByte);
        assert_eq!(Value::Char(b'a').data_type(), DataType::Char);
        assert_eq!(Value::from("x").data_type(), DataType::String);
    }

    #[test]
    fn value_cast() {
        assert_eq!(Value::Int(150).cast(DataType::Byte).unwrap(), Value::Byte(127));
        assert_eq!(Value::Double(-2.5).cast(DataType::Short).unwrap(), Value::Short(-3));
        assert_eq!(Value::Int(-1).cast(DataType::UInt).unwrap(), Value::UInt(0));
        assert!(Value::Int(1).cast(DataType::String).is_err());
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::Char(b'm').to_string(), "m");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::UInt64(7).to_string(), "7");
    }

    #[test]
    fn value_serde() {
        let json = serde_json::to_string(&Value::Short(-3)).unwrap();
        assert_eq!(json, r#"{"type":"short","value":-3}"#);
        let value: Value = serde_json::from_str(r#"{"type":"uint64","value":12}"#).unwrap();
        assert_eq!(value, Value::UInt64(12));
    }
}
