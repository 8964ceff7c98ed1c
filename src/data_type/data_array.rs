use std::{collections::TryReserveError, ops::Range};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{CdsError, DataType};

use super::Value;

/// A typed, contiguous array of values.
///
/// This is the storage of attribute values and variable sample data.
/// `char` arrays hold text as bytes, `string` arrays hold owned strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum DataArray {
    /// `char` values.
    Char(Vec<u8>),
    /// `byte` values.
    Byte(Vec<i8>),
    /// `short` values.
    Short(Vec<i16>),
    /// `int` values.
    Int(Vec<i32>),
    /// `float` values.
    Float(Vec<f32>),
    /// `double` values.
    Double(Vec<f64>),
    /// `ubyte` values.
    UByte(Vec<u8>),
    /// `ushort` values.
    UShort(Vec<u16>),
    /// `uint` values.
    UInt(Vec<u32>),
    /// `int64` values.
    Int64(Vec<i64>),
    /// `uint64` values.
    UInt64(Vec<u64>),
    /// `string` values.
    String(Vec<String>),
}

/// Evaluate `$body` with `$v` bound to the inner vector of any variant.
macro_rules! data_array_apply {
    ($array:expr, $v:ident => $body:expr) => {
        match $array {
            $crate::data_type::DataArray::Char($v) => $body,
            $crate::data_type::DataArray::Byte($v) => $body,
            $crate::data_type::DataArray::Short($v) => $body,
            $crate::data_type::DataArray::Int($v) => $body,
            $crate::data_type::DataArray::Float($v) => $body,
            $crate::data_type::DataArray::Double($v) => $body,
            $crate::data_type::DataArray::UByte($v) => $body,
            $crate::data_type::DataArray::UShort($v) => $body,
            $crate::data_type::DataArray::UInt($v) => $body,
            $crate::data_type::DataArray::Int64($v) => $body,
            $crate::data_type::DataArray::UInt64($v) => $body,
            $crate::data_type::DataArray::String($v) => $body,
        }
    };
}

/// Build a new array of the same variant, with `$body` producing the inner vector from `$v`.
macro_rules! data_array_map {
    ($array:expr, $v:ident => $body:expr) => {
        match $array {
            $crate::data_type::DataArray::Char($v) => $crate::data_type::DataArray::Char($body),
            $crate::data_type::DataArray::Byte($v) => $crate::data_type::DataArray::Byte($body),
            $crate::data_type::DataArray::Short($v) => $crate::data_type::DataArray::Short($body),
            $crate::data_type::DataArray::Int($v) => $crate::data_type::DataArray::Int($body),
            $crate::data_type::DataArray::Float($v) => $crate::data_type::DataArray::Float($body),
            $crate::data_type::DataArray::Double($v) => $crate::data_type::DataArray::Double($body),
            $crate::data_type::DataArray::UByte($v) => $crate::data_type::DataArray::UByte($body),
            $crate::data_type::DataArray::UShort($v) => $crate::data_type::DataArray::UShort($body),
            $crate::data_type::DataArray::UInt($v) => $crate::data_type::DataArray::UInt($body),
            $crate::data_type::DataArray::Int64($v) => $crate::data_type::DataArray::Int64($body),
            $crate::data_type::DataArray::UInt64($v) => $crate::data_type::DataArray::UInt64($body),
            $crate::data_type::DataArray::String($v) => $crate::data_type::DataArray::String($body),
        }
    };
}

pub(crate) use data_array_apply;
pub(crate) use data_array_map;

impl DataArray {
    /// Create an empty array of `data_type`.
    ///
    /// Returns [`None`] for [`DataType::NotAType`].
    #[must_use]
    pub fn new(data_type: DataType) -> Option<Self> {
        Some(match data_type {
            DataType::NotAType => return None,
            DataType::Char => Self::Char(Vec::new()),
            DataType::Byte => Self::Byte(Vec::new()),
            DataType::Short => Self::Short(Vec::new()),
            DataType::Int => Self::Int(Vec::new()),
            DataType::Float => Self::Float(Vec::new()),
            DataType::Double => Self::Double(Vec::new()),
            DataType::UByte => Self::UByte(Vec::new()),
            DataType::UShort => Self::UShort(Vec::new()),
            DataType::UInt => Self::UInt(Vec::new()),
            DataType::Int64 => Self::Int64(Vec::new()),
            DataType::UInt64 => Self::UInt64(Vec::new()),
            DataType::String => Self::String(Vec::new()),
        })
    }

    /// Create an array of `len` copies of `value`.
    #[must_use]
    pub fn from_value(value: &Value, len: usize) -> Self {
        match value {
            Value::Char(v) => Self::Char(vec![*v; len]),
            Value::Byte(v) => Self::Byte(vec![*v; len]),
            Value::Short(v) => Self::Short(vec![*v; len]),
            Value::Int(v) => Self::Int(vec![*v; len]),
            Value::Float(v) => Self::Float(vec![*v; len]),
            Value::Double(v) => Self::Double(vec![*v; len]),
            Value::UByte(v) => Self::UByte(vec![*v; len]),
            Value::UShort(v) => Self::UShort(vec![*v; len]),
            Value::UInt(v) => Self::UInt(vec![*v; len]),
            Value::Int64(v) => Self::Int64(vec![*v; len]),
            Value::UInt64(v) => Self::UInt64(vec![*v; len]),
            Value::String(v) => Self::String(vec![v.clone(); len]),
        }
    }

    /// Create a `char` array holding the bytes of `text`.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::Char(text.as_bytes().to_vec())
    }

    /// Parse `text` into an array of `data_type`.
    ///
    /// `char` arrays take the text verbatim and `string` arrays hold it as a single element.
    /// Numeric arrays are parsed from comma and/or whitespace separated numbers.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::InvalidArgument`] if a number cannot be parsed or `data_type` is [`DataType::NotAType`].
    pub fn parse_text(data_type: DataType, text: &str) -> Result<Self, CdsError> {
        match data_type {
            DataType::NotAType => Err(CdsError::invalid("cannot parse text as NAT")),
            DataType::Char => Ok(Self::from_text(text)),
            DataType::String => Ok(Self::String(vec![text.to_string()])),
            _ => {
                let numbers = text
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|token| !token.is_empty())
                    .map(|token| {
                        token.parse::<f64>().map_err(|_| {
                            CdsError::invalid(format!("cannot parse {token:?} as {data_type}"))
                        })
                    })
                    .collect::<Result<Vec<f64>, _>>()?;
                Self::Double(numbers).cast(data_type)
            }
        }
    }

    /// Returns the data type of the array.
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

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        data_array_apply!(self, v => v.len())
    }

    /// Returns true if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of elements the array can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        data_array_apply!(self, v => v.capacity())
    }

    /// Returns the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        Some(match self {
            Self::Char(v) => Value::Char(*v.get(index)?),
            Self::Byte(v) => Value::Byte(*v.get(index)?),
            Self::Short(v) => Value::Short(*v.get(index)?),
            Self::Int(v) => Value::Int(*v.get(index)?),
            Self::Float(v) => Value::Float(*v.get(index)?),
            Self::Double(v) => Value::Double(*v.get(index)?),
            Self::UByte(v) => Value::UByte(*v.get(index)?),
            Self::UShort(v) => Value::UShort(*v.get(index)?),
            Self::UInt(v) => Value::UInt(*v.get(index)?),
            Self::Int64(v) => Value::Int64(*v.get(index)?),
            Self::UInt64(v) => Value::UInt64(*v.get(index)?),
            Self::String(v) => Value::String(v.get(index)?.clone()),
        })
    }

    /// Returns the first element.
    #[must_use]
    pub fn first(&self) -> Option<Value> {
        self.get(0)
    }

    /// Iterate over the elements as [`Value`]s.
    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(|index| self.get(index))
    }

    /// Returns a copy of the elements in `range`.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::InvalidArgument`] if `range` is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Result<Self, CdsError> {
        if range.start > range.end || range.end > self.len() {
            return Err(CdsError::invalid(format!(
                "range {range:?} exceeds array length {}",
                self.len()
            )));
        }
        Ok(data_array_map!(self, v => v[range].to_vec()))
    }

    /// Overwrite the elements starting at `offset` with `values`.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::InvalidArgument`] if the data types differ or the write exceeds the array length.
    pub fn write_at(&mut self, offset: usize, values: &Self) -> Result<(), CdsError> {
        if offset + values.len() > self.len() {
            return Err(CdsError::invalid(format!(
                "writing {} elements at offset {offset} exceeds array length {}",
                values.len(),
                self.len()
            )));
        }
        macro_rules! write_variants {
            ($($variant:ident),+) => {
                match (self, values) {
                    $((Self::$variant(dst), Self::$variant(src)) => {
                        dst[offset..offset + src.len()].clone_from_slice(src);
                        Ok(())
                    })+
                    (dst, src) => Err(CdsError::invalid(format!(
                        "cannot write {} values into a {} array",
                        src.data_type(),
                        dst.data_type()
                    ))),
                }
            };
        }
        write_variants!(Char, Byte, Short, Int, Float, Double, UByte, UShort, UInt, Int64, UInt64, String)
    }

    /// Fill the elements in `range` with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::InvalidArgument`] if the value type differs from the array type or `range` is out of bounds.
    pub fn fill(&mut self, range: Range<usize>, value: &Value) -> Result<(), CdsError> {
        if range.start > range.end || range.end > self.len() {
            return Err(CdsError::invalid(format!(
                "range {range:?} exceeds array length {}",
                self.len()
            )));
        }
        let fill = Self::from_value(value, range.end - range.start);
        self.write_at(range.start, &fill)
    }

    /// Reserve capacity for at least `additional` more elements.
    ///
    /// # Errors
    ///
    /// Returns a [`TryReserveError`] if the allocation fails.
    pub fn try_reserve_exact(&mut self, additional: usize) -> Result<(), TryReserveError> {
        data_array_apply!(self, v => v.try_reserve_exact(additional))
    }

    /// Resize the array to `len`, filling new elements with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::InvalidArgument`] if the value type differs from the array type.
    pub fn resize_with_value(&mut self, len: usize, value: &Value) -> Result<(), CdsError> {
        let current = self.len();
        if len <= current {
            self.truncate(len);
            return Ok(());
        }
        if value.data_type() != self.data_type() {
            return Err(CdsError::invalid(format!(
                "cannot fill a {} array with a {} value",
                self.data_type(),
                value.data_type()
            )));
        }
        match (self, value) {
            (Self::Char(v), Value::Char(x)) | (Self::UByte(v), Value::UByte(x)) => v.resize(len, *x),
            (Self::Byte(v), Value::Byte(x)) => v.resize(len, *x),
            (Self::Short(v), Value::Short(x)) => v.resize(len, *x),
            (Self::Int(v), Value::Int(x)) => v.resize(len, *x),
            (Self::Float(v), Value::Float(x)) => v.resize(len, *x),
            (Self::Double(v), Value::Double(x)) => v.resize(len, *x),
            (Self::UShort(v), Value::UShort(x)) => v.resize(len, *x),
            (Self::UInt(v), Value::UInt(x)) => v.resize(len, *x),
            (Self::Int64(v), Value::Int64(x)) => v.resize(len, *x),
            (Self::UInt64(v), Value::UInt64(x)) => v.resize(len, *x),
            (Self::String(v), Value::String(x)) => v.resize(len, x.clone()),
            _ => {}
        }
        Ok(())
    }

    /// Resize the array to `len`, filling new elements with zero (or empty strings).
    pub fn resize_default(&mut self, len: usize) {
        data_array_apply!(self, v => v.resize_with(len, Default::default));
    }

    /// Shorten the array to `len` elements, keeping its capacity.
    pub fn truncate(&mut self, len: usize) {
        data_array_apply!(self, v => v.truncate(len));
    }

    /// Append `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::InvalidArgument`] if the value type differs from the array type.
    pub fn push(&mut self, value: Value) -> Result<(), CdsError> {
        match (self, value) {
            (Self::Char(v), Value::Char(x)) | (Self::UByte(v), Value::UByte(x)) => v.push(x),
            (Self::Byte(v), Value::Byte(x)) => v.push(x),
            (Self::Short(v), Value::Short(x)) => v.push(x),
            (Self::Int(v), Value::Int(x)) => v.push(x),
            (Self::Float(v), Value::Float(x)) => v.push(x),
            (Self::Double(v), Value::Double(x)) => v.push(x),
            (Self::UShort(v), Value::UShort(x)) => v.push(x),
            (Self::UInt(v), Value::UInt(x)) => v.push(x),
            (Self::Int64(v), Value::Int64(x)) => v.push(x),
            (Self::UInt64(v), Value::UInt64(x)) => v.push(x),
            (Self::String(v), Value::String(x)) => v.push(x),
            (array, value) => {
                return Err(CdsError::invalid(format!(
                    "cannot append a {} value to a {} array",
                    value.data_type(),
                    array.data_type()
                )))
            }
        }
        Ok(())
    }

    /// Append the elements of `other`.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::InvalidArgument`] if the data types differ.
    pub fn append(&mut self, other: &Self) -> Result<(), CdsError> {
        if other.data_type() != self.data_type() {
            return Err(CdsError::invalid(format!(
                "cannot append {} values to a {} array",
                other.data_type(),
                self.data_type()
            )));
        }
        let offset = self.len();
        self.resize_default(offset + other.len());
        self.write_at(offset, other)
    }

    /// Returns the native-endian bytes of a numeric array, or [`None`] for strings.
    #[must_use]
    pub fn as_ne_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Char(v) | Self::UByte(v) => Some(v.as_slice()),
            Self::Byte(v) => Some(bytemuck::cast_slice(v)),
            Self::Short(v) => Some(bytemuck::cast_slice(v)),
            Self::Int(v) => Some(bytemuck::cast_slice(v)),
            Self::Float(v) => Some(bytemuck::cast_slice(v)),
            Self::Double(v) => Some(bytemuck::cast_slice(v)),
            Self::UShort(v) => Some(bytemuck::cast_slice(v)),
            Self::UInt(v) => Some(bytemuck::cast_slice(v)),
            Self::Int64(v) => Some(bytemuck::cast_slice(v)),
            Self::UInt64(v) => Some(bytemuck::cast_slice(v)),
            Self::String(_) => None,
        }
    }

    /// Render the array as text.
    ///
    /// A `char` array is decoded as UTF-8 up to the first NUL, other arrays are joined with `", "`.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Char(bytes) => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                String::from_utf8_lossy(&bytes[..end]).into_owned()
            }
            _ => self.values().join(", "),
        }
    }

    /// Cast the array to `data_type`, saturating at the bounds of the output type.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::TypeMismatch`] if exactly one of the types is `string`.
    pub fn cast(&self, data_type: DataType) -> Result<Self, CdsError> {
        if self.data_type() == data_type {
            return Ok(self.clone());
        }
        let converter = crate::converter::Converter::new(self.data_type(), None, data_type, None)?;
        converter.convert_array(crate::converter::UnitsMode::Ignore, self)
    }
}

macro_rules! impl_from_vec_for_data_array {
    ($t:ty, $variant:ident) => {
        impl From<Vec<$t>> for DataArray {
            fn from(values: Vec<$t>) -> Self {
                Self::$variant(values)
            }
        }

        impl From<&[$t]> for DataArray {
            fn from(values: &[$t]) -> Self {
                Self::$variant(values.to_vec())
            }
        }
    };
}

impl_from_vec_for_data_array!(i8, Byte);
impl_from_vec_for_data_array!(i16, Short);
impl_from_vec_for_data_array!(i32, Int);
impl_from_vec_for_data_array!(f32, Float);
impl_from_vec_for_data_array!(f64, Double);
impl_from_vec_for_data_array!(u8, UByte);
impl_from_vec_for_data_array!(u16, UShort);
impl_from_vec_for_data_array!(u32, UInt);
impl_from_vec_for_data_array!(i64, Int64);
impl_from_vec_for_data_array!(u64, UInt64);
impl_from_vec_for_data_array!(String, String);

impl From<&str> for DataArray {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}
