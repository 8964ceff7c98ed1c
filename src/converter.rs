//! Data conversion between data types and units.
//!
//! A [`Converter`] is a reusable plan for converting values of one data type and units into another.
//! Each element is converted in this order:
//!  1. a value found in the missing value map is replaced by its mapped output value,
//!  2. units are converted (unless the call uses [`UnitsMode::Ignore`]),
//!  3. a value outside the converter range is replaced by the out-of-range value of that bound,
//!  4. the value is cast to the output type with the converter [`Rounding`].
//!
//! ```
//! # use cds::{converter::{Converter, UnitsMode}, DataArray, DataType, Value};
//! let mut converter = Converter::new(DataType::Int, None, DataType::Short, None)?;
//! let data = DataArray::from(vec![1i32, 40000, -9999]);
//! assert_eq!(
//!     converter.convert_array(UnitsMode::Convert, &data)?,
//!     DataArray::Short(vec![1, 32767, -9999])
//! );
//!
//! // replace values above 100 with the short fill value
//! converter.set_range(None, None, Some(&Value::Int(100)), Some(&Value::Short(-32767)))?;
//! assert_eq!(
//!     converter.convert_array(UnitsMode::Convert, &data)?,
//!     DataArray::Short(vec![1, -32767, -9999])
//! );
//! # Ok::<(), cds::CdsError>(())
//! ```

mod data_attributes;
mod kernel;
mod missing_values;
mod var_converter;

use std::{ops::Range, sync::Arc};

use serde::{Deserialize, Serialize};

pub use data_attributes::DataAttributes;
pub use missing_values::missing_values_map;

use crate::{
    config::global_config,
    data_type::Wide,
    units::{get_unit_converter, UnitConverter, UnitSystem},
    CdsError, DataArray, DataType, Value, COMPONENT,
};

/// The rounding applied when a floating point value is cast to an integer type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// Round to the nearest integer, ties away from zero.
    #[default]
    Nearest,
    /// Round towards zero.
    Truncate,
}

impl Rounding {
    /// Round `value`.
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::Nearest => value.round(),
            Self::Truncate => value.trunc(),
        }
    }
}

/// How a conversion call treats the units of a [`Converter`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitsMode {
    /// Convert values between the units.
    #[default]
    Convert,
    /// Only cast values; units are not converted.
    Ignore,
    /// Convert values as differences (offsets) rather than absolute quantities.
    ///
    /// A value `v` becomes `convert(2v) - convert(v)` and the range is not applied.
    Delta,
}

/// The output side of a missing value map.
#[derive(Clone, Debug, PartialEq)]
pub enum OutputMap {
    /// Derive one output value per input value with [`missing_values_map`].
    Derive,
    /// Map every input value to the first derived output value.
    DeriveSingle,
    /// Map input values to these values, cast to the output type.
    ///
    /// A shorter list is padded with its first value.
    Values(DataArray),
}

#[derive(Clone, Debug)]
struct ValueMap {
    input: DataArray,
    output: DataArray,
    identity: bool,
}

/// One side of the converter range.
#[derive(Clone, Debug)]
struct Bound {
    limit: Wide,
    replacement: Value,
}

/// A reusable plan for converting data between data types and units.
///
/// A converter is not attached to any object; it is created for a conversion and dropped after it.
#[derive(Clone, Debug)]
pub struct Converter {
    in_type: DataType,
    in_units: Option<String>,
    out_type: DataType,
    out_units: Option<String>,
    units: Option<Arc<dyn UnitConverter>>,
    map: Option<ValueMap>,
    min: Option<Bound>,
    max: Option<Bound>,
    rounding: Rounding,
    data_attributes: DataAttributes,
}

impl Converter {
    /// Create a converter from `in_type`/`in_units` to `out_type`/`out_units` using the global unit system.
    ///
    /// Units are only converted if both units are given.
    /// If the input type has a wider range than the output type,
    /// out-of-range values are replaced by the minimum/maximum of the output type.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if exactly one of the types is `string`, a type is [`DataType::NotAType`],
    /// or the units cannot be converted.
    pub fn new(
        in_type: DataType,
        in_units: Option<&str>,
        out_type: DataType,
        out_units: Option<&str>,
    ) -> Result<Self, CdsError> {
        Self::check_types(in_type, out_type)?;
        let units = match (in_units, out_units) {
            (Some(from), Some(to)) => get_unit_converter(from, to).map_err(CdsError::from)?,
            _ => None,
        };
        Self::build(in_type, in_units, out_type, out_units, units)
    }

    /// Create a converter resolving units with `system` instead of the global unit system.
    ///
    /// # Errors
    ///
    /// See [`Converter::new`].
    pub fn with_unit_system(
        in_type: DataType,
        in_units: Option<&str>,
        out_type: DataType,
        out_units: Option<&str>,
        system: &dyn UnitSystem,
    ) -> Result<Self, CdsError> {
        Self::check_types(in_type, out_type)?;
        let units = match (in_units, out_units) {
            (Some(from), Some(to)) => crate::units::resolve_converter(system, from, to)?,
            _ => None,
        };
        Self::build(in_type, in_units, out_type, out_units, units)
    }

    fn check_types(in_type: DataType, out_type: DataType) -> Result<(), CdsError> {
        if (in_type == DataType::String) != (out_type == DataType::String) {
            return Err(CdsError::TypeMismatch(in_type, out_type).logged());
        }
        if in_type == DataType::NotAType || out_type == DataType::NotAType {
            return Err(CdsError::invalid(format!(
                "could not create converter from {in_type} to {out_type}"
            )));
        }
        Ok(())
    }

    fn build(
        in_type: DataType,
        in_units: Option<&str>,
        out_type: DataType,
        out_units: Option<&str>,
        units: Option<Arc<dyn UnitConverter>>,
    ) -> Result<Self, CdsError> {
        if units.is_some() && in_type == DataType::String {
            return Err(CdsError::invalid(format!(
                "could not create converter: string values cannot be converted from {:?} to {:?}",
                in_units.unwrap_or_default(),
                out_units.unwrap_or_default()
            )));
        }
        let (rounding, data_attributes) = {
            let config = global_config();
            (config.rounding(), config.data_attributes().clone())
        };
        let mut converter = Self {
            in_type,
            in_units: in_units.map(str::to_string),
            out_type,
            out_units: out_units.map(str::to_string),
            units,
            map: None,
            min: None,
            max: None,
            rounding,
            data_attributes,
        };
        if out_type.is_numeric() {
            let min = out_type.min();
            let max = out_type.max();
            converter.set_range(None, min.as_ref(), None, max.as_ref())?;
        }
        tracing::trace!(
            target: COMPONENT,
            %in_type,
            ?in_units,
            %out_type,
            ?out_units,
            units = converter.units.is_some(),
            "converter created"
        );
        Ok(converter)
    }

    /// Returns the input data type.
    #[must_use]
    pub const fn in_type(&self) -> DataType {
        self.in_type
    }

    /// Returns the input units.
    #[must_use]
    pub fn in_units(&self) -> Option<&str> {
        self.in_units.as_deref()
    }

    /// Returns the output data type.
    #[must_use]
    pub const fn out_type(&self) -> DataType {
        self.out_type
    }

    /// Returns the output units.
    #[must_use]
    pub fn out_units(&self) -> Option<&str> {
        self.out_units.as_deref()
    }

    /// Returns true if the converter converts units.
    #[must_use]
    pub fn converts_units(&self) -> bool {
        self.units.is_some()
    }

    /// Returns the rounding applied when casting floating point values to integers.
    #[must_use]
    pub const fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Set the rounding applied when casting floating point values to integers.
    pub fn set_rounding(&mut self, rounding: Rounding) -> &mut Self {
        self.rounding = rounding;
        self
    }

    /// Returns the data attributes converted alongside variable data by [`Hierarchy::convert_var`](crate::Hierarchy::convert_var).
    #[must_use]
    pub const fn data_attributes(&self) -> &DataAttributes {
        &self.data_attributes
    }

    /// Replace the data attributes taken from the global configuration when the converter was created.
    #[must_use]
    pub fn with_data_attributes(mut self, data_attributes: DataAttributes) -> Self {
        self.data_attributes = data_attributes;
        self
    }

    /// Set the missing value map.
    ///
    /// `input` is cast to the input type and the output values to the output type.
    /// An empty `input` clears the map.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the values cannot be cast.
    pub fn set_map(&mut self, input: &DataArray, output: OutputMap) -> Result<(), CdsError> {
        self.map = None;
        if input.is_empty() {
            return Ok(());
        }
        let input = input.cast(self.in_type)?;
        let output = match output {
            OutputMap::Values(values) if !values.is_empty() => {
                let mut values = values.cast(self.out_type)?;
                values.truncate(input.len());
                if let Some(first) = values.first() {
                    while values.len() < input.len() {
                        values.push(first.clone())?;
                    }
                }
                values
            }
            OutputMap::DeriveSingle => {
                let derived = missing_values_map(&input, self.out_type)?;
                match derived.first() {
                    Some(first) => DataArray::from_value(&first, input.len()),
                    None => derived,
                }
            }
            OutputMap::Derive | OutputMap::Values(_) => missing_values_map(&input, self.out_type)?,
        };
        let identity = input.len() == output.len()
            && std::iter::zip(input.values(), output.values()).all(|(a, b)| match (a.to_wide(), b.to_wide()) {
                (Some(a), Some(b)) => a == b,
                _ => a == b,
            });
        self.map = Some(ValueMap {
            input,
            output,
            identity,
        });
        Ok(())
    }

    /// Returns the first output value of the missing value map.
    ///
    /// This is the missing value of converted data when every input missing value maps to a single value.
    #[must_use]
    pub fn output_missing_value(&self) -> Option<Value> {
        self.map.as_ref().and_then(|map| map.output.first())
    }

    /// Set the range of the output data.
    ///
    /// A bound is only applied if its out-of-range value is given.
    /// If the bound itself is [`None`], the minimum/maximum of the output type is used,
    /// but only if the input type can hold values beyond it.
    /// Bounds and out-of-range values are cast to the output type.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the values cannot be cast or the output type is `string`.
    pub fn set_range(
        &mut self,
        min: Option<&Value>,
        orv_min: Option<&Value>,
        max: Option<&Value>,
        orv_max: Option<&Value>,
    ) -> Result<(), CdsError> {
        self.min = None;
        self.max = None;
        if !self.out_type.is_numeric() {
            if orv_min.is_some() || orv_max.is_some() {
                return Err(CdsError::invalid(format!(
                    "could not set converter range: unsupported data type {}",
                    self.out_type
                )));
            }
            return Ok(());
        }
        if let Some(orv) = orv_min {
            let limit = match min {
                Some(min) => Some(min.cast(self.out_type)?),
                None => match (self.in_type.wide_min(), self.out_type.wide_min()) {
                    (Some(in_min), Some(out_min)) if in_min < out_min => self.out_type.min(),
                    _ => None,
                },
            };
            self.min = self.bound(limit, orv)?;
        }
        if let Some(orv) = orv_max {
            let limit = match max {
                Some(max) => Some(max.cast(self.out_type)?),
                None => match (self.in_type.wide_max(), self.out_type.wide_max()) {
                    (Some(in_max), Some(out_max)) if in_max > out_max => self.out_type.max(),
                    _ => None,
                },
            };
            self.max = self.bound(limit, orv)?;
        }
        Ok(())
    }

    fn bound(&self, limit: Option<Value>, orv: &Value) -> Result<Option<Bound>, CdsError> {
        let Some(limit) = limit.as_ref().and_then(Value::to_wide) else {
            return Ok(None);
        };
        Ok(Some(Bound {
            limit,
            replacement: orv.cast(self.out_type)?,
        }))
    }

    /// Returns true if converting with `mode` changes any value.
    ///
    /// A converter has no conversion if the types are equal, units are not converted,
    /// the missing value map is an identity, and no range is set.
    #[must_use]
    pub fn has_conversion(&self, mode: UnitsMode) -> bool {
        self.in_type != self.out_type
            || (self.units.is_some() && mode != UnitsMode::Ignore)
            || self.map.as_ref().is_some_and(|map| !map.identity)
            || self.min.is_some()
            || self.max.is_some()
    }

    fn check_input(&self, data: &DataArray) -> Result<(), CdsError> {
        if data.data_type() == self.in_type {
            Ok(())
        } else {
            Err(CdsError::invalid(format!(
                "could not convert {} values with a {} to {} converter",
                data.data_type(),
                self.in_type,
                self.out_type
            )))
        }
    }

    /// Convert `data` into a new array of the output type.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if `data` is not of the input type or the output cannot be allocated.
    pub fn convert_array(&self, mode: UnitsMode, data: &DataArray) -> Result<DataArray, CdsError> {
        self.check_input(data)?;
        if !self.has_conversion(mode) {
            return Ok(data.clone());
        }
        kernel::convert(self, mode, data)
    }

    /// Convert the elements of `data` in `range` into a new array of the output type.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if `range` is out of bounds or [`Converter::convert_array`] fails.
    pub fn convert_range(
        &self,
        mode: UnitsMode,
        data: &DataArray,
        range: Range<usize>,
    ) -> Result<DataArray, CdsError> {
        self.check_input(data)?;
        self.convert_array(mode, &data.slice(range)?)
    }

    /// Convert `data` in place, replacing it with an array of the output type.
    ///
    /// The allocation of `data` is reused if the input and output elements have the same size.
    /// Returns true if the allocation was reused, and false if a new array was allocated.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if `data` is not of the input type or a new array cannot be allocated.
    pub fn convert_in_place(&self, mode: UnitsMode, data: &mut DataArray) -> Result<bool, CdsError> {
        self.check_input(data)?;
        if !self.has_conversion(mode) {
            return Ok(true);
        }
        kernel::convert_in_place(self, mode, data)
    }

    /// Convert a single value.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if `value` is not of the input type.
    pub fn convert_value(&self, value: &Value) -> Result<Value, CdsError> {
        self.convert_array(UnitsMode::Convert, &DataArray::from_value(value, 1))?
            .first()
            .ok_or_else(|| CdsError::invalid("could not convert an empty value"))
    }
}
