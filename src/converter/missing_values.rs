use crate::{CdsError, DataArray, DataType};

use super::{Converter, OutputMap, UnitsMode};

/// Map the missing values `values` to `out_type`.
///
/// Each value keeps its meaning in the output type:
///  - the default fill value of the input type maps to the default fill value of `out_type`,
///  - a value representable in `out_type` keeps its value,
///  - any other value maps to the first representable value of `values`,
///    or to the default fill value of `out_type` if there is none.
///
/// # Errors
///
/// Returns [`CdsError::TypeMismatch`] if exactly one of the types is `string`.
pub fn missing_values_map(values: &DataArray, out_type: DataType) -> Result<DataArray, CdsError> {
    let in_type = values.data_type();
    let mut converter = Converter::new(in_type, None, out_type, None)?;
    if !out_type.is_numeric() {
        return converter.convert_array(UnitsMode::Ignore, values);
    }
    let (Some(out_min), Some(out_max), Some(out_fill)) =
        (out_type.wide_min(), out_type.wide_max(), out_type.default_fill())
    else {
        return Err(CdsError::TypeMismatch(in_type, out_type).logged());
    };
    let out_of_range = values
        .values()
        .find(|value| {
            value
                .to_wide()
                .is_some_and(|wide| wide >= out_min && wide <= out_max)
        })
        .map(|value| value.cast(out_type))
        .transpose()?
        .unwrap_or_else(|| out_fill.clone());

    if let Some(in_fill) = in_type.default_fill() {
        converter.set_map(
            &DataArray::from_value(&in_fill, 1),
            OutputMap::Values(DataArray::from_value(&out_fill, 1)),
        )?;
    }
    converter.set_range(None, Some(&out_of_range), None, Some(&out_of_range))?;
    converter.convert_array(UnitsMode::Ignore, values)
}
