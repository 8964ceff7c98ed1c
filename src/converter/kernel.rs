use crate::{
    data_type::{Element, Wide},
    units::UnitConverter,
    CdsError, DataArray, DataType,
};

use super::{Bound, Converter, Rounding, UnitsMode};

/// Dispatch on a numeric output type, binding `$o` to its element type and wrapping the vector produced by `$body`.
macro_rules! with_output_type {
    ($data_type:expr, $o:ident => $body:expr, else $fallback:expr) => {
        match $data_type {
            DataType::Char => { type $o = u8; DataArray::Char($body) }
            DataType::Byte => { type $o = i8; DataArray::Byte($body) }
            DataType::Short => { type $o = i16; DataArray::Short($body) }
            DataType::Int => { type $o = i32; DataArray::Int($body) }
            DataType::Float => { type $o = f32; DataArray::Float($body) }
            DataType::Double => { type $o = f64; DataArray::Double($body) }
            DataType::UByte => { type $o = u8; DataArray::UByte($body) }
            DataType::UShort => { type $o = u16; DataArray::UShort($body) }
            DataType::UInt => { type $o = u32; DataArray::UInt($body) }
            DataType::Int64 => { type $o = i64; DataArray::Int64($body) }
            DataType::UInt64 => { type $o = u64; DataArray::UInt64($body) }
            DataType::String | DataType::NotAType => $fallback,
        }
    };
}

/// The per-element steps of a conversion, resolved for one pair of element types.
struct Plan<'a, I, O> {
    map: Option<(&'a [I], &'a [O])>,
    units: Option<&'a dyn UnitConverter>,
    delta: bool,
    min: Option<(Wide, O)>,
    max: Option<(Wide, O)>,
    rounding: Rounding,
}

impl<'a, I: Element, O: Element> Plan<'a, I, O> {
    fn new(converter: &'a Converter, mode: UnitsMode) -> Self {
        let units = converter
            .units
            .as_deref()
            .filter(|_| mode != UnitsMode::Ignore);
        // an identity map only matters when units or a range would change the mapped values
        let ranged = converter.min.is_some() || converter.max.is_some();
        let map = converter
            .map
            .as_ref()
            .filter(|map| units.is_some() || ranged || !map.identity)
            .and_then(|map| Some((I::slice(&map.input)?, O::slice(&map.output)?)));
        let delta = units.is_some() && mode == UnitsMode::Delta;
        let bound = |bound: &Option<Bound>| {
            bound
                .as_ref()
                .filter(|_| !delta)
                .and_then(|bound| Some((bound.limit, O::from_value(&bound.replacement)?)))
        };
        Self {
            map,
            units,
            delta,
            min: bound(&converter.min),
            max: bound(&converter.max),
            rounding: converter.rounding,
        }
    }

    fn out_of_range(&self, value: Wide) -> Option<O> {
        match (self.min, self.max) {
            (Some((limit, replacement)), _) if value < limit => Some(replacement),
            (_, Some((limit, replacement))) if value > limit => Some(replacement),
            _ => None,
        }
    }

    fn apply(&self, value: I) -> O {
        if let Some((input, output)) = self.map {
            if let Some(&mapped) = input
                .iter()
                .position(|&missing| missing.same_value(value))
                .and_then(|index| output.get(index))
            {
                return mapped;
            }
        }
        match self.units {
            Some(units) => {
                let x = value.to_f64();
                let x = if self.delta {
                    units.convert(2.0 * x) - units.convert(x)
                } else {
                    units.convert(x)
                };
                self.out_of_range(Wide::Float(x))
                    .unwrap_or_else(|| O::from_f64(x, self.rounding))
            }
            None => self
                .out_of_range(value.to_wide())
                .unwrap_or_else(|| O::cast_from(value, self.rounding)),
        }
    }
}

fn convert_slice<I: Element, O: Element>(plan: &Plan<I, O>, values: &[I]) -> Result<Vec<O>, CdsError> {
    let mut converted = Vec::new();
    converted
        .try_reserve_exact(values.len())
        .map_err(|err| CdsError::allocation("converted data", err))?;
    converted.extend(values.iter().map(|&value| plan.apply(value)));
    Ok(converted)
}

/// Reinterpret the allocation of `values` as the output element type and convert each element in place.
///
/// Returns `values` unchanged if the element sizes or alignments differ.
fn convert_vec<I: Element, O: Element>(plan: &Plan<I, O>, values: Vec<I>) -> Result<Vec<O>, Vec<I>> {
    let mut converted: Vec<O> =
        bytemuck::allocation::try_cast_vec(values).map_err(|(_, values)| values)?;
    for slot in &mut converted {
        if let Ok(value) = bytemuck::try_cast::<O, I>(*slot) {
            *slot = plan.apply(value);
        }
    }
    Ok(converted)
}

fn mismatch(converter: &Converter) -> CdsError {
    CdsError::TypeMismatch(converter.in_type, converter.out_type).logged()
}

fn convert_strings(converter: &Converter, values: &mut [String]) {
    let Some(map) = &converter.map else {
        return;
    };
    let (DataArray::String(input), DataArray::String(output)) = (&map.input, &map.output) else {
        return;
    };
    for value in values {
        if let Some(mapped) = input
            .iter()
            .position(|missing| missing == value)
            .and_then(|index| output.get(index))
        {
            value.clone_from(mapped);
        }
    }
}

pub(super) fn convert(converter: &Converter, mode: UnitsMode, data: &DataArray) -> Result<DataArray, CdsError> {
    fn numeric<I: Element>(
        converter: &Converter,
        mode: UnitsMode,
        values: &[I],
    ) -> Result<DataArray, CdsError> {
        Ok(with_output_type!(
            converter.out_type,
            O => convert_slice(&Plan::<I, O>::new(converter, mode), values)?,
            else return Err(mismatch(converter))
        ))
    }

    match data {
        DataArray::Char(values) | DataArray::UByte(values) => numeric(converter, mode, values),
        DataArray::Byte(values) => numeric(converter, mode, values),
        DataArray::Short(values) => numeric(converter, mode, values),
        DataArray::Int(values) => numeric(converter, mode, values),
        DataArray::Float(values) => numeric(converter, mode, values),
        DataArray::Double(values) => numeric(converter, mode, values),
        DataArray::UShort(values) => numeric(converter, mode, values),
        DataArray::UInt(values) => numeric(converter, mode, values),
        DataArray::Int64(values) => numeric(converter, mode, values),
        DataArray::UInt64(values) => numeric(converter, mode, values),
        DataArray::String(values) => {
            if converter.out_type != DataType::String {
                return Err(mismatch(converter));
            }
            let mut values = values.clone();
            convert_strings(converter, &mut values);
            Ok(DataArray::String(values))
        }
    }
}

pub(super) fn convert_in_place(
    converter: &Converter,
    mode: UnitsMode,
    data: &mut DataArray,
) -> Result<bool, CdsError> {
    fn numeric<I: Element>(converter: &Converter, mode: UnitsMode, values: Vec<I>) -> DataArray {
        with_output_type!(
            converter.out_type,
            O => {
                let plan = Plan::<I, O>::new(converter, mode);
                convert_vec(&plan, values)
                    .unwrap_or_else(|values| values.iter().map(|&value| plan.apply(value)).collect())
            },
            else DataArray::Char(Vec::new())
        )
    }

    if let DataArray::String(values) = data {
        convert_strings(converter, values);
        return Ok(true);
    }
    if converter.in_type.size() != converter.out_type.size() || !converter.out_type.is_numeric() {
        *data = convert(converter, mode, data)?;
        return Ok(false);
    }
    // equal element sizes, so the allocation can be reinterpreted
    *data = match std::mem::replace(data, DataArray::Char(Vec::new())) {
        DataArray::Char(values) | DataArray::UByte(values) => numeric(converter, mode, values),
        DataArray::Byte(values) => numeric(converter, mode, values),
        DataArray::Short(values) => numeric(converter, mode, values),
        DataArray::Int(values) => numeric(converter, mode, values),
        DataArray::Float(values) => numeric(converter, mode, values),
        DataArray::Double(values) => numeric(converter, mode, values),
        DataArray::UShort(values) => numeric(converter, mode, values),
        DataArray::UInt(values) => numeric(converter, mode, values),
        DataArray::Int64(values) => numeric(converter, mode, values),
        DataArray::UInt64(values) => numeric(converter, mode, values),
        DataArray::String(values) => DataArray::String(values),
    };
    Ok(true)
}
