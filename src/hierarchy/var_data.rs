//! Variable sample storage: allocation, hole filling, reads and writes.

use crate::{
    converter::{Converter, OutputMap, UnitsMode},
    data_type::Element,
    node::{AttParent, GroupId, VarId},
    CdsError, DataArray, DataType, Value, COMPONENT,
};

use super::Hierarchy;

/// Missing value attribute names, in priority order.
pub(crate) const MISSING_VALUE_ATTS: [&str; 7] = [
    "missing_value",
    "missing-value",
    "missing_data",
    "missing-data",
    "missing_value1",
    "Missing_value",
    "_FillValue",
];

/// Data read from a variable by [`Hierarchy::get_var_data`].
#[derive(Clone, Debug, PartialEq)]
pub struct RetrievedData {
    /// The samples, cast to the requested type.
    pub data: DataArray,
    /// The number of samples read.
    pub sample_count: usize,
    /// The value that replaced every missing value of the variable, if it has any.
    pub missing_value: Option<Value>,
}

impl Hierarchy {
    /// Returns the missing values of a variable, cast to its data type.
    ///
    /// The missing value attributes of the variable are checked in priority order
    /// (`missing_value`, its deprecated synonyms, then `_FillValue`).
    /// If the variable has none, the same attributes of its ancestor groups are checked, nearest first.
    /// If there are still none, the default fill value of the variable is used if it is set.
    /// Values are returned in that order, duplicates included; the first is the missing value used for new data.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale or a missing value attribute cannot be cast to the variable type.
    pub fn get_var_missing_values(&self, id: VarId) -> Result<DataArray, CdsError> {
        let var = self.var_ref(id)?;
        let data_type = var.data_type;
        let mut values = Vec::new();
        self.collect_missing_values(AttParent::Var(id), data_type, &mut values)?;
        if values.is_empty() {
            if let Some(group) = var.group() {
                for group in self.group_lineage(group) {
                    self.collect_missing_values(AttParent::Group(group), data_type, &mut values)?;
                    if !values.is_empty() {
                        break;
                    }
                }
            }
        }
        if values.is_empty() {
            values.extend(var.default_fill.clone());
        }
        let mut missing = DataArray::new(data_type)
            .ok_or_else(|| CdsError::invalid(format!("{} has no data type", self.describe(id))))?;
        for value in values {
            missing.push(value)?;
        }
        Ok(missing)
    }

    fn collect_missing_values(
        &self,
        parent: AttParent,
        data_type: DataType,
        values: &mut Vec<Value>,
    ) -> Result<(), CdsError> {
        for name in MISSING_VALUE_ATTS {
            let Some(att) = self.get_att(parent, name) else {
                continue;
            };
            let att_type = self.att_ref(att)?.data_type();
            if (att_type == DataType::String) != (data_type == DataType::String) {
                continue;
            }
            values.extend(self.get_att_value(att, data_type)?.values());
        }
        Ok(())
    }

    /// Returns the first missing value of a variable, adopting the default fill value of its type when it has none.
    pub(crate) fn resolve_fill_value(&mut self, id: VarId) -> Result<Value, CdsError> {
        if let Some(value) = self.get_var_missing_values(id)?.first() {
            return Ok(value);
        }
        let var = self.var_mut(id)?;
        let fill = var
            .data_type
            .default_fill()
            .ok_or_else(|| CdsError::invalid("variable has no data type"))?;
        var.default_fill = Some(fill.clone());
        Ok(fill)
    }

    /// Allocate space for samples `start..start + count` of a variable.
    ///
    /// Returns the element offset of sample `start` in the variable data.
    ///
    /// The data of a variable with an unlimited first dimension grows geometrically,
    /// and the length of the unlimited dimension is raised to cover the new samples.
    /// The data of any other variable is allocated for the full length of its first dimension.
    ///
    /// If `start` is past the current sample count, the samples in between are filled with
    /// the first missing value of the variable. The requested samples themselves are zeroed if they are new.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if
    ///  - the handle is stale,
    ///  - `count` is zero,
    ///  - a dimension after the first has length zero,
    ///  - a scalar variable is allocated other than `(0, 1)`,
    ///  - the samples exceed the length of a static first dimension, or
    ///  - memory cannot be reserved.
    pub fn alloc_var_data(&mut self, id: VarId, start: usize, count: usize) -> Result<usize, CdsError> {
        let var = self.var_ref(id)?;
        if count == 0 {
            return Err(CdsError::invalid(format!(
                "could not allocate data for {}: zero sample count",
                self.describe(id)
            )));
        }
        let end = start.checked_add(count).ok_or_else(|| {
            CdsError::invalid(format!("sample range of {} overflows", self.describe(id)))
        })?;
        let dims = var.dims.clone();
        let unlimited = self.var_is_unlimited(id);
        let static_length = match dims.first() {
            None => {
                if (start, count) != (0, 1) {
                    return Err(CdsError::invalid(format!(
                        "could not allocate data for {}: a scalar variable holds exactly one sample",
                        self.describe(id)
                    )));
                }
                1
            }
            Some(&dim) => {
                if let Some(&empty) = dims
                    .iter()
                    .skip(1)
                    .find(|&&dim| self.dim(dim).is_some_and(|dim| dim.length == 0))
                {
                    return Err(CdsError::invalid(format!(
                        "could not allocate data for {}: dimension {} has length zero",
                        self.describe(id),
                        self.describe(empty)
                    )));
                }
                let length = self.dim_ref(dim)?.length;
                if !unlimited && end > length {
                    return Err(CdsError::invalid(format!(
                        "could not allocate data for {}: samples {start}..{end} exceed the dimension length {length}",
                        self.describe(id)
                    )));
                }
                length
            }
        };
        let sample_size = self.var_sample_size(id);
        let (sample_count, alloc_count) = (var.sample_count, var.alloc_count);

        let alloc = if end <= alloc_count {
            alloc_count
        } else if unlimited {
            let mut alloc = if alloc_count == 0 { end } else { alloc_count };
            while alloc < end {
                alloc = alloc.saturating_mul(2);
            }
            alloc
        } else {
            static_length
        };
        let hole_fill = if start > sample_count {
            Some(self.resolve_fill_value(id)?)
        } else {
            None
        };

        let description = self.describe(id);
        let var = self.var_mut(id)?;
        if var.data.is_none() {
            var.data = DataArray::new(var.data_type);
        }
        let data = var
            .data
            .as_mut()
            .ok_or_else(|| CdsError::invalid(format!("{description} has no data type")))?;
        if alloc != alloc_count {
            let elements = alloc.checked_mul(sample_size).ok_or_else(|| {
                CdsError::invalid(format!("allocation of {alloc} samples for {description} overflows"))
            })?;
            data.try_reserve_exact(elements.saturating_sub(data.len()))
                .map_err(|source| CdsError::allocation(description.clone(), source))?;
            var.alloc_count = alloc;
            var.data_index = None;
            tracing::trace!(target: COMPONENT, path = %description, alloc_count = alloc, "variable data allocated");
        }
        if end > sample_count {
            if let Some(fill) = &hole_fill {
                data.resize_with_value(start * sample_size, fill)?;
                tracing::debug!(
                    target: COMPONENT,
                    path = %description,
                    sample_count,
                    start,
                    "filled hole with missing value {fill}"
                );
            }
            data.resize_default(end * sample_size);
            var.sample_count = end;
        }
        if unlimited {
            self.grow_unlimited_dim(dims[0], end);
        }
        Ok(start * sample_size)
    }

    /// Allocate samples `start..start + count` of a variable and fill them with a missing value.
    ///
    /// The first missing value of the variable is used if `use_missing` is set and it has one,
    /// otherwise the default fill value of the variable or its data type.
    /// Returns the element offset of sample `start`.
    ///
    /// # Errors
    ///
    /// See [`Hierarchy::alloc_var_data`].
    pub fn init_var_data(
        &mut self,
        id: VarId,
        start: usize,
        count: usize,
        use_missing: bool,
    ) -> Result<usize, CdsError> {
        let offset = self.alloc_var_data(id, start, count)?;
        let fill = if use_missing {
            self.resolve_fill_value(id)?
        } else {
            let var = self.var_ref(id)?;
            match &var.default_fill {
                Some(fill) => fill.clone(),
                None => var
                    .data_type
                    .default_fill()
                    .ok_or_else(|| CdsError::invalid("variable has no data type"))?,
            }
        };
        let length = count * self.var_sample_size(id);
        if let Some(data) = &mut self.var_mut(id)?.data {
            data.fill(offset..offset + length, &fill)?;
        }
        Ok(offset)
    }

    /// Delete the data of a variable, releasing its allocation.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if the handle is stale.
    pub fn delete_var_data(&mut self, id: VarId) -> Result<(), CdsError> {
        let var = self.var_mut(id)?;
        var.data = None;
        var.sample_count = 0;
        var.alloc_count = 0;
        var.data_index = None;
        Ok(())
    }

    /// Set the sample counts of the variables in a group and its descendants to zero, keeping their allocations.
    ///
    /// `unlim_vars` selects variables with an unlimited first dimension, and also resets the lengths of unlimited dimensions.
    /// `static_vars` selects every other variable.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if the handle is stale.
    pub fn reset_sample_counts(
        &mut self,
        group: GroupId,
        unlim_vars: bool,
        static_vars: bool,
    ) -> Result<(), CdsError> {
        let mut stack = vec![group];
        let mut vars = Vec::new();
        let mut dims = Vec::new();
        while let Some(group) = stack.pop() {
            let group = self.group_ref(group)?;
            vars.extend(group.vars.iter().copied());
            dims.extend(group.dims.iter().copied());
            stack.extend(group.groups.iter().copied());
        }
        for var in vars {
            let unlimited = self.var_is_unlimited(var);
            if (unlimited && unlim_vars) || (!unlimited && static_vars) {
                let var = self.var_mut(var)?;
                var.sample_count = 0;
                var.data_index = None;
                if let Some(data) = &mut var.data {
                    data.truncate(0);
                }
            }
        }
        if unlim_vars {
            for dim in dims {
                let dim = self.dim_mut(dim)?;
                if dim.is_unlimited {
                    dim.length = 0;
                }
            }
        }
        Ok(())
    }

    /// Returns the data of a variable.
    #[must_use]
    pub fn var_data(&self, id: VarId) -> Option<&DataArray> {
        self.var(id)?.data.as_ref()
    }

    fn samples_range(&self, id: VarId, start: usize, count: Option<usize>) -> Result<std::ops::Range<usize>, CdsError> {
        let var = self.var_ref(id)?;
        let count = count.unwrap_or_else(|| var.sample_count.saturating_sub(start));
        let end = start.saturating_add(count);
        if end > var.sample_count {
            return Err(CdsError::invalid(format!(
                "samples {start}..{end} of {} exceed the sample count {}",
                self.describe(id),
                var.sample_count
            )));
        }
        let sample_size = self.var_sample_size(id);
        Ok(start * sample_size..end * sample_size)
    }

    /// Returns samples `start..start + count` of a variable as a typed slice.
    ///
    /// A `count` of [`None`] returns every sample from `start`.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale, `T` does not match the variable type, or the samples do not exist.
    pub fn var_samples<T: Element>(
        &self,
        id: VarId,
        start: usize,
        count: Option<usize>,
    ) -> Result<&[T], CdsError> {
        let range = self.samples_range(id, start, count)?;
        let var = self.var_ref(id)?;
        let Some(data) = &var.data else {
            return Ok(&[]);
        };
        T::slice(data)
            .and_then(|slice| slice.get(range))
            .ok_or_else(|| {
                CdsError::invalid(format!(
                    "{} does not hold {} elements",
                    self.describe(id),
                    std::any::type_name::<T>()
                ))
            })
    }

    /// Returns samples `start..start + count` of a variable as a mutable typed slice.
    ///
    /// # Errors
    ///
    /// See [`Hierarchy::var_samples`].
    pub fn var_samples_mut<T: Element>(
        &mut self,
        id: VarId,
        start: usize,
        count: Option<usize>,
    ) -> Result<&mut [T], CdsError> {
        let range = self.samples_range(id, start, count)?;
        let description = self.describe(id);
        let var = self.var_mut(id)?;
        let Some(data) = &mut var.data else {
            return Ok(&mut []);
        };
        T::slice_mut(data)
            .and_then(|slice| slice.get_mut(range))
            .ok_or_else(|| {
                CdsError::invalid(format!(
                    "{description} does not hold {} elements",
                    std::any::type_name::<T>()
                ))
            })
    }

    /// Write `data` to a variable starting at sample `sample_start`, casting it to the variable type.
    ///
    /// The length of `data` must be a whole number of samples.
    /// Elements of `data` equal to one of `missing_values` are replaced by the first missing value of the variable
    /// (or the default fill value of its type).
    /// Returns the element offset of sample `sample_start`.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the data is empty or not a whole number of samples,
    /// cannot be cast to the variable type, or cannot be allocated.
    pub fn set_var_data(
        &mut self,
        id: VarId,
        data: &DataArray,
        sample_start: usize,
        missing_values: Option<&DataArray>,
    ) -> Result<usize, CdsError> {
        let var_type = self.var_ref(id)?.data_type;
        let sample_size = self.var_sample_size(id);
        if data.is_empty() || sample_size == 0 || data.len() % sample_size != 0 {
            return Err(CdsError::invalid(format!(
                "could not set data of {}: {} elements is not a whole number of samples of size {sample_size}",
                self.describe(id),
                data.len()
            )));
        }
        let mut converter = Converter::new(data.data_type(), None, var_type, None)?;
        if let Some(missing_values) = missing_values.filter(|values| !values.is_empty()) {
            let fill = self.resolve_fill_value(id)?;
            converter.set_map(missing_values, OutputMap::Values(DataArray::from(fill)))?;
        }
        let converted = converter.convert_array(UnitsMode::Ignore, data)?;
        let offset = self.alloc_var_data(id, sample_start, data.len() / sample_size)?;
        let description = self.describe(id);
        let stored = self
            .var_mut(id)?
            .data
            .as_mut()
            .ok_or_else(|| CdsError::not_found(format!("data of {description}")))?;
        stored.write_at(offset, &converted)?;
        Ok(offset)
    }

    /// Read samples of a variable, cast to `data_type`.
    ///
    /// A `sample_count` of [`None`] reads every sample from `sample_start`, and a request past the end is shortened.
    /// The missing values of the variable are replaced by `missing_value` (cast to `data_type`),
    /// or by a value derived from the first missing value when it is [`None`].
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale or the data cannot be cast.
    pub fn get_var_data(
        &self,
        id: VarId,
        data_type: DataType,
        sample_start: usize,
        sample_count: Option<usize>,
        missing_value: Option<&Value>,
    ) -> Result<RetrievedData, CdsError> {
        let var = self.var_ref(id)?;
        let empty = || {
            DataArray::new(data_type)
                .ok_or_else(|| CdsError::invalid("cannot read data as NAT"))
        };
        let available = var.sample_count.saturating_sub(sample_start);
        let count = sample_count.map_or(available, |count| count.min(available));
        let Some(data) = var.data.as_ref().filter(|_| count > 0) else {
            return Ok(RetrievedData {
                data: empty()?,
                sample_count: 0,
                missing_value: None,
            });
        };
        let sample_size = self.var_sample_size(id);
        let slice = data.slice(sample_start * sample_size..(sample_start + count) * sample_size)?;

        let mut converter = Converter::new(var.data_type, None, data_type, None)?;
        let missing = self.get_var_missing_values(id)?;
        if !missing.is_empty() {
            let output = match missing_value {
                Some(value) => OutputMap::Values(DataArray::from(value.cast(data_type)?)),
                None => OutputMap::DeriveSingle,
            };
            converter.set_map(&missing, output)?;
        }
        Ok(RetrievedData {
            data: converter.convert_array(UnitsMode::Ignore, &slice)?,
            sample_count: count,
            missing_value: converter.output_missing_value(),
        })
    }
}
