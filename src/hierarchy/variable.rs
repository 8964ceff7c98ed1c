use crate::{
    converter::{Converter, OutputMap},
    node::{validate_name, AttId, DimId, GroupId, ObjectCommon, ObjectId, VarId},
    CdsError, DataArray, DataType, Outcome, Value, COMPONENT,
};

use super::{DataIndex, Hierarchy};

/// A named, typed, multi-dimensional array bound to dimensions.
///
/// Sample data is stored flat. A sample is one cross-section over every dimension after the first,
/// so a variable holds `sample_count * sample_size` elements.
#[derive(Debug)]
pub struct Variable {
    pub(crate) common: ObjectCommon,
    pub(crate) data_type: DataType,
    pub(crate) dims: Vec<DimId>,
    pub(crate) atts: Vec<AttId>,
    pub(crate) data: Option<DataArray>,
    pub(crate) sample_count: usize,
    pub(crate) alloc_count: usize,
    pub(crate) data_index: Option<DataIndex>,
    pub(crate) default_fill: Option<Value>,
}

impl Variable {
    /// Returns the [`ObjectCommon`] state.
    #[must_use]
    pub const fn common(&self) -> &ObjectCommon {
        &self.common
    }

    /// Returns the variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.common.name()
    }

    /// Returns the group that owns the variable.
    #[must_use]
    pub fn group(&self) -> Option<GroupId> {
        match self.common.parent() {
            Some(ObjectId::Group(group)) => Some(group),
            _ => None,
        }
    }

    /// Returns the data type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the dimensions, slowest varying first.
    #[must_use]
    pub fn dims(&self) -> &[DimId] {
        &self.dims
    }

    /// Returns the attributes in definition order.
    #[must_use]
    pub fn atts(&self) -> &[AttId] {
        &self.atts
    }

    /// Returns the number of samples holding data.
    #[must_use]
    pub const fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Returns the number of samples allocated.
    #[must_use]
    pub const fn alloc_count(&self) -> usize {
        self.alloc_count
    }

    /// Returns the default fill value used for holes when the variable has no missing value attributes.
    #[must_use]
    pub const fn default_fill(&self) -> Option<&Value> {
        self.default_fill.as_ref()
    }

    /// Returns the data index built by [`Hierarchy::create_var_data_index`], unless it has been invalidated.
    #[must_use]
    pub const fn data_index(&self) -> Option<&DataIndex> {
        self.data_index.as_ref()
    }
}

impl Hierarchy {
    /// Define a variable in `group` over the dimensions named `dim_names`.
    ///
    /// Dimensions are looked up in `group` and its ancestors.
    /// If a variable with the same name, data type, and dimensions exists, it is returned.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if
    ///  - the name is invalid or `data_type` is [`DataType::NotAType`],
    ///  - a dimension does not exist,
    ///  - an unlimited dimension is not the first dimension,
    ///  - a variable of the same name exists with a different definition,
    ///  - `group` is stale, or
    ///  - the definition lock of `group` is set.
    pub fn define_var(
        &mut self,
        group: GroupId,
        name: &str,
        data_type: DataType,
        dim_names: &[&str],
    ) -> Result<VarId, CdsError> {
        validate_name(name)?;
        if data_type == DataType::NotAType {
            return Err(CdsError::invalid(format!(
                "could not define variable {name}: invalid data type"
            )));
        }
        self.group_ref(group)?;
        let dims = dim_names
            .iter()
            .map(|&dim_name| {
                self.get_dim(group, dim_name).ok_or_else(|| {
                    CdsError::not_found(format!(
                        "dimension {dim_name} of variable {}/_vars_/{name}",
                        self.describe(group)
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(position) = dims
            .iter()
            .skip(1)
            .position(|&dim| self.dim(dim).is_some_and(|dim| dim.is_unlimited))
        {
            return Err(CdsError::invalid(format!(
                "could not define variable {name}: unlimited dimension {} must be the first dimension",
                dim_names[position + 1]
            )));
        }
        if let Some(existing) = self.get_var(group, name) {
            let var = self.var_ref(existing)?;
            if var.data_type == data_type && var.dims == dims {
                return Ok(existing);
            }
            return Err(CdsError::invalid(format!(
                "could not define variable {}: a conflicting definition exists",
                self.describe(existing)
            )));
        }
        if self.is_locked(group) {
            return Err(CdsError::locked(format!(
                "could not define variable {}/_vars_/{name}",
                self.describe(group)
            )));
        }
        let var = Variable {
            common: ObjectCommon::new(Some(group.into()), name),
            data_type,
            dims,
            atts: Vec::new(),
            data: None,
            sample_count: 0,
            alloc_count: 0,
            data_index: None,
            default_fill: None,
        };
        let id = VarId(self.vars.insert(var));
        self.group_mut(group)?.vars.push(id);
        tracing::debug!(target: COMPONENT, path = %self.describe(id), %data_type, "variable defined");
        Ok(id)
    }

    /// Returns the variable named `name` in `group`.
    #[must_use]
    pub fn get_var(&self, group: GroupId, name: &str) -> Option<VarId> {
        self.group(group)?
            .vars
            .iter()
            .copied()
            .find(|&id| self.object_name(id) == Some(name))
    }

    /// Returns the variable named `name` in `group` or the nearest ancestor that has one.
    #[must_use]
    pub fn find_var(&self, group: GroupId, name: &str) -> Option<VarId> {
        self.group_lineage(group)
            .find_map(|group| self.get_var(group, name))
    }

    /// Delete a variable, its attributes, and its data.
    ///
    /// Returns [`Outcome::Skipped`] if the definition lock of the variable or its group is set.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if the handle is stale.
    pub fn delete_var(&mut self, id: VarId) -> Result<Outcome<()>, CdsError> {
        let group = self.var_ref(id)?.group();
        if self.is_locked(id) {
            self.skip_locked(id, "delete variable");
            return Ok(Outcome::Skipped);
        }
        if let Some(group) = group.filter(|&group| self.is_locked(group)) {
            self.skip_locked(group, "delete variable");
            return Ok(Outcome::Skipped);
        }
        tracing::debug!(target: COMPONENT, path = %self.describe(id), "variable deleted");
        self.unlink_var(id);
        self.destroy_var(id);
        Ok(Outcome::Done(()))
    }

    /// Rename a variable.
    ///
    /// Returns [`Outcome::Skipped`] if the definition lock of the variable or its group is set.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale, the name is invalid, or the name is taken.
    pub fn rename_var(&mut self, id: VarId, name: &str) -> Result<Outcome<()>, CdsError> {
        validate_name(name)?;
        let group = self.var_ref(id)?.group();
        if self.is_locked(id) {
            self.skip_locked(id, "rename variable");
            return Ok(Outcome::Skipped);
        }
        if let Some(group) = group {
            if self.is_locked(group) {
                self.skip_locked(group, "rename variable");
                return Ok(Outcome::Skipped);
            }
            if self.get_var(group, name).is_some_and(|other| other != id) {
                return Err(CdsError::invalid(format!(
                    "could not rename variable {}: {name} already exists",
                    self.describe(id)
                )));
            }
        }
        self.var_mut(id)?.common.set_name(name);
        self.invalidate_paths(id.into());
        Ok(Outcome::Done(()))
    }

    /// Detach a variable from its group.
    pub(crate) fn unlink_var(&mut self, id: VarId) {
        let Some(group) = self.var(id).and_then(Variable::group) else {
            return;
        };
        if let Some(group) = self.groups.get_mut(group.0) {
            group.vars.retain(|&v| v != id);
        }
    }

    /// Remove a variable and its attributes from storage, clearing references from variable arrays.
    pub(crate) fn destroy_var(&mut self, id: VarId) {
        let Some(var) = self.vars.remove(id.0) else {
            return;
        };
        for att in var.atts {
            self.atts.remove(att.0);
        }
        for vararray in self.vararrays.values_mut() {
            for slot in &mut vararray.vars {
                if *slot == Some(id) {
                    *slot = None;
                }
            }
        }
    }

    /// Returns the dimensions of a variable, or an empty slice if the handle is stale.
    #[must_use]
    pub fn var_dims(&self, id: VarId) -> &[DimId] {
        self.var(id).map_or(&[], |var| var.dims.as_slice())
    }

    /// Returns the number of samples written to a variable.
    #[must_use]
    pub fn var_sample_count(&self, id: VarId) -> usize {
        self.var(id).map_or(0, Variable::sample_count)
    }

    /// Returns the position of the dimension named `name` in the dimensions of a variable.
    #[must_use]
    pub fn var_has_dim(&self, id: VarId, name: &str) -> Option<usize> {
        self.var(id)?
            .dims
            .iter()
            .position(|&dim| self.object_name(dim) == Some(name))
    }

    /// Returns true if the first dimension of a variable is unlimited.
    #[must_use]
    pub fn var_is_unlimited(&self, id: VarId) -> bool {
        self.var(id)
            .and_then(|var| var.dims.first())
            .and_then(|&dim| self.dim(dim))
            .is_some_and(|dim| dim.is_unlimited)
    }

    /// Returns the number of elements in one sample: the product of the lengths of every dimension after the first.
    ///
    /// A scalar or one-dimensional variable has a sample size of 1.
    #[must_use]
    pub fn var_sample_size(&self, id: VarId) -> usize {
        self.var(id).map_or(0, |var| {
            var.dims
                .iter()
                .skip(1)
                .map(|&dim| self.dim(dim).map_or(0, |dim| dim.length))
                .product()
        })
    }

    /// Returns the coordinate variable of the dimension at `dim_index` of a variable.
    #[must_use]
    pub fn get_coord_var(&self, id: VarId, dim_index: usize) -> Option<VarId> {
        let dim = *self.var(id)?.dims.get(dim_index)?;
        self.get_dim_var(dim)
    }

    /// Returns the boundary variable named by the `bounds` attribute of a coordinate variable.
    #[must_use]
    pub fn get_bounds_var(&self, coord_var: VarId) -> Option<VarId> {
        let group = self.var(coord_var)?.group()?;
        let bounds = self.get_att(coord_var.into(), "bounds")?;
        self.get_var(group, &self.get_att_text(bounds)?)
    }

    /// Returns the coordinate variable whose `bounds` attribute names `bounds_var`.
    #[must_use]
    pub fn get_bounds_coord_var(&self, bounds_var: VarId) -> Option<VarId> {
        let var = self.var(bounds_var)?;
        let name = var.name();
        self.group(var.group()?)?.vars.iter().copied().find(|&coord_var| {
            coord_var != bounds_var
                && self
                    .get_att(coord_var.into(), "bounds")
                    .and_then(|att| self.get_att_text(att))
                    .is_some_and(|text| text == name)
        })
    }

    /// Set or clear the default fill value of a variable. The value is cast to the variable type.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale or the value cannot be cast.
    pub fn set_var_default_fill_value(
        &mut self,
        id: VarId,
        value: Option<&Value>,
    ) -> Result<(), CdsError> {
        let data_type = self.var_ref(id)?.data_type;
        let value = value.map(|value| value.cast(data_type)).transpose()?;
        self.var_mut(id)?.default_fill = value;
        Ok(())
    }

    /// Returns the value of the `units` attribute of a variable.
    #[must_use]
    pub fn get_var_units(&self, id: VarId) -> Option<String> {
        self.get_att(id.into(), "units")
            .and_then(|att| self.get_att_text(att))
    }

    /// Change the data type of a variable, converting its data and data attributes.
    ///
    /// Missing values keep their meaning through the change.
    ///
    /// # Errors
    ///
    /// See [`Hierarchy::change_var_units`].
    pub fn change_var_type(&mut self, id: VarId, data_type: DataType) -> Result<Outcome<()>, CdsError> {
        let units = self.get_var_units(id);
        self.change_var_units(id, data_type, units.as_deref())
    }

    /// Change the data type and units of a variable, converting its data and data attributes.
    ///
    /// An `units` of [`None`] keeps the current units.
    /// Returns [`Outcome::Skipped`] if the definition lock of the variable blocks a data type change.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale, the types are incompatible, or the units cannot be converted.
    pub fn change_var_units(
        &mut self,
        id: VarId,
        data_type: DataType,
        units: Option<&str>,
    ) -> Result<Outcome<()>, CdsError> {
        let in_type = self.var_ref(id)?.data_type;
        let in_units = self.get_var_units(id);
        let out_units = units.or(in_units.as_deref());
        let mut converter = Converter::new(in_type, in_units.as_deref(), data_type, out_units)?;
        let missing = self.get_var_missing_values(id)?;
        if !missing.is_empty() {
            converter.set_map(&missing, OutputMap::Derive)?;
        }
        self.convert_var(id, &converter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn hierarchy() -> (Hierarchy, GroupId) {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.define_group(None, "root").unwrap();
        hierarchy.define_dim(root, "time", 0, true).unwrap();
        hierarchy.define_dim(root, "range", 4, false).unwrap();
        hierarchy.define_dim(root, "bound", 2, false).unwrap();
        (hierarchy, root)
    }

    #[test]
    fn var_define() {
        let (mut hierarchy, root) = hierarchy();
        let var = hierarchy
            .define_var(root, "temp", DataType::Float, &["time", "range"])
            .unwrap();
        assert_eq!(
            hierarchy
                .define_var(root, "temp", DataType::Float, &["time", "range"])
                .unwrap(),
            var
        );
        assert_eq!(
            hierarchy
                .define_var(root, "temp", DataType::Double, &["time", "range"])
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            hierarchy
                .define_var(root, "bad", DataType::Float, &["range", "time"])
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            hierarchy
                .define_var(root, "nat", DataType::NotAType, &["time"])
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            hierarchy
                .define_var(root, "missing", DataType::Int, &["height"])
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
        assert!(hierarchy.var_is_unlimited(var));
        assert_eq!(hierarchy.var_dims(var).len(), 2);
        assert_eq!(hierarchy.var_sample_count(var), 0);
        assert_eq!(hierarchy.var_sample_size(var), 4);
        assert_eq!(hierarchy.var_has_dim(var, "range"), Some(1));
        assert_eq!(hierarchy.var_has_dim(var, "bound"), None);

        let scalar = hierarchy.define_var(root, "lat", DataType::Double, &[]).unwrap();
        assert!(!hierarchy.var_is_unlimited(scalar));
        assert_eq!(hierarchy.var_sample_size(scalar), 1);
    }

    #[test]
    fn var_find_searches_ancestors() {
        let (mut hierarchy, root) = hierarchy();
        let child = hierarchy.define_group(Some(root), "child").unwrap();
        let var = hierarchy.define_var(root, "lat", DataType::Double, &[]).unwrap();
        assert_eq!(hierarchy.get_var(child, "lat"), None);
        assert_eq!(hierarchy.find_var(child, "lat"), Some(var));
    }

    #[test]
    fn var_delete_and_rename() {
        let (mut hierarchy, root) = hierarchy();
        let a = hierarchy.define_var(root, "a", DataType::Int, &["time"]).unwrap();
        let units = hierarchy.define_att_text(a.into(), "units", "m").unwrap();
        hierarchy.define_var(root, "b", DataType::Int, &["time"]).unwrap();
        assert!(hierarchy.rename_var(a, "b").is_err());
        assert!(hierarchy.rename_var(a, "c").unwrap().is_done());
        assert_eq!(hierarchy.path(units), Some("/root/_vars_/c/_atts_/units"));

        hierarchy.set_definition_lock(a, 1).unwrap();
        assert!(hierarchy.delete_var(a).unwrap().is_skipped());
        hierarchy.set_definition_lock(a, 0).unwrap();
        assert!(hierarchy.delete_var(a).unwrap().is_done());
        assert!(!hierarchy.contains(a));
        assert!(!hierarchy.contains(units));
        assert_eq!(hierarchy.group(root).unwrap().vars().len(), 1);
    }

    #[test]
    fn var_coordinates_and_bounds() {
        let (mut hierarchy, root) = hierarchy();
        let range = hierarchy
            .define_var(root, "range", DataType::Float, &["range"])
            .unwrap();
        let bounds = hierarchy
            .define_var(root, "range_bounds", DataType::Float, &["range", "bound"])
            .unwrap();
        let data = hierarchy
            .define_var(root, "backscatter", DataType::Float, &["time", "range"])
            .unwrap();
        hierarchy
            .define_att_text(range.into(), "bounds", "range_bounds")
            .unwrap();

        assert_eq!(hierarchy.get_coord_var(data, 1), Some(range));
        assert_eq!(hierarchy.get_coord_var(data, 0), None);
        assert_eq!(hierarchy.get_bounds_var(range), Some(bounds));
        assert_eq!(hierarchy.get_bounds_coord_var(bounds), Some(range));
        assert_eq!(hierarchy.get_bounds_var(data), None);
    }

    #[test]
    fn var_default_fill_and_units() {
        let (mut hierarchy, root) = hierarchy();
        let var = hierarchy.define_var(root, "v", DataType::Short, &["time"]).unwrap();
        hierarchy
            .set_var_default_fill_value(var, Some(&Value::Double(-999.0)))
            .unwrap();
        assert_eq!(hierarchy.var(var).unwrap().default_fill(), Some(&Value::Short(-999)));
        hierarchy.set_var_default_fill_value(var, None).unwrap();
        assert_eq!(hierarchy.var(var).unwrap().default_fill(), None);

        assert_eq!(hierarchy.get_var_units(var), None);
        hierarchy.define_att_text(var.into(), "units", "km").unwrap();
        assert_eq!(hierarchy.get_var_units(var).as_deref(), Some("km"));
    }

    #[test]
    fn var_change_type_keeps_missing_values() {
        let (mut hierarchy, root) = hierarchy();
        let var = hierarchy.define_var(root, "v", DataType::Int, &["time"]).unwrap();
        hierarchy
            .define_att(var.into(), "missing_value", DataArray::from(vec![-9999i32]))
            .unwrap();
        hierarchy
            .set_var_data(var, &DataArray::from(vec![1i32, -9999, 3]), 0, None)
            .unwrap();
        assert!(hierarchy.change_var_type(var, DataType::Float).unwrap().is_done());
        let v = hierarchy.var(var).unwrap();
        assert_eq!(v.data_type(), DataType::Float);
        assert_eq!(
            hierarchy.var_data(var),
            Some(&DataArray::Float(vec![1.0, -9999.0, 3.0]))
        );
        let missing = hierarchy.get_att(var.into(), "missing_value").unwrap();
        assert_eq!(
            hierarchy.att(missing).unwrap().value(),
            &DataArray::Float(vec![-9999.0])
        );
    }
}
