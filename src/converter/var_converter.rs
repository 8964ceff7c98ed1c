use crate::{
    hierarchy::Hierarchy, node::VarId, CdsError, DataArray, DataType, Outcome, COMPONENT,
};

use super::{Converter, OutputMap, UnitsMode};

impl Converter {
    /// Create a converter for writing data of `in_type` and `in_units` into a variable.
    ///
    /// The output units are the `units` attribute of the variable.
    /// Values equal to one of `in_missing` are mapped to the missing values of the variable.
    /// If the variable has no missing values, they are mapped to the default fill value of its type,
    /// which becomes the default fill value of the variable.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale or [`Converter::new`] fails.
    pub fn array_to_var(
        hierarchy: &mut Hierarchy,
        in_type: DataType,
        in_units: Option<&str>,
        in_missing: &DataArray,
        var: VarId,
    ) -> Result<Self, CdsError> {
        let out_type = hierarchy.var_ref(var)?.data_type;
        let out_units = hierarchy.get_var_units(var);
        let mut converter = Self::new(in_type, in_units, out_type, out_units.as_deref())?;
        if in_missing.is_empty() {
            return Ok(converter);
        }
        let out_missing = hierarchy.get_var_missing_values(var)?;
        if out_missing.is_empty() {
            let fill = out_type.default_fill().ok_or_else(|| {
                CdsError::invalid(format!("{} has no default fill value", hierarchy.describe(var)))
            })?;
            converter.set_map(in_missing, OutputMap::Values(DataArray::from_value(&fill, 1)))?;
            hierarchy.set_var_default_fill_value(var, Some(&fill))?;
        } else {
            converter.set_map(in_missing, OutputMap::Values(out_missing))?;
        }
        Ok(converter)
    }

    /// Create a converter for reading the data of a variable as `out_type` and `out_units`.
    ///
    /// The input units are the `units` attribute of the variable.
    /// The missing values of the variable are mapped as selected by `out_missing`.
    /// If the variable has no missing values, [`Converter::output_missing_value`] is [`None`].
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale or [`Converter::new`] fails.
    pub fn var_to_array(
        hierarchy: &Hierarchy,
        var: VarId,
        out_type: DataType,
        out_units: Option<&str>,
        out_missing: OutputMap,
    ) -> Result<Self, CdsError> {
        let in_type = hierarchy.var_ref(var)?.data_type;
        let in_units = hierarchy.get_var_units(var);
        let mut converter = Self::new(in_type, in_units.as_deref(), out_type, out_units)?;
        let in_missing = hierarchy.get_var_missing_values(var)?;
        if !in_missing.is_empty() {
            converter.set_map(&in_missing, out_missing)?;
        }
        Ok(converter)
    }

    /// Create a converter for copying the data of `in_var` in `src` to `out_var` in `dest`.
    ///
    /// The missing values of `in_var` are mapped to those of `out_var`,
    /// or derived for the type of `out_var` if it has none.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if a handle is stale or [`Converter::new`] fails.
    pub fn var_to_var(
        src: &Hierarchy,
        in_var: VarId,
        dest: &Hierarchy,
        out_var: VarId,
    ) -> Result<Self, CdsError> {
        let in_type = src.var_ref(in_var)?.data_type;
        let out_type = dest.var_ref(out_var)?.data_type;
        let in_units = src.get_var_units(in_var);
        let out_units = dest.get_var_units(out_var);
        let mut converter = Self::new(in_type, in_units.as_deref(), out_type, out_units.as_deref())?;
        let in_missing = src.get_var_missing_values(in_var)?;
        if in_missing.is_empty() {
            return Ok(converter);
        }
        let out_missing = dest.get_var_missing_values(out_var)?;
        let output = if out_missing.is_empty() {
            OutputMap::Derive
        } else {
            OutputMap::Values(out_missing)
        };
        converter.set_map(&in_missing, output)?;
        Ok(converter)
    }
}

impl Hierarchy {
    /// Convert the data, data attributes, and default fill value of a variable with `converter`,
    /// and change the variable to the converter output type.
    ///
    /// If the units change, an existing `units` attribute is updated; one is never added.
    /// Data attributes are converted with the units mode registered for their name.
    /// Returns [`Outcome::Skipped`] if the data type changes and the definition lock of the variable is set.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale, the variable type is not the converter input type,
    /// or converted data cannot be allocated.
    pub fn convert_var(&mut self, id: VarId, converter: &Converter) -> Result<Outcome<()>, CdsError> {
        let data_type = self.var_ref(id)?.data_type;
        if data_type != converter.in_type() {
            return Err(CdsError::invalid(format!(
                "could not convert {}: a {data_type} variable cannot be converted from {}",
                self.describe(id),
                converter.in_type()
            )));
        }
        let new_units = converter
            .out_units()
            .filter(|&out_units| converter.in_units() != Some(out_units));
        if !converter.has_conversion(UnitsMode::Convert) {
            if let Some(units) = new_units {
                self.update_units_att(id, units)?;
            }
            return Ok(Outcome::Done(()));
        }
        if converter.in_type() != converter.out_type() && self.is_locked(id) {
            self.skip_locked(id, "convert data type");
            return Ok(Outcome::Skipped);
        }
        // nothing is changed until every conversion has succeeded
        let var = self.var_ref(id)?;
        let fill = match &var.default_fill {
            Some(fill) => converter
                .convert_array(UnitsMode::Ignore, &DataArray::from_value(fill, 1))?
                .first(),
            None => None,
        };
        let mut atts = Vec::new();
        for &att_id in &var.atts {
            let att = self.att_ref(att_id)?;
            if att.value.data_type() != converter.in_type() {
                continue;
            }
            if let Some(mode) = converter.data_attributes().units_mode(att.name()) {
                atts.push((att_id, converter.convert_array(mode, &att.value)?));
            }
        }

        let size_changed = converter.in_type().size() != converter.out_type().size();
        let var = self.var_mut(id)?;
        if let Some(data) = &mut var.data {
            if !converter.convert_in_place(UnitsMode::Convert, data)? {
                var.alloc_count = var.sample_count;
            }
            if size_changed {
                var.data_index = None;
            }
        }
        var.default_fill = fill;
        var.data_type = converter.out_type();
        for (att, value) in atts {
            self.att_mut(att)?.value = value;
        }
        if let Some(units) = new_units {
            self.update_units_att(id, units)?;
        }
        tracing::debug!(
            target: COMPONENT,
            path = %self.describe(id),
            in_type = %converter.in_type(),
            out_type = %converter.out_type(),
            "variable converted"
        );
        Ok(Outcome::Done(()))
    }

    fn update_units_att(&mut self, id: VarId, units: &str) -> Result<(), CdsError> {
        if self.get_att(id.into(), "units").is_some() {
            // a locked units attribute keeps its value
            let _ = self.change_att_text(id.into(), true, "units", units)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        node::GroupId,
        units::{LinearUnitSystem, UnitConverter, UnitSystem},
        Value,
    };

    fn hierarchy() -> (Hierarchy, GroupId) {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.define_group(None, "root").unwrap();
        hierarchy.define_dim(root, "time", 0, true).unwrap();
        (hierarchy, root)
    }

    #[test]
    fn convert_var_type_and_data_atts() {
        let (mut hierarchy, root) = hierarchy();
        let var = hierarchy.define_var(root, "v", DataType::Int, &["time"]).unwrap();
        hierarchy
            .define_att(var.into(), "valid_range", DataArray::from(vec![0i32, 100]))
            .unwrap();
        hierarchy
            .define_att(var.into(), "comment", DataArray::from(vec![1i32]))
            .unwrap();
        hierarchy
            .set_var_data(var, &DataArray::from(vec![5i32, 150, 40000]), 0, None)
            .unwrap();
        hierarchy.create_var_data_index(var, 0).unwrap();

        let converter = Converter::new(DataType::Int, None, DataType::Short, None).unwrap();
        assert!(hierarchy.convert_var(var, &converter).unwrap().is_done());
        let v = hierarchy.var(var).unwrap();
        assert_eq!(v.data_type(), DataType::Short);
        assert!(v.data_index().is_none());
        assert_eq!(v.alloc_count(), 3);
        assert_eq!(
            hierarchy.var_data(var),
            Some(&DataArray::Short(vec![5, 150, 32767]))
        );
        let valid_range = hierarchy.get_att(var.into(), "valid_range").unwrap();
        assert_eq!(
            hierarchy.att(valid_range).unwrap().value(),
            &DataArray::Short(vec![0, 100])
        );
        // not a data attribute
        let comment = hierarchy.get_att(var.into(), "comment").unwrap();
        assert_eq!(
            hierarchy.att(comment).unwrap().value(),
            &DataArray::Int(vec![1])
        );
    }

    #[test]
    fn convert_var_locked() {
        let (mut hierarchy, root) = hierarchy();
        let var = hierarchy.define_var(root, "v", DataType::Int, &["time"]).unwrap();
        hierarchy.set_definition_lock(var, 1).unwrap();
        let converter = Converter::new(DataType::Int, None, DataType::Double, None).unwrap();
        assert!(hierarchy.convert_var(var, &converter).unwrap().is_skipped());
        assert_eq!(hierarchy.var(var).unwrap().data_type(), DataType::Int);

        let wrong = Converter::new(DataType::Float, None, DataType::Double, None).unwrap();
        assert!(hierarchy.convert_var(var, &wrong).is_err());
    }

    #[test]
    fn convert_var_units() {
        let (mut hierarchy, root) = hierarchy();
        let var = hierarchy.define_var(root, "p", DataType::Float, &["time"]).unwrap();
        hierarchy.define_att_text(var.into(), "units", "hPa").unwrap();
        hierarchy
            .define_att(var.into(), "valid_delta", DataArray::from(vec![2.0f32]))
            .unwrap();
        hierarchy
            .define_att(var.into(), "missing_value", DataArray::from(vec![-9999.0f32]))
            .unwrap();
        hierarchy
            .set_var_data(var, &DataArray::from(vec![1000.0f32, -9999.0]), 0, None)
            .unwrap();

        let system = LinearUnitSystem::standard();
        // same physical unit, only the units text changes
        let renamed = Converter::with_unit_system(
            DataType::Float,
            Some("hPa"),
            DataType::Float,
            Some("mb"),
            &system,
        )
        .unwrap();
        assert!(hierarchy.convert_var(var, &renamed).unwrap().is_done());
        assert_eq!(hierarchy.get_var_units(var).as_deref(), Some("mb"));
        assert_eq!(
            hierarchy.var_data(var),
            Some(&DataArray::Float(vec![1000.0, -9999.0]))
        );

        let mut converter = Converter::with_unit_system(
            DataType::Float,
            Some("mb"),
            DataType::Float,
            Some("Pa"),
            &system,
        )
        .unwrap();
        converter
            .set_map(&hierarchy.get_var_missing_values(var).unwrap(), OutputMap::Derive)
            .unwrap();
        assert!(hierarchy.convert_var(var, &converter).unwrap().is_done());
        assert_eq!(hierarchy.get_var_units(var).as_deref(), Some("Pa"));
        assert_eq!(
            hierarchy.var_data(var),
            Some(&DataArray::Float(vec![100_000.0, -9999.0]))
        );
        let valid_delta = hierarchy.get_att(var.into(), "valid_delta").unwrap();
        assert_eq!(
            hierarchy.att(valid_delta).unwrap().value(),
            &DataArray::Float(vec![200.0])
        );
        let missing = hierarchy.get_att(var.into(), "missing_value").unwrap();
        assert_eq!(
            hierarchy.att(missing).unwrap().value(),
            &DataArray::Float(vec![-9999.0])
        );
    }

    #[test]
    fn convert_var_units_follow_data() {
        let (mut hierarchy, root) = hierarchy();
        let var = hierarchy.define_var(root, "h", DataType::Int, &["time"]).unwrap();
        hierarchy.define_att_text(var.into(), "units", "m").unwrap();
        hierarchy
            .set_var_data(var, &DataArray::from(vec![1500i32]), 0, None)
            .unwrap();
        let system = LinearUnitSystem::standard();
        let converter =
            Converter::with_unit_system(DataType::Int, Some("m"), DataType::Double, Some("km"), &system)
                .unwrap();

        // a skipped conversion leaves the units with the unconverted data
        hierarchy.set_definition_lock(var, 1).unwrap();
        assert!(hierarchy.convert_var(var, &converter).unwrap().is_skipped());
        assert_eq!(hierarchy.get_var_units(var).as_deref(), Some("m"));
        assert_eq!(hierarchy.var_data(var), Some(&DataArray::Int(vec![1500])));

        hierarchy.set_definition_lock(var, 0).unwrap();
        assert!(hierarchy.convert_var(var, &converter).unwrap().is_done());
        assert_eq!(hierarchy.get_var_units(var).as_deref(), Some("km"));
        assert_eq!(hierarchy.var_data(var), Some(&DataArray::Double(vec![1.5])));
    }

    #[test]
    fn converter_between_vars() {
        let (mut hierarchy, root) = hierarchy();
        let src = hierarchy.define_var(root, "src", DataType::Double, &["time"]).unwrap();
        let dest = hierarchy.define_var(root, "dest", DataType::Short, &["time"]).unwrap();
        hierarchy
            .define_att(src.into(), "missing_value", DataArray::from(vec![-9999.0f64]))
            .unwrap();

        // the destination has no missing values, so the source ones are derived
        let converter = Converter::var_to_var(&hierarchy, src, &hierarchy, dest).unwrap();
        assert_eq!(converter.output_missing_value(), Some(Value::Short(-9999)));

        hierarchy
            .define_att(dest.into(), "_FillValue", DataArray::from(vec![-1i16]))
            .unwrap();
        let converter = Converter::var_to_var(&hierarchy, src, &hierarchy, dest).unwrap();
        assert_eq!(converter.output_missing_value(), Some(Value::Short(-1)));

        let converter =
            Converter::var_to_array(&hierarchy, src, DataType::Float, None, OutputMap::DeriveSingle)
                .unwrap();
        assert_eq!(converter.output_missing_value(), Some(Value::Float(-9999.0)));

        let other = hierarchy.define_var(root, "other", DataType::Int, &["time"]).unwrap();
        let converter = Converter::array_to_var(
            &mut hierarchy,
            DataType::Float,
            None,
            &DataArray::from(vec![-1.0f32]),
            other,
        )
        .unwrap();
        assert_eq!(converter.output_missing_value(), Some(Value::Int(crate::data_type::FILL_INT)));
        assert_eq!(
            hierarchy.var(other).unwrap().default_fill(),
            Some(&Value::Int(crate::data_type::FILL_INT))
        );
    }

    #[derive(Debug)]
    struct Doubling;

    impl UnitConverter for Doubling {
        fn convert(&self, value: f64) -> f64 {
            value * 2.0
        }
    }

    #[derive(Debug)]
    struct DoublingSystem;

    impl UnitSystem for DoublingSystem {
        fn converter(
            &self,
            _from: &str,
            _to: &str,
        ) -> Result<Option<Box<dyn UnitConverter>>, crate::units::UnitsError> {
            Ok(Some(Box::new(Doubling)))
        }
    }

    #[test]
    fn convert_var_custom_unit_system() {
        let (mut hierarchy, root) = hierarchy();
        let var = hierarchy.define_var(root, "x", DataType::Int, &["time"]).unwrap();
        hierarchy
            .set_var_data(var, &DataArray::from(vec![1i32, 2]), 0, None)
            .unwrap();
        let converter = Converter::with_unit_system(
            DataType::Int,
            Some("half"),
            DataType::Int,
            Some("whole"),
            &DoublingSystem,
        )
        .unwrap();
        assert!(hierarchy.convert_var(var, &converter).unwrap().is_done());
        // no units attribute is added
        assert_eq!(hierarchy.get_var_units(var), None);
        assert_eq!(hierarchy.var_data(var), Some(&DataArray::Int(vec![2, 4])));
    }
}
