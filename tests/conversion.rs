use cds::{
    converter::{Converter, OutputMap, UnitsMode},
    DataArray, DataType, Hierarchy, Value,
};

fn int_var(hierarchy: &mut Hierarchy) -> Result<cds::VarId, cds::CdsError> {
    let root = hierarchy.define_group(None, "root")?;
    hierarchy.define_dim(root, "time", 0, true)?;
    let var = hierarchy.define_var(root, "counts", DataType::Int, &["time"])?;
    hierarchy.define_att(var.into(), "valid_range", DataArray::from(vec![0i32, 100]))?;
    hierarchy.set_var_data(var, &DataArray::from(vec![150i32, 40000, -40000, 7]), 0, None)?;
    Ok(var)
}

#[test]
fn conversion_narrowing_clamps_to_type_range() -> Result<(), Box<dyn std::error::Error>> {
    let mut hierarchy = Hierarchy::new();
    let var = int_var(&mut hierarchy)?;

    assert!(hierarchy.change_var_type(var, DataType::Short)?.is_done());
    let valid_range = hierarchy.get_att(var.into(), "valid_range").unwrap();
    assert_eq!(
        hierarchy.att(valid_range).unwrap().value(),
        &DataArray::Short(vec![0, 100])
    );
    assert_eq!(
        hierarchy.var_data(var),
        Some(&DataArray::Short(vec![150, 32767, -32768, 7]))
    );
    Ok(())
}

#[test]
fn conversion_narrowing_with_explicit_range() -> Result<(), Box<dyn std::error::Error>> {
    let mut hierarchy = Hierarchy::new();
    let var = int_var(&mut hierarchy)?;

    let mut converter = Converter::new(DataType::Int, None, DataType::Short, None)?;
    converter.set_range(
        None,
        None,
        Some(&Value::Int(100)),
        Some(&Value::Short(32767)),
    )?;
    assert!(hierarchy.convert_var(var, &converter)?.is_done());
    assert_eq!(hierarchy.var(var).unwrap().data_type(), DataType::Short);
    // values below the type minimum saturate when no minimum is set
    assert_eq!(hierarchy.var_samples::<i16>(var, 0, None)?, &[32767, 32767, -32768, 7]);
    Ok(())
}

#[test]
fn conversion_preserves_missing_values() -> Result<(), Box<dyn std::error::Error>> {
    let mut hierarchy = Hierarchy::new();
    let root = hierarchy.define_group(None, "station")?;
    hierarchy.define_dim(root, "time", 0, true)?;
    let pres = hierarchy.define_var(root, "pres", DataType::Float, &["time"])?;
    hierarchy.define_att_text(pres.into(), "units", "hPa")?;
    hierarchy.define_att(pres.into(), "missing_value", DataArray::from(vec![-9999.0f32]))?;
    hierarchy.set_var_data(pres, &DataArray::from(vec![1013.25f32, -9999.0, 1000.0]), 0, None)?;

    // missing values are neither scaled nor clamped
    assert!(hierarchy
        .change_var_units(pres, DataType::Double, Some("Pa"))?
        .is_done());
    assert_eq!(hierarchy.get_var_units(pres).as_deref(), Some("Pa"));
    assert_eq!(
        hierarchy.var_data(pres),
        Some(&DataArray::Double(vec![101_325.0, -9999.0, 100_000.0]))
    );
    assert_eq!(
        hierarchy.get_var_missing_values(pres)?,
        DataArray::Double(vec![-9999.0])
    );

    // reading as a narrower type keeps the missing value when it is representable
    let converter =
        Converter::var_to_array(&hierarchy, pres, DataType::Short, Some("hPa"), OutputMap::Derive)?;
    assert_eq!(converter.output_missing_value(), Some(Value::Short(-9999)));
    let data = hierarchy.var_data(pres).unwrap();
    assert_eq!(
        converter.convert_array(UnitsMode::Convert, data)?,
        DataArray::Short(vec![1013, -9999, 1000])
    );
    Ok(())
}

#[test]
fn conversion_writes_through_variable_converter() -> Result<(), Box<dyn std::error::Error>> {
    let mut hierarchy = Hierarchy::new();
    let root = hierarchy.define_group(None, "met")?;
    hierarchy.define_dim(root, "time", 0, true)?;
    let temp = hierarchy.define_var(root, "temp", DataType::Short, &["time"])?;
    hierarchy.define_att_text(temp.into(), "units", "K")?;

    let missing = DataArray::from(vec![-999.0f64]);
    let converter = Converter::array_to_var(&mut hierarchy, DataType::Double, Some("degC"), &missing, temp)?;
    let fill = DataType::Short.default_fill();
    assert_eq!(hierarchy.var(temp).unwrap().default_fill(), fill.as_ref());

    let converted = converter.convert_array(
        UnitsMode::Convert,
        &DataArray::from(vec![0.0f64, -999.0, 26.85]),
    )?;
    hierarchy.set_var_data(temp, &converted, 0, None)?;
    assert_eq!(
        hierarchy.var_samples::<i16>(temp, 0, None)?,
        &[273, cds::data_type::FILL_SHORT, 300]
    );
    Ok(())
}

#[test]
fn conversion_string_mismatch() {
    let err = Converter::new(DataType::String, None, DataType::Int, None).unwrap_err();
    assert!(matches!(err, cds::CdsError::TypeMismatch(DataType::String, DataType::Int)));
    assert_eq!(err.kind(), cds::ErrorKind::InvalidArgument);
}
