use cds::{
    converter::{Converter, UnitsMode},
    units::{
        compare_units, free_unit_system, get_unit_converter, init_unit_system, LinearUnitSystem,
        UnitsError,
    },
    DataArray, DataType, ErrorKind,
};

// Runs as a single test since it swaps the process-wide unit system.
#[test]
fn units_system_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    // the standard system is installed on first use
    assert!(compare_units("degF", "degC")?);
    assert_eq!(
        get_unit_converter("m", "s").unwrap_err(),
        UnitsError::Incompatible {
            from: "m".to_string(),
            to: "s".to_string()
        }
    );

    let mut counts = LinearUnitSystem::new();
    counts
        .define("count", "number", 1.0, 0.0)
        .define("dozen", "number", 12.0, 0.0);
    init_unit_system(counts);
    assert!(matches!(
        get_unit_converter("m", "km"),
        Err(UnitsError::UnknownUnit(_))
    ));
    let converter = Converter::new(DataType::Int, Some("dozen"), DataType::Int, Some("count"))?;
    assert!(converter.converts_units());

    // converters created before teardown keep their unit converter
    free_unit_system();
    assert_eq!(
        converter.convert_array(UnitsMode::Convert, &DataArray::from(vec![1i32, 3]))?,
        DataArray::Int(vec![12, 36])
    );

    // and the next lookup reinstalls the standard system
    assert!(!compare_units("hPa", "millibar")?);
    let err = Converter::new(DataType::Int, Some("dozen"), DataType::Int, Some("count")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RangeOrFormat);
    Ok(())
}
