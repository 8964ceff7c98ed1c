use cds::{
    copy::{copy_att, copy_group, copy_var, CopyNames, CopyOptions, NameMap, SampleRange},
    AttParent, DataArray, DataType, GroupId, Hierarchy, VarId,
};

/// A source hierarchy with the group `site`, dims `time` (unlimited) and `range` (3),
/// and the variable `A(time, range)` of type double in metres with two samples.
fn source() -> Result<(Hierarchy, GroupId, VarId), cds::CdsError> {
    let mut src = Hierarchy::new();
    let site = src.define_group(None, "site")?;
    src.define_att_text(site.into(), "title", "test site")?;
    src.define_dim(site, "time", 0, true)?;
    src.define_dim(site, "range", 3, false)?;
    let a = src.define_var(site, "A", DataType::Double, &["time", "range"])?;
    src.define_att_text(a.into(), "units", "m")?;
    src.define_att(a.into(), "_FillValue", DataArray::from(vec![-999.0f64]))?;
    src.define_att(a.into(), "valid_max", DataArray::from(vec![5000.0f64]))?;
    src.set_var_data(
        a,
        &DataArray::from(vec![1.0f64, 2.0, -999.0, 1000.0, 2500.0, 4000.0]),
        0,
        None,
    )?;
    Ok((src, site, a))
}

fn dim_names(hierarchy: &Hierarchy, var: VarId) -> Vec<&str> {
    hierarchy
        .var(var)
        .unwrap()
        .dims()
        .iter()
        .filter_map(|&dim| hierarchy.object_name(dim))
        .collect()
}

#[test]
fn copy_var_into_new_variable() -> Result<(), Box<dyn std::error::Error>> {
    let (src, _, a) = source()?;
    let mut dest = Hierarchy::new();
    let group = dest.define_group(None, "products")?;

    let b = copy_var(
        &src,
        a,
        &mut dest,
        group,
        Some("B"),
        &NameMap::all(),
        &NameMap::all(),
        &CopyOptions::default(),
    )?
    .done()
    .unwrap();

    let var = dest.var(b).unwrap();
    assert_eq!(dest.path(b), Some("/products/_vars_/B"));
    assert_eq!(var.data_type(), DataType::Double);
    assert_eq!(dest.get_var_units(b).as_deref(), Some("m"));
    assert_eq!(dim_names(&dest, b), ["time", "range"]);
    let time = dest.get_dim(group, "time").unwrap();
    assert!(dest.dim(time).unwrap().is_unlimited());
    assert_eq!(dest.dim(time).unwrap().length(), 2);
    assert_eq!(dest.var_data(b), src.var_data(a));
    assert_eq!(dest.get_var_missing_values(b)?, DataArray::Double(vec![-999.0]));
    Ok(())
}

#[test]
fn copy_var_converts_to_existing_variable() -> Result<(), Box<dyn std::error::Error>> {
    let (src, _, a) = source()?;
    let mut dest = Hierarchy::new();
    let group = dest.define_group(None, "products")?;
    dest.define_dim(group, "time", 0, true)?;
    dest.define_dim(group, "range", 3, false)?;
    let b = dest.define_var(group, "B", DataType::Float, &["time", "range"])?;
    dest.define_att_text(b.into(), "units", "km")?;
    dest.define_att(b.into(), "_FillValue", DataArray::from(vec![-1.0f32]))?;

    let options = CopyOptions::builder().overwrite_atts().build();
    let all = NameMap::all();
    assert!(copy_var(&src, a, &mut dest, group, Some("B"), &all, &all, &options)?.is_done());

    // the units of the destination are kept and the data follows them
    assert_eq!(dest.get_var_units(b).as_deref(), Some("km"));
    assert_eq!(
        dest.var_data(b),
        Some(&DataArray::Float(vec![0.001, 0.002, -1.0, 1.0, 2.5, 4.0]))
    );
    let valid_max = dest.get_att(b.into(), "valid_max").unwrap();
    assert_eq!(dest.att(valid_max).unwrap().value(), &DataArray::Float(vec![5.0]));
    Ok(())
}

#[test]
fn copy_var_keeps_written_samples() -> Result<(), Box<dyn std::error::Error>> {
    let (mut src, _, a) = source()?;
    src.set_var_data(a, &DataArray::from(vec![7.0f64; 6]), 2, None)?;
    let mut dest = Hierarchy::new();
    let group = dest.define_group(None, "products")?;
    dest.define_dim(group, "time", 0, true)?;
    dest.define_dim(group, "range", 3, false)?;
    let b = dest.define_var(group, "A", DataType::Double, &["time", "range"])?;
    dest.set_var_data(b, &DataArray::from(vec![0.0f64; 3]), 0, None)?;

    let copy = |dest: &mut Hierarchy, options: &CopyOptions| {
        copy_var(&src, a, dest, group, None, &NameMap::all(), &NameMap::all(), options)
    };

    // the first destination sample is kept, the rest of the source is appended after it
    assert!(copy(&mut dest, &CopyOptions::default())?.is_done());
    assert_eq!(dest.var(b).unwrap().sample_count(), 4);
    assert_eq!(dest.var_samples::<f64>(b, 0, Some(2))?, &[0.0, 0.0, 0.0, 1000.0, 2500.0, 4000.0]);
    assert_eq!(dest.var_samples::<f64>(b, 2, None)?, &[7.0; 6]);

    // overwriting copies the requested range as is
    let options = CopyOptions::builder()
        .overwrite_data()
        .samples(SampleRange::new(1, 0, Some(1)))
        .build();
    assert!(copy(&mut dest, &options)?.is_done());
    assert_eq!(dest.var_samples::<f64>(b, 0, Some(1))?, &[1000.0, 2500.0, 4000.0]);
    assert_eq!(dest.var(b).unwrap().sample_count(), 4);
    Ok(())
}

#[test]
fn copy_var_rolls_back_new_variable() -> Result<(), Box<dyn std::error::Error>> {
    let (src, _, a) = source()?;
    let mut dest = Hierarchy::new();
    let group = dest.define_group(None, "products")?;
    dest.define_dim(group, "range", 5, false)?;

    // the destination range has a different length, so the samples do not match
    let all = NameMap::all();
    let result = copy_var(&src, a, &mut dest, group, None, &all, &all, &CopyOptions::default());
    assert_eq!(result.unwrap_err().kind(), cds::ErrorKind::InvalidArgument);
    assert!(dest.get_var(group, "A").is_none());
    assert!(dest.group(group).unwrap().vars().is_empty());
    Ok(())
}

#[test]
fn copy_group_exclusive() -> Result<(), Box<dyn std::error::Error>> {
    let (mut src, site, _) = source()?;
    let extra = src.define_var(site, "extra", DataType::Int, &["time"])?;
    src.set_var_data(extra, &DataArray::from(vec![1i32, 2]), 0, None)?;

    let mut dest = Hierarchy::new();
    let group = dest.define_group(None, "site")?;
    dest.define_dim(group, "time", 0, true)?;
    dest.define_dim(group, "range", 3, false)?;
    let a = dest.define_var(group, "A", DataType::Double, &["time", "range"])?;

    let options = CopyOptions::builder().exclusive().build();
    let copied = copy_group(&src, site, &mut dest, None, None, &CopyNames::default(), &options)?;
    assert_eq!(copied.done(), Some(group));
    assert_eq!(dest.root_groups(), &[group]);
    assert!(dest.get_var(group, "extra").is_none());
    assert!(dest.get_att(group.into(), "title").is_none());
    assert!(dest.get_att(a.into(), "units").is_none());
    assert_eq!(dest.var(a).unwrap().sample_count(), 2);
    Ok(())
}

#[test]
fn copy_group_renames_and_copies_locks() -> Result<(), Box<dyn std::error::Error>> {
    let (mut src, site, a) = source()?;
    let calib = src.define_group(Some(site), "calibration")?;
    src.define_att(calib.into(), "gain", DataArray::from(vec![1.5f32]))?;
    src.define_var(site, "unused", DataType::Int, &["time"])?;
    src.set_definition_lock(a, 1)?;

    let names = CopyNames {
        dims: NameMap::all().rename("time", "t"),
        vars: NameMap::new(["A"]).rename("A", "reflectivity"),
        ..CopyNames::default()
    };
    let options = CopyOptions::builder().copy_locks().build();
    let mut dest = Hierarchy::new();
    let group = copy_group(&src, site, &mut dest, None, Some("radar"), &names, &options)?
        .done()
        .unwrap();

    assert_eq!(dest.path(group), Some("/radar"));
    let var = dest.get_var(group, "reflectivity").unwrap();
    assert!(dest.get_var(group, "unused").is_none());
    assert_eq!(dim_names(&dest, var), ["t", "range"]);
    assert_eq!(dest.definition_lock(var)?, 1);
    assert_eq!(dest.get_att_text(dest.get_att(group.into(), "title").unwrap()).as_deref(), Some("test site"));

    let calib = dest.get_group(group, "calibration").unwrap();
    let gain = dest.get_att(calib.into(), "gain").unwrap();
    assert_eq!(dest.att(gain).unwrap().value(), &DataArray::Float(vec![1.5]));
    Ok(())
}

#[test]
fn copy_att_respects_overwrite_and_locks() -> Result<(), Box<dyn std::error::Error>> {
    let (src, site, _) = source()?;
    let title = src.get_att(site.into(), "title").unwrap();
    let mut dest = Hierarchy::new();
    let group = dest.define_group(None, "site")?;
    let parent = AttParent::from(group);
    let existing = dest.define_att_text(parent, "title", "old")?;

    assert!(copy_att(&src, title, &mut dest, parent, None, &CopyOptions::default())?.is_skipped());
    assert_eq!(dest.get_att_text(existing).as_deref(), Some("old"));

    let overwrite = CopyOptions::builder().overwrite_atts().build();
    dest.set_definition_lock(existing, 1)?;
    assert!(copy_att(&src, title, &mut dest, parent, None, &overwrite)?.is_skipped());
    dest.set_definition_lock(existing, 0)?;
    assert_eq!(copy_att(&src, title, &mut dest, parent, None, &overwrite)?, cds::Outcome::Done(existing));
    assert_eq!(dest.get_att_text(existing).as_deref(), Some("test site"));

    // nothing is created under a locked parent
    dest.set_definition_lock(group, 1)?;
    assert!(copy_att(&src, title, &mut dest, parent, Some("copy"), &CopyOptions::default())?.is_skipped());
    assert!(dest.get_att(parent, "copy").is_none());
    Ok(())
}
