//! Copying objects between hierarchies.
//!
//! Copies merge a source object into a destination [`Hierarchy`]:
//!  - objects missing from the destination are created, unless the copy is [exclusive](CopyOptionsBuilder::exclusive),
//!  - existing objects are only filled if they are empty, unless an overwrite option is set,
//!  - an object is never created under a locked parent, and a locked object is never changed.
//!
//! Skipped objects are reported as [`Outcome::Skipped`] and logged at the debug level.
//! Variable data and data attributes are converted to the data type and units of an existing destination variable.
//!
//! ```
//! # use cds::{copy::{copy_group, CopyNames, CopyOptions}, DataArray, DataType, Hierarchy};
//! let mut src = Hierarchy::new();
//! let root = src.define_group(None, "site")?;
//! src.define_dim(root, "time", 0, true)?;
//! let temp = src.define_var(root, "temp", DataType::Double, &["time"])?;
//! src.set_var_data(temp, &DataArray::from(vec![1.5f64, 2.5]), 0, None)?;
//!
//! let mut dest = Hierarchy::new();
//! let copied = copy_group(&src, root, &mut dest, None, None, &CopyNames::default(), &CopyOptions::default())?;
//! let group = copied.done().expect("a new root group is always created");
//! let var = dest.get_var(group, "temp").expect("copied");
//! assert_eq!(dest.var_data(var), Some(&DataArray::Double(vec![1.5, 2.5])));
//! # Ok::<(), cds::CdsError>(())
//! ```

mod copy_options;
mod name_map;

pub use copy_options::{CopyOptions, CopyOptionsBuilder, SampleRange};
pub use name_map::NameMap;

use crate::{
    converter::{Converter, UnitsMode},
    hierarchy::Hierarchy,
    node::{AttId, AttParent, DimId, GroupId, ObjectId, VarId},
    CdsError, DataArray, Outcome, COMPONENT,
};

/// The name maps of a group copy, one per object kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CopyNames {
    /// Dimensions, also used to rename the dimensions of copied variables.
    pub dims: NameMap,
    /// Group attributes.
    pub atts: NameMap,
    /// Variables.
    pub vars: NameMap,
    /// Subgroups, applied at every level.
    pub subgroups: NameMap,
}

fn skipped<T>(path: &str, reason: &str) -> Outcome<T> {
    tracing::debug!(target: COMPONENT, path, reason, "copy skipped");
    Outcome::Skipped
}

fn new_path(dest: &Hierarchy, parent: impl Into<ObjectId>, separator: &str, name: &str) -> String {
    format!("{}{separator}{name}", dest.describe(parent))
}

/// Copy the definition lock of `src_id` to `dest_id` if [`CopyOptions::copy_locks`] is set.
fn copy_lock(
    src: &Hierarchy,
    src_id: impl Into<ObjectId>,
    dest: &mut Hierarchy,
    dest_id: impl Into<ObjectId>,
    options: &CopyOptions,
) -> Result<(), CdsError> {
    if options.copy_locks() {
        let lock = src.definition_lock(src_id)?;
        if lock != 0 {
            dest.set_definition_lock(dest_id, lock)?;
        }
    }
    Ok(())
}

/// Returns the converter for copying the data attributes of `src_parent` to `dest_parent`, if both are variables.
fn var_att_converter(
    src: &Hierarchy,
    src_parent: AttParent,
    dest: &Hierarchy,
    dest_parent: AttParent,
) -> Result<Option<Converter>, CdsError> {
    match (src_parent, dest_parent) {
        (AttParent::Var(src_var), AttParent::Var(dest_var)) => {
            Converter::var_to_var(src, src_var, dest, dest_var).map(Some)
        }
        _ => Ok(None),
    }
}

/// Copy an attribute to `dest_parent`, naming it `dest_name` (or the source name).
///
/// A data attribute copied between variables is converted to the data type and units of the destination variable.
/// Other values are cast to the data type of an existing destination attribute.
/// Returns [`Outcome::Skipped`] if
///  - the destination attribute is locked,
///  - it has a value and [`CopyOptions::overwrite_atts`] is not set,
///  - it does not exist and the copy is exclusive or the destination parent is locked.
///
/// # Errors
///
/// Returns a [`CdsError`] if a handle is stale or the value cannot be converted.
pub fn copy_att(
    src: &Hierarchy,
    src_att: AttId,
    dest: &mut Hierarchy,
    dest_parent: AttParent,
    dest_name: Option<&str>,
    options: &CopyOptions,
) -> Result<Outcome<AttId>, CdsError> {
    let parent = src.att_ref(src_att)?.parent();
    let converter = match parent {
        Some(src_parent) if src.is_data_att(src_att) => {
            var_att_converter(src, src_parent, dest, dest_parent)?
        }
        _ => None,
    };
    copy_att_with(converter.as_ref(), src, src_att, dest, dest_parent, dest_name, options)
}

fn copy_att_with(
    converter: Option<&Converter>,
    src: &Hierarchy,
    src_att: AttId,
    dest: &mut Hierarchy,
    dest_parent: AttParent,
    dest_name: Option<&str>,
    options: &CopyOptions,
) -> Result<Outcome<AttId>, CdsError> {
    let att = src.att_ref(src_att)?;
    let name = dest_name.unwrap_or(att.name());
    let existing = dest.get_att(dest_parent, name);
    if let Some(existing) = existing {
        let dest_att = dest.att_ref(existing)?;
        if dest_att.common.is_locked() {
            return Ok(skipped(&dest.describe(existing), "the attribute is locked"));
        }
        if !dest_att.is_empty() {
            if !options.overwrite_atts() {
                return Ok(skipped(&dest.describe(existing), "the attribute has a value"));
            }
            if converter.is_some() && att.name() == "units" {
                return Ok(skipped(&dest.describe(existing), "the units are converted"));
            }
        }
    } else if options.exclusive() || dest.is_locked(dest_parent) {
        return Ok(skipped(
            &new_path(dest, dest_parent, "/_atts_/", name),
            "the attribute is not defined in the destination",
        ));
    }

    let data_att_mode = converter.and_then(|converter| {
        let var_type = match att.parent()? {
            AttParent::Var(var) => src.var(var)?.data_type(),
            AttParent::Group(_) => return None,
        };
        let mode = converter.data_attributes().units_mode(att.name())?;
        (att.data_type() == var_type).then_some((converter, mode))
    });
    let value = match (data_att_mode, existing) {
        (Some((converter, mode)), _) => converter.convert_array(mode, att.value())?,
        (None, Some(existing)) if !att.is_empty() => {
            crate::hierarchy::cast_att_value(att.value(), dest.att_ref(existing)?.data_type())?
        }
        (None, _) => att.value().clone(),
    };

    let id = match existing {
        Some(existing) => {
            if !value.is_empty() {
                dest.att_mut(existing)?.value = value;
            }
            existing
        }
        None => dest.define_att(dest_parent, name, value)?,
    };
    if let Err(err) = copy_lock(src, src_att, dest, id, options) {
        if existing.is_none() {
            let _ = dest.delete_att(id);
        }
        return Err(err);
    }
    Ok(Outcome::Done(id))
}

/// Copy the attributes of `src_parent` selected by `names` to `dest_parent`.
///
/// See [`copy_att`].
///
/// # Errors
///
/// Returns a [`CdsError`] if copying an attribute fails. Attributes copied before the failure are kept.
pub fn copy_atts(
    src: &Hierarchy,
    src_parent: AttParent,
    dest: &mut Hierarchy,
    dest_parent: AttParent,
    names: &NameMap,
    options: &CopyOptions,
) -> Result<(), CdsError> {
    let converter = var_att_converter(src, src_parent, dest, dest_parent)?;
    copy_atts_with(converter.as_ref(), src, src_parent, dest, dest_parent, names, options)
}

fn copy_atts_with(
    converter: Option<&Converter>,
    src: &Hierarchy,
    src_parent: AttParent,
    dest: &mut Hierarchy,
    dest_parent: AttParent,
    names: &NameMap,
    options: &CopyOptions,
) -> Result<(), CdsError> {
    let atts: Vec<(AttId, &str)> = src
        .atts_of(src_parent)
        .iter()
        .filter_map(|&att| Some((att, src.object_name(att)?)))
        .collect();
    for (att, dest_name) in names.select(&atts) {
        let _ = copy_att_with(converter, src, att, dest, dest_parent, Some(&dest_name), options)?;
    }
    Ok(())
}

/// Copy a dimension to `dest_group`, naming it `dest_name` (or the source name).
///
/// An existing destination dimension (found in `dest_group` or an ancestor) only receives the source length if
/// it is not locked, not unlimited, and either has length zero or [`CopyOptions::overwrite_dims`] is set.
/// A new unlimited dimension starts with length zero.
///
/// # Errors
///
/// Returns a [`CdsError`] if a handle is stale, the dimension cannot be defined,
/// or the length of a dimension used by variables holding data would change.
pub fn copy_dim(
    src: &Hierarchy,
    src_dim: DimId,
    dest: &mut Hierarchy,
    dest_group: GroupId,
    dest_name: Option<&str>,
    options: &CopyOptions,
) -> Result<Outcome<DimId>, CdsError> {
    let dim = src.dim_ref(src_dim)?;
    let name = dest_name.unwrap_or(dim.name());
    let id = if let Some(existing) = dest.get_dim(dest_group, name) {
        let dest_dim = dest.dim_ref(existing)?;
        if dest_dim.common.is_locked() {
            return Ok(skipped(&dest.describe(existing), "the dimension is locked"));
        }
        if dest_dim.is_unlimited() {
            return Ok(skipped(&dest.describe(existing), "the dimension is unlimited"));
        }
        if dest_dim.length() != 0 && !options.overwrite_dims() {
            return Ok(skipped(&dest.describe(existing), "the dimension has a length"));
        }
        if dest.change_dim_length(existing, dim.length())?.is_skipped() {
            return Ok(Outcome::Skipped);
        }
        existing
    } else {
        if options.exclusive() || dest.is_locked(dest_group) {
            return Ok(skipped(
                &new_path(dest, dest_group, "/_dims_/", name),
                "the dimension is not defined in the destination",
            ));
        }
        let length = if dim.is_unlimited() { 0 } else { dim.length() };
        dest.define_dim(dest_group, name, length, dim.is_unlimited())?
    };
    copy_lock(src, src_dim, dest, id, options)?;
    Ok(Outcome::Done(id))
}

/// Copy the dimensions of `src_group` selected by `names` to `dest_group`.
///
/// See [`copy_dim`].
///
/// # Errors
///
/// Returns a [`CdsError`] if copying a dimension fails. Dimensions copied before the failure are kept.
pub fn copy_dims(
    src: &Hierarchy,
    src_group: GroupId,
    dest: &mut Hierarchy,
    dest_group: GroupId,
    names: &NameMap,
    options: &CopyOptions,
) -> Result<(), CdsError> {
    let dims: Vec<(DimId, &str)> = src
        .group_ref(src_group)?
        .dims()
        .iter()
        .filter_map(|&dim| Some((dim, src.object_name(dim)?)))
        .collect();
    for (dim, dest_name) in names.select(&dims) {
        let _ = copy_dim(src, dim, dest, dest_group, Some(&dest_name), options)?;
    }
    Ok(())
}

/// Copy a variable to `dest_group`, naming it `dest_name` (or the source name).
///
/// A new destination variable has the source data type, and dimensions missing from the destination are copied,
/// renamed by `dim_names`.
/// The attributes selected by `att_names` are copied (see [`copy_att`]).
/// Samples from [`CopyOptions::samples`] are copied if the variable has an unlimited dimension, otherwise every sample.
/// Without [`CopyOptions::overwrite_data`], destination samples below its sample count are kept,
/// and only the part of the range past them is copied.
///
/// A destination variable created by this call is deleted again if a later step fails.
///
/// # Errors
///
/// Returns a [`CdsError`] if
///  - a handle is stale,
///  - the variable, a dimension, or an attribute cannot be defined,
///  - the source and destination sample sizes differ, or
///  - the data cannot be converted or allocated.
#[allow(clippy::too_many_arguments)]
pub fn copy_var(
    src: &Hierarchy,
    src_var: VarId,
    dest: &mut Hierarchy,
    dest_group: GroupId,
    dest_name: Option<&str>,
    dim_names: &NameMap,
    att_names: &NameMap,
    options: &CopyOptions,
) -> Result<Outcome<VarId>, CdsError> {
    let var = src.var_ref(src_var)?;
    let name = dest_name.unwrap_or(var.name());
    let (dest_var, defined) = match dest.get_var(dest_group, name) {
        Some(existing) => (existing, false),
        None => {
            if options.exclusive() || dest.is_locked(dest_group) {
                return Ok(skipped(
                    &new_path(dest, dest_group, "/_vars_/", name),
                    "the variable is not defined in the destination",
                ));
            }
            let mut dest_dims = Vec::with_capacity(var.dims().len());
            for &dim in var.dims() {
                let dim_name = dim_names.map_name(src.dim_ref(dim)?.name());
                if dest.get_dim(dest_group, dim_name).is_none() {
                    let _ = copy_dim(src, dim, dest, dest_group, Some(dim_name), options)?;
                }
                dest_dims.push(dim_name);
            }
            let id = dest.define_var(dest_group, name, var.data_type(), &dest_dims)?;
            tracing::debug!(target: COMPONENT, path = %dest.describe(id), "variable copied");
            (id, true)
        }
    };

    let samples = if src.var_is_unlimited(src_var) {
        options.samples()
    } else {
        SampleRange::default()
    };
    let result = copy_var_contents(src, src_var, dest, dest_var, defined, att_names, samples, options);
    if result.is_err() && defined {
        dest.unlink_var(dest_var);
        dest.destroy_var(dest_var);
    }
    result.map(|()| Outcome::Done(dest_var))
}

#[allow(clippy::too_many_arguments)]
fn copy_var_contents(
    src: &Hierarchy,
    src_var: VarId,
    dest: &mut Hierarchy,
    dest_var: VarId,
    defined: bool,
    att_names: &NameMap,
    samples: SampleRange,
    options: &CopyOptions,
) -> Result<(), CdsError> {
    let converter = if options.skip_var_atts() && options.skip_data() {
        None
    } else if defined {
        let data_type = src.var_ref(src_var)?.data_type();
        Some(Converter::new(data_type, None, data_type, None)?)
    } else {
        Some(Converter::var_to_var(src, src_var, dest, dest_var)?)
    };

    if !options.skip_var_atts() {
        copy_atts_with(
            converter.as_ref(),
            src,
            src_var.into(),
            dest,
            dest_var.into(),
            att_names,
            options,
        )?;
    }

    if let Some(fill) = src.var_ref(src_var)?.default_fill() {
        if dest.var_ref(dest_var)?.default_fill().is_none() {
            let fill = match &converter {
                Some(converter) => converter
                    .convert_array(UnitsMode::Ignore, &DataArray::from_value(fill, 1))?
                    .first(),
                None => Some(fill.cast(dest.var_ref(dest_var)?.data_type())?),
            };
            dest.var_mut(dest_var)?.default_fill = fill;
        }
    }

    if options.copy_locks() {
        let lock = src.definition_lock(src_var)?;
        dest.set_definition_lock(dest_var, lock)?;
    }

    if let Some(converter) = &converter {
        let _ = copy_var_data(converter, src, src_var, dest, dest_var, samples, options)?;
    }
    Ok(())
}

/// Returns the source start, destination start, and count of the samples to copy, or [`None`] if there are none.
fn data_copy_range(
    src_count: usize,
    dest_count: usize,
    samples: SampleRange,
    overwrite: bool,
) -> Option<(usize, usize, usize)> {
    let SampleRange {
        mut src_start,
        mut dest_start,
        count,
    } = samples;
    if src_start >= src_count {
        return None;
    }
    let available = src_count - src_start;
    let mut count = count.filter(|&count| count > 0).map_or(available, |count| count.min(available));
    if !overwrite && dest_start < dest_count {
        // samples already written in the destination are kept
        let written = dest_count - dest_start;
        if count <= written {
            return None;
        }
        src_start += written;
        count -= written;
        dest_start = dest_count;
    }
    Some((src_start, dest_start, count))
}

fn copy_var_data(
    converter: &Converter,
    src: &Hierarchy,
    src_var: VarId,
    dest: &mut Hierarchy,
    dest_var: VarId,
    samples: SampleRange,
    options: &CopyOptions,
) -> Result<Outcome<()>, CdsError> {
    if options.skip_data() {
        return Ok(Outcome::Skipped);
    }
    let var = src.var_ref(src_var)?;
    let Some(data) = var.data.as_ref() else {
        return Ok(Outcome::Skipped);
    };
    let Some((src_start, dest_start, count)) = data_copy_range(
        var.sample_count(),
        dest.var_ref(dest_var)?.sample_count(),
        samples,
        options.overwrite_data(),
    ) else {
        return Ok(skipped(&dest.describe(dest_var), "no new samples"));
    };

    let sample_size = src.var_sample_size(src_var);
    let dest_sample_size = dest.var_sample_size(dest_var);
    if sample_size != dest_sample_size {
        return Err(CdsError::invalid(format!(
            "could not copy data of {} to {}: sample size {sample_size} != {dest_sample_size}",
            src.describe(src_var),
            dest.describe(dest_var)
        )));
    }
    let converted = converter.convert_range(
        UnitsMode::Convert,
        data,
        src_start * sample_size..(src_start + count) * sample_size,
    )?;
    let offset = dest.alloc_var_data(dest_var, dest_start, count)?;
    let description = dest.describe(dest_var);
    dest.var_mut(dest_var)?
        .data
        .as_mut()
        .ok_or_else(|| CdsError::not_found(format!("data of {description}")))?
        .write_at(offset, &converted)?;
    tracing::trace!(
        target: COMPONENT,
        path = %description,
        src_start,
        dest_start,
        sample_count = count,
        "variable data copied"
    );
    Ok(Outcome::Done(()))
}

/// Copy the variables of `src_group` selected by `names.vars` to `dest_group`.
///
/// Every attribute of each variable is copied. See [`copy_var`].
///
/// # Errors
///
/// Returns a [`CdsError`] if copying a variable fails. Variables copied before the failure are kept.
pub fn copy_vars(
    src: &Hierarchy,
    src_group: GroupId,
    dest: &mut Hierarchy,
    dest_group: GroupId,
    names: &CopyNames,
    options: &CopyOptions,
) -> Result<(), CdsError> {
    let vars: Vec<(VarId, &str)> = src
        .group_ref(src_group)?
        .vars()
        .iter()
        .filter_map(|&var| Some((var, src.object_name(var)?)))
        .collect();
    for (var, dest_name) in names.vars.select(&vars) {
        let _ = copy_var(
            src,
            var,
            dest,
            dest_group,
            Some(&dest_name),
            &names.dims,
            &NameMap::all(),
            options,
        )?;
    }
    Ok(())
}

/// Copy the subgroups of `src_group` selected by `names.subgroups` into `dest_group`.
///
/// See [`copy_group`].
///
/// # Errors
///
/// Returns a [`CdsError`] if copying a subgroup fails. Subgroups copied before the failure are kept.
pub fn copy_subgroups(
    src: &Hierarchy,
    src_group: GroupId,
    dest: &mut Hierarchy,
    dest_group: GroupId,
    names: &CopyNames,
    options: &CopyOptions,
) -> Result<(), CdsError> {
    let groups: Vec<(GroupId, &str)> = src
        .group_ref(src_group)?
        .groups()
        .iter()
        .filter_map(|&group| Some((group, src.object_name(group)?)))
        .collect();
    for (group, dest_name) in names.subgroups.select(&groups) {
        let _ = copy_group(src, group, dest, Some(dest_group), Some(&dest_name), names, options)?;
    }
    Ok(())
}

/// Copy a group into `dest_parent`, naming it `dest_name` (or the source name).
///
/// A `dest_parent` of [`None`] copies into the root group of that name, which is created if it does not exist.
/// Dimensions, group attributes, transform parameters, variables, and subgroups are copied in that order,
/// each unless skipped by `options`.
/// A destination group created by this call is deleted again if a later step fails.
///
/// # Errors
///
/// Returns a [`CdsError`] if a handle is stale or copying a member fails.
pub fn copy_group(
    src: &Hierarchy,
    src_group: GroupId,
    dest: &mut Hierarchy,
    dest_parent: Option<GroupId>,
    dest_name: Option<&str>,
    names: &CopyNames,
    options: &CopyOptions,
) -> Result<Outcome<GroupId>, CdsError> {
    let name = dest_name.unwrap_or(src.group_ref(src_group)?.name());
    let existing = match dest_parent {
        Some(parent) => dest.get_group(parent, name),
        None => dest.get_root_group(name),
    };
    let (dest_group, defined) = match existing {
        Some(existing) => (existing, false),
        None => {
            if options.exclusive() || dest_parent.is_some_and(|parent| dest.is_locked(parent)) {
                let path = match dest_parent {
                    Some(parent) => new_path(dest, parent, "/", name),
                    None => format!("/{name}"),
                };
                return Ok(skipped(&path, "the group is not defined in the destination"));
            }
            (dest.define_group(dest_parent, name)?, true)
        }
    };

    let result = copy_group_contents(src, src_group, dest, dest_group, names, options);
    if result.is_err() && defined {
        match dest_parent {
            Some(parent) => {
                if let Ok(parent) = dest.group_mut(parent) {
                    parent.groups.retain(|&group| group != dest_group);
                }
            }
            None => dest.roots.retain(|&group| group != dest_group),
        }
        dest.destroy_group(dest_group);
    }
    result.map(|()| Outcome::Done(dest_group))
}

fn copy_group_contents(
    src: &Hierarchy,
    src_group: GroupId,
    dest: &mut Hierarchy,
    dest_group: GroupId,
    names: &CopyNames,
    options: &CopyOptions,
) -> Result<(), CdsError> {
    if !options.skip_dims() {
        copy_dims(src, src_group, dest, dest_group, &names.dims, options)?;
    }
    if !options.skip_group_atts() {
        copy_atts(src, src_group.into(), dest, dest_group.into(), &names.atts, options)?;
        dest.copy_transform_params(src, src_group, dest_group)?;
    }
    if !options.skip_vars() {
        copy_vars(src, src_group, dest, dest_group, names, options)?;
    }
    if !options.skip_subgroups() {
        copy_subgroups(src, src_group, dest, dest_group, names, options)?;
    }
    if options.copy_locks() {
        let lock = src.definition_lock(src_group)?;
        dest.set_definition_lock(dest_group, lock)?;
    }
    Ok(())
}
