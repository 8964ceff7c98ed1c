//! The hierarchy of groups, dimensions, attributes, and variables.
//!
//! A [`Hierarchy`] owns every object. Each collection of children is owned by its parent,
//! and children hold a non-owning link back to their parent.
//! Destroying a group destroys everything below it regardless of definition locks.
//!
//! ```
//! # use cds::{DataArray, DataType, Hierarchy};
//! let mut hierarchy = Hierarchy::new();
//! let root = hierarchy.define_group(None, "root")?;
//! hierarchy.define_dim(root, "time", 0, true)?;
//! let temp = hierarchy.define_var(root, "temp", DataType::Float, &["time"])?;
//! hierarchy.define_att(temp.into(), "missing_value", DataArray::from(vec![-9999.0f32]))?;
//! assert_eq!(hierarchy.path(temp), Some("/root/_vars_/temp"));
//! # Ok::<(), cds::CdsError>(())
//! ```

mod attribute;
mod data_index;
mod dimension;
mod group;
mod time_vars;
mod transform_params;
mod var_data;
mod var_group;
mod variable;

pub use attribute::Attribute;
pub(crate) use attribute::cast_att_value;
pub use data_index::DataIndex;
pub use dimension::Dimension;
pub use group::Group;
pub use time_vars::{find_time_index, TimeRange, TimeSearch, TimeVar};
pub use var_data::RetrievedData;
pub use var_group::{VarArray, VarGroup};
pub use variable::Variable;

use std::any::Any;

use crate::{
    node::{
        AttId, DimId, GroupId, ObjectCommon, ObjectId, Slots, VarArrayId, VarGroupId, VarId,
    },
    CdsError, COMPONENT,
};

/// An in-memory hierarchy of scientific data objects.
///
/// A hierarchy may hold any number of root groups.
#[derive(Debug, Default)]
pub struct Hierarchy {
    pub(crate) groups: Slots<Group>,
    pub(crate) dims: Slots<Dimension>,
    pub(crate) atts: Slots<Attribute>,
    pub(crate) vars: Slots<Variable>,
    pub(crate) vargroups: Slots<VarGroup>,
    pub(crate) vararrays: Slots<VarArray>,
    pub(crate) roots: Vec<GroupId>,
}

impl Hierarchy {
    /// Create an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the root groups.
    #[must_use]
    pub fn root_groups(&self) -> &[GroupId] {
        &self.roots
    }

    /// Returns the number of live objects of every kind.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.groups.len()
            + self.dims.len()
            + self.atts.len()
            + self.vars.len()
            + self.vargroups.len()
            + self.vararrays.len()
    }

    /// Returns a group.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0)
    }

    /// Returns a dimension.
    #[must_use]
    pub fn dim(&self, id: DimId) -> Option<&Dimension> {
        self.dims.get(id.0)
    }

    /// Returns an attribute.
    #[must_use]
    pub fn att(&self, id: AttId) -> Option<&Attribute> {
        self.atts.get(id.0)
    }

    /// Returns a variable.
    #[must_use]
    pub fn var(&self, id: VarId) -> Option<&Variable> {
        self.vars.get(id.0)
    }

    /// Returns a variable group.
    #[must_use]
    pub fn vargroup(&self, id: VarGroupId) -> Option<&VarGroup> {
        self.vargroups.get(id.0)
    }

    /// Returns a variable array.
    #[must_use]
    pub fn vararray(&self, id: VarArrayId) -> Option<&VarArray> {
        self.vararrays.get(id.0)
    }

    /// Returns true if `id` refers to a live object.
    #[must_use]
    pub fn contains(&self, id: impl Into<ObjectId>) -> bool {
        self.common(id.into()).is_some()
    }

    /// Returns the [`ObjectCommon`] state of an object.
    #[must_use]
    pub fn common(&self, id: ObjectId) -> Option<&ObjectCommon> {
        match id {
            ObjectId::Group(id) => self.group(id).map(|o| &o.common),
            ObjectId::Dim(id) => self.dim(id).map(|o| &o.common),
            ObjectId::Att(id) => self.att(id).map(|o| &o.common),
            ObjectId::Var(id) => self.var(id).map(|o| &o.common),
            ObjectId::VarGroup(id) => self.vargroup(id).map(|o| &o.common),
            ObjectId::VarArray(id) => self.vararray(id).map(|o| &o.common),
        }
    }

    pub(crate) fn common_mut(&mut self, id: ObjectId) -> Option<&mut ObjectCommon> {
        match id {
            ObjectId::Group(id) => self.groups.get_mut(id.0).map(|o| &mut o.common),
            ObjectId::Dim(id) => self.dims.get_mut(id.0).map(|o| &mut o.common),
            ObjectId::Att(id) => self.atts.get_mut(id.0).map(|o| &mut o.common),
            ObjectId::Var(id) => self.vars.get_mut(id.0).map(|o| &mut o.common),
            ObjectId::VarGroup(id) => self.vargroups.get_mut(id.0).map(|o| &mut o.common),
            ObjectId::VarArray(id) => self.vararrays.get_mut(id.0).map(|o| &mut o.common),
        }
    }

    /// Returns the name of an object.
    #[must_use]
    pub fn object_name(&self, id: impl Into<ObjectId>) -> Option<&str> {
        self.common(id.into()).map(ObjectCommon::name)
    }

    /// Returns the parent of an object.
    #[must_use]
    pub fn object_parent(&self, id: impl Into<ObjectId>) -> Option<ObjectId> {
        self.common(id.into()).and_then(ObjectCommon::parent)
    }

    /// Returns the object itself if it is a group, or the nearest group containing it.
    pub(crate) fn nearest_group(&self, id: ObjectId) -> Option<GroupId> {
        std::iter::successors(Some(id), |&id| self.object_parent(id)).find_map(|id| match id {
            ObjectId::Group(group) => Some(group),
            _ => None,
        })
    }

    /// Returns the full path of an object.
    ///
    /// The path is computed on first use and cached until the object or one of its ancestors is renamed.
    /// Returns [`None`] if the handle is stale.
    #[must_use]
    pub fn path(&self, id: impl Into<ObjectId>) -> Option<&str> {
        self.path_of(id.into())
    }

    fn path_of(&self, id: ObjectId) -> Option<&str> {
        let common = self.common(id)?;
        let path = common.path.get_or_init(|| {
            let separator = id.kind().separator();
            match common.parent().and_then(|parent| self.path_of(parent)) {
                Some(parent) => format!("{parent}{separator}{}", common.name()),
                None => format!("{separator}{}", common.name()),
            }
        });
        Some(path.as_str())
    }

    /// The path of an object for messages, or a description of a stale handle.
    pub(crate) fn describe(&self, id: impl Into<ObjectId>) -> String {
        let id = id.into();
        self.path_of(id)
            .map_or_else(|| format!("stale {} handle", id.kind()), str::to_string)
    }

    /// Clear the cached path of an object and everything below it.
    pub(crate) fn invalidate_paths(&mut self, id: ObjectId) {
        if let Some(common) = self.common_mut(id) {
            common.path.take();
        }
        for child in self.children(id) {
            self.invalidate_paths(child);
        }
    }

    /// Returns the owned children of an object.
    pub(crate) fn children(&self, id: ObjectId) -> Vec<ObjectId> {
        match id {
            ObjectId::Group(id) => self
                .group(id)
                .map(|group| {
                    let dims = group.dims.iter().copied().map(ObjectId::from);
                    let atts = group.atts.iter().copied().map(ObjectId::from);
                    let vars = group.vars.iter().copied().map(ObjectId::from);
                    let groups = group.groups.iter().copied().map(ObjectId::from);
                    let vargroups = group.vargroups.iter().copied().map(ObjectId::from);
                    dims.chain(atts)
                        .chain(vars)
                        .chain(groups)
                        .chain(vargroups)
                        .collect()
                })
                .unwrap_or_default(),
            ObjectId::Var(id) => self
                .var(id)
                .map(|var| var.atts.iter().copied().map(ObjectId::from).collect())
                .unwrap_or_default(),
            ObjectId::VarGroup(id) => self
                .vargroup(id)
                .map(|vargroup| {
                    vargroup
                        .vararrays
                        .iter()
                        .copied()
                        .map(ObjectId::from)
                        .collect()
                })
                .unwrap_or_default(),
            ObjectId::Dim(_) | ObjectId::Att(_) | ObjectId::VarArray(_) => Vec::new(),
        }
    }

    /// Returns the definition lock of an object.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if the handle is stale.
    pub fn definition_lock(&self, id: impl Into<ObjectId>) -> Result<i32, CdsError> {
        let id = id.into();
        self.common(id)
            .map(ObjectCommon::definition_lock)
            .ok_or_else(|| CdsError::not_found(self.describe(id)))
    }

    /// Set the definition lock of an object. A non-zero value forbids structural changes.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if the handle is stale.
    pub fn set_definition_lock(&mut self, id: impl Into<ObjectId>, lock: i32) -> Result<(), CdsError> {
        let id = id.into();
        let description = self.describe(id);
        let common = self
            .common_mut(id)
            .ok_or_else(|| CdsError::not_found(description))?;
        common.set_definition_lock(lock);
        Ok(())
    }

    pub(crate) fn is_locked(&self, id: impl Into<ObjectId>) -> bool {
        self.common(id.into()).is_some_and(ObjectCommon::is_locked)
    }

    /// Log that a change was skipped because of a definition lock.
    pub(crate) fn skip_locked(&self, id: impl Into<ObjectId>, operation: &str) {
        tracing::warn!(
            target: COMPONENT,
            path = %self.describe(id),
            "{operation} skipped: the definition lock is set"
        );
    }

    /// Set a user data value on an object, replacing and dropping any existing value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if the handle is stale.
    pub fn set_user_data(
        &mut self,
        id: impl Into<ObjectId>,
        key: &str,
        value: Box<dyn Any + Send>,
    ) -> Result<(), CdsError> {
        let id = id.into();
        let description = self.describe(id);
        let common = self
            .common_mut(id)
            .ok_or_else(|| CdsError::not_found(description))?;
        common.user_data.set(key, value);
        Ok(())
    }

    /// Returns a user data value of an object.
    #[must_use]
    pub fn get_user_data(&self, id: impl Into<ObjectId>, key: &str) -> Option<&(dyn Any + Send)> {
        self.common(id.into())?.user_data().get(key)
    }

    /// Returns a user data value of an object if it has type `T`.
    #[must_use]
    pub fn get_user_data_as<T: Any>(&self, id: impl Into<ObjectId>, key: &str) -> Option<&T> {
        self.common(id.into())?.user_data().get_as(key)
    }

    /// Delete a user data value of an object, dropping it. Returns true if a value was deleted.
    pub fn delete_user_data(&mut self, id: impl Into<ObjectId>, key: &str) -> bool {
        self.common_mut(id.into())
            .and_then(|common| common.user_data.remove(key))
            .is_some()
    }

    pub(crate) fn group_ref(&self, id: GroupId) -> Result<&Group, CdsError> {
        self.group(id)
            .ok_or_else(|| CdsError::not_found(self.describe(id)))
    }

    pub(crate) fn dim_ref(&self, id: DimId) -> Result<&Dimension, CdsError> {
        self.dim(id).ok_or_else(|| CdsError::not_found(self.describe(id)))
    }

    pub(crate) fn att_ref(&self, id: AttId) -> Result<&Attribute, CdsError> {
        self.att(id).ok_or_else(|| CdsError::not_found(self.describe(id)))
    }

    pub(crate) fn var_ref(&self, id: VarId) -> Result<&Variable, CdsError> {
        self.var(id).ok_or_else(|| CdsError::not_found(self.describe(id)))
    }

    pub(crate) fn group_mut(&mut self, id: GroupId) -> Result<&mut Group, CdsError> {
        if !self.groups.contains(id.0) {
            return Err(CdsError::not_found(self.describe(id)));
        }
        self.groups
            .get_mut(id.0)
            .ok_or_else(|| CdsError::not_found("group"))
    }

    pub(crate) fn dim_mut(&mut self, id: DimId) -> Result<&mut Dimension, CdsError> {
        if !self.dims.contains(id.0) {
            return Err(CdsError::not_found(self.describe(id)));
        }
        self.dims
            .get_mut(id.0)
            .ok_or_else(|| CdsError::not_found("dimension"))
    }

    pub(crate) fn att_mut(&mut self, id: AttId) -> Result<&mut Attribute, CdsError> {
        if !self.atts.contains(id.0) {
            return Err(CdsError::not_found(self.describe(id)));
        }
        self.atts
            .get_mut(id.0)
            .ok_or_else(|| CdsError::not_found("attribute"))
    }

    pub(crate) fn var_mut(&mut self, id: VarId) -> Result<&mut Variable, CdsError> {
        if !self.vars.contains(id.0) {
            return Err(CdsError::not_found(self.describe(id)));
        }
        self.vars
            .get_mut(id.0)
            .ok_or_else(|| CdsError::not_found("variable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataArray, DataType, ObjectKind};

    #[test]
    fn hierarchy_paths() {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.define_group(None, "root").unwrap();
        let child = hierarchy.define_group(Some(root), "child").unwrap();
        let time = hierarchy.define_dim(child, "time", 0, true).unwrap();
        let temp = hierarchy
            .define_var(child, "temp", DataType::Float, &["time"])
            .unwrap();
        let units = hierarchy
            .define_att(temp.into(), "units", DataArray::from("degC"))
            .unwrap();
        let title = hierarchy
            .define_att(root.into(), "title", DataArray::from("test"))
            .unwrap();

        assert_eq!(hierarchy.path(root), Some("/root"));
        assert_eq!(hierarchy.path(child), Some("/root/child"));
        assert_eq!(hierarchy.path(time), Some("/root/child/_dims_/time"));
        assert_eq!(hierarchy.path(temp), Some("/root/child/_vars_/temp"));
        assert_eq!(
            hierarchy.path(units),
            Some("/root/child/_vars_/temp/_atts_/units")
        );
        assert_eq!(hierarchy.path(title), Some("/root/_atts_/title"));
        assert_eq!(ObjectId::from(units).kind(), ObjectKind::Att);

        // path is stable until a rename
        assert_eq!(hierarchy.path(units), hierarchy.path(units));
        assert!(hierarchy.rename_group(child, "renamed").unwrap().is_done());
        assert_eq!(
            hierarchy.path(units),
            Some("/root/renamed/_vars_/temp/_atts_/units")
        );
        assert_eq!(hierarchy.path(time), Some("/root/renamed/_dims_/time"));
    }

    #[test]
    fn hierarchy_stale_handles() {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.define_group(None, "root").unwrap();
        let child = hierarchy.define_group(Some(root), "child").unwrap();
        assert!(hierarchy.delete_group(child).unwrap().is_done());
        assert!(!hierarchy.contains(child));
        assert_eq!(hierarchy.path(child), None);
        assert_eq!(
            hierarchy.definition_lock(child).unwrap_err().kind(),
            crate::ErrorKind::NotFound
        );
        // a new group in the recycled slot is not reachable through the old handle
        let other = hierarchy.define_group(Some(root), "other").unwrap();
        assert_ne!(other, child);
        assert!(hierarchy.group(child).is_none());
    }

    #[test]
    fn hierarchy_user_data() {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.define_group(None, "root").unwrap();
        hierarchy
            .set_user_data(root, "source", Box::new("sonde".to_string()))
            .unwrap();
        assert_eq!(
            hierarchy
                .get_user_data_as::<String>(root, "source")
                .map(String::as_str),
            Some("sonde")
        );
        hierarchy
            .set_user_data(root, "source", Box::new(3u8))
            .unwrap();
        assert_eq!(hierarchy.get_user_data_as::<u8>(root, "source"), Some(&3));
        assert!(hierarchy.delete_user_data(root, "source"));
        assert!(!hierarchy.delete_user_data(root, "source"));
        assert!(hierarchy.get_user_data(root, "source").is_none());
    }

    #[test]
    fn hierarchy_locks() {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.define_group(None, "root").unwrap();
        assert_eq!(hierarchy.definition_lock(root).unwrap(), 0);
        hierarchy.set_definition_lock(root, 1).unwrap();
        assert_eq!(hierarchy.definition_lock(root).unwrap(), 1);
        assert_eq!(
            hierarchy.define_dim(root, "time", 0, true).unwrap_err().kind(),
            crate::ErrorKind::Locked
        );
    }
}
