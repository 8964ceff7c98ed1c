use crate::{
    node::{validate_name, AttId, DimId, GroupId, ObjectCommon, ObjectId, VarGroupId, VarId},
    CdsError, Outcome, COMPONENT,
};

use super::Hierarchy;

/// A named container of dimensions, attributes, variables, child groups, and variable groups.
#[derive(Debug)]
pub struct Group {
    pub(crate) common: ObjectCommon,
    pub(crate) dims: Vec<DimId>,
    pub(crate) atts: Vec<AttId>,
    pub(crate) vars: Vec<VarId>,
    pub(crate) groups: Vec<GroupId>,
    pub(crate) vargroups: Vec<VarGroupId>,
}

impl Group {
    fn new(parent: Option<GroupId>, name: &str) -> Self {
        Self {
            common: ObjectCommon::new(parent.map(ObjectId::from), name),
            dims: Vec::new(),
            atts: Vec::new(),
            vars: Vec::new(),
            groups: Vec::new(),
            vargroups: Vec::new(),
        }
    }

    /// Returns the [`ObjectCommon`] state.
    #[must_use]
    pub const fn common(&self) -> &ObjectCommon {
        &self.common
    }

    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.common.name()
    }

    /// Returns the parent group, or [`None`] for a root group.
    #[must_use]
    pub fn parent(&self) -> Option<GroupId> {
        match self.common.parent() {
            Some(ObjectId::Group(parent)) => Some(parent),
            _ => None,
        }
    }

    /// Returns the dimensions in definition order.
    #[must_use]
    pub fn dims(&self) -> &[DimId] {
        &self.dims
    }

    /// Returns the attributes in definition order.
    #[must_use]
    pub fn atts(&self) -> &[AttId] {
        &self.atts
    }

    /// Returns the variables in definition order.
    #[must_use]
    pub fn vars(&self) -> &[VarId] {
        &self.vars
    }

    /// Returns the child groups in definition order.
    #[must_use]
    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    /// Returns the variable groups in definition order.
    #[must_use]
    pub fn vargroups(&self) -> &[VarGroupId] {
        &self.vargroups
    }
}

impl Hierarchy {
    /// Define a group.
    ///
    /// A `parent` of [`None`] creates a root group.
    /// If a group with the same name already exists under `parent`, it is returned.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if
    ///  - the name is invalid,
    ///  - `parent` is stale, or
    ///  - the definition lock of `parent` is set.
    pub fn define_group(&mut self, parent: Option<GroupId>, name: &str) -> Result<GroupId, CdsError> {
        validate_name(name)?;
        let Some(parent) = parent else {
            let id = GroupId(self.groups.insert(Group::new(None, name)));
            self.roots.push(id);
            return Ok(id);
        };
        if let Some(existing) = self.get_group(parent, name) {
            return Ok(existing);
        }
        if self.group_ref(parent)?.common.is_locked() {
            return Err(CdsError::locked(format!(
                "could not define group {}/{name}",
                self.describe(parent)
            )));
        }
        let id = GroupId(self.groups.insert(Group::new(Some(parent), name)));
        self.group_mut(parent)?.groups.push(id);
        tracing::debug!(target: COMPONENT, path = %self.describe(id), "group defined");
        Ok(id)
    }

    /// Returns the child group of `parent` named `name`.
    #[must_use]
    pub fn get_group(&self, parent: GroupId, name: &str) -> Option<GroupId> {
        self.group(parent)?
            .groups
            .iter()
            .copied()
            .find(|&id| self.object_name(id) == Some(name))
    }

    /// Returns the root group named `name`.
    #[must_use]
    pub fn get_root_group(&self, name: &str) -> Option<GroupId> {
        self.roots
            .iter()
            .copied()
            .find(|&id| self.object_name(id) == Some(name))
    }

    /// Delete a group and everything below it.
    ///
    /// Locked descendants are deleted too.
    /// Returns [`Outcome::Skipped`] if the definition lock of the group or its parent is set.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if the handle is stale.
    pub fn delete_group(&mut self, id: GroupId) -> Result<Outcome<()>, CdsError> {
        let parent = self.group_ref(id)?.parent();
        if self.is_locked(id) {
            self.skip_locked(id, "delete group");
            return Ok(Outcome::Skipped);
        }
        if let Some(parent) = parent.filter(|&parent| self.is_locked(parent)) {
            self.skip_locked(parent, "delete group");
            return Ok(Outcome::Skipped);
        }
        match parent {
            Some(parent) => self.group_mut(parent)?.groups.retain(|&g| g != id),
            None => self.roots.retain(|&g| g != id),
        }
        tracing::debug!(target: COMPONENT, path = %self.describe(id), "group deleted");
        self.destroy_group(id);
        Ok(Outcome::Done(()))
    }

    /// Rename a group.
    ///
    /// Returns [`Outcome::Skipped`] if the definition lock of the group or its parent is set.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale, the name is invalid, or a sibling group already has the name.
    pub fn rename_group(&mut self, id: GroupId, name: &str) -> Result<Outcome<()>, CdsError> {
        validate_name(name)?;
        let parent = self.group_ref(id)?.parent();
        if self.is_locked(id) {
            self.skip_locked(id, "rename group");
            return Ok(Outcome::Skipped);
        }
        if let Some(parent) = parent {
            if self.is_locked(parent) {
                self.skip_locked(parent, "rename group");
                return Ok(Outcome::Skipped);
            }
            if self.get_group(parent, name).is_some_and(|other| other != id) {
                return Err(CdsError::invalid(format!(
                    "could not rename group {}: {name} already exists",
                    self.describe(id)
                )));
            }
        }
        self.group_mut(id)?.common.set_name(name);
        self.invalidate_paths(id.into());
        Ok(Outcome::Done(()))
    }

    /// Returns the ancestors of a group, nearest first, starting with the group itself.
    pub(crate) fn group_lineage(&self, id: GroupId) -> impl Iterator<Item = GroupId> + '_ {
        std::iter::successors(Some(id), |&group| self.group(group).and_then(Group::parent))
            .filter(|&group| self.groups.contains(group.0))
    }

    /// Remove a group and its descendants from storage. The caller unlinks it from its parent.
    pub(crate) fn destroy_group(&mut self, id: GroupId) {
        let Some(group) = self.groups.remove(id.0) else {
            return;
        };
        for var in group.vars {
            self.destroy_var(var);
        }
        for att in group.atts {
            self.atts.remove(att.0);
        }
        for dim in group.dims {
            self.dims.remove(dim.0);
        }
        for child in group.groups {
            self.destroy_group(child);
        }
        for vargroup in group.vargroups {
            self.destroy_vargroup(vargroup);
        }
    }
}
