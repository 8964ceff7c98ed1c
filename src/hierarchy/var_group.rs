use crate::{
    node::{validate_name, GroupId, ObjectCommon, ObjectId, VarArrayId, VarGroupId, VarId},
    CdsError, Outcome, COMPONENT,
};

use super::Hierarchy;

/// A named collection of [`VarArray`]s in a group.
#[derive(Debug)]
pub struct VarGroup {
    pub(crate) common: ObjectCommon,
    pub(crate) vararrays: Vec<VarArrayId>,
}

impl VarGroup {
    /// Returns the [`ObjectCommon`] state.
    #[must_use]
    pub const fn common(&self) -> &ObjectCommon {
        &self.common
    }

    /// Returns the variable group name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.common.name()
    }

    /// Returns the variable arrays in definition order.
    #[must_use]
    pub fn vararrays(&self) -> &[VarArrayId] {
        &self.vararrays
    }
}

/// An ordered list of references to variables.
///
/// A slot is [`None`] if the variable did not exist when it was added or has since been deleted.
#[derive(Debug)]
pub struct VarArray {
    pub(crate) common: ObjectCommon,
    pub(crate) vars: Vec<Option<VarId>>,
}

impl VarArray {
    /// Returns the [`ObjectCommon`] state.
    #[must_use]
    pub const fn common(&self) -> &ObjectCommon {
        &self.common
    }

    /// Returns the variable array name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.common.name()
    }

    /// Returns the variable references.
    #[must_use]
    pub fn vars(&self) -> &[Option<VarId>] {
        &self.vars
    }
}

impl Hierarchy {
    /// Define a variable group in `group`, returning an existing one of the same name.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the name is invalid, `group` is stale, or the definition lock of `group` is set.
    pub fn define_vargroup(&mut self, group: GroupId, name: &str) -> Result<VarGroupId, CdsError> {
        validate_name(name)?;
        if let Some(existing) = self.get_vargroup(group, name) {
            return Ok(existing);
        }
        if self.group_ref(group)?.common.is_locked() {
            return Err(CdsError::locked(format!(
                "could not define variable group {}/_vargroups_/{name}",
                self.describe(group)
            )));
        }
        let vargroup = VarGroup {
            common: ObjectCommon::new(Some(group.into()), name),
            vararrays: Vec::new(),
        };
        let id = VarGroupId(self.vargroups.insert(vargroup));
        self.group_mut(group)?.vargroups.push(id);
        tracing::trace!(target: COMPONENT, path = %self.describe(id), "variable group defined");
        Ok(id)
    }

    /// Returns the variable group named `name` in `group`.
    #[must_use]
    pub fn get_vargroup(&self, group: GroupId, name: &str) -> Option<VarGroupId> {
        self.group(group)?
            .vargroups
            .iter()
            .copied()
            .find(|&id| self.object_name(id) == Some(name))
    }

    /// Delete a variable group and its variable arrays. The referenced variables are not affected.
    ///
    /// Returns [`Outcome::Skipped`] if the definition lock of the variable group or its group is set.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if the handle is stale.
    pub fn delete_vargroup(&mut self, id: VarGroupId) -> Result<Outcome<()>, CdsError> {
        let parent = self
            .vargroup(id)
            .ok_or_else(|| CdsError::not_found(self.describe(id)))?
            .common
            .parent();
        if self.is_locked(id) {
            self.skip_locked(id, "delete variable group");
            return Ok(Outcome::Skipped);
        }
        if let Some(ObjectId::Group(group)) = parent {
            if self.is_locked(group) {
                self.skip_locked(group, "delete variable group");
                return Ok(Outcome::Skipped);
            }
            self.group_mut(group)?.vargroups.retain(|&v| v != id);
        }
        self.destroy_vargroup(id);
        Ok(Outcome::Done(()))
    }

    pub(crate) fn destroy_vargroup(&mut self, id: VarGroupId) {
        if let Some(vargroup) = self.vargroups.remove(id.0) {
            for vararray in vargroup.vararrays {
                self.vararrays.remove(vararray.0);
            }
        }
    }

    /// Define a variable array in a variable group, returning an existing one of the same name.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the name is invalid, `vargroup` is stale, or the definition lock of `vargroup` is set.
    pub fn define_vararray(&mut self, vargroup: VarGroupId, name: &str) -> Result<VarArrayId, CdsError> {
        validate_name(name)?;
        if let Some(existing) = self.get_vararray(vargroup, name) {
            return Ok(existing);
        }
        if !self.contains(vargroup) {
            return Err(CdsError::not_found(self.describe(vargroup)));
        }
        if self.is_locked(vargroup) {
            return Err(CdsError::locked(format!(
                "could not define variable array {}/_vararrays_/{name}",
                self.describe(vargroup)
            )));
        }
        let vararray = VarArray {
            common: ObjectCommon::new(Some(vargroup.into()), name),
            vars: Vec::new(),
        };
        let id = VarArrayId(self.vararrays.insert(vararray));
        if let Some(vargroup) = self.vargroups.get_mut(vargroup.0) {
            vargroup.vararrays.push(id);
        }
        Ok(id)
    }

    /// Returns the variable array named `name` in a variable group.
    #[must_use]
    pub fn get_vararray(&self, vargroup: VarGroupId, name: &str) -> Option<VarArrayId> {
        self.vargroup(vargroup)?
            .vararrays
            .iter()
            .copied()
            .find(|&id| self.object_name(id) == Some(name))
    }

    /// Delete a variable array.
    ///
    /// Returns [`Outcome::Skipped`] if the definition lock of the variable array or its variable group is set.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if the handle is stale.
    pub fn delete_vararray(&mut self, id: VarArrayId) -> Result<Outcome<()>, CdsError> {
        let parent = self
            .vararray(id)
            .ok_or_else(|| CdsError::not_found(self.describe(id)))?
            .common
            .parent();
        if self.is_locked(id) {
            self.skip_locked(id, "delete variable array");
            return Ok(Outcome::Skipped);
        }
        if let Some(ObjectId::VarGroup(vargroup)) = parent {
            if self.is_locked(vargroup) {
                self.skip_locked(vargroup, "delete variable array");
                return Ok(Outcome::Skipped);
            }
            if let Some(vargroup) = self.vargroups.get_mut(vargroup.0) {
                vargroup.vararrays.retain(|&v| v != id);
            }
        }
        self.vararrays.remove(id.0);
        Ok(Outcome::Done(()))
    }

    /// Append variable references to a variable array.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if `vararray` or one of `vars` is stale.
    pub fn add_vararray_vars(&mut self, vararray: VarArrayId, vars: &[VarId]) -> Result<(), CdsError> {
        if let Some(&stale) = vars.iter().find(|&&var| !self.contains(var)) {
            return Err(CdsError::not_found(self.describe(stale)));
        }
        let description = self.describe(vararray);
        let vararray = self
            .vararrays
            .get_mut(vararray.0)
            .ok_or_else(|| CdsError::not_found(description))?;
        vararray.vars.extend(vars.iter().copied().map(Some));
        Ok(())
    }

    /// Define a variable array holding the variables of `group` named `var_names`,
    /// defining the variable group and array if needed.
    ///
    /// A name without a variable leaves an empty slot.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the variable group or array cannot be defined.
    pub fn create_vararray(
        &mut self,
        group: GroupId,
        vargroup_name: &str,
        vararray_name: &str,
        var_names: &[&str],
    ) -> Result<VarArrayId, CdsError> {
        let vargroup = self.define_vargroup(group, vargroup_name)?;
        let vararray = self.define_vararray(vargroup, vararray_name)?;
        let vars: Vec<Option<VarId>> = var_names
            .iter()
            .map(|&name| self.get_var(group, name))
            .collect();
        let description = self.describe(vararray);
        self.vararrays
            .get_mut(vararray.0)
            .ok_or_else(|| CdsError::not_found(description))?
            .vars
            .extend(vars);
        Ok(vararray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataType;

    #[test]
    fn vararray_create() {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.define_group(None, "root").unwrap();
        hierarchy.define_dim(root, "time", 0, true).unwrap();
        let u = hierarchy.define_var(root, "u", DataType::Float, &["time"]).unwrap();
        let v = hierarchy.define_var(root, "v", DataType::Float, &["time"]).unwrap();

        let wind = hierarchy
            .create_vararray(root, "vectors", "wind", &["u", "v", "w"])
            .unwrap();
        assert_eq!(hierarchy.vararray(wind).unwrap().vars(), [Some(u), Some(v), None]);
        assert_eq!(hierarchy.path(wind), Some("/root/_vargroups_/vectors/_vararrays_/wind"));
        let vectors = hierarchy.get_vargroup(root, "vectors").unwrap();
        assert_eq!(hierarchy.get_vararray(vectors, "wind"), Some(wind));

        hierarchy.add_vararray_vars(wind, &[u]).unwrap();
        assert_eq!(hierarchy.vararray(wind).unwrap().vars().len(), 4);

        // deleting a variable clears its references
        assert!(hierarchy.delete_var(u).unwrap().is_done());
        assert_eq!(hierarchy.vararray(wind).unwrap().vars(), [None, Some(v), None, None]);
        assert!(hierarchy.add_vararray_vars(wind, &[u]).is_err());
    }

    #[test]
    fn vargroup_delete() {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.define_group(None, "root").unwrap();
        let vectors = hierarchy.define_vargroup(root, "vectors").unwrap();
        assert_eq!(hierarchy.define_vargroup(root, "vectors").unwrap(), vectors);
        let wind = hierarchy.define_vararray(vectors, "wind").unwrap();
        let current = hierarchy.define_vararray(vectors, "current").unwrap();

        hierarchy.set_definition_lock(vectors, 1).unwrap();
        assert!(hierarchy.delete_vararray(wind).unwrap().is_skipped());
        assert!(hierarchy.define_vararray(vectors, "waves").is_err());
        hierarchy.set_definition_lock(vectors, 0).unwrap();
        assert!(hierarchy.delete_vararray(wind).unwrap().is_done());
        assert_eq!(hierarchy.vargroup(vectors).unwrap().vararrays(), [current]);

        assert!(hierarchy.delete_vargroup(vectors).unwrap().is_done());
        assert!(!hierarchy.contains(current));
        assert!(hierarchy.group(root).unwrap().vargroups().is_empty());
    }
}
