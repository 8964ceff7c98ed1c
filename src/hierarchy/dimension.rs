use crate::{
    node::{validate_name, DimId, GroupId, ObjectCommon, ObjectId, VarId},
    CdsError, Outcome, COMPONENT,
};

use super::Hierarchy;

/// A named axis, optionally unlimited.
///
/// The length of an unlimited dimension grows with the data of the variables that use it.
#[derive(Debug)]
pub struct Dimension {
    pub(crate) common: ObjectCommon,
    pub(crate) length: usize,
    pub(crate) is_unlimited: bool,
}

impl Dimension {
    /// Returns the [`ObjectCommon`] state.
    #[must_use]
    pub const fn common(&self) -> &ObjectCommon {
        &self.common
    }

    /// Returns the dimension name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.common.name()
    }

    /// Returns the group that owns the dimension.
    #[must_use]
    pub fn group(&self) -> Option<GroupId> {
        match self.common.parent() {
            Some(ObjectId::Group(group)) => Some(group),
            _ => None,
        }
    }

    /// Returns the length.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Returns true if the dimension is unlimited.
    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        self.is_unlimited
    }
}

impl Hierarchy {
    /// Define a dimension in `group`.
    ///
    /// An unlimited dimension always starts with length 0.
    /// If a dimension of the same name exists with the same definition, it is returned.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if
    ///  - the name is invalid,
    ///  - an existing dimension of the same name has a conflicting length or unlimited flag,
    ///  - `group` is stale, or
    ///  - the definition lock of `group` is set.
    pub fn define_dim(
        &mut self,
        group: GroupId,
        name: &str,
        length: usize,
        is_unlimited: bool,
    ) -> Result<DimId, CdsError> {
        validate_name(name)?;
        if let Some(existing) = self.get_group_dim(group, name) {
            let dim = self.dim_ref(existing)?;
            if dim.is_unlimited == is_unlimited && (is_unlimited || dim.length == length) {
                return Ok(existing);
            }
            return Err(CdsError::invalid(format!(
                "could not define dimension {}: a conflicting definition exists",
                self.describe(existing)
            )));
        }
        if self.group_ref(group)?.common.is_locked() {
            return Err(CdsError::locked(format!(
                "could not define dimension {}/_dims_/{name}",
                self.describe(group)
            )));
        }
        let dim = Dimension {
            common: ObjectCommon::new(Some(group.into()), name),
            length: if is_unlimited { 0 } else { length },
            is_unlimited,
        };
        let id = DimId(self.dims.insert(dim));
        self.group_mut(group)?.dims.push(id);
        tracing::debug!(target: COMPONENT, path = %self.describe(id), length, is_unlimited, "dimension defined");
        Ok(id)
    }

    /// Returns the dimension named `name` in `group` or the nearest ancestor that has one.
    #[must_use]
    pub fn get_dim(&self, group: GroupId, name: &str) -> Option<DimId> {
        self.group_lineage(group)
            .find_map(|group| self.get_group_dim(group, name))
    }

    /// Returns the dimension named `name` in `group` only.
    #[must_use]
    pub fn get_group_dim(&self, group: GroupId, name: &str) -> Option<DimId> {
        self.group(group)?
            .dims
            .iter()
            .copied()
            .find(|&id| self.object_name(id) == Some(name))
    }

    /// Change the length of a static dimension.
    ///
    /// The length of an unlimited dimension follows the data of its variables, so requests for one are ignored.
    /// Returns [`Outcome::Skipped`] if the definition lock of the dimension is set.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale or a variable using the dimension holds data.
    pub fn change_dim_length(&mut self, id: DimId, length: usize) -> Result<Outcome<()>, CdsError> {
        let dim = self.dim_ref(id)?;
        if dim.length == length || dim.is_unlimited {
            return Ok(Outcome::Done(()));
        }
        if dim.common.is_locked() {
            self.skip_locked(id, "change dimension length");
            return Ok(Outcome::Skipped);
        }
        if let Some(var) = self
            .dim_dependents(id)
            .into_iter()
            .find(|&var| self.var(var).is_some_and(|var| var.sample_count() > 0))
        {
            return Err(CdsError::invalid(format!(
                "could not change the length of {}: {} holds data",
                self.describe(id),
                self.describe(var)
            )));
        }
        self.dim_mut(id)?.length = length;
        Ok(Outcome::Done(()))
    }

    /// Delete a dimension and every variable that uses it.
    ///
    /// Returns [`Outcome::Skipped`] if the definition lock of the dimension or its group is set.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if the handle is stale.
    pub fn delete_dim(&mut self, id: DimId) -> Result<Outcome<()>, CdsError> {
        let group = self.dim_ref(id)?.group();
        if self.is_locked(id) {
            self.skip_locked(id, "delete dimension");
            return Ok(Outcome::Skipped);
        }
        if let Some(group) = group.filter(|&group| self.is_locked(group)) {
            self.skip_locked(group, "delete dimension");
            return Ok(Outcome::Skipped);
        }
        for var in self.dim_dependents(id) {
            tracing::debug!(target: COMPONENT, path = %self.describe(var), "deleting variable of deleted dimension");
            self.unlink_var(var);
            self.destroy_var(var);
        }
        if let Some(group) = group {
            self.group_mut(group)?.dims.retain(|&d| d != id);
        }
        self.dims.remove(id.0);
        Ok(Outcome::Done(()))
    }

    /// Rename a dimension.
    ///
    /// A coordinate variable of the dimension (a variable with the dimension name in the same group) is renamed too,
    /// unless its definition lock is set.
    /// Returns [`Outcome::Skipped`] if the definition lock of the dimension or its group is set.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale, the name is invalid, or the name is taken.
    pub fn rename_dim(&mut self, id: DimId, name: &str) -> Result<Outcome<()>, CdsError> {
        validate_name(name)?;
        let group = self.dim_ref(id)?.group();
        if self.is_locked(id) {
            self.skip_locked(id, "rename dimension");
            return Ok(Outcome::Skipped);
        }
        if let Some(group) = group {
            if self.is_locked(group) {
                self.skip_locked(group, "rename dimension");
                return Ok(Outcome::Skipped);
            }
            if self.get_group_dim(group, name).is_some_and(|other| other != id) {
                return Err(CdsError::invalid(format!(
                    "could not rename dimension {}: {name} already exists",
                    self.describe(id)
                )));
            }
        }
        if let Some(coord_var) = self.get_dim_var(id) {
            if !self.is_locked(coord_var) {
                let _ = self.rename_var(coord_var, name)?;
            }
        }
        self.dim_mut(id)?.common.set_name(name);
        self.invalidate_paths(id.into());
        Ok(Outcome::Done(()))
    }

    /// Returns the coordinate variable of a dimension.
    ///
    /// A coordinate variable has the same name as the dimension, is in the same group, and has that dimension as its only dimension.
    #[must_use]
    pub fn get_dim_var(&self, id: DimId) -> Option<VarId> {
        let dim = self.dim(id)?;
        let var = self.get_var(dim.group()?, dim.name())?;
        (self.var(var)?.dims() == [id]).then_some(var)
    }

    /// Returns every variable that uses a dimension.
    ///
    /// Only the owning group and its descendants can reference the dimension.
    pub(crate) fn dim_dependents(&self, id: DimId) -> Vec<VarId> {
        let mut dependents = Vec::new();
        let Some(group) = self.dim(id).and_then(Dimension::group) else {
            return dependents;
        };
        let mut stack = vec![group];
        while let Some(group) = stack.pop() {
            let Some(group) = self.group(group) else {
                continue;
            };
            dependents.extend(
                group
                    .vars
                    .iter()
                    .copied()
                    .filter(|&var| self.var(var).is_some_and(|var| var.dims.contains(&id))),
            );
            stack.extend(group.groups.iter().copied());
        }
        dependents
    }

    /// Raise the length of an unlimited dimension to at least `length`.
    pub(crate) fn grow_unlimited_dim(&mut self, id: DimId, length: usize) {
        if let Some(dim) = self.dims.get_mut(id.0) {
            if dim.is_unlimited && dim.length < length {
                dim.length = length;
            }
        }
    }
}
