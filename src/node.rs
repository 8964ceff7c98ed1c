//! The object registry.
//!
//! Every object in a [`Hierarchy`](crate::Hierarchy) is addressed by a typed generational handle
//! ([`GroupId`], [`DimId`], [`AttId`], [`VarId`], [`VarGroupId`], [`VarArrayId`]) and carries an [`ObjectCommon`]:
//! its name, a non-owning link to its parent, a lazily cached path, a definition lock, and a [`UserData`] side table.
//!
//! Paths concatenate the names of all ancestors, root-most first, with a kind-specific separator before each name.
//! For example, the `units` attribute of variable `temp` in root group `root` has the path `/root/_vars_/temp/_atts_/units`.

mod object_id;
mod slots;
mod user_data;

use std::cell::OnceCell;

pub use object_id::{
    AttId, AttParent, DimId, GroupId, ObjectId, ObjectKind, SlotId, VarArrayId, VarGroupId, VarId,
};
pub(crate) use slots::Slots;
pub use user_data::UserData;

use crate::CdsError;

/// The state shared by every object.
#[derive(Debug)]
pub struct ObjectCommon {
    name: String,
    parent: Option<ObjectId>,
    pub(crate) path: OnceCell<String>,
    definition_lock: i32,
    pub(crate) user_data: UserData,
}

impl ObjectCommon {
    pub(crate) fn new(parent: Option<ObjectId>, name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent,
            path: OnceCell::new(),
            definition_lock: 0,
            user_data: UserData::default(),
        }
    }

    /// Returns the object name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent of the object, or [`None`] for a root group.
    #[must_use]
    pub const fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Returns the definition lock. A non-zero lock forbids structural changes.
    #[must_use]
    pub const fn definition_lock(&self) -> i32 {
        self.definition_lock
    }

    /// Returns true if the definition lock is set.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.definition_lock != 0
    }

    /// Returns the user data table.
    #[must_use]
    pub const fn user_data(&self) -> &UserData {
        &self.user_data
    }

    pub(crate) fn set_definition_lock(&mut self, lock: i32) {
        self.definition_lock = lock;
    }

    /// Rename the object. The caller invalidates cached paths.
    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
}

/// Validates an object name.
///
/// A name must not be empty and must not contain `/`.
pub(crate) fn validate_name(name: &str) -> Result<(), CdsError> {
    if name.is_empty() || name.contains('/') {
        Err(CdsError::invalid(format!("invalid object name {name:?}")))
    } else {
        Ok(())
    }
}
