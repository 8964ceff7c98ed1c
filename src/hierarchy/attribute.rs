use std::fmt::Display;

use crate::{
    config::global_config,
    node::{validate_name, AttId, AttParent, ObjectCommon, ObjectId},
    CdsError, DataArray, DataType, Outcome, COMPONENT,
};

use super::Hierarchy;

/// A named, typed, fixed-length value attached to a group or variable.
#[derive(Debug)]
pub struct Attribute {
    pub(crate) common: ObjectCommon,
    pub(crate) value: DataArray,
}

impl Attribute {
    /// Returns the [`ObjectCommon`] state.
    #[must_use]
    pub const fn common(&self) -> &ObjectCommon {
        &self.common
    }

    /// Returns the attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.common.name()
    }

    /// Returns the group or variable that owns the attribute.
    #[must_use]
    pub fn parent(&self) -> Option<AttParent> {
        match self.common.parent()? {
            ObjectId::Group(group) => Some(AttParent::Group(group)),
            ObjectId::Var(var) => Some(AttParent::Var(var)),
            _ => None,
        }
    }

    /// Returns the data type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.value.data_type()
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Returns true if the attribute has no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Returns the value.
    #[must_use]
    pub const fn value(&self) -> &DataArray {
        &self.value
    }

    /// Returns the value rendered as text.
    #[must_use]
    pub fn text(&self) -> String {
        self.value.to_text()
    }
}

/// Cast an attribute value, converting between text and numbers where one side is `char`.
pub(crate) fn cast_att_value(value: &DataArray, data_type: DataType) -> Result<DataArray, CdsError> {
    match (value.data_type(), data_type) {
        (from, to) if from == to => Ok(value.clone()),
        (DataType::Char, to) => DataArray::parse_text(to, &value.to_text()),
        (_, DataType::Char) => Ok(DataArray::from_text(&value.to_text())),
        (_, to) => value.cast(to),
    }
}

impl Hierarchy {
    /// Returns the attributes of a group or variable.
    #[must_use]
    pub fn atts_of(&self, parent: AttParent) -> &[AttId] {
        match parent {
            AttParent::Group(group) => self.group(group).map_or(&[][..], |group| group.atts.as_slice()),
            AttParent::Var(var) => self.var(var).map_or(&[][..], |var| var.atts.as_slice()),
        }
    }

    /// Returns the attribute named `name` on a group or variable.
    #[must_use]
    pub fn get_att(&self, parent: AttParent, name: &str) -> Option<AttId> {
        self.atts_of(parent)
            .iter()
            .copied()
            .find(|&id| self.object_name(id) == Some(name))
    }

    fn atts_of_mut(&mut self, parent: AttParent) -> Result<&mut Vec<AttId>, CdsError> {
        Ok(match parent {
            AttParent::Group(group) => &mut self.group_mut(group)?.atts,
            AttParent::Var(var) => &mut self.var_mut(var)?.atts,
        })
    }

    /// Define an attribute.
    ///
    /// If the attribute exists with an empty value, the value is set.
    /// If it exists with the same value, it is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if
    ///  - the name is invalid,
    ///  - the attribute exists with a different value,
    ///  - the definition lock of `parent` (or of an existing empty attribute) is set, or
    ///  - `parent` is stale.
    pub fn define_att(
        &mut self,
        parent: AttParent,
        name: &str,
        value: DataArray,
    ) -> Result<AttId, CdsError> {
        validate_name(name)?;
        if let Some(existing) = self.get_att(parent, name) {
            let att = self.att_ref(existing)?;
            if att.value == value {
                return Ok(existing);
            }
            if !att.is_empty() {
                return Err(CdsError::invalid(format!(
                    "could not define attribute {}: it already has a value",
                    self.describe(existing)
                )));
            }
            if att.common.is_locked() {
                return Err(CdsError::locked(self.describe(existing)));
            }
            self.att_mut(existing)?.value = value;
            return Ok(existing);
        }
        if self.is_locked(ObjectId::from(parent)) {
            return Err(CdsError::locked(format!(
                "could not define attribute {}/_atts_/{name}",
                self.describe(parent)
            )));
        }
        if !self.contains(ObjectId::from(parent)) {
            return Err(CdsError::not_found(self.describe(parent)));
        }
        let att = Attribute {
            common: ObjectCommon::new(Some(parent.into()), name),
            value,
        };
        let id = AttId(self.atts.insert(att));
        self.atts_of_mut(parent)?.push(id);
        tracing::trace!(target: COMPONENT, path = %self.describe(id), "attribute defined");
        Ok(id)
    }

    /// Define a `char` attribute holding `text`.
    ///
    /// Use [`format_args!`] to build the text from a template.
    ///
    /// # Errors
    ///
    /// See [`Hierarchy::define_att`].
    pub fn define_att_text(
        &mut self,
        parent: AttParent,
        name: &str,
        text: impl Display,
    ) -> Result<AttId, CdsError> {
        self.define_att(parent, name, DataArray::from_text(&text.to_string()))
    }

    /// Change the type and value of an attribute, defining it if it does not exist.
    ///
    /// Returns [`Outcome::Skipped`] if the attribute exists and its definition lock is set,
    /// or if it has a value and `overwrite` is false.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the attribute must be defined and [`Hierarchy::define_att`] fails.
    pub fn change_att(
        &mut self,
        parent: AttParent,
        overwrite: bool,
        name: &str,
        value: DataArray,
    ) -> Result<Outcome<AttId>, CdsError> {
        let Some(existing) = self.get_att(parent, name) else {
            return self.define_att(parent, name, value).map(Outcome::Done);
        };
        if !overwrite && !self.att_ref(existing)?.is_empty() {
            return Ok(Outcome::Skipped);
        }
        Ok(self.change_att_value(existing, value)?.map(|()| existing))
    }

    /// Change an attribute to a `char` value holding `text`.
    ///
    /// # Errors
    ///
    /// See [`Hierarchy::change_att`].
    pub fn change_att_text(
        &mut self,
        parent: AttParent,
        overwrite: bool,
        name: &str,
        text: impl Display,
    ) -> Result<Outcome<AttId>, CdsError> {
        self.change_att(parent, overwrite, name, DataArray::from_text(&text.to_string()))
    }

    /// Set the value of an attribute, defining it if it does not exist.
    ///
    /// An existing attribute keeps its data type and `value` is cast into it.
    /// Returns [`Outcome::Skipped`] if the definition lock of an existing attribute is set.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the value cannot be cast into the attribute type or the attribute cannot be defined.
    pub fn set_att(
        &mut self,
        parent: AttParent,
        name: &str,
        value: DataArray,
    ) -> Result<Outcome<AttId>, CdsError> {
        let Some(existing) = self.get_att(parent, name) else {
            return self.define_att(parent, name, value).map(Outcome::Done);
        };
        Ok(self.set_att_value(existing, &value)?.map(|()| existing))
    }

    /// Set the value of an attribute from `text`.
    ///
    /// # Errors
    ///
    /// See [`Hierarchy::set_att`].
    pub fn set_att_text(
        &mut self,
        parent: AttParent,
        name: &str,
        text: impl Display,
    ) -> Result<Outcome<AttId>, CdsError> {
        self.set_att(parent, name, DataArray::from_text(&text.to_string()))
    }

    /// Replace the type and value of an attribute.
    ///
    /// Returns [`Outcome::Skipped`] if the definition lock of the attribute is set.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if the handle is stale.
    pub fn change_att_value(&mut self, id: AttId, value: DataArray) -> Result<Outcome<()>, CdsError> {
        if self.att_ref(id)?.common.is_locked() {
            self.skip_locked(id, "change attribute value");
            return Ok(Outcome::Skipped);
        }
        self.att_mut(id)?.value = value;
        Ok(Outcome::Done(()))
    }

    /// Set the value of an attribute, casting it into the attribute type.
    ///
    /// Text is parsed into numbers for a numeric attribute, and numbers are formatted for a `char` attribute.
    /// Returns [`Outcome::Skipped`] if the definition lock of the attribute is set.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale or the value cannot be cast.
    pub fn set_att_value(&mut self, id: AttId, value: &DataArray) -> Result<Outcome<()>, CdsError> {
        let att = self.att_ref(id)?;
        if att.common.is_locked() {
            self.skip_locked(id, "set attribute value");
            return Ok(Outcome::Skipped);
        }
        let value = cast_att_value(value, att.data_type())?;
        self.att_mut(id)?.value = value;
        Ok(Outcome::Done(()))
    }

    /// Returns the value of an attribute cast to `data_type`.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale or the value cannot be cast.
    pub fn get_att_value(&self, id: AttId, data_type: DataType) -> Result<DataArray, CdsError> {
        cast_att_value(&self.att_ref(id)?.value, data_type)
    }

    /// Returns the value of an attribute as text.
    #[must_use]
    pub fn get_att_text(&self, id: AttId) -> Option<String> {
        self.att(id).map(Attribute::text)
    }

    /// Delete an attribute.
    ///
    /// Returns [`Outcome::Skipped`] if the definition lock of the attribute or its parent is set.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if the handle is stale.
    pub fn delete_att(&mut self, id: AttId) -> Result<Outcome<()>, CdsError> {
        let parent = self.att_ref(id)?.parent();
        if self.is_locked(id) {
            self.skip_locked(id, "delete attribute");
            return Ok(Outcome::Skipped);
        }
        if let Some(parent) = parent {
            if self.is_locked(ObjectId::from(parent)) {
                self.skip_locked(parent, "delete attribute");
                return Ok(Outcome::Skipped);
            }
            self.atts_of_mut(parent)?.retain(|&a| a != id);
        }
        self.atts.remove(id.0);
        Ok(Outcome::Done(()))
    }

    /// Rename an attribute.
    ///
    /// Returns [`Outcome::Skipped`] if the definition lock of the attribute or its parent is set.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the handle is stale, the name is invalid, or the name is taken.
    pub fn rename_att(&mut self, id: AttId, name: &str) -> Result<Outcome<()>, CdsError> {
        validate_name(name)?;
        let parent = self.att_ref(id)?.parent();
        if self.is_locked(id) {
            self.skip_locked(id, "rename attribute");
            return Ok(Outcome::Skipped);
        }
        if let Some(parent) = parent {
            if self.is_locked(ObjectId::from(parent)) {
                self.skip_locked(parent, "rename attribute");
                return Ok(Outcome::Skipped);
            }
            if self.get_att(parent, name).is_some_and(|other| other != id) {
                return Err(CdsError::invalid(format!(
                    "could not rename attribute {}: {name} already exists",
                    self.describe(id)
                )));
            }
        }
        self.att_mut(id)?.common.set_name(name);
        self.invalidate_paths(id.into());
        Ok(Outcome::Done(()))
    }

    /// Returns true if an attribute is a data attribute of its variable.
    ///
    /// A data attribute is owned by a variable, has the data type of that variable,
    /// and its name is registered in the [`DataAttributes`](crate::converter::DataAttributes) of the global configuration.
    #[must_use]
    pub fn is_data_att(&self, id: AttId) -> bool {
        let Some(att) = self.att(id) else {
            return false;
        };
        let Some(AttParent::Var(var)) = att.parent() else {
            return false;
        };
        self.var(var)
            .is_some_and(|var| var.data_type() == att.data_type())
            && global_config().data_attributes().contains(att.name())
    }
}
