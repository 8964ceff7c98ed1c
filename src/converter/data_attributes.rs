use super::UnitsMode;

/// The attributes that always hold data values, with the units mode used to convert them.
const DEFAULT_DATA_ATTRIBUTES: [(&str, UnitsMode); 14] = [
    ("valid_min", UnitsMode::Convert),
    ("valid_max", UnitsMode::Convert),
    ("valid_range", UnitsMode::Convert),
    ("bound_offsets", UnitsMode::Delta),
    ("flag_masks", UnitsMode::Ignore),
    ("flag_values", UnitsMode::Ignore),
    ("valid_delta", UnitsMode::Delta),
    ("missing_value", UnitsMode::Ignore),
    ("_FillValue", UnitsMode::Ignore),
    ("missing-value", UnitsMode::Ignore),
    ("missing_data", UnitsMode::Ignore),
    ("missing-data", UnitsMode::Ignore),
    ("missing_value1", UnitsMode::Ignore),
    ("Missing_value", UnitsMode::Ignore),
];

/// The registry of data attribute names.
///
/// A data attribute of a variable holds values in the data type and units of the variable,
/// so it is converted whenever the variable is.
/// The registry always contains the default names (`valid_min`, `valid_range`, `missing_value`, `_FillValue`, ...)
/// and may be extended with user names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataAttributes {
    user: Vec<(String, UnitsMode)>,
}

impl DataAttributes {
    /// Returns the units mode of the data attribute `name`, or [`None`] if it is not a data attribute.
    #[must_use]
    pub fn units_mode(&self, name: &str) -> Option<UnitsMode> {
        DEFAULT_DATA_ATTRIBUTES
            .iter()
            .copied()
            .chain(self.user.iter().map(|(user, mode)| (user.as_str(), *mode)))
            .find(|&(registered, _)| registered == name)
            .map(|(_, mode)| mode)
    }

    /// Returns true if `name` is a data attribute.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.units_mode(name).is_some()
    }

    /// Register a user data attribute.
    ///
    /// Registering a default name has no effect, and registering a user name again replaces its units mode.
    pub fn register(&mut self, name: &str, mode: UnitsMode) {
        if DEFAULT_DATA_ATTRIBUTES.iter().any(|&(default, _)| default == name) {
            return;
        }
        match self.user.iter_mut().find(|(user, _)| user == name) {
            Some(entry) => entry.1 = mode,
            None => self.user.push((name.to_string(), mode)),
        }
    }

    /// Remove every user data attribute.
    pub fn clear_user(&mut self) {
        self.user.clear();
    }

    /// Iterate over the registered names, defaults first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        DEFAULT_DATA_ATTRIBUTES
            .iter()
            .map(|&(name, _)| name)
            .chain(self.user.iter().map(|(name, _)| name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_attributes_registry() {
        let mut data_attributes = DataAttributes::default();
        assert_eq!(data_attributes.units_mode("valid_range"), Some(UnitsMode::Convert));
        assert_eq!(data_attributes.units_mode("bound_offsets"), Some(UnitsMode::Delta));
        assert_eq!(data_attributes.units_mode("_FillValue"), Some(UnitsMode::Ignore));
        assert!(!data_attributes.contains("threshold"));

        data_attributes.register("threshold", UnitsMode::Convert);
        data_attributes.register("threshold", UnitsMode::Delta);
        data_attributes.register("valid_min", UnitsMode::Ignore);
        assert_eq!(data_attributes.units_mode("threshold"), Some(UnitsMode::Delta));
        assert_eq!(data_attributes.units_mode("valid_min"), Some(UnitsMode::Convert));
        assert_eq!(data_attributes.names().count(), 15);

        data_attributes.clear_user();
        assert!(!data_attributes.contains("threshold"));
        assert!(data_attributes.contains("valid_min"));
    }
}
