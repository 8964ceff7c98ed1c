//! `cds` global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::converter::{DataAttributes, Rounding, UnitsMode};

/// Global configuration options for the `cds` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// ## Rounding
/// > default: [`Rounding::Nearest`]
///
/// The rounding applied by new [`Converter`](crate::converter::Converter)s when a floating point value is cast to an integer type.
/// The rounding of an existing converter can be changed with [`Converter::set_rounding`](crate::converter::Converter::set_rounding).
///
/// ## Data Attributes
/// > default: the default data attribute names only
///
/// The names of the attributes converted along with the data of a variable.
/// A converter takes a snapshot of the registry when it is created,
/// so registering a name does not affect existing converters.
#[derive(Debug, Default)]
pub struct Config {
    rounding: Rounding,
    data_attributes: DataAttributes,
}

impl Config {
    /// Get the [rounding](#rounding) configuration.
    #[must_use]
    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Set the [rounding](#rounding) configuration.
    pub fn set_rounding(&mut self, rounding: Rounding) {
        self.rounding = rounding;
    }

    /// Get the [data attributes](#data-attributes) configuration.
    #[must_use]
    pub fn data_attributes(&self) -> &DataAttributes {
        &self.data_attributes
    }

    /// Get a mutable reference to the [data attributes](#data-attributes) configuration.
    pub fn data_attributes_mut(&mut self) -> &mut DataAttributes {
        &mut self.data_attributes
    }

    /// Register a user data attribute converted with units `mode`.
    pub fn register_data_attribute(&mut self, name: &str, mode: UnitsMode) {
        self.data_attributes.register(name, mode);
    }

    /// Remove every user data attribute.
    pub fn clear_user_data_attributes(&mut self) {
        self.data_attributes.clear_user();
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global `cds` configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global `cds` configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}
