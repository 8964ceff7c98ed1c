//! Physical units.
//!
//! Unit strings are resolved into numeric converters by a [`UnitSystem`].
//! The process-wide unit system is installed with [`init_unit_system`] and torn down with [`free_unit_system`].
//! If none is installed, the first lookup installs [`LinearUnitSystem::standard`].
//!
//! ```
//! # use cds::units::{get_unit_converter, compare_units};
//! let converter = get_unit_converter("km", "m")?.expect("km and m differ by a factor");
//! assert_eq!(converter.convert(1.5), 1500.0);
//! assert!(!compare_units("mb", "millibar")?);
//! # Ok::<(), cds::units::UnitsError>(())
//! ```

mod linear;
mod time_units;

use std::{fmt::Debug, sync::Arc};

use parking_lot::RwLock;
use thiserror::Error;

pub use linear::{LinearUnitConverter, LinearUnitSystem};
pub use time_units::{base_time_to_units_string, midnight, units_string_to_base_time, TimeUnits};

use crate::COMPONENT;

/// A numeric conversion between two units.
pub trait UnitConverter: Debug + Send + Sync {
    /// Convert `value` from the source units to the destination units.
    fn convert(&self, value: f64) -> f64;
}

/// A resolver of unit strings.
pub trait UnitSystem: Debug + Send + Sync {
    /// Returns the converter from `from` units to `to` units.
    ///
    /// Returns [`None`] if the units are equivalent and values need no numeric conversion.
    ///
    /// # Errors
    ///
    /// Returns a [`UnitsError`] if a unit is unknown or the units are incompatible.
    fn converter(&self, from: &str, to: &str) -> Result<Option<Box<dyn UnitConverter>>, UnitsError>;
}

/// A units error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UnitsError {
    /// A unit string is not known to the unit system.
    #[error("unknown unit {0:?}")]
    UnknownUnit(String),
    /// The units measure different quantities.
    #[error("cannot convert from {from:?} to {to:?}")]
    Incompatible {
        /// The source units.
        from: String,
        /// The destination units.
        to: String,
    },
    /// A units string is not of the form `<unit> since <reference time>`.
    #[error("invalid time units {0:?}")]
    InvalidTimeUnits(String),
    /// A time in seconds since 1970 is outside the representable dates.
    #[error("time {0} is out of range")]
    TimeOutOfRange(i64),
}

static UNIT_SYSTEM: RwLock<Option<Arc<dyn UnitSystem>>> = parking_lot::const_rwlock(None);

/// Install `system` as the process-wide unit system, replacing any existing one.
pub fn init_unit_system(system: impl UnitSystem + 'static) {
    tracing::debug!(target: COMPONENT, ?system, "unit system installed");
    *UNIT_SYSTEM.write() = Some(Arc::new(system));
}

/// Tear down the process-wide unit system.
///
/// Converters that already hold a unit converter keep working.
pub fn free_unit_system() {
    if UNIT_SYSTEM.write().take().is_some() {
        tracing::debug!(target: COMPONENT, "unit system freed");
    }
}

/// Returns the process-wide unit system, installing [`LinearUnitSystem::standard`] if there is none.
#[must_use]
pub fn unit_system() -> Arc<dyn UnitSystem> {
    if let Some(system) = UNIT_SYSTEM.read().as_ref() {
        return Arc::clone(system);
    }
    let mut installed = UNIT_SYSTEM.write();
    let system = installed.get_or_insert_with(|| {
        tracing::debug!(target: COMPONENT, "standard unit system installed");
        Arc::new(LinearUnitSystem::standard()) as Arc<dyn UnitSystem>
    });
    Arc::clone(system)
}

/// Returns the converter from `from` units to `to` units of the process-wide unit system.
///
/// Equal unit strings always give [`None`].
///
/// # Errors
///
/// Returns a [`UnitsError`] if a unit is unknown or the units are incompatible.
pub fn get_unit_converter(
    from: &str,
    to: &str,
) -> Result<Option<Arc<dyn UnitConverter>>, UnitsError> {
    resolve_converter(unit_system().as_ref(), from, to).map_err(|err| {
        tracing::error!(target: COMPONENT, %err);
        err
    })
}

/// Resolve the converter from `from` units to `to` units.
///
/// Timestamp units (`<unit> since <time>`) convert into each other without consulting `system`.
pub(crate) fn resolve_converter(
    system: &dyn UnitSystem,
    from: &str,
    to: &str,
) -> Result<Option<Arc<dyn UnitConverter>>, UnitsError> {
    if from == to {
        return Ok(None);
    }
    if let (Ok(source), Ok(target)) = (from.parse::<TimeUnits>(), to.parse::<TimeUnits>()) {
        let converter = source.converter_to(&target);
        return Ok((!converter.is_identity()).then(|| Arc::new(converter) as Arc<dyn UnitConverter>));
    }
    Ok(system.converter(from, to)?.map(Arc::from))
}

/// Returns true if values in `from` units need a numeric conversion to `to` units.
///
/// # Errors
///
/// Returns a [`UnitsError`] if a unit is unknown or the units are incompatible.
pub fn compare_units(from: &str, to: &str) -> Result<bool, UnitsError> {
    Ok(get_unit_converter(from, to)?.is_some())
}
