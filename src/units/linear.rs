use std::collections::HashMap;

use super::{UnitConverter, UnitSystem, UnitsError};

#[derive(Clone, Debug, PartialEq)]
struct UnitDefinition {
    quantity: String,
    scale: f64,
    offset: f64,
}

/// A table-driven unit system of linear units.
///
/// Each unit is defined by the quantity it measures and its relation to the base unit of that quantity,
/// `base = value * scale + offset`.
/// Units of the same quantity convert into each other, units of different quantities do not.
#[derive(Clone, Debug, Default)]
pub struct LinearUnitSystem {
    units: HashMap<String, UnitDefinition>,
}

/// A linear conversion `value * scale + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearUnitConverter {
    scale: f64,
    offset: f64,
}

impl LinearUnitConverter {
    /// Create the conversion `value * scale + offset`.
    #[must_use]
    pub const fn new(scale: f64, offset: f64) -> Self {
        Self { scale, offset }
    }

    #[allow(clippy::float_cmp)]
    pub(crate) fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.offset == 0.0
    }

    /// Returns the scale factor.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the offset.
    #[must_use]
    pub const fn offset(&self) -> f64 {
        self.offset
    }
}

impl UnitConverter for LinearUnitConverter {
    fn convert(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }
}

impl LinearUnitSystem {
    /// Create an empty unit system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a unit system with common length, time, temperature, pressure, speed, and fraction units.
    #[must_use]
    pub fn standard() -> Self {
        const UNITS: &[(&str, &str, f64, f64)] = &[
            ("m", "length", 1.0, 0.0),
            ("km", "length", 1000.0, 0.0),
            ("cm", "length", 0.01, 0.0),
            ("mm", "length", 0.001, 0.0),
            ("um", "length", 1.0e-6, 0.0),
            ("ft", "length", 0.3048, 0.0),
            ("mi", "length", 1609.344, 0.0),
            ("s", "time", 1.0, 0.0),
            ("ms", "time", 0.001, 0.0),
            ("min", "time", 60.0, 0.0),
            ("h", "time", 3600.0, 0.0),
            ("day", "time", 86400.0, 0.0),
            ("K", "temperature", 1.0, 0.0),
            ("degC", "temperature", 1.0, 273.15),
            ("degF", "temperature", 5.0 / 9.0, 273.15 - 32.0 * 5.0 / 9.0),
            ("Pa", "pressure", 1.0, 0.0),
            ("hPa", "pressure", 100.0, 0.0),
            ("kPa", "pressure", 1000.0, 0.0),
            ("bar", "pressure", 100_000.0, 0.0),
            ("atm", "pressure", 101_325.0, 0.0),
            ("m/s", "speed", 1.0, 0.0),
            ("km/h", "speed", 1000.0 / 3600.0, 0.0),
            ("knot", "speed", 1852.0 / 3600.0, 0.0),
            ("mph", "speed", 1609.344 / 3600.0, 0.0),
            ("1", "fraction", 1.0, 0.0),
            ("%", "fraction", 0.01, 0.0),
        ];
        const ALIASES: &[(&str, &str)] = &[
            ("meter", "m"),
            ("meters", "m"),
            ("metre", "m"),
            ("sec", "s"),
            ("seconds", "s"),
            ("hours", "h"),
            ("days", "day"),
            ("kelvin", "K"),
            ("degK", "K"),
            ("degree_Celsius", "degC"),
            ("C", "degC"),
            ("degree_Fahrenheit", "degF"),
            ("mb", "hPa"),
            ("mbar", "hPa"),
            ("millibar", "hPa"),
            ("m s-1", "m/s"),
            ("kts", "knot"),
            ("percent", "%"),
            ("unitless", "1"),
        ];

        let mut system = Self::new();
        for &(symbol, quantity, scale, offset) in UNITS {
            system.define(symbol, quantity, scale, offset);
        }
        for &(alias, symbol) in ALIASES {
            system.alias(alias, symbol);
        }
        system
    }

    /// Define `symbol` as a unit of `quantity` with `base = value * scale + offset`.
    ///
    /// An existing definition of `symbol` is replaced.
    pub fn define(&mut self, symbol: &str, quantity: &str, scale: f64, offset: f64) -> &mut Self {
        self.units.insert(
            symbol.to_string(),
            UnitDefinition {
                quantity: quantity.to_string(),
                scale,
                offset,
            },
        );
        self
    }

    /// Define `alias` as another name of the unit `symbol`.
    ///
    /// Returns false if `symbol` is not defined.
    pub fn alias(&mut self, alias: &str, symbol: &str) -> bool {
        match self.units.get(symbol).cloned() {
            Some(definition) => {
                self.units.insert(alias.to_string(), definition);
                true
            }
            None => false,
        }
    }

    fn lookup(&self, symbol: &str) -> Result<&UnitDefinition, UnitsError> {
        self.units
            .get(symbol.trim())
            .ok_or_else(|| UnitsError::UnknownUnit(symbol.to_string()))
    }

    /// Returns the linear conversion from `from` units to `to` units.
    ///
    /// # Errors
    ///
    /// Returns a [`UnitsError`] if a unit is unknown or the units measure different quantities.
    pub fn linear_converter(&self, from: &str, to: &str) -> Result<LinearUnitConverter, UnitsError> {
        let source = self.lookup(from)?;
        let target = self.lookup(to)?;
        if source.quantity != target.quantity {
            return Err(UnitsError::Incompatible {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(LinearUnitConverter::new(
            source.scale / target.scale,
            (source.offset - target.offset) / target.scale,
        ))
    }
}

impl UnitSystem for LinearUnitSystem {
    fn converter(&self, from: &str, to: &str) -> Result<Option<Box<dyn UnitConverter>>, UnitsError> {
        let converter = self.linear_converter(from, to)?;
        if converter.is_identity() {
            Ok(None)
        } else {
            Ok(Some(Box::new(converter)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_units() {
        let system = LinearUnitSystem::standard();
        let converter = system.linear_converter("degC", "K").unwrap();
        assert_eq!(converter.convert(0.0), 273.15);
        let converter = system.linear_converter("K", "degC").unwrap();
        assert!((converter.convert(300.0) - 26.85).abs() < 1.0e-9);
        let converter = system.linear_converter("degF", "degC").unwrap();
        assert!((converter.convert(212.0) - 100.0).abs() < 1.0e-9);
        assert_eq!(system.linear_converter("km", "m").unwrap().scale(), 1000.0);

        assert!(system.converter("mb", "millibar").unwrap().is_none());
        assert!(system.converter("hPa", "Pa").unwrap().is_some());
        assert!(system.converter(" m ", "meter").unwrap().is_none());
        assert!(system.converter("m", "K").is_err());
        assert!(system.converter("m", "furlong").is_err());
    }

    #[test]
    fn linear_units_define() {
        let mut system = LinearUnitSystem::new();
        system
            .define("dBZ", "reflectivity", 1.0, 0.0)
            .define("dBZ_offset", "reflectivity", 1.0, -10.0);
        assert!(system.alias("decibel_z", "dBZ"));
        assert!(!system.alias("z", "Z"));
        let converter = system.converter("decibel_z", "dBZ_offset").unwrap().unwrap();
        assert_eq!(converter.convert(5.0), 15.0);
    }
}
