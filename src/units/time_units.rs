use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::{LinearUnitConverter, UnitsError};

const SECONDS_PER_DAY: i64 = 86_400;

/// Timestamp units, a time unit counted from a reference time.
///
/// The accepted forms are `<unit> since <date>[ <time>][ <zone>]`, for example
///  - `seconds since 1970-1-1 0:00:00 0:00`,
///  - `seconds since 2009-02-13T23:31:30Z`,
///  - `hours since 2010/01/01`,
///  - `minutes since 2010-01-01, 06:00:00 UTC`.
///
/// Dates may be separated by `-` or `/`, the time may follow the date after a `T`,
/// and the zone is `UTC`, `GMT`, `Z`, or an offset such as `0:00`, `-6:00` or `+0530`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeUnits {
    seconds_per_unit: f64,
    base_time: f64,
}

impl TimeUnits {
    /// Seconds since `base_time`, in seconds since 1970-01-01 00:00:00 UTC.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn seconds_since(base_time: i64) -> Self {
        Self {
            seconds_per_unit: 1.0,
            base_time: base_time as f64,
        }
    }

    /// Returns the length of one unit in seconds.
    #[must_use]
    pub const fn seconds_per_unit(&self) -> f64 {
        self.seconds_per_unit
    }

    /// Returns the reference time in seconds since 1970-01-01 00:00:00 UTC.
    #[must_use]
    pub const fn base_time(&self) -> f64 {
        self.base_time
    }

    /// Convert a value in these units to seconds since 1970.
    #[must_use]
    pub fn to_epoch(&self, value: f64) -> f64 {
        self.base_time + value * self.seconds_per_unit
    }

    /// Convert seconds since 1970 to a value in these units.
    #[must_use]
    pub fn from_epoch(&self, seconds: f64) -> f64 {
        (seconds - self.base_time) / self.seconds_per_unit
    }

    /// Returns the conversion of values in these units to values in `other` units.
    #[must_use]
    pub fn converter_to(&self, other: &Self) -> LinearUnitConverter {
        LinearUnitConverter::new(
            self.seconds_per_unit / other.seconds_per_unit,
            (self.base_time - other.base_time) / other.seconds_per_unit,
        )
    }
}

impl FromStr for TimeUnits {
    type Err = UnitsError;

    fn from_str(units: &str) -> Result<Self, Self::Err> {
        let invalid = || UnitsError::InvalidTimeUnits(units.to_string());
        let (unit, reference) = units.trim().split_once(" since ").ok_or_else(invalid)?;
        Ok(Self {
            seconds_per_unit: unit_seconds(unit.trim()).ok_or_else(invalid)?,
            base_time: parse_reference(reference).ok_or_else(invalid)?,
        })
    }
}

fn unit_seconds(unit: &str) -> Option<f64> {
    Some(match unit.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        "min" | "mins" | "minute" | "minutes" => 60.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600.0,
        "d" | "day" | "days" => 86_400.0,
        _ => return None,
    })
}

/// Parse `date[ time][ zone]` into seconds since 1970.
#[allow(clippy::cast_precision_loss)]
fn parse_reference(reference: &str) -> Option<f64> {
    let reference = reference.replace(',', " ");
    let mut tokens = reference.split_whitespace();
    let first = tokens.next()?;
    let (date, time) = match first.split_once('T') {
        Some((date, time)) => (date, Some(time.trim_end_matches('Z'))),
        None => (first, tokens.next()),
    };
    let offset = match tokens.next() {
        Some(zone) => zone_offset(zone)?,
        None => 0,
    };
    if tokens.next().is_some() {
        return None;
    }

    let mut fields = date.split(['-', '/']);
    let year = fields.next()?.parse().ok()?;
    let month = fields.next()?.parse().ok()?;
    let day = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let (hms, seconds) = match time {
        Some(time) => parse_time(time)?,
        None => (NaiveTime::MIN, 0.0),
    };
    let timestamp = date.and_time(hms).and_utc().timestamp() - offset;
    Some(timestamp as f64 + seconds)
}

/// Parse `h[:m[:s[.f]]]` into the whole minutes of the day and the seconds past them.
fn parse_time(time: &str) -> Option<(NaiveTime, f64)> {
    let mut fields = time.split(':');
    let hour = fields.next()?.parse().ok()?;
    let minute = fields.next().map_or(Some(0), |minute| minute.parse().ok())?;
    let seconds: f64 = fields.next().map_or(Some(0.0), |seconds| seconds.parse().ok())?;
    if fields.next().is_some() || !(0.0..61.0).contains(&seconds) {
        return None;
    }
    Some((NaiveTime::from_hms_opt(hour, minute, 0)?, seconds))
}

/// Parse a zone into its offset from UTC in seconds.
fn zone_offset(zone: &str) -> Option<i64> {
    if matches!(zone, "UTC" | "GMT" | "Z") {
        return Some(0);
    }
    let (sign, digits) = match zone.strip_prefix('-') {
        Some(digits) => (-1, digits),
        None => (1, zone.strip_prefix('+').unwrap_or(zone)),
    };
    let (hours, minutes) = match digits.split_once(':') {
        Some((hours, minutes)) => (hours, minutes),
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };
    let hours: i64 = hours.parse().ok()?;
    let minutes: i64 = minutes.parse().ok()?;
    Some(sign * (hours * 3600 + minutes * 60))
}

/// Returns the units string `seconds since YYYY-MM-DD hh:mm:ss 0:00` of `base_time` (seconds since 1970).
///
/// # Errors
///
/// Returns [`UnitsError::TimeOutOfRange`] if `base_time` is not a representable date.
pub fn base_time_to_units_string(base_time: i64) -> Result<String, UnitsError> {
    let time = DateTime::<Utc>::from_timestamp(base_time, 0).ok_or(UnitsError::TimeOutOfRange(base_time))?;
    Ok(time.format("seconds since %Y-%m-%d %H:%M:%S 0:00").to_string())
}

/// Returns the reference time of timestamp `units` in whole seconds since 1970.
///
/// # Errors
///
/// Returns [`UnitsError::InvalidTimeUnits`] if `units` are not timestamp units.
#[allow(clippy::cast_possible_truncation)]
pub fn units_string_to_base_time(units: &str) -> Result<i64, UnitsError> {
    Ok(units.parse::<TimeUnits>()?.base_time().floor() as i64)
}

/// Returns the midnight at or before `time`, both in seconds since 1970.
#[must_use]
pub const fn midnight(time: i64) -> i64 {
    time - time.rem_euclid(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_units_formats() {
        let base = 1_234_567_890.0;
        for units in [
            "seconds since 2009-02-13 23:31:30 0:00",
            "seconds since 2009-2-13 23:31:30",
            "seconds since 2009-02-13T23:31:30Z",
            "seconds since 2009/02/13 23:31:30 UTC",
            "seconds since 2009-02-13, 23:31:30 UTC",
            "sec since 2009-02-13 17:31:30 -6:00",
        ] {
            let parsed: TimeUnits = units.parse().unwrap();
            assert_eq!(parsed.base_time(), base, "{units}");
            assert_eq!(parsed.seconds_per_unit(), 1.0);
        }
        let days: TimeUnits = "days since 1970-01-02".parse().unwrap();
        assert_eq!(days.base_time(), 86_400.0);
        assert_eq!(days.to_epoch(1.5), 216_000.0);
        assert_eq!(days.from_epoch(216_000.0), 1.5);

        assert!("seconds".parse::<TimeUnits>().is_err());
        assert!("fortnights since 1970-01-01".parse::<TimeUnits>().is_err());
        assert!("seconds since 2009-02-30".parse::<TimeUnits>().is_err());
        assert!("seconds since yesterday".parse::<TimeUnits>().is_err());
    }

    #[test]
    fn time_units_strings() {
        assert_eq!(
            base_time_to_units_string(1_234_567_890).unwrap(),
            "seconds since 2009-02-13 23:31:30 0:00"
        );
        assert_eq!(units_string_to_base_time("seconds since 1970-1-1 0:00:00 0:00"), Ok(0));
        assert_eq!(
            units_string_to_base_time("m"),
            Err(UnitsError::InvalidTimeUnits("m".to_string()))
        );
        assert_eq!(midnight(1_266_019_201), 1_265_932_800);
        assert_eq!(midnight(1_265_932_800), 1_265_932_800);
        assert_eq!(midnight(-1), -86_400);
    }

    #[test]
    fn time_units_conversion() {
        let from: TimeUnits = "hours since 2010-01-01".parse().unwrap();
        let to: TimeUnits = "seconds since 2010-01-01 01:00:00".parse().unwrap();
        let converter = from.converter_to(&to);
        assert_eq!(converter.scale(), 3600.0);
        assert_eq!(converter.offset(), -3600.0);
    }
}
