use chrono::{DateTime, Utc};

use crate::{
    node::{ObjectId, VarId},
    units::{base_time_to_units_string, midnight, TimeUnits, UnitsError},
    CdsError, DataArray, DataType, COMPONENT,
};

use super::Hierarchy;

const BASE_TIME_LONG_NAME: &str = "Base time in Epoch";
const BASE_TIME_UNITS: &str = "seconds since 1970-1-1 0:00:00 0:00";
const TIME_OFFSET_LONG_NAME: &str = "Time offset from base_time";
const MIDNIGHT_LONG_NAME: &str = "Time offset from midnight";
const SAMPLE_TIMES_LONG_NAME: &str = "Sample times";

/// A standard time variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeVar {
    /// `time`, the sample times as offsets from the reference time in its units.
    Time,
    /// `time_offset`, the sample times as offsets from `base_time`.
    TimeOffset,
    /// `base_time`, the reference time in seconds since 1970.
    BaseTime,
}

impl TimeVar {
    /// Returns the standard time variable named `name`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "time" => Some(Self::Time),
            "time_offset" => Some(Self::TimeOffset),
            "base_time" => Some(Self::BaseTime),
            _ => None,
        }
    }

    /// Returns the variable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::TimeOffset => "time_offset",
            Self::BaseTime => "base_time",
        }
    }

    /// Returns true for `base_time`.
    #[must_use]
    pub const fn is_base_time(self) -> bool {
        matches!(self, Self::BaseTime)
    }
}

/// The relation of a found time to the reference time in [`find_time_index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeSearch {
    /// The first time equal to the reference.
    Equal,
    /// The last time before the reference.
    Less,
    /// The last time at or before the reference.
    LessEqual,
    /// The first time after the reference.
    Greater,
    /// The first time at or after the reference.
    GreaterEqual,
}

/// Returns the index of the time in ascending `times` that relates to `reference` as `search` asks.
///
/// ```
/// # use cds::hierarchy::{find_time_index, TimeSearch};
/// let times = [10, 20, 20, 30];
/// assert_eq!(find_time_index(&times, &20, TimeSearch::Equal), Some(1));
/// assert_eq!(find_time_index(&times, &20, TimeSearch::LessEqual), Some(2));
/// assert_eq!(find_time_index(&times, &20, TimeSearch::Greater), Some(3));
/// assert_eq!(find_time_index(&times, &5, TimeSearch::Less), None);
/// ```
#[must_use]
pub fn find_time_index<T: PartialOrd>(times: &[T], reference: &T, search: TimeSearch) -> Option<usize> {
    let before = times.partition_point(|time| time < reference);
    let through = times.partition_point(|time| time <= reference);
    match search {
        TimeSearch::Equal => (before < through).then_some(before),
        TimeSearch::Less => before.checked_sub(1),
        TimeSearch::LessEqual => through.checked_sub(1),
        TimeSearch::Greater => (through < times.len()).then_some(through),
        TimeSearch::GreaterEqual => (before < times.len()).then_some(before),
    }
}

/// The number of samples of a time variable and its first and last sample times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeRange {
    /// The number of samples.
    pub sample_count: usize,
    /// The time of the first sample.
    pub start: DateTime<Utc>,
    /// The time of the last sample.
    pub end: DateTime<Utc>,
}

/// Sample times as whole seconds since 1970 plus the seconds past them.
struct SampleSeconds {
    base: i64,
    offsets: Vec<f64>,
}

impl SampleSeconds {
    #[allow(clippy::cast_possible_truncation)]
    fn times(&self) -> impl Iterator<Item = i64> + '_ {
        self.offsets.iter().map(|offset| self.base + offset.round() as i64)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn timevals(&self) -> Result<Vec<DateTime<Utc>>, CdsError> {
        self.offsets
            .iter()
            .map(|offset| {
                let micros = self.base * 1_000_000 + (offset * 1.0e6).round() as i64;
                let seconds = micros.div_euclid(1_000_000);
                DateTime::<Utc>::from_timestamp(seconds, (micros.rem_euclid(1_000_000) * 1000) as u32)
                    .ok_or_else(|| CdsError::from(UnitsError::TimeOutOfRange(seconds)).logged())
            })
            .collect()
    }
}

/// Returns the value of `time` as an offset in `units`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn units_offset(units: &TimeUnits, time: &DateTime<Utc>) -> f64 {
    let base = units.base_time();
    let whole = base.floor();
    let seconds = (time.timestamp() - whole as i64) as f64
        + f64::from(time.timestamp_subsec_micros()) * 1.0e-6
        - (base - whole);
    seconds / units.seconds_per_unit()
}

impl Hierarchy {
    /// Returns the kind of standard time variable `var` is, if any.
    #[must_use]
    pub fn is_time_var(&self, var: VarId) -> Option<TimeVar> {
        self.object_name(var).and_then(TimeVar::from_name)
    }

    /// Find the time variable of an object.
    ///
    /// The nearest group containing the object and then each ancestor group is searched for
    /// a `time` variable, then a `time_offset` variable.
    #[must_use]
    pub fn find_time_var(&self, object: impl Into<ObjectId>) -> Option<VarId> {
        let group = self.nearest_group(object.into())?;
        self.group_lineage(group).find_map(|group| {
            self.get_var(group, TimeVar::Time.name())
                .or_else(|| self.get_var(group, TimeVar::TimeOffset.name()))
        })
    }

    /// Returns the timestamp units of a variable.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the variable has no `units` attribute or its value is not timestamp units.
    pub fn get_time_units(&self, var: VarId) -> Result<TimeUnits, CdsError> {
        let units = self
            .get_var_units(var)
            .ok_or_else(|| CdsError::not_found(format!("units of {}", self.describe(var))))?;
        units.parse().map_err(|err: UnitsError| CdsError::from(err).logged())
    }

    fn var_time_units(&self, var: VarId) -> Option<TimeUnits> {
        self.get_var_units(var)?.parse().ok()
    }

    /// The variable holding the sample times of an object, a variable itself or the time variable it finds.
    fn time_var_of(&self, object: ObjectId) -> Option<VarId> {
        match object {
            ObjectId::Var(var) => Some(var),
            _ => self.find_time_var(object),
        }
    }

    /// Returns the base time of an object in seconds since 1970.
    ///
    /// This is the reference time of the units of the variable, or of the time variable of any other object.
    /// Returns [`None`] if there is no time variable or its units are not timestamp units.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_base_time(&self, object: impl Into<ObjectId>) -> Option<i64> {
        let var = self.time_var_of(object.into())?;
        self.var_time_units(var).map(|units| units.base_time().floor() as i64)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn sample_seconds(
        &self,
        var: VarId,
        sample_start: usize,
        sample_count: Option<usize>,
    ) -> Result<SampleSeconds, CdsError> {
        let data = self
            .get_var_data(var, DataType::Double, sample_start, sample_count, None)?
            .data;
        if data.is_empty() {
            return Ok(SampleSeconds {
                base: 0,
                offsets: Vec::new(),
            });
        }
        let units = self.get_time_units(var)?;
        let base = units.base_time().floor();
        let past = units.base_time() - base;
        Ok(SampleSeconds {
            base: base as i64,
            offsets: data
                .values()
                .filter_map(|value| value.as_f64())
                .map(|value| value * units.seconds_per_unit() + past)
                .collect(),
        })
    }

    /// Returns sample times of an object in seconds since 1970, rounded to the nearest second.
    ///
    /// The object is a variable holding sample times or any object with a time variable (see [`Hierarchy::find_time_var`]).
    /// A `sample_count` of [`None`] reads every sample from `sample_start`.
    /// Returns an empty vector if there is no time variable or it has no samples from `sample_start`.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if the time variable does not have timestamp units.
    pub fn get_sample_times(
        &self,
        object: impl Into<ObjectId>,
        sample_start: usize,
        sample_count: Option<usize>,
    ) -> Result<Vec<i64>, CdsError> {
        let Some(var) = self.time_var_of(object.into()) else {
            return Ok(Vec::new());
        };
        Ok(self.sample_seconds(var, sample_start, sample_count)?.times().collect())
    }

    /// Returns sample times of an object to the nearest microsecond.
    ///
    /// # Errors
    ///
    /// See [`Hierarchy::get_sample_times`].
    pub fn get_sample_timevals(
        &self,
        object: impl Into<ObjectId>,
        sample_start: usize,
        sample_count: Option<usize>,
    ) -> Result<Vec<DateTime<Utc>>, CdsError> {
        let Some(var) = self.time_var_of(object.into()) else {
            return Ok(Vec::new());
        };
        self.sample_seconds(var, sample_start, sample_count)?.timevals()
    }

    /// Returns the number of samples and the first and last sample times of an object.
    ///
    /// Returns [`None`] if there is no time variable or it has no samples.
    ///
    /// # Errors
    ///
    /// See [`Hierarchy::get_sample_times`].
    pub fn get_time_range(&self, object: impl Into<ObjectId>) -> Result<Option<TimeRange>, CdsError> {
        let Some(var) = self.time_var_of(object.into()) else {
            return Ok(None);
        };
        let sample_count = self.var_sample_count(var);
        if sample_count == 0 {
            return Ok(None);
        }
        let first = self.sample_seconds(var, 0, Some(1))?.timevals()?;
        let last = self.sample_seconds(var, sample_count - 1, Some(1))?.timevals()?;
        Ok(first.first().zip(last.first()).map(|(&start, &end)| TimeRange {
            sample_count,
            start,
            end,
        }))
    }

    /// The variables whose sample times are set through an object.
    ///
    /// A variable other than a standard time variable is set by itself.
    /// Otherwise the standard time variables named `names` in the group of the time variable are set.
    fn time_targets(&self, object: ObjectId, names: &[TimeVar]) -> Result<Vec<VarId>, CdsError> {
        let var = match object {
            ObjectId::Var(var) if self.is_time_var(var).is_none() => return Ok(vec![var]),
            ObjectId::Var(var) => var,
            _ => self.find_time_var(object).ok_or_else(|| {
                CdsError::not_found(format!("time variable of {}", self.describe(object)))
            })?,
        };
        let group = self
            .var_ref(var)?
            .group()
            .ok_or_else(|| CdsError::not_found(format!("group of {}", self.describe(var))))?;
        Ok(names
            .iter()
            .filter_map(|name| self.get_var(group, name.name()))
            .collect())
    }

    /// Set the base time of an object in seconds since 1970.
    ///
    /// The units of the time variables change to `seconds since <base time>` and their data are
    /// converted so the sample times are unchanged.
    /// For any object other than a variable that is not a standard time variable,
    /// `base_time` is also written to a `base_time` variable if the group of the time variables has one.
    /// A `long_name` of [`None`] describes the offsets from midnight, or the sample times if the base time is not a midnight.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if no time variable is found,
    /// the base time is not representable, or the time variables cannot be updated.
    pub fn set_base_time(
        &mut self,
        object: impl Into<ObjectId>,
        long_name: Option<&str>,
        base_time: i64,
    ) -> Result<(), CdsError> {
        let object = object.into();
        let long_name = long_name.unwrap_or(if base_time == midnight(base_time) {
            MIDNIGHT_LONG_NAME
        } else {
            SAMPLE_TIMES_LONG_NAME
        });
        let units = base_time_to_units_string(base_time).map_err(|err| CdsError::from(err).logged())?;
        let targets = self.time_targets(object, &[TimeVar::BaseTime, TimeVar::TimeOffset, TimeVar::Time])?;
        tracing::debug!(target: COMPONENT, object = %self.describe(object), %units, "setting base time");
        for var in targets {
            match self.is_time_var(var) {
                Some(TimeVar::BaseTime) => self.update_base_time_var(var, base_time, &units)?,
                Some(TimeVar::TimeOffset) => self.rebase_time_var(var, TIME_OFFSET_LONG_NAME, &units)?,
                _ => self.rebase_time_var(var, long_name, &units)?,
            }
        }
        Ok(())
    }

    fn update_base_time_var(&mut self, var: VarId, base_time: i64, units: &str) -> Result<(), CdsError> {
        let value = i32::try_from(base_time).map_err(|_| {
            CdsError::invalid(format!("base time {base_time} does not fit {}", self.describe(var)))
        })?;
        self.set_var_data(var, &DataArray::from(vec![value]), 0, None)?;
        let string = units.strip_prefix("seconds since ").unwrap_or(units);
        let _ = self.change_att_text(var.into(), true, "string", string)?;
        let _ = self.change_att_text(var.into(), true, "long_name", BASE_TIME_LONG_NAME)?;
        let _ = self.change_att_text(var.into(), true, "units", BASE_TIME_UNITS)?;
        Ok(())
    }

    fn rebase_time_var(&mut self, var: VarId, long_name: &str, units: &str) -> Result<(), CdsError> {
        match self.get_att(var.into(), "long_name") {
            Some(att) if !self.is_locked(att) => {
                let _ = self.change_att_text(var.into(), true, "long_name", long_name)?;
            }
            None if !self.is_locked(var) => {
                self.define_att_text(var.into(), "long_name", long_name)?;
            }
            _ => self.skip_locked(var, "long_name change"),
        }
        if self.var_time_units(var).is_some() {
            let data_type = self.var_ref(var)?.data_type;
            let _ = self.change_var_units(var, data_type, Some(units))?;
        } else {
            // offsets in other units are not converted, only relabelled
            let _ = self.change_att_text(var.into(), true, "units", units)?;
        }
        Ok(())
    }

    /// Set sample times of an object from seconds since 1970.
    ///
    /// # Errors
    ///
    /// See [`Hierarchy::set_sample_timevals`].
    pub fn set_sample_times(
        &mut self,
        object: impl Into<ObjectId>,
        sample_start: usize,
        times: &[i64],
    ) -> Result<(), CdsError> {
        let timevals = times
            .iter()
            .map(|&time| {
                DateTime::<Utc>::from_timestamp(time, 0)
                    .ok_or_else(|| CdsError::from(UnitsError::TimeOutOfRange(time)).logged())
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.set_sample_timevals(object, sample_start, &timevals)
    }

    /// Set sample times of an object starting at sample `sample_start`.
    ///
    /// A variable other than a standard time variable is set by itself.
    /// Otherwise the `time` and `time_offset` variables in the group of the time variable of the object are set.
    /// If the object has no base time yet, it is set to the midnight before the first time.
    /// Integer time variables hold offsets rounded to the nearest whole unit.
    /// A time variable without timestamp units is written as seconds since the base time.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if
    ///  - `times` is empty,
    ///  - there is no base time and `sample_start` is not zero,
    ///  - no time variable is found,
    ///  - a time variable is not a `short`, `int`, `int64`, `float`, or `double` variable, or
    ///  - the data cannot be stored.
    pub fn set_sample_timevals(
        &mut self,
        object: impl Into<ObjectId>,
        sample_start: usize,
        times: &[DateTime<Utc>],
    ) -> Result<(), CdsError> {
        let object = object.into();
        let first = times.first().ok_or_else(|| {
            CdsError::invalid(format!("could not set sample times of {}: no times", self.describe(object)))
        })?;
        let base_time = match self.get_base_time(object) {
            Some(base_time) => base_time,
            None if sample_start == 0 => {
                let base_time = midnight(first.timestamp());
                self.set_base_time(object, Some(MIDNIGHT_LONG_NAME), base_time)?;
                base_time
            }
            None => {
                return Err(CdsError::invalid(format!(
                    "could not set sample times of {} from sample {sample_start}: no base time",
                    self.describe(object)
                )));
            }
        };
        for var in self.time_targets(object, &[TimeVar::Time, TimeVar::TimeOffset])? {
            self.write_sample_times(var, base_time, sample_start, times)?;
        }
        Ok(())
    }

    fn write_sample_times(
        &mut self,
        var: VarId,
        base_time: i64,
        sample_start: usize,
        times: &[DateTime<Utc>],
    ) -> Result<(), CdsError> {
        let data_type = self.var_ref(var)?.data_type;
        if !matches!(
            data_type,
            DataType::Short | DataType::Int | DataType::Int64 | DataType::Float | DataType::Double
        ) {
            return Err(CdsError::invalid(format!(
                "could not set sample times of {}: unsupported time variable data type {data_type}",
                self.describe(var)
            )));
        }
        // a variable without timestamp units holds seconds since the base time
        let units = self
            .var_time_units(var)
            .unwrap_or_else(|| TimeUnits::seconds_since(base_time));
        let offsets = times.iter().map(|time| units_offset(&units, time)).collect::<Vec<_>>();
        self.set_var_data(var, &DataArray::from(offsets), sample_start, None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{node::GroupId, ErrorKind};

    // 2009-02-13 23:31:30
    const TIME: i64 = 1_234_567_890;
    const MIDNIGHT: i64 = 1_234_483_200;

    fn hierarchy() -> (Hierarchy, GroupId) {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.define_group(None, "root").unwrap();
        hierarchy.define_dim(root, "time", 0, true).unwrap();
        hierarchy.define_var(root, "base_time", DataType::Int, &[]).unwrap();
        hierarchy.define_var(root, "time_offset", DataType::Double, &["time"]).unwrap();
        hierarchy.define_var(root, "time", DataType::Double, &["time"]).unwrap();
        (hierarchy, root)
    }

    #[test]
    fn time_index_search() {
        let times = [5, 5, 5, 6, 7, 8, 9, 10, 10, 10, 11, 12, 13, 14, 15, 15, 15];
        let search = |reference, search| find_time_index(&times, &reference, search);
        assert_eq!(search(3, TimeSearch::Equal), None);
        assert_eq!(search(3, TimeSearch::Less), None);
        assert_eq!(search(3, TimeSearch::GreaterEqual), Some(0));
        assert_eq!(search(5, TimeSearch::Equal), Some(0));
        assert_eq!(search(5, TimeSearch::LessEqual), Some(2));
        assert_eq!(search(5, TimeSearch::Greater), Some(3));
        assert_eq!(search(7, TimeSearch::Less), Some(3));
        assert_eq!(search(10, TimeSearch::Equal), Some(7));
        assert_eq!(search(10, TimeSearch::Less), Some(6));
        assert_eq!(search(10, TimeSearch::LessEqual), Some(9));
        assert_eq!(search(10, TimeSearch::GreaterEqual), Some(7));
        assert_eq!(search(12, TimeSearch::Greater), Some(12));
        assert_eq!(search(15, TimeSearch::Greater), None);
        assert_eq!(search(15, TimeSearch::GreaterEqual), Some(14));
        assert_eq!(search(17, TimeSearch::LessEqual), Some(16));
        assert_eq!(search(17, TimeSearch::GreaterEqual), None);
        assert_eq!(find_time_index(&[] as &[i64], &1, TimeSearch::LessEqual), None);
    }

    #[test]
    fn time_vars_found() {
        let (mut hierarchy, root) = hierarchy();
        let child = hierarchy.define_group(Some(root), "child").unwrap();
        let time = hierarchy.get_var(root, "time").unwrap();
        let base_time = hierarchy.get_var(root, "base_time").unwrap();
        assert_eq!(hierarchy.is_time_var(time), Some(TimeVar::Time));
        assert!(hierarchy.is_time_var(base_time).is_some_and(TimeVar::is_base_time));
        assert_eq!(hierarchy.find_time_var(child), Some(time));

        hierarchy.define_dim(child, "time", 0, true).unwrap();
        let offset = hierarchy.define_var(child, "time_offset", DataType::Int, &["time"]).unwrap();
        assert_eq!(hierarchy.find_time_var(child), Some(offset));
        let temp = hierarchy.define_var(child, "temp", DataType::Float, &["time"]).unwrap();
        assert_eq!(hierarchy.is_time_var(temp), None);
        assert_eq!(hierarchy.find_time_var(temp), Some(offset));
        assert_eq!(hierarchy.get_base_time(temp), None);
    }

    #[test]
    fn sample_times_set_and_get() {
        let (mut hierarchy, root) = hierarchy();
        let times = [TIME, TIME + 60, TIME + 120];
        hierarchy.set_sample_times(root, 0, &times).unwrap();

        assert_eq!(hierarchy.get_base_time(root), Some(MIDNIGHT));
        let time = hierarchy.get_var(root, "time").unwrap();
        assert_eq!(
            hierarchy.get_var_units(time).as_deref(),
            Some("seconds since 2009-02-13 00:00:00 0:00")
        );
        let long_name = hierarchy.get_att(time.into(), "long_name").unwrap();
        assert_eq!(hierarchy.get_att_text(long_name).as_deref(), Some(MIDNIGHT_LONG_NAME));
        assert_eq!(
            hierarchy.var_data(time),
            Some(&DataArray::Double(vec![84_690.0, 84_750.0, 84_810.0]))
        );
        let base_time = hierarchy.get_var(root, "base_time").unwrap();
        assert_eq!(hierarchy.var_data(base_time), Some(&DataArray::Int(vec![1_234_483_200])));
        let string = hierarchy.get_att(base_time.into(), "string").unwrap();
        assert_eq!(hierarchy.get_att_text(string).as_deref(), Some("2009-02-13 00:00:00 0:00"));

        assert_eq!(hierarchy.get_sample_times(root, 0, None).unwrap(), times);
        assert_eq!(hierarchy.get_sample_times(root, 1, Some(1)).unwrap(), [TIME + 60]);
        assert!(hierarchy.get_sample_times(root, 3, None).unwrap().is_empty());

        hierarchy.set_sample_times(root, 3, &[TIME + 180]).unwrap();
        let range = hierarchy.get_time_range(root).unwrap().unwrap();
        assert_eq!(range.sample_count, 4);
        assert_eq!(range.start.timestamp(), TIME);
        assert_eq!(range.end.timestamp(), TIME + 180);
    }

    #[test]
    fn sample_timevals_round_integer_offsets() {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.define_group(None, "root").unwrap();
        hierarchy.define_dim(root, "time", 0, true).unwrap();
        let time = hierarchy.define_var(root, "time", DataType::Int, &["time"]).unwrap();
        let offset = hierarchy.define_var(root, "time_offset", DataType::Double, &["time"]).unwrap();
        let timevals = [
            DateTime::<Utc>::from_timestamp(TIME, 400_000_000).unwrap(),
            DateTime::<Utc>::from_timestamp(TIME + 1, 500_000_000).unwrap(),
        ];
        hierarchy.set_sample_timevals(time, 0, &timevals).unwrap();
        assert_eq!(hierarchy.var_data(time), Some(&DataArray::Int(vec![84_690, 84_692])));
        assert_eq!(hierarchy.get_sample_timevals(offset, 0, None).unwrap(), timevals);
        assert_eq!(hierarchy.get_sample_times(root, 0, None).unwrap(), [TIME, TIME + 2]);

        let text = hierarchy.define_var(root, "time_text", DataType::Char, &["time"]).unwrap();
        hierarchy.define_att_text(text.into(), "units", "seconds since 2009-02-13").unwrap();
        assert_eq!(
            hierarchy.set_sample_times(text, 0, &[TIME]).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn base_time_change_keeps_sample_times() {
        let (mut hierarchy, root) = hierarchy();
        let times = [TIME, TIME + 30];
        hierarchy.set_sample_times(root, 0, &times).unwrap();

        hierarchy.set_base_time(root, None, TIME).unwrap();
        let time = hierarchy.get_var(root, "time").unwrap();
        let offset = hierarchy.get_var(root, "time_offset").unwrap();
        assert_eq!(hierarchy.var_data(time), Some(&DataArray::Double(vec![0.0, 30.0])));
        assert_eq!(hierarchy.var_data(offset), Some(&DataArray::Double(vec![0.0, 30.0])));
        let long_name = hierarchy.get_att(time.into(), "long_name").unwrap();
        assert_eq!(hierarchy.get_att_text(long_name).as_deref(), Some(SAMPLE_TIMES_LONG_NAME));
        let long_name = hierarchy.get_att(offset.into(), "long_name").unwrap();
        assert_eq!(hierarchy.get_att_text(long_name).as_deref(), Some(TIME_OFFSET_LONG_NAME));
        assert_eq!(hierarchy.get_base_time(root), Some(TIME));
        assert_eq!(hierarchy.get_sample_times(root, 0, None).unwrap(), times);

        let orphan = hierarchy.define_group(None, "orphan").unwrap();
        assert_eq!(
            hierarchy.set_base_time(orphan, None, TIME).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            hierarchy.set_sample_times(orphan, 2, &[TIME]).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }
}
