use crate::{
    accumulator::naming::SampleDate,
    albedo_errors::AlbedoError,
    constants::{DayOfYear, Year, MAX_DAY_OF_YEAR},
};

/// Temporal window `[target - wings, target + wings]` around one composite day.
///
/// Membership is decided on the signed day difference (see
/// [`SampleDate::day_difference`]), so windows extend across year boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulationWindow {
    pub target: SampleDate,
    pub wings: u32,
}

impl AccumulationWindow {
    pub fn new(target: SampleDate, wings: u32) -> Self {
        AccumulationWindow { target, wings }
    }

    /// Signed day difference of `date` relative to the target day.
    #[inline]
    pub fn day_difference(&self, date: &SampleDate) -> i32 {
        date.day_difference(&self.target)
    }

    /// Day difference of `date` if it falls inside the window, both ends included.
    #[inline]
    pub fn offset_of(&self, date: &SampleDate) -> Option<i32> {
        let d = self.day_difference(date);
        (d.unsigned_abs() <= self.wings).then_some(d)
    }

    pub fn contains(&self, date: &SampleDate) -> bool {
        self.offset_of(date).is_some()
    }
}

/// Target days `start, start + step, …` up to and including `end`.
///
/// Return
/// ----------
/// * `Err(AlbedoError::InvalidDayOfYear)` if `start` or `end` is outside `1..=366`,
/// * `Err(AlbedoError::InvalidParameter)` if `step` is zero or `start > end`.
pub fn target_days(
    start: DayOfYear,
    end: DayOfYear,
    step: u32,
) -> Result<Vec<DayOfYear>, AlbedoError> {
    for doy in [start, end] {
        if !(1..=MAX_DAY_OF_YEAR).contains(&doy) {
            return Err(AlbedoError::InvalidDayOfYear(doy));
        }
    }
    if step == 0 {
        return Err(AlbedoError::InvalidParameter(
            "target day step must be positive".into(),
        ));
    }
    if start > end {
        return Err(AlbedoError::InvalidParameter(format!(
            "first target day {start} is after last target day {end}"
        )));
    }
    Ok((start..=end).step_by(step as usize).collect())
}

/// [`target_days`] as dates of `year`.
pub fn target_dates(
    year: Year,
    start: DayOfYear,
    end: DayOfYear,
    step: u32,
) -> Result<Vec<SampleDate>, AlbedoError> {
    target_days(start, end, step)?
        .into_iter()
        .map(|doy| SampleDate::new(year, doy))
        .collect()
}
