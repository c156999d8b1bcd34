//! Day-of-year strings and accumulator file names.
//!
//! Daily accumulators are stored as `matrices_<year><doy>.bin` and full (composite)
//! accumulators as `matrices_full_<year><doy>.bin`, where `<doy>` is zero-padded to three
//! digits (`"007"`, `"045"`, `"366"`). The date embedded in a file name is what the
//! temporal accumulation engine uses to place a file inside a compositing window.

use std::{fmt, sync::LazyLock};

use regex::Regex;

use crate::{
    albedo_errors::AlbedoError,
    constants::{DayOfYear, Year, DAYS_PER_YEAR, MAX_DAY_OF_YEAR},
};

static DAILY_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^matrices_(?P<year>\d{4})(?P<doy>\d{3})\.bin$").expect("daily file name regex")
});

static FULL_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^matrices_full_(?P<year>\d{4})(?P<doy>\d{3})\.bin$")
        .expect("full file name regex")
});

/// A (year, day-of-year) pair identifying one observation day or one composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleDate {
    pub year: Year,
    pub doy: DayOfYear,
}

impl SampleDate {
    /// Build a date, rejecting a day of year outside `1..=366`.
    pub fn new(year: Year, doy: DayOfYear) -> Result<Self, AlbedoError> {
        if !(1..=MAX_DAY_OF_YEAR).contains(&doy) {
            return Err(AlbedoError::InvalidDayOfYear(doy));
        }
        Ok(SampleDate { year, doy })
    }

    /// Signed number of days from `reference` to `self`.
    ///
    /// Years are counted as 365 days; leap days are not taken into account, so the
    /// difference is consistent with the naming convention of the daily products rather
    /// than with the civil calendar.
    pub fn day_difference(&self, reference: &SampleDate) -> i32 {
        DAYS_PER_YEAR * (self.year - reference.year) + (self.doy as i32 - reference.doy as i32)
    }
}

impl fmt::Display for SampleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.year, self.doy)
    }
}

/// Zero-padded three digit day-of-year string, `None` outside `1..=366`.
pub fn doy_string(doy: DayOfYear) -> Option<String> {
    if !(1..=MAX_DAY_OF_YEAR).contains(&doy) {
        return None;
    }
    Some(format!("{doy:03}"))
}

/// File name of the daily accumulator of `year`/`doy`.
pub fn daily_accumulator_file_name(year: Year, doy: DayOfYear) -> Result<String, AlbedoError> {
    let doy = doy_string(doy).ok_or(AlbedoError::InvalidDayOfYear(doy))?;
    Ok(format!("matrices_{year}{doy}.bin"))
}

/// File name of the full accumulator (composite) of `year`/`doy`.
pub fn full_accumulator_file_name(year: Year, doy: DayOfYear) -> Result<String, AlbedoError> {
    let doy = doy_string(doy).ok_or(AlbedoError::InvalidDayOfYear(doy))?;
    Ok(format!("matrices_full_{year}{doy}.bin"))
}

fn parse_with(regex: &Regex, file_name: &str) -> Result<SampleDate, AlbedoError> {
    let invalid = || AlbedoError::InvalidFileName(file_name.to_string());
    let captures = regex.captures(file_name).ok_or_else(invalid)?;
    let year: Year = captures["year"].parse().map_err(|_| invalid())?;
    let doy: DayOfYear = captures["doy"].parse().map_err(|_| invalid())?;
    SampleDate::new(year, doy)
}

/// Extract the observation date from a daily accumulator file name.
pub fn parse_daily_accumulator_file_name(file_name: &str) -> Result<SampleDate, AlbedoError> {
    parse_with(&DAILY_FILE_NAME, file_name)
}

/// Extract the composite date from a full accumulator file name.
pub fn parse_full_accumulator_file_name(file_name: &str) -> Result<SampleDate, AlbedoError> {
    parse_with(&FULL_FILE_NAME, file_name)
}
