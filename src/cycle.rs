use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Serialize, Serializer};

use crate::error::NasrError;

pub const CYCLE_LENGTH_DAYS: i64 = 28;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// First effective date of the 28-day shapefile subscription.
pub fn cycle_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 5, 23).unwrap_or(NaiveDate::MIN)
}

/// Effective date of a published NASR cycle. Always `epoch + 28k`, k >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EffectiveDate(NaiveDate);

impl EffectiveDate {
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn cycle_index(&self) -> i64 {
        (self.0 - cycle_epoch()).num_days() / CYCLE_LENGTH_DAYS
    }

    /// Effective date of the following cycle. Fails past the last
    /// representable calendar date.
    pub fn next(&self) -> Result<EffectiveDate, NasrError> {
        self.0
            .checked_add_days(Days::new(CYCLE_LENGTH_DAYS as u64))
            .map(EffectiveDate)
            .ok_or(NasrError::NoNextCycle(self.0))
    }
}

impl fmt::Display for EffectiveDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for EffectiveDate {
    type Err = NasrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let date = parse_requested_date(value)?;
        let effective = normalize(date)?;
        if effective.0 != date {
            return Err(NasrError::OffCycleDate(value.trim().to_string()));
        }
        Ok(effective)
    }
}

impl Serialize for EffectiveDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn parse_requested_date(value: &str) -> Result<NaiveDate, NasrError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| NasrError::DateFormat(value.to_string()))
}

/// Rounds `date` down to the effective date of the cycle that governs it.
pub fn normalize(date: NaiveDate) -> Result<EffectiveDate, NasrError> {
    let epoch = cycle_epoch();
    if date < epoch {
        return Err(NasrError::OutOfRangeDate { date, epoch });
    }
    let offset = (date - epoch).num_days() % CYCLE_LENGTH_DAYS;
    Ok(EffectiveDate(date - Days::new(offset as u64)))
}
