//! Acquisition unit definitions.
//!
//! An [`AcquisitionUnit`] is the chunk of data the loader fetches as a whole: an entire
//! year, or a single month within a year. A month's records are always a subset of its
//! parent year's records.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DataError, Result};

/// The addressable retrieval granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AcquisitionUnit {
    /// A full calendar year.
    Year(i32),
    /// One month (1-12) of a calendar year.
    Month(i32, u32),
}

impl AcquisitionUnit {
    /// Creates a year unit.
    #[must_use]
    pub const fn year(year: i32) -> Self {
        Self::Year(year)
    }

    /// Creates a month unit, validating that `month` is in `1..=12`.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidParameter`] for an out-of-range month.
    pub fn month(year: i32, month: u32) -> Result<Self> {
        if (1..=12).contains(&month) {
            Ok(Self::Month(year, month))
        } else {
            Err(DataError::InvalidParameter(format!(
                "month must be in 1..=12, got {month}"
            )))
        }
    }

    /// Returns the calendar year this unit belongs to.
    #[must_use]
    pub const fn calendar_year(&self) -> i32 {
        match self {
            Self::Year(y) | Self::Month(y, _) => *y,
        }
    }

    /// Returns the year unit containing this unit (a year is its own parent).
    #[must_use]
    pub const fn parent(&self) -> Self {
        Self::Year(self.calendar_year())
    }

    /// Returns true if `date` falls inside this unit.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            Self::Year(y) => date.year() == *y,
            Self::Month(y, m) => date.year() == *y && date.month() == *m,
        }
    }

    /// Returns the month following this one, rolling over into January.
    ///
    /// A year unit returns the year that follows it.
    #[must_use]
    pub const fn next(&self) -> Self {
        match self {
            Self::Year(y) => Self::Year(*y + 1),
            Self::Month(y, 12) => Self::Month(*y + 1, 1),
            Self::Month(y, m) => Self::Month(*y, *m + 1),
        }
    }

    /// Returns the month unit containing `date`.
    #[must_use]
    pub fn month_of(date: NaiveDate) -> Self {
        Self::Month(date.year(), date.month())
    }
}

impl fmt::Display for AcquisitionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(y) => write!(f, "{y}"),
            Self::Month(y, m) => write!(f, "{y}-{m:02}"),
        }
    }
}
