//! The Julian time representation used throughout the binary format.
//!
//! Dates and times in FS5Files records are integers relative to the start of
//! 1900: [`JulianDay`] counts days with day 1 = 1900-01-01, and
//! [`JulianHour`] counts hours with hour 0 = 1900-01-01T00:00:00.
//! Calendar conversions are always normalized to UTC; the format carries no
//! time-zone information of its own.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Seconds from the Unix epoch back to 1900-01-01T00:00:00Z.
const EPOCH_1900_OFFSET_SECS: i64 = -2_208_988_800;

/// Hours since 1900-01-01T00:00:00Z.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct JulianHour(pub i32);

impl JulianHour {
    pub fn get(self) -> i32 {
        self.0
    }

    /// Builds an hour count from a day number (1-based, day 1 = 1900-01-01)
    /// and an hour of day.
    pub fn from_day_hour(day: JulianDay, hour: i32) -> Self {
        JulianHour((day.0 - 1) * 24 + hour)
    }

    /// The calendar instant for this hour count, in UTC.
    ///
    /// Returns `None` only for hour counts so far outside the representable
    /// calendar range that the conversion overflows; every value a real
    /// database stores converts.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs = EPOCH_1900_OFFSET_SECS + i64::from(self.0) * 3600;
        match Utc.timestamp_opt(secs, 0) {
            chrono::LocalResult::Single(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn checked_add_hours(self, hours: i32) -> Option<Self> {
        self.0.checked_add(hours).map(JulianHour)
    }
}

impl Add<i32> for JulianHour {
    type Output = JulianHour;

    fn add(self, hours: i32) -> JulianHour {
        JulianHour(self.0 + hours)
    }
}

impl Sub for JulianHour {
    type Output = i32;

    fn sub(self, other: JulianHour) -> i32 {
        self.0 - other.0
    }
}

impl fmt::Display for JulianHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:00Z")),
            None => write!(f, "hour {}", self.0),
        }
    }
}

/// Days since the start of 1900, with day 1 = 1900-01-01.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct JulianDay(pub i32);

impl JulianDay {
    pub fn get(self) -> i32 {
        self.0
    }

    /// Midnight UTC at the start of this day.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        JulianHour::from_day_hour(self, 0).to_datetime()
    }
}
