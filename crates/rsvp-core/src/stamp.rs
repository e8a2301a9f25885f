//! Calendar timestamps and their canonical keys.
//!
//! A [`Stamp`] wraps a UTC instant and carries the calendar arithmetic the
//! rest of the crate needs. Its [`DateKey`] is the minute-resolution string
//! form used as the dictionary key for a calendar's dates: two stamps with
//! equal keys denote the same date slot even when their sub-minute
//! precision differs.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Strict input/key format, minute resolution.
const KEY_FORMAT: &str = "%d/%m/%Y-%H:%M";
/// Same data, separator swapped for readability.
const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Canonical minute-resolution key of a date slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateKey(String);

impl DateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A moment in time with calendar arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Stamp(DateTime<Utc>);

impl Stamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// Parse raw user input into a stamp.
    ///
    /// Recognizes the case-insensitive tokens `current`/`today` (now) and
    /// `tomorrow` (now plus one day); everything else must match the strict
    /// `%d/%m/%Y-%H:%M` key format so router payloads round-trip.
    pub fn parse(raw: &str) -> Result<Self, CalendarError> {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "current" | "today" => return Ok(Self::now()),
            "tomorrow" => return Ok(Self::now().skip(0, 0, 1)),
            _ => {}
        }

        NaiveDateTime::parse_from_str(trimmed, KEY_FORMAT)
            .map(|naive| Self(naive.and_utc()))
            .map_err(|_| CalendarError::InvalidDate(trimmed.to_string()))
    }

    /// Canonical minute-resolution key.
    pub fn key(&self) -> DateKey {
        DateKey(self.0.format(KEY_FORMAT).to_string())
    }

    /// Human-readable variant of [`key`](Self::key): same data, the `-`
    /// separator swapped for a space.
    pub fn beautify(&self) -> String {
        self.0.format(DISPLAY_FORMAT).to_string()
    }

    /// Calendar-correct offset by whole years, months and days.
    ///
    /// Month arithmetic clamps to the last valid day of the target month:
    /// one month past Jan 31 is the end of February.
    pub fn skip(&self, years: i32, months: i32, days: i64) -> Self {
        let shift = years.saturating_mul(12).saturating_add(months);
        let shifted = if shift >= 0 {
            self.0.checked_add_months(Months::new(shift as u32))
        } else {
            self.0.checked_sub_months(Months::new(shift.unsigned_abs()))
        };
        Self(shifted.unwrap_or(self.0) + Duration::days(days))
    }

    /// First day of the containing month, at the same time of day.
    pub fn month_start(&self) -> Self {
        Self(self.0.with_day(1).unwrap_or(self.0))
    }

    /// Last day of the containing month, at the same time of day.
    pub fn month_end(&self) -> Self {
        self.month_start().skip(0, 1, -1)
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Day of the week, Sunday = 0.
    pub fn weekday(&self) -> u32 {
        self.0.weekday().num_days_from_sunday()
    }

    pub fn is_before(&self, other: &Self) -> bool {
        self.0 < other.0
    }

    pub fn is_after(&self, other: &Self) -> bool {
        self.0 > other.0
    }
}

impl From<DateTime<Utc>> for Stamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.beautify())
    }
}
