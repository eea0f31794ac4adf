use std::fmt;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A missing or unparseable end date falls back to `start + FALLBACK_SPAN_DAYS`,
/// giving a seven-day bar.
pub const FALLBACK_SPAN_DAYS: u64 = 6;

/// Day-only formats, tried in order. Day-first wins over month-first.
const DAY_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%m-%d-%Y",
];

/// Timestamp formats without a zone offset.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// A date as it arrives from the task API, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DateInput {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
    Text(String),
    #[default]
    Missing,
}

impl From<NaiveDate> for DateInput {
    fn from(d: NaiveDate) -> Self {
        DateInput::Day(d)
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

impl From<Option<String>> for DateInput {
    fn from(s: Option<String>) -> Self {
        s.map(DateInput::Text).unwrap_or(DateInput::Missing)
    }
}

impl<'de> Deserialize<'de> for DateInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Millis(i64),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            None => DateInput::Missing,
            Some(Raw::Text(s)) => DateInput::Text(s),
            Some(Raw::Millis(ms)) => match DateTime::<Utc>::from_timestamp_millis(ms) {
                Some(t) => DateInput::Instant(t),
                None => DateInput::Text(ms.to_string()),
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("date is missing")]
    Missing,
    #[error("unrecognised date '{0}'")]
    Unparseable(String),
    #[error("date is outside the supported calendar range")]
    OutOfRange,
}

/// Truncate any accepted input to its calendar day.
pub fn parse_day(input: &DateInput) -> Result<NaiveDate, DateError> {
    match input {
        DateInput::Day(d) => Ok(*d),
        DateInput::Instant(t) => Ok(t.date_naive()),
        DateInput::Text(s) => parse_day_str(s),
        DateInput::Missing => Err(DateError::Missing),
    }
}

pub fn parse_day_str(s: &str) -> Result<NaiveDate, DateError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DateError::Missing);
    }
    // Keep the calendar day as written, in the offset it was written in.
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t.date());
        }
    }
    for fmt in DAY_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(DateError::Unparseable(s.to_string()))
}

/// An inclusive day range with `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DayRange {
    /// Build a range, pulling an end before `start` up to `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// What to do with a record whose dates are missing or unparseable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Substitute today for the start and a seven-day span for the end.
    #[default]
    Substitute,
    /// Reject the record.
    Drop,
}

/// Which dates were substituted, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackReason {
    pub start: Option<DateError>,
    pub end: Option<DateError>,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.start, &self.end) {
            (Some(s), Some(e)) => write!(f, "start {s}, end {e}"),
            (Some(s), None) => write!(f, "start {s}"),
            (None, Some(e)) => write!(f, "end {e}"),
            (None, None) => write!(f, "no fallback"),
        }
    }
}

/// Outcome of normalizing a start/end pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeResolution {
    /// Both dates parsed and were in order.
    Exact(DayRange),
    /// Both dates parsed; the end preceded the start and was pulled up to it.
    Clamped(DayRange),
    /// At least one date was substituted.
    Fallback {
        range: DayRange,
        reason: FallbackReason,
    },
}

impl RangeResolution {
    pub fn range(&self) -> DayRange {
        match self {
            RangeResolution::Exact(r) | RangeResolution::Clamped(r) => *r,
            RangeResolution::Fallback { range, .. } => *range,
        }
    }

    pub fn fallback(&self) -> Option<&FallbackReason> {
        match self {
            RangeResolution::Fallback { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Normalize a start/end pair to a day range under a single fallback policy.
pub fn normalize_range(
    start: &DateInput,
    end: &DateInput,
    today: NaiveDate,
    policy: FallbackPolicy,
) -> Result<RangeResolution, DateError> {
    match (parse_day(start), parse_day(end)) {
        (Ok(s), Ok(e)) if e < s => Ok(RangeResolution::Clamped(DayRange::single(s))),
        (Ok(s), Ok(e)) => Ok(RangeResolution::Exact(DayRange::new(s, e))),
        (start_res, end_res) => {
            let start_err = start_res.as_ref().err().cloned();
            let end_err = end_res.as_ref().err().cloned();
            if policy == FallbackPolicy::Drop {
                return Err(start_err.or(end_err).unwrap_or(DateError::Missing));
            }

            let start_day = start_res.unwrap_or(today);
            let end_day = match end_res {
                Ok(e) => e.max(start_day),
                Err(_) => start_day
                    .checked_add_days(Days::new(FALLBACK_SPAN_DAYS))
                    .ok_or(DateError::OutOfRange)?,
            };
            Ok(RangeResolution::Fallback {
                range: DayRange::new(start_day, end_day),
                reason: FallbackReason {
                    start: start_err,
                    end: end_err,
                },
            })
        }
    }
}
