//! Trigger keys: the "<Weekday> <HH:MM>" string a scheduler passes per run.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::BookingError;

/// When a run fires. Immutable once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub weekday: Weekday,
    /// 0-23
    pub hour: u32,
}

impl TriggerSpec {
    pub fn new(weekday: Weekday, hour: u32) -> Result<Self, BookingError> {
        if hour > 23 {
            return Err(BookingError::invalid_trigger(
                format!("{} {hour:02}:00", weekday_name(weekday)),
                "hour must be 0-23",
            ));
        }
        Ok(Self { weekday, hour })
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TriggerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:00", weekday_name(self.weekday), self.hour)
    }
}

/// A raw trigger key as typed by the caller, possibly off the hour
/// (a scheduler that fired a few minutes late).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerKey {
    pub weekday: Weekday,
    pub time: NaiveTime,
}

impl TriggerKey {
    /// Minutes between this key and a trigger on the same weekday, or `None`
    /// when the weekdays differ.
    pub fn minutes_from(&self, spec: &TriggerSpec) -> Option<i64> {
        if self.weekday != spec.weekday {
            return None;
        }
        Some((self.time - spec.time()).num_minutes().abs())
    }

    pub fn as_exact_spec(&self) -> Option<TriggerSpec> {
        if self.time.minute() == 0 && self.time.second() == 0 {
            Some(TriggerSpec {
                weekday: self.weekday,
                hour: self.time.hour(),
            })
        } else {
            None
        }
    }
}

impl FromStr for TriggerKey {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(day), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(BookingError::invalid_trigger(
                s,
                "expected '<Weekday> <HH:MM>', e.g. 'Monday 19:00'",
            ));
        };

        let weekday = parse_weekday(day)
            .ok_or_else(|| BookingError::invalid_trigger(s, format!("unknown weekday '{day}'")))?;
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .map_err(|e| BookingError::invalid_trigger(s, format!("bad time '{time}': {e}")))?;

        Ok(Self { weekday, time })
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", weekday_name(self.weekday), self.time.format("%H:%M"))
    }
}

/// Full English weekday name ("Monday").
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Accepts full or abbreviated names, any case.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    s.trim().parse::<Weekday>().ok()
}
