//! Wall-clock helpers. The engine works in naive local time of the
//! configured zone.

use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;

use courtbook_core::weekday_name;

pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.trim().parse().map_err(|_| anyhow!("invalid timezone: {tz}"))
}

pub fn local_now(tz: Tz) -> NaiveDateTime {
    Utc::now().with_timezone(&tz).naive_local()
}

/// Parse `--now` values like "2026-10-19 19:00".
pub fn parse_local(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M")
        .map_err(|e| anyhow!("invalid local datetime '{s}' (want YYYY-MM-DD HH:MM): {e}"))
}

/// Trigger key for "right now", e.g. "Monday 19:03".
pub fn trigger_key_at(now: NaiveDateTime) -> String {
    format!("{} {:02}:{:02}", weekday_name(now.weekday()), now.hour(), now.minute())
}
