//! Slot text normalization.
//!
//! Booking pages render slot times as "19:00", "7:00pm", "7:00 PM" or "7pm"
//! depending on locale. Everything funnels through [`parse_display_time`] so
//! there is exactly one place that decides what a slot's text means.
//!
//! | display    | target | match |
//! |------------|--------|-------|
//! | `19:00`    | 19:00  | yes   |
//! | `7:00pm`   | 19:00  | yes   |
//! | `7:00 PM`  | 19:00  | yes   |
//! | `7pm`      | 19:00  | yes   |
//! | `7:00`     | 19:00  | no    |
//! | `13:00`    | 03:00  | no    |
//! | `3:00pm`   | 15:00  | yes   |
//! | `3:00am`   | 15:00  | no    |
//! | `12:00pm`  | 12:00  | yes   |
//! | `12:00am`  | 00:00  | yes   |
//! | `19:30`    | 19:00  | no    |
//! | `7:00pmx`  | 19:00  | no    |

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

static TIME_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::([0-5]\d))?(?:\s*([ap])\.?m\.?)?(?:\b|$)").expect("valid time pattern")
});

/// Does `display_text` denote the same clock time as `target`?
pub fn matches_time(display_text: &str, target: NaiveTime) -> bool {
    parse_display_time(display_text) == Some(target)
}

/// Parse the first clock time in a slot's display text.
///
/// A token counts as a time only when it carries minutes or an am/pm marker,
/// so stray numbers ("2 spots left") are ignored. Tokens are anchored on word
/// boundaries at both ends: "13:00" is read whole, never as "3:00", and
/// "7:00pmx" is not a time at all. Text without a meridiem is read as
/// 24-hour.
pub fn parse_display_time(display_text: &str) -> Option<NaiveTime> {
    for caps in TIME_TOKEN.captures_iter(display_text) {
        let minutes = caps.get(2);
        let meridiem = caps.get(3);
        if minutes.is_none() && meridiem.is_none() {
            continue;
        }

        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = match minutes {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };

        let hour = match meridiem.map(|m| m.as_str().to_ascii_lowercase()) {
            Some(m) => {
                if !(1..=12).contains(&hour) {
                    return None;
                }
                let base = hour % 12;
                if m == "p" { base + 12 } else { base }
            }
            None => hour,
        };

        return NaiveTime::from_hms_opt(hour, minute, 0);
    }
    None
}

/// Parse a rule's target time: "19", "19:00", "3:00" or "7pm".
pub fn parse_target_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse().ok().and_then(|h| NaiveTime::from_hms_opt(h, 0, 0));
    }
    parse_display_time(s)
}
