//! Booking rules: which slot each trigger books, and for whom.

use chrono::{Duration, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::BookingError;
use crate::trigger::{TriggerKey, TriggerSpec, parse_weekday, weekday_name};

/// Minimum interval between the trigger and the booked slot.
pub const LEAD_TIME_HOURS: i64 = 48;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRule {
    pub trigger: TriggerSpec,
    pub target_weekday: Weekday,
    pub target_time: NaiveTime,
    /// Name of the contact profile used for this trigger.
    pub contact: String,
}

impl BookingRule {
    /// Build a rule from the textual forms used in config files:
    /// `"Monday 19:00"`, `"Wednesday"`, `"19:00"` (or just `"19"`).
    pub fn parse(trigger: &str, target_day: &str, target_time: &str, contact: &str) -> Result<Self, BookingError> {
        let key: TriggerKey = trigger
            .parse()
            .map_err(|e| BookingError::Configuration(format!("rule trigger: {e}")))?;
        let spec = key.as_exact_spec().ok_or_else(|| {
            BookingError::Configuration(format!("rule trigger '{trigger}' must fall on the hour"))
        })?;
        let target_weekday = parse_weekday(target_day).ok_or_else(|| {
            BookingError::Configuration(format!("rule '{trigger}': unknown target day '{target_day}'"))
        })?;
        let target_time = crate::time_match::parse_target_time(target_time).ok_or_else(|| {
            BookingError::Configuration(format!("rule '{trigger}': bad target time '{target_time}'"))
        })?;
        if contact.trim().is_empty() {
            return Err(BookingError::Configuration(format!("rule '{trigger}' names no contact profile")));
        }

        Ok(Self {
            trigger: spec,
            target_weekday,
            target_time,
            contact: contact.trim().to_string(),
        })
    }

    pub fn lead_time(&self) -> Duration {
        Duration::hours(LEAD_TIME_HOURS)
    }

    pub fn describe(&self) -> String {
        format!(
            "{} -> {} {} (contact: {})",
            self.trigger,
            weekday_name(self.target_weekday),
            self.target_time.format("%H:%M"),
            self.contact
        )
    }
}

/// The static trigger -> rule table. One rule per trigger key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingSchedule {
    rules: Vec<BookingRule>,
}

impl BookingSchedule {
    pub fn new(rules: Vec<BookingRule>) -> Result<Self, BookingError> {
        for (i, rule) in rules.iter().enumerate() {
            if rules[..i].iter().any(|r| r.trigger == rule.trigger) {
                return Err(BookingError::Configuration(format!(
                    "duplicate rule for trigger '{}'",
                    rule.trigger
                )));
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[BookingRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, spec: &TriggerSpec) -> Option<&BookingRule> {
        self.rules.iter().find(|r| &r.trigger == spec)
    }

    /// Look up the rule for a raw key.
    ///
    /// With `tolerance_minutes == 0` only an exact match is accepted. Otherwise
    /// the nearest rule on the same weekday within the tolerance wins.
    pub fn lookup(&self, key: &TriggerKey, tolerance_minutes: i64) -> Result<&BookingRule, BookingError> {
        if let Some(rule) = key.as_exact_spec().and_then(|spec| self.get(&spec)) {
            return Ok(rule);
        }

        if tolerance_minutes > 0 {
            let nearest = self
                .rules
                .iter()
                .filter_map(|r| key.minutes_from(&r.trigger).map(|d| (d, r)))
                .filter(|(d, _)| *d <= tolerance_minutes)
                .min_by_key(|(d, _)| *d);
            if let Some((_, rule)) = nearest {
                tracing::info!(key = %key, trigger = %rule.trigger, "snapped trigger key to scheduled rule");
                return Ok(rule);
            }
        }

        Err(BookingError::invalid_trigger(
            key.to_string(),
            "no booking rule for this trigger",
        ))
    }
}

/// The four weekly rules booked out of the box.
pub fn default_rules() -> Vec<BookingRule> {
    [
        ("Monday 19:00", "Wednesday", "19:00", "primary"),
        ("Monday 20:00", "Wednesday", "20:00", "secondary"),
        ("Thursday 16:00", "Saturday", "16:00", "primary"),
        ("Thursday 17:00", "Saturday", "17:00", "secondary"),
    ]
    .into_iter()
    .filter_map(|(trigger, day, time, contact)| BookingRule::parse(trigger, day, time, contact).ok())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn schedule() -> BookingSchedule {
        BookingSchedule::new(default_rules()).unwrap()
    }

    #[test]
    fn default_table_has_four_rules() {
        let s = schedule();
        assert_eq!(s.rules().len(), 4);
        assert_eq!(
            s.rules()[2].describe(),
            "Thursday 16:00 -> Saturday 16:00 (contact: primary)"
        );
    }

    #[test]
    fn exact_lookup() {
        let key: TriggerKey = "Monday 20:00".parse().unwrap();
        let rule = schedule().lookup(&key, 0).unwrap().clone();
        assert_eq!(rule.target_weekday, Weekday::Wed);
        assert_eq!(rule.contact, "secondary");
    }

    #[test]
    fn unknown_key_is_invalid_trigger() {
        let key: TriggerKey = "Tuesday 19:00".parse().unwrap();
        let err = schedule().lookup(&key, 30).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTrigger);
    }

    #[test]
    fn late_key_snaps_only_within_tolerance() {
        let key: TriggerKey = "Thursday 16:20".parse().unwrap();
        let s = schedule();
        assert!(s.lookup(&key, 0).is_err());
        assert_eq!(s.lookup(&key, 30).unwrap().trigger.hour, 16);
        assert!(s.lookup(&key, 10).is_err());
    }

    #[test]
    fn nearest_rule_wins_when_snapping() {
        let key: TriggerKey = "Thursday 16:40".parse().unwrap();
        assert_eq!(schedule().lookup(&key, 60).unwrap().trigger.hour, 17);
    }

    #[test]
    fn duplicate_triggers_are_rejected() {
        let mut rules = default_rules();
        rules.push(rules[0].clone());
        let err = BookingSchedule::new(rules).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    }

    #[test]
    fn rule_accepts_hour_only_target() {
        let rule = BookingRule::parse("Monday 19:00", "wed", "19", "primary").unwrap();
        assert_eq!(rule.target_time, NaiveTime::from_hms_opt(19, 0, 0).unwrap());
        assert_eq!(rule.lead_time(), Duration::hours(48));
    }

    #[test]
    fn rule_trigger_must_be_on_the_hour() {
        assert!(BookingRule::parse("Monday 19:30", "Wednesday", "19:00", "primary").is_err());
    }
}
