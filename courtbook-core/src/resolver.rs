//! Target resolution: trigger + rule + wall clock -> concrete slot.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::Serialize;

use crate::schedule::{BookingRule, BookingSchedule};
use crate::trigger::{TriggerKey, TriggerSpec, weekday_name};
use crate::error::BookingError;

/// How late a run may fire and still count as today's trigger.
pub const DEFAULT_LATE_GRACE_MINUTES: i64 = 60;

/// The slot a run books. Recomputed every run, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedTarget {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub time_of_day: NaiveTime,
}

impl ResolvedTarget {
    pub fn instant(&self) -> NaiveDateTime {
        self.date.and_time(self.time_of_day)
    }

    /// "2025-03-12" as rendered in calendar `data-date` attributes.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn time_string(&self) -> String {
        self.time_of_day.format("%H:%M").to_string()
    }
}

impl std::fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", weekday_name(self.weekday), self.date_string(), self.time_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TriggerResolver {
    late_grace: Duration,
}

impl Default for TriggerResolver {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_LATE_GRACE_MINUTES))
    }
}

impl TriggerResolver {
    pub fn new(late_grace: Duration) -> Self {
        Self { late_grace }
    }

    /// Resolve the rule registered for `spec`.
    pub fn resolve(
        &self,
        spec: &TriggerSpec,
        schedule: &BookingSchedule,
        now: NaiveDateTime,
    ) -> Result<ResolvedTarget, BookingError> {
        let rule = schedule
            .get(spec)
            .ok_or_else(|| BookingError::invalid_trigger(spec.to_string(), "no booking rule for this trigger"))?;
        Ok(self.resolve_rule(rule, now))
    }

    pub fn resolve_rule(&self, rule: &BookingRule, now: NaiveDateTime) -> ResolvedTarget {
        let trigger_at = self.trigger_instant(&rule.trigger, now);
        self.target_after(rule, trigger_at)
    }

    /// Resolve `rule` for a run that fired as `key`, which may sit a few
    /// minutes off the rule's own trigger. The week is fixed by the key's
    /// occurrence, so a snapped run never rolls past the one it snapped to.
    pub fn resolve_key(&self, rule: &BookingRule, key: &TriggerKey, now: NaiveDateTime) -> ResolvedTarget {
        let fired_at = self.occurrence(key.weekday, key.time, now);
        let trigger_at = fired_at.date().and_time(rule.trigger.time());
        self.target_after(rule, trigger_at)
    }

    /// This week's occurrence of the trigger, or next week's once this
    /// week's lies further in the past than the late-fire grace.
    pub fn trigger_instant(&self, spec: &TriggerSpec, now: NaiveDateTime) -> NaiveDateTime {
        self.occurrence(spec.weekday, spec.time(), now)
    }

    fn occurrence(&self, weekday: Weekday, time: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date();
        let offset = weekday.num_days_from_monday() as i64 - today.weekday().num_days_from_monday() as i64;
        let mut at = (today + Duration::days(offset)).and_time(time);

        if at + self.late_grace < now {
            at += Duration::days(7);
        }
        at
    }

    fn target_after(&self, rule: &BookingRule, trigger_at: NaiveDateTime) -> ResolvedTarget {
        let earliest = trigger_at + rule.lead_time();

        let mut date = earliest.date();
        while date.weekday() != rule.target_weekday || date.and_time(rule.target_time) < earliest {
            date += Duration::days(1);
        }

        tracing::debug!(
            trigger = %rule.trigger,
            trigger_at = %trigger_at,
            earliest = %earliest,
            target = %date,
            "resolved booking target"
        );

        ResolvedTarget {
            date,
            weekday: date.weekday(),
            time_of_day: rule.target_time,
        }
    }
}
