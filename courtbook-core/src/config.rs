//! Immutable per-run configuration, built once at the process boundary.

use chrono::Duration;

use crate::error::BookingError;
use crate::layout::PageLayout;
use crate::profile::ContactDirectory;
use crate::resolver::DEFAULT_LATE_GRACE_MINUTES;
use crate::schedule::BookingSchedule;
use crate::wait::WaitBudgets;

#[derive(Debug, Clone)]
pub struct BookingConfig {
    pub site_url: String,
    pub schedule: BookingSchedule,
    pub contacts: ContactDirectory,
    pub layout: PageLayout,
    pub waits: WaitBudgets,
    /// How late a run may fire and still count as the current trigger.
    pub late_grace: Duration,
    /// Snap off-hour trigger keys to a rule within this many minutes (0: exact only).
    pub trigger_tolerance_minutes: i64,
}

impl BookingConfig {
    pub fn new(site_url: impl Into<String>, schedule: BookingSchedule, contacts: ContactDirectory) -> Self {
        Self {
            site_url: site_url.into(),
            schedule,
            contacts,
            layout: PageLayout::default(),
            waits: WaitBudgets::default(),
            late_grace: Duration::minutes(DEFAULT_LATE_GRACE_MINUTES),
            trigger_tolerance_minutes: 0,
        }
    }

    pub fn with_layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_waits(mut self, waits: WaitBudgets) -> Self {
        self.waits = waits;
        self
    }

    pub fn with_late_grace(mut self, grace: Duration) -> Self {
        self.late_grace = grace;
        self
    }

    pub fn with_trigger_tolerance(mut self, minutes: i64) -> Self {
        self.trigger_tolerance_minutes = minutes.max(0);
        self
    }

    /// Structural checks that do not depend on which trigger runs.
    pub fn validate(&self) -> Result<(), BookingError> {
        let url = url::Url::parse(self.site_url.trim())
            .map_err(|e| BookingError::Configuration(format!("site_url '{}' is invalid: {e}", self.site_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(BookingError::Configuration(format!(
                "site_url must be http(s), got '{}'",
                url.scheme()
            )));
        }

        if self.schedule.is_empty() {
            return Err(BookingError::Configuration("no booking rules configured".to_string()));
        }
        for rule in self.schedule.rules() {
            self.contacts.for_rule(rule)?;
        }

        if self.waits.page.is_zero() || self.waits.control.is_zero() {
            return Err(BookingError::Configuration("wait budgets must be non-zero".to_string()));
        }
        Ok(())
    }
}
