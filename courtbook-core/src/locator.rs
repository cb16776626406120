//! Finding the calendar day and time slot that match a resolved target.

use std::time::Duration;

use tracing::debug;

use crate::error::{BookingError, PageError};
use crate::page::{BookingPage, PageElement};
use crate::resolver::ResolvedTarget;
use crate::time_match::matches_time;
use crate::wait::{Probe, WaitError, poll_until};
use crate::wizard::Step;

/// First available day (document order) whose date equals the target.
/// Unavailable or disabled days are skipped even when the date matches.
pub fn select_date<'a>(days: &'a [PageElement], target: &ResolvedTarget) -> Option<&'a PageElement> {
    days.iter()
        .find(|d| d.available && d.enabled && d.date_value == Some(target.date))
}

/// First visible, enabled slot (document order) whose text matches the target time.
pub fn select_time<'a>(slots: &'a [PageElement], target: &ResolvedTarget) -> Option<&'a PageElement> {
    slots
        .iter()
        .find(|s| s.is_actionable() && matches_time(s.text(), target.time_of_day))
}

pub struct SlotLocator<'a, P: BookingPage> {
    page: &'a P,
    poll_interval: Duration,
}

impl<'a, P: BookingPage> SlotLocator<'a, P> {
    pub fn new(page: &'a P, poll_interval: Duration) -> Self {
        Self { page, poll_interval }
    }

    /// Wait up to `budget` for a bookable day matching the target.
    pub async fn locate_date(&self, target: &ResolvedTarget, budget: Duration) -> Result<PageElement, BookingError> {
        let page = self.page;
        let found = poll_until(budget, self.poll_interval, || async move {
            let days = page.calendar_days().await?;
            debug!(count = days.len(), "calendar days rendered");
            Ok::<_, PageError>(match select_date(&days, target) {
                Some(day) => Probe::Ready(day.clone()),
                None => Probe::Absent,
            })
        })
        .await;

        found.map_err(|e| match e {
            WaitError::Elapsed { .. } => BookingError::ElementNotFound {
                step: Step::SelectDate,
                detail: format!("no bookable day for {}", target.date_string()),
            },
            WaitError::Page(err) => BookingError::from_page(Step::SelectDate, err),
        })
    }

    /// Wait up to `budget` for an enabled slot matching the target time.
    pub async fn locate_time(&self, target: &ResolvedTarget, budget: Duration) -> Result<PageElement, BookingError> {
        let page = self.page;
        let found = poll_until(budget, self.poll_interval, || async move {
            let slots = page.time_slots().await?;
            debug!(count = slots.len(), "time slots rendered");
            Ok::<_, PageError>(match select_time(&slots, target) {
                Some(slot) => Probe::Ready(slot.clone()),
                None => Probe::Absent,
            })
        })
        .await;

        found.map_err(|e| match e {
            WaitError::Elapsed { .. } => BookingError::ElementNotFound {
                step: Step::SelectTime,
                detail: format!("no enabled slot at {} on {}", target.time_string(), target.date_string()),
            },
            WaitError::Page(err) => BookingError::from_page(Step::SelectTime, err),
        })
    }
}
