//! Bounded "wait until condition or timeout" polling.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use crate::error::PageError;

/// Wait budgets for the two tiers of page readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitBudgets {
    /// Initial page content: calendar, slot list, confirmation.
    pub page: Duration,
    /// Already-rendered interactive controls and form fields.
    pub control: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitBudgets {
    fn default() -> Self {
        Self {
            page: Duration::from_secs(20),
            control: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// One observation of the page.
#[derive(Debug)]
pub enum Probe<T> {
    Ready(T),
    /// Nothing matching is rendered.
    Absent,
    /// A match is rendered but cannot be acted on yet.
    NotActionable,
}

#[derive(Debug)]
pub enum WaitError {
    /// Budget spent; carries the last observation.
    Elapsed { last_seen_present: bool },
    Page(PageError),
}

/// Poll `probe` until it is ready or `budget` is spent.
///
/// Transient page errors count as `Absent` and polling continues; any other
/// page error ends the wait immediately. The probe always runs at least once.
pub async fn poll_until<T, F, Fut>(budget: Duration, interval: Duration, mut probe: F) -> Result<T, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Probe<T>, PageError>>,
{
    let deadline = Instant::now() + budget;
    let mut polls = 0u32;

    loop {
        polls += 1;
        let last_seen_present = match probe().await {
            Ok(Probe::Ready(value)) => return Ok(value),
            Ok(Probe::Absent) => false,
            Ok(Probe::NotActionable) => true,
            Err(err) if err.is_transient() => {
                debug!(error = %err, "transient page error while waiting");
                false
            }
            Err(err) => return Err(WaitError::Page(err)),
        };

        let now = Instant::now();
        if now >= deadline {
            debug!(polls, budget_ms = budget.as_millis() as u64, "wait budget spent");
            return Err(WaitError::Elapsed { last_seen_present });
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}
