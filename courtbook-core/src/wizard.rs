//! The reservation wizard: date -> time -> contact form -> confirmation.
//!
//! The state machine is strictly linear. A failed step moves the wizard to
//! `Failed` and every later call is rejected; nothing is retried here.

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::{BookingError, PageError};
use crate::form::ContactFormFiller;
use crate::layout::PageLayout;
use crate::locator::SlotLocator;
use crate::page::{BookingPage, PageElement};
use crate::profile::ContactProfile;
use crate::resolver::ResolvedTarget;
use crate::wait::{Probe, WaitBudgets, WaitError, poll_until};

/// Named unit of work, used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    OpenSite,
    SelectDate,
    SelectTime,
    AdvanceToForm,
    FillForm,
    Submit,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::OpenSite => "open-site",
            Step::SelectDate => "select-date",
            Step::SelectTime => "select-time",
            Step::AdvanceToForm => "advance-to-form",
            Step::FillForm => "fill-form",
            Step::Submit => "submit",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    Idle,
    DateSelected,
    TimeSelected,
    FormFilled,
    Submitted,
    Failed(String),
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardState::Idle => f.write_str("Idle"),
            WizardState::DateSelected => f.write_str("DateSelected"),
            WizardState::TimeSelected => f.write_str("TimeSelected"),
            WizardState::FormFilled => f.write_str("FormFilled"),
            WizardState::Submitted => f.write_str("Submitted"),
            WizardState::Failed(reason) => write!(f, "Failed({reason})"),
        }
    }
}

pub struct WizardDriver<'a, P: BookingPage> {
    page: &'a P,
    layout: &'a PageLayout,
    waits: WaitBudgets,
    state: WizardState,
    /// The contact form has rendered (set by `advance_to_form`).
    form_open: bool,
    selected_slot: Option<String>,
}

impl<'a, P: BookingPage> WizardDriver<'a, P> {
    pub fn new(page: &'a P, layout: &'a PageLayout, waits: WaitBudgets) -> Self {
        Self {
            page,
            layout,
            waits,
            state: WizardState::Idle,
            form_open: false,
            selected_slot: None,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Display text of the slot that was clicked, once one has been.
    pub fn selected_slot(&self) -> Option<&str> {
        self.selected_slot.as_deref()
    }

    pub async fn select_date(&mut self, target: &ResolvedTarget) -> Result<(), BookingError> {
        self.enter(Step::SelectDate)?;
        let locator = SlotLocator::new(self.page, self.waits.poll_interval);
        let result = match locator.locate_date(target, self.waits.page).await {
            Ok(day) => self.activate(Step::SelectDate, &day).await,
            Err(e) => Err(e),
        };
        self.settle(Step::SelectDate, result, WizardState::DateSelected)
    }

    pub async fn select_time(&mut self, target: &ResolvedTarget) -> Result<(), BookingError> {
        self.enter(Step::SelectTime)?;
        let locator = SlotLocator::new(self.page, self.waits.poll_interval);
        let result = match locator.locate_time(target, self.waits.page).await {
            Ok(slot) => {
                self.selected_slot = Some(slot.text().trim().to_string());
                self.activate(Step::SelectTime, &slot).await
            }
            Err(e) => Err(e),
        };
        self.settle(Step::SelectTime, result, WizardState::TimeSelected)
    }

    /// Click "Next" and wait for the contact form to render.
    pub async fn advance_to_form(&mut self) -> Result<(), BookingError> {
        self.enter(Step::AdvanceToForm)?;
        let result = self.advance_to_form_inner().await;
        self.settle(Step::AdvanceToForm, result, WizardState::TimeSelected)?;
        self.form_open = true;
        Ok(())
    }

    async fn advance_to_form_inner(&self) -> Result<(), BookingError> {
        let next = self.wait_for_control(Step::AdvanceToForm, &self.layout.next_label).await?;
        self.activate(Step::AdvanceToForm, &next).await?;

        let page = self.page;
        let first_field = self.layout.fields.first();
        poll_until(self.waits.control, self.waits.poll_interval, || async move {
            Ok::<_, PageError>(if page.has_field(first_field).await? {
                Probe::Ready(())
            } else {
                Probe::Absent
            })
        })
        .await
        .map_err(|e| Self::wait_failure(Step::AdvanceToForm, e, format!("contact field '{first_field}'")))
    }

    pub async fn fill_form(&mut self, profile: &ContactProfile) -> Result<(), BookingError> {
        self.enter(Step::FillForm)?;
        let filler = ContactFormFiller::new(&self.layout.fields);
        let result = filler.fill(self.page, profile).await.map(|written| {
            debug!(written, "contact form filled");
        });
        self.settle(Step::FillForm, result, WizardState::FormFilled)
    }

    /// Click "Schedule" and wait for the confirmation marker.
    pub async fn submit(&mut self) -> Result<(), BookingError> {
        self.enter(Step::Submit)?;
        let result = self.submit_inner().await.map_err(|e| match e {
            BookingError::Submission(_) => e,
            other => BookingError::Submission(other.to_string()),
        });
        self.settle(Step::Submit, result, WizardState::Submitted)
    }

    async fn submit_inner(&self) -> Result<(), BookingError> {
        let schedule = self.wait_for_control(Step::Submit, &self.layout.schedule_label).await?;
        self.activate(Step::Submit, &schedule).await?;

        let marker = self.layout.confirmation_text.as_str();
        if marker.is_empty() {
            return Ok(());
        }
        let page = self.page;
        poll_until(self.waits.page, self.waits.poll_interval, || async move {
            Ok::<_, PageError>(if page.contains_text(marker).await? {
                Probe::Ready(())
            } else {
                Probe::Absent
            })
        })
        .await
        .map_err(|e| match e {
            WaitError::Elapsed { .. } => {
                BookingError::Submission(format!("confirmation '{marker}' never appeared"))
            }
            WaitError::Page(err) => BookingError::from_page(Step::Submit, err),
        })
    }

    /// Wait for the first control labelled `label` to become actionable.
    async fn wait_for_control(&self, step: Step, label: &str) -> Result<PageElement, BookingError> {
        let page = self.page;
        poll_until(self.waits.control, self.waits.poll_interval, || async move {
            let controls = page.controls(label).await?;
            Ok::<_, PageError>(match controls.iter().find(|c| c.is_actionable()) {
                Some(c) => Probe::Ready(c.clone()),
                None if controls.is_empty() => Probe::Absent,
                None => Probe::NotActionable,
            })
        })
        .await
        .map_err(|e| Self::wait_failure(step, e, format!("'{label}' control")))
    }

    async fn activate(&self, step: Step, element: &PageElement) -> Result<(), BookingError> {
        debug!(step = %step, handle = %element.handle, text = element.text(), "activating element");
        self.page
            .activate(&element.handle)
            .await
            .map_err(|e| BookingError::from_page(step, e))
    }

    fn wait_failure(step: Step, err: WaitError, what: String) -> BookingError {
        match err {
            WaitError::Elapsed { last_seen_present: true } => BookingError::StepTimeout {
                step,
                detail: format!("{what} present but never actionable"),
            },
            WaitError::Elapsed { last_seen_present: false } => BookingError::ElementNotFound {
                step,
                detail: format!("{what} did not appear"),
            },
            WaitError::Page(e) => BookingError::from_page(step, e),
        }
    }

    fn enter(&mut self, step: Step) -> Result<(), BookingError> {
        let allowed = match step {
            Step::SelectDate => self.state == WizardState::Idle,
            Step::SelectTime => self.state == WizardState::DateSelected,
            Step::AdvanceToForm => self.state == WizardState::TimeSelected && !self.form_open,
            Step::FillForm => self.state == WizardState::TimeSelected && self.form_open,
            Step::Submit => self.state == WizardState::FormFilled,
            Step::OpenSite => false,
        };
        if allowed {
            return Ok(());
        }
        let err = BookingError::InvalidTransition {
            step,
            state: self.state.to_string(),
        };
        if !matches!(self.state, WizardState::Failed(_)) {
            self.state = WizardState::Failed(err.to_string());
        }
        Err(err)
    }

    fn settle(&mut self, step: Step, result: Result<(), BookingError>, next: WizardState) -> Result<(), BookingError> {
        match result {
            Ok(()) => {
                info!(step = %step, state = %next, "wizard advanced");
                self.state = next;
                Ok(())
            }
            Err(err) => {
                warn!(step = %step, error = %err, "wizard step failed");
                self.state = WizardState::Failed(err.to_string());
                Err(err)
            }
        }
    }
}
