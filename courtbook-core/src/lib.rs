//! courtbook-core: target resolution and reservation-wizard engine.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod form;
pub mod layout;
pub mod locator;
pub mod page;
pub mod profile;
pub mod resolver;
pub mod schedule;
pub mod session;
pub mod time_match;
pub mod trigger;
pub mod wait;
pub mod wizard;

pub use config::BookingConfig;
pub use coordinator::{BookingOutcome, RunCoordinator, RunPlan, plan_run};
pub use error::{BookingError, ErrorKind, FailureReport, PageError};
pub use form::ContactFormFiller;
pub use layout::{FormFieldIds, PageLayout};
pub use locator::{SlotLocator, select_date, select_time};
pub use page::{BookingPage, ElementHandle, PageElement};
pub use profile::{ContactDirectory, ContactField, ContactProfile};
pub use resolver::{ResolvedTarget, TriggerResolver};
pub use schedule::{BookingRule, BookingSchedule, LEAD_TIME_HOURS, default_rules};
pub use session::{BrowserSession, SessionFactory};
pub use time_match::{matches_time, parse_display_time, parse_target_time};
pub use trigger::{TriggerKey, TriggerSpec, weekday_name};
pub use wait::WaitBudgets;
pub use wizard::{Step, WizardDriver, WizardState};
