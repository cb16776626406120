//! In-memory booking page that reveals each wizard step only after the
//! previous one was clicked, plus a session factory that records releases.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use courtbook_core::{
    BookingConfig, BookingError, BookingPage, BookingSchedule, BrowserSession, ContactDirectory,
    ContactProfile, ElementHandle, PageElement, PageError, SessionFactory, WaitBudgets, default_rules,
};

pub const SITE: &str = "https://calendly.com/court/booking";

#[derive(Debug, Default)]
pub struct PageState {
    pub days: Vec<PageElement>,
    pub slots: Vec<PageElement>,
    pub next_enabled: bool,
    pub show_next: bool,
    pub show_form: bool,
    pub confirms: bool,

    pub opened: Vec<String>,
    pub activated: Vec<String>,
    pub writes: Vec<(String, String)>,
}

pub struct ScriptedPage {
    pub state: Mutex<PageState>,
}

pub fn day(handle: &str, date: &str, available: bool) -> PageElement {
    PageElement {
        handle: ElementHandle(handle.to_string()),
        available,
        enabled: available,
        visible: true,
        date_value: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
        display_text: date.get(8..).map(str::to_string),
    }
}

pub fn slot(handle: &str, text: &str, enabled: bool) -> PageElement {
    PageElement {
        handle: ElementHandle(handle.to_string()),
        available: enabled,
        enabled,
        visible: true,
        date_value: None,
        display_text: Some(text.to_string()),
    }
}

fn control(handle: &str, label: &str, enabled: bool) -> PageElement {
    PageElement {
        handle: ElementHandle(handle.to_string()),
        available: enabled,
        enabled,
        visible: true,
        date_value: None,
        display_text: Some(label.to_string()),
    }
}

impl ScriptedPage {
    /// A page on which booking Wednesday 2026-10-21 at 19:00 succeeds.
    pub fn happy() -> Self {
        Self::with(PageState {
            days: vec![
                day("day-20", "2026-10-20", true),
                day("day-21-full", "2026-10-21", false),
                day("day-21", "2026-10-21", true),
            ],
            slots: vec![
                slot("slot-1800", "6:00pm", true),
                slot("slot-1900-off", "7:00pm", false),
                slot("slot-1900", "7:00pm", true),
            ],
            next_enabled: true,
            show_next: true,
            show_form: true,
            confirms: true,
            ..PageState::default()
        })
    }

    pub fn with(state: PageState) -> Self {
        Self { state: Mutex::new(state) }
    }

    pub fn activated(&self) -> Vec<String> {
        self.state.lock().activated.clone()
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.state.lock().writes.clone()
    }

    fn clicked(&self, handle: &str) -> bool {
        self.state.lock().activated.iter().any(|h| h == handle)
    }

    fn clicked_prefix(&self, prefix: &str) -> bool {
        self.state.lock().activated.iter().any(|h| h.starts_with(prefix))
    }
}

#[async_trait]
impl BookingPage for ScriptedPage {
    async fn open(&self, url: &str) -> Result<(), PageError> {
        self.state.lock().opened.push(url.to_string());
        Ok(())
    }

    async fn calendar_days(&self) -> Result<Vec<PageElement>, PageError> {
        Ok(self.state.lock().days.clone())
    }

    async fn time_slots(&self) -> Result<Vec<PageElement>, PageError> {
        if !self.clicked_prefix("day-") {
            return Ok(vec![]);
        }
        Ok(self.state.lock().slots.clone())
    }

    async fn controls(&self, label: &str) -> Result<Vec<PageElement>, PageError> {
        let state = self.state.lock();
        let clicked = |p: &str| state.activated.iter().any(|h| h.starts_with(p));
        Ok(match label {
            "Next" if state.show_next && clicked("slot-") => vec![control("next", "Next", state.next_enabled)],
            "Schedule" if clicked("next") => vec![control("schedule", "Schedule Event", true)],
            _ => vec![],
        })
    }

    async fn has_field(&self, field_id: &str) -> Result<bool, PageError> {
        let show_form = self.state.lock().show_form;
        Ok(show_form && self.clicked("next") && !field_id.is_empty())
    }

    async fn activate(&self, element: &ElementHandle) -> Result<(), PageError> {
        self.state.lock().activated.push(element.0.clone());
        Ok(())
    }

    async fn write_field(&self, field_id: &str, value: &str) -> Result<(), PageError> {
        if !self.clicked("next") {
            return Err(PageError::NotFound(format!("#{field_id}")));
        }
        self.state
            .lock()
            .writes
            .push((field_id.to_string(), value.to_string()));
        Ok(())
    }

    async fn contains_text(&self, text: &str) -> Result<bool, PageError> {
        let confirms = self.state.lock().confirms;
        Ok(confirms && self.clicked("schedule") && text == "You are scheduled")
    }
}

pub fn profile(email: &str) -> ContactProfile {
    ContactProfile {
        full_name: "Sam Rivera".into(),
        email: email.into(),
        building_name: "Noor 7".into(),
        unit_number: "315".into(),
        party_count: "2".into(),
        phone_number: "501506191".into(),
    }
}

pub fn fast_waits() -> WaitBudgets {
    WaitBudgets {
        page: Duration::from_millis(60),
        control: Duration::from_millis(40),
        poll_interval: Duration::from_millis(5),
    }
}

pub fn config() -> BookingConfig {
    let mut profiles = BTreeMap::new();
    profiles.insert("primary".to_string(), profile("primary@example.com"));
    profiles.insert("secondary".to_string(), profile("secondary@example.com"));
    BookingConfig::new(
        SITE,
        BookingSchedule::new(default_rules()).unwrap(),
        ContactDirectory::new(profiles),
    )
    .with_waits(fast_waits())
}

/// Shared event log so tests can check acquire/release ordering.
#[derive(Clone, Default)]
pub struct Journal(pub Arc<Mutex<Vec<&'static str>>>);

impl Journal {
    pub fn events(&self) -> Vec<&'static str> {
        self.0.lock().clone()
    }

    fn push(&self, event: &'static str) {
        self.0.lock().push(event);
    }
}

pub struct ScriptedFactory {
    pub page: Arc<ScriptedPage>,
    pub journal: Journal,
    pub fail_acquire: bool,
}

impl ScriptedFactory {
    pub fn new(page: ScriptedPage) -> Self {
        Self {
            page: Arc::new(page),
            journal: Journal::default(),
            fail_acquire: false,
        }
    }
}

pub struct ScriptedSession {
    page: Arc<ScriptedPage>,
    journal: Journal,
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    type Session = ScriptedSession;

    async fn acquire(&self) -> Result<ScriptedSession, BookingError> {
        if self.fail_acquire {
            return Err(BookingError::Browser("chrome failed to start".into()));
        }
        self.journal.push("acquire");
        Ok(ScriptedSession {
            page: self.page.clone(),
            journal: self.journal.clone(),
        })
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    type Page = ScriptedPage;

    fn page(&self) -> &ScriptedPage {
        &self.page
    }

    async fn release(self) -> Result<(), BookingError> {
        self.journal.push("release");
        Ok(())
    }
}
