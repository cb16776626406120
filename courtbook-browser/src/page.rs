//! `BookingPage` over a CDP page session.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use courtbook_core::{BookingPage, ElementHandle, PageElement, PageError, PageLayout};

use crate::error::CdpError;
use crate::script;
use crate::session::PageSession;

/// Element snapshot as returned by the enumeration scripts.
#[derive(Debug, Clone, Deserialize)]
struct RawElement {
    #[serde(rename = "ref")]
    reference: String,
    date: Option<String>,
    text: String,
    label: String,
    disabled: bool,
    visible: bool,
}

impl RawElement {
    /// `marker`: aria-label substring that must be present for the element to
    /// count as available. Empty means "enabled is enough".
    fn into_element(self, marker: &str) -> PageElement {
        let available = !self.disabled && (marker.is_empty() || self.label.contains(marker));
        let display_text = if self.text.is_empty() { self.label } else { self.text };
        PageElement {
            handle: ElementHandle(self.reference),
            available,
            enabled: !self.disabled,
            visible: self.visible,
            date_value: self
                .date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok()),
            display_text: Some(display_text).filter(|t| !t.is_empty()),
        }
    }
}

pub struct CdpBookingPage {
    session: PageSession,
    layout: PageLayout,
    generation: AtomicU64,
}

impl CdpBookingPage {
    pub fn new(session: PageSession, layout: PageLayout) -> Self {
        Self {
            session,
            layout,
            generation: AtomicU64::new(1),
        }
    }

    pub fn session(&self) -> &PageSession {
        &self.session
    }

    async fn enumerate(&self, js: String, marker: &str) -> Result<Vec<PageElement>, PageError> {
        let value = self.session.evaluate(&js).await?;
        let raw: Vec<RawElement> = match value {
            // Null when the document is mid-navigation.
            Value::Null => Vec::new(),
            v => serde_json::from_value(v).map_err(CdpError::from)?,
        };
        Ok(raw.into_iter().map(|r| r.into_element(marker)).collect())
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed)
    }

    async fn eval_bool(&self, js: &str) -> Result<bool, PageError> {
        Ok(self.session.evaluate(js).await?.as_bool().unwrap_or(false))
    }
}

#[async_trait]
impl BookingPage for CdpBookingPage {
    async fn open(&self, url: &str) -> Result<(), PageError> {
        self.session.navigate(url).await.map_err(|e| match e {
            CdpError::NavigationFailed(msg) => PageError::Fatal(msg),
            other => other.into(),
        })
    }

    async fn calendar_days(&self) -> Result<Vec<PageElement>, PageError> {
        let js = script::select_all(&self.layout.calendar_day_selector, self.next_generation());
        self.enumerate(js, &self.layout.available_day_marker).await
    }

    async fn time_slots(&self) -> Result<Vec<PageElement>, PageError> {
        let js = script::select_all(&self.layout.time_slot_selector, self.next_generation());
        self.enumerate(js, "").await
    }

    async fn controls(&self, label: &str) -> Result<Vec<PageElement>, PageError> {
        let js = script::buttons_labelled(label, self.next_generation());
        self.enumerate(js, "").await
    }

    async fn has_field(&self, field_id: &str) -> Result<bool, PageError> {
        self.eval_bool(&script::field_exists(field_id)).await
    }

    async fn activate(&self, element: &ElementHandle) -> Result<(), PageError> {
        if self.eval_bool(&script::click_ref(&element.0)).await? {
            Ok(())
        } else {
            Err(PageError::NotFound(format!("element {element} is no longer attached")))
        }
    }

    async fn write_field(&self, field_id: &str, value: &str) -> Result<(), PageError> {
        if !self.eval_bool(&script::focus_field(field_id)).await? {
            return Err(PageError::NotFound(format!("field #{field_id}")));
        }
        self.session.insert_text(value).await?;
        self.eval_bool(&script::commit_field(field_id)).await?;
        debug!(field_id, len = value.len(), "typed into field");
        Ok(())
    }

    async fn contains_text(&self, text: &str) -> Result<bool, PageError> {
        self.eval_bool(&script::body_contains(text)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(label: &str, disabled: bool) -> RawElement {
        RawElement {
            reference: "2-0".into(),
            date: Some("2026-10-21".into()),
            text: "21".into(),
            label: label.into(),
            disabled,
            visible: true,
        }
    }

    #[test]
    fn available_day_needs_marker_in_label() {
        let el = raw("Wednesday, October 21 - Times available", false).into_element("Times available");
        assert!(el.available);
        assert_eq!(el.date_value, NaiveDate::from_ymd_opt(2026, 10, 21));
        assert_eq!(el.handle.0, "2-0");

        let el = raw("Wednesday, October 21 - No times available", false).into_element("Times available");
        assert!(!el.available);
    }

    #[test]
    fn disabled_element_is_never_available() {
        let el = raw("Times available", true).into_element("");
        assert!(!el.available);
        assert!(!el.enabled);
    }

    #[test]
    fn label_stands_in_for_empty_text() {
        let mut r = raw("7:00pm", false);
        r.text.clear();
        r.date = None;
        let el = r.into_element("");
        assert_eq!(el.display_text.as_deref(), Some("7:00pm"));
        assert!(el.date_value.is_none());
    }

    #[test]
    fn parses_snapshot_json() {
        let v: Vec<RawElement> = serde_json::from_str(
            r#"[{"ref":"1-0","date":null,"text":"7:00pm","label":"","disabled":false,"visible":true}]"#,
        )
        .unwrap();
        assert_eq!(v[0].reference, "1-0");
        assert!(v[0].date.is_none());
    }
}
