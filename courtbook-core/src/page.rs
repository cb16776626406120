//! Typed page access.
//!
//! The wizard never touches DOM attributes directly; a [`BookingPage`]
//! implementation answers with structured [`PageElement`] snapshots.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PageError;

/// Opaque reference to an element from the most recent query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub String);

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of one candidate element. Valid for a single wizard step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageElement {
    pub handle: ElementHandle,
    /// The page marks this element as bookable.
    pub available: bool,
    /// Not disabled (attribute or class).
    pub enabled: bool,
    /// Rendered with a non-empty box.
    pub visible: bool,
    pub date_value: Option<NaiveDate>,
    pub display_text: Option<String>,
}

impl PageElement {
    pub fn is_actionable(&self) -> bool {
        self.enabled && self.visible
    }

    pub fn text(&self) -> &str {
        self.display_text.as_deref().unwrap_or("")
    }
}

#[async_trait]
pub trait BookingPage: Send + Sync {
    /// Navigate to the booking site and wait for the document to load.
    async fn open(&self, url: &str) -> Result<(), PageError>;

    /// Calendar day cells, in document order.
    async fn calendar_days(&self) -> Result<Vec<PageElement>, PageError>;

    /// Time slot buttons for the selected day, in document order.
    async fn time_slots(&self) -> Result<Vec<PageElement>, PageError>;

    /// Buttons whose text contains `label`, in document order.
    async fn controls(&self, label: &str) -> Result<Vec<PageElement>, PageError>;

    /// Whether an input with this element id is rendered.
    async fn has_field(&self, field_id: &str) -> Result<bool, PageError>;

    /// Click a previously returned element.
    async fn activate(&self, element: &ElementHandle) -> Result<(), PageError>;

    /// Type `value` into the input with this element id.
    async fn write_field(&self, field_id: &str, value: &str) -> Result<(), PageError>;

    /// Whether the visible page text contains `text`.
    async fn contains_text(&self, text: &str) -> Result<bool, PageError>;
}
