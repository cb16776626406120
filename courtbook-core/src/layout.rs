//! Where things live on the booking page.

use serde::{Deserialize, Serialize};

use crate::profile::ContactField;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    /// CSS selector for calendar day cells carrying a `data-date` attribute.
    pub calendar_day_selector: String,
    /// Substring of a day's aria-label marking it bookable. Empty: any
    /// enabled day is bookable.
    pub available_day_marker: String,
    pub time_slot_selector: String,
    pub next_label: String,
    pub schedule_label: String,
    /// Text that must appear once the booking is confirmed. Empty skips the check.
    pub confirmation_text: String,
    pub fields: FormFieldIds,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            calendar_day_selector: "button[data-date]".to_string(),
            available_day_marker: "Times available".to_string(),
            time_slot_selector: "button[data-container='time-button']".to_string(),
            next_label: "Next".to_string(),
            schedule_label: "Schedule".to_string(),
            confirmation_text: "You are scheduled".to_string(),
            fields: FormFieldIds::default(),
        }
    }
}

/// Element ids of the contact form inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormFieldIds {
    pub full_name: String,
    pub email: String,
    pub building_name: String,
    pub unit_number: String,
    pub party_count: String,
    pub phone_number: String,
}

impl Default for FormFieldIds {
    fn default() -> Self {
        Self {
            full_name: "full_name_input".to_string(),
            email: "email_input".to_string(),
            building_name: "1bT3Iu2abRAKqjda6jqLu".to_string(),
            unit_number: "tCGwp8nKnr6eDQuqH1Z7F".to_string(),
            party_count: "eMqYw4Nb4Cd2DDrjBwbbm".to_string(),
            phone_number: "B-IUGCRB09hRLI1QXjzeI".to_string(),
        }
    }
}

impl FormFieldIds {
    pub fn id_for(&self, field: ContactField) -> &str {
        match field {
            ContactField::FullName => &self.full_name,
            ContactField::Email => &self.email,
            ContactField::BuildingName => &self.building_name,
            ContactField::UnitNumber => &self.unit_number,
            ContactField::PartyCount => &self.party_count,
            ContactField::PhoneNumber => &self.phone_number,
        }
    }

    /// The field whose appearance marks the form step as rendered.
    pub fn first(&self) -> &str {
        self.id_for(ContactField::ALL[0])
    }
}
