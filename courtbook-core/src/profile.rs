//! Contact profiles submitted on the booking form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::BookingError;
use crate::schedule::BookingRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    FullName,
    Email,
    BuildingName,
    UnitNumber,
    PartyCount,
    PhoneNumber,
}

impl ContactField {
    pub const ALL: [ContactField; 6] = [
        ContactField::FullName,
        ContactField::Email,
        ContactField::BuildingName,
        ContactField::UnitNumber,
        ContactField::PartyCount,
        ContactField::PhoneNumber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactField::FullName => "full_name",
            ContactField::Email => "email",
            ContactField::BuildingName => "building_name",
            ContactField::UnitNumber => "unit_number",
            ContactField::PartyCount => "party_count",
            ContactField::PhoneNumber => "phone_number",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactProfile {
    pub full_name: String,
    pub email: String,
    pub building_name: String,
    pub unit_number: String,
    pub party_count: String,
    pub phone_number: String,
}

impl ContactProfile {
    pub fn get(&self, field: ContactField) -> &str {
        match field {
            ContactField::FullName => &self.full_name,
            ContactField::Email => &self.email,
            ContactField::BuildingName => &self.building_name,
            ContactField::UnitNumber => &self.unit_number,
            ContactField::PartyCount => &self.party_count,
            ContactField::PhoneNumber => &self.phone_number,
        }
    }

    pub fn set(&mut self, field: ContactField, value: impl Into<String>) {
        let slot = match field {
            ContactField::FullName => &mut self.full_name,
            ContactField::Email => &mut self.email,
            ContactField::BuildingName => &mut self.building_name,
            ContactField::UnitNumber => &mut self.unit_number,
            ContactField::PartyCount => &mut self.party_count,
            ContactField::PhoneNumber => &mut self.phone_number,
        };
        *slot = value.into();
    }

    pub fn missing_fields(&self) -> Vec<ContactField> {
        ContactField::ALL
            .into_iter()
            .filter(|f| self.get(*f).trim().is_empty())
            .collect()
    }

    /// All fields must be non-empty before anything is written to the form.
    pub fn validate(&self) -> Result<(), BookingError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            return Ok(());
        }
        let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
        Err(BookingError::Configuration(format!(
            "contact profile is missing: {}",
            names.join(", ")
        )))
    }
}

/// Named profiles; each booking rule selects one by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDirectory {
    profiles: BTreeMap<String, ContactProfile>,
}

impl ContactDirectory {
    pub fn new(profiles: BTreeMap<String, ContactProfile>) -> Self {
        Self { profiles }
    }

    pub fn get(&self, name: &str) -> Option<&ContactProfile> {
        self.profiles.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn for_rule(&self, rule: &BookingRule) -> Result<&ContactProfile, BookingError> {
        self.get(&rule.contact).ok_or_else(|| {
            BookingError::Configuration(format!(
                "trigger '{}' uses contact profile '{}', which is not configured",
                rule.trigger, rule.contact
            ))
        })
    }
}
