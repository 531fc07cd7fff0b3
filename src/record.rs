//! Recipient records as kept by the document store.

use hamcert_types::{FieldValues, Role};
use serde::{Deserialize, Serialize};

/// One contact entry on a recipient's record.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    #[serde(default)]
    pub band: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rst: Option<i64>,
}

impl Attributes {
    /// `"<frequency> - <band>"`, or whichever half is present.
    pub fn frequency_label(&self) -> Option<String> {
        let frequency = self.frequency.trim();
        let band = self.band.trim();
        match (frequency.is_empty(), band.is_empty()) {
            (false, false) => Some(format!("{} - {}", frequency, band)),
            (false, true) => Some(frequency.to_string()),
            (true, false) => Some(band.to_string()),
            (true, true) => None,
        }
    }
}

/// A certificate recipient.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Identity {
    pub call_sign: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub certificate_number: String,
    #[serde(default)]
    pub event_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attributes>,
    #[serde(default)]
    pub is_fulfilled: bool,
    #[serde(default)]
    pub download_count: i32,
}

impl Identity {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Display strings for this recipient using the contact at `attribute_index`.
    pub fn field_values(&self, attribute_index: usize) -> FieldValues {
        let mut values = FieldValues::new()
            .with(Role::CallSign, self.call_sign.as_str())
            .with(Role::RecipientName, self.name.as_str());

        match self.attributes.get(attribute_index) {
            Some(attributes) => {
                if let Some(label) = attributes.frequency_label() {
                    values.insert(Role::Frequency, label);
                }
            }
            None => log::debug!(
                "{} has no attribute #{}; frequency left empty",
                self.call_sign,
                attribute_index
            ),
        }
        values
    }
}
