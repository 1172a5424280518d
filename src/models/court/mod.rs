//! Court model.
//!
//! Courts are the bookable resources a game takes place on. Staff users can
//! add, edit and delete them from the courts form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Court {
    #[serde(default, alias = "court_id")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub building_number: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CourtValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{field} must be {max} characters or less")]
    TooLong { field: &'static str, max: usize },
}

impl Court {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// `(field, value, max length)` in the order the form shows them.
    fn fields(&self) -> [(&'static str, &str, usize); 6] {
        [
            ("name", self.name.as_str(), 255),
            ("building_number", self.building_number.as_str(), 10),
            ("street", self.street.as_str(), 255),
            ("postal_code", self.postal_code.as_str(), 20),
            ("city", self.city.as_str(), 255),
            ("country", self.country.as_str(), 255),
        ]
    }

    pub fn validate(&self) -> Result<(), CourtValidationError> {
        for (field, value, max) in self.fields() {
            let value = value.trim();
            if value.is_empty() {
                return Err(CourtValidationError::MissingField(field));
            }
            if value.len() > max {
                return Err(CourtValidationError::TooLong { field, max });
            }
        }
        Ok(())
    }

    /// Form fields for the court form.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        self.fields()
            .iter()
            .map(|(field, value, _)| (field.to_string(), value.trim().to_string()))
            .collect()
    }

    /// One-line address for lists.
    pub fn address(&self) -> String {
        format!(
            "{} {}, {} {}, {}",
            self.street, self.building_number, self.postal_code, self.city, self.country
        )
    }
}
