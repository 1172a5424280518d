//! Category model for grouping games.
//!
//! Categories (Training, Match, Lesson, ...) carry the colour used for the
//! tile background and the side bar of every game in that category.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::event::EventRecord;

/// Longest name the server accepts.
const MAX_NAME_LEN: usize = 255;

/// A category for organizing games.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// Server primary key, absent for categories not created yet
    pub id: Option<i64>,
    /// Display name of the category
    pub name: String,
    /// Hex color code (`#RRGGBB`)
    pub color: String,
}

impl Category {
    /// Create a new category with the given name and color.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            color: color.into(),
        }
    }

    /// Validate the category before it is posted.
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(CategoryValidationError::NameTooLong);
        }
        if !is_valid_hex_color(&self.color) {
            return Err(CategoryValidationError::InvalidColor);
        }
        Ok(())
    }

    /// Form fields for the category form.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            ("name".to_string(), self.name.trim().to_string()),
            ("color".to_string(), self.color.trim().to_string()),
        ]
    }
}

/// Validation errors for Category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryValidationError {
    #[error("Category name cannot be empty")]
    EmptyName,
    #[error("Category name must be 255 characters or less")]
    NameTooLong,
    #[error("Invalid color format (use hex like #FF0000)")]
    InvalidColor,
}

/// Check if a string is a `#RRGGBB` color code.
pub fn is_valid_hex_color(color: &str) -> bool {
    let color = color.trim();
    let Some(hex) = color.strip_prefix('#') else {
        return false;
    };
    hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Categories referenced by a set of games, ordered by name.
///
/// The server does not list categories separately, so the filter checkboxes
/// are built from what the current listing contains.
pub fn categories_in(events: &[EventRecord]) -> Vec<Category> {
    let mut by_name: BTreeMap<String, Category> = BTreeMap::new();
    for event in events {
        let Some(name) = event.category_name.as_ref() else {
            continue;
        };
        by_name.entry(name.clone()).or_insert_with(|| Category {
            id: event.category_id,
            name: name.clone(),
            color: event
                .category_color
                .clone()
                .unwrap_or_else(|| "#DDDDDD".to_string()),
        });
    }
    by_name.into_values().collect()
}
