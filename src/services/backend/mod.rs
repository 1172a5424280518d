//! Boundary to the club scheduling server.
//!
//! [`CalendarBackend`] is the seam the controller and the UI talk through.
//! [`HttpBackend`] is the production implementation; tests substitute an
//! in-memory fake. Pushed updates arrive over a [`LiveConnection`].

mod http;
mod live;
mod socket;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::category::Category;
use crate::models::court::Court;
use crate::models::event::{EventDetail, EventRecord};
use crate::services::forms::FormSubmission;

pub use http::HttpBackend;
pub use live::{LiveFeed, LiveMessage, LiveSender, LiveSubscribe};
pub use socket::LiveConnection;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server responded with HTTP status {0}")]
    Status(u16),
    #[error("could not decode server response: {0}")]
    Decode(String),
    #[error("missing configuration: {0}")]
    NotConfigured(&'static str),
}

/// Listing returned for one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayEventsResponse {
    #[serde(default)]
    pub events: Vec<EventRecord>,
    #[serde(default)]
    pub current_date: Option<String>,
    #[serde(default)]
    pub prev_date: Option<String>,
    #[serde(default)]
    pub next_date: Option<String>,
}

/// Field errors are usually lists, but a bare string is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum FieldErrors {
    Many(Vec<String>),
    One(String),
}

impl FieldErrors {
    fn into_vec(self) -> Vec<String> {
        match self {
            FieldErrors::Many(messages) => messages,
            FieldErrors::One(message) => vec![message],
        }
    }
}

/// Raw JSON body of a form post.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Option<BTreeMap<String, FieldErrors>>,
    #[serde(default)]
    confirm_needed: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Interpreted result of a form post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Success { message: Option<String> },
    Invalid { errors: BTreeMap<String, Vec<String>> },
    ConfirmNeeded { message: String },
    Rejected { message: Option<String> },
}

impl From<SubmitResponse> for SubmitOutcome {
    fn from(response: SubmitResponse) -> Self {
        if response.success {
            return SubmitOutcome::Success {
                message: response.message,
            };
        }
        if response.confirm_needed {
            return SubmitOutcome::ConfirmNeeded {
                message: response.message.unwrap_or_default(),
            };
        }

        let errors: BTreeMap<String, Vec<String>> = response
            .errors
            .unwrap_or_default()
            .into_iter()
            .map(|(field, messages)| (field, messages.into_vec()))
            .collect();
        if errors.is_empty() {
            SubmitOutcome::Rejected {
                message: response.message,
            }
        } else {
            SubmitOutcome::Invalid { errors }
        }
    }
}

impl SubmitOutcome {
    pub fn from_json(body: &str) -> Result<Self, BackendError> {
        serde_json::from_str::<SubmitResponse>(body)
            .map(SubmitOutcome::from)
            .map_err(|err| BackendError::Decode(err.to_string()))
    }
}

/// Category and court options for the game form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormChoices {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub courts: Vec<Court>,
}

impl FormChoices {
    /// Server categories followed by any category seen on screen that the
    /// server list lacks. Entries without an id cannot be posted and are
    /// left out.
    pub fn categories_with(&self, on_screen: &[Category]) -> Vec<Category> {
        let mut merged: Vec<Category> = self
            .categories
            .iter()
            .filter(|category| category.id.is_some())
            .cloned()
            .collect();
        for category in on_screen {
            if category.id.is_some() && !merged.iter().any(|known| known.id == category.id) {
                merged.push(category.clone());
            }
        }
        merged
    }

    pub fn court_name(&self, court_id: &str) -> Option<&str> {
        self.courts
            .iter()
            .find(|court| court.id.map(|id| id.to_string()).as_deref() == Some(court_id))
            .map(|court| court.name.as_str())
    }
}

/// Requests the calendar needs from the server.
pub trait CalendarBackend {
    fn fetch_day(&self, date: NaiveDate) -> Result<DayEventsResponse, BackendError>;

    fn fetch_event_detail(&self, game_id: i64) -> Result<EventDetail, BackendError>;

    fn fetch_court(&self, court_id: i64) -> Result<Court, BackendError>;

    fn fetch_form_choices(&self) -> Result<FormChoices, BackendError>;

    fn submit(&self, submission: &FormSubmission) -> Result<SubmitOutcome, BackendError>;
}
