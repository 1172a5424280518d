use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::blocking::{Client, Response};
use reqwest::header;
use serde::de::DeserializeOwned;

use super::{BackendError, CalendarBackend, DayEventsResponse, FormChoices, SubmitOutcome};
use crate::models::court::Court;
use crate::models::event::EventDetail;
use crate::models::settings::Settings;
use crate::services::forms::{FormKind, FormSubmission};
use crate::utils::date::to_iso;

const CSRF_HEADER: &str = "X-CSRFToken";
const AJAX_HEADER: &str = "X-Requested-With";
const AJAX_VALUE: &str = "XMLHttpRequest";

/// Blocking HTTP client for the scheduling server.
///
/// Calls block the caller, so the UI runs them on worker threads.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    form_path: String,
    courts_path: String,
    csrf_token: Option<String>,
}

impl HttpBackend {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build calendar HTTP client")?;

        let csrf_token = settings
            .csrf_token
            .as_ref()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());
        if csrf_token.is_none() {
            log::warn!("No CSRF token configured; creating, editing and deleting are disabled");
        }

        Ok(Self {
            client,
            base_url: settings.base_url().to_string(),
            form_path: settings.form_path.clone(),
            courts_path: settings.courts_path.clone(),
            csrf_token,
        })
    }

    /// Whether form posts can be sent at all.
    pub fn can_post(&self) -> bool {
        self.csrf_token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn path_for(&self, kind: FormKind) -> &str {
        match kind {
            FormKind::Court => &self.courts_path,
            FormKind::Game | FormKind::Category => &self.form_path,
        }
    }

    fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().unwrap_or_default();
            log::warn!("Server responded with {}: {}", status, body.trim());
            Err(BackendError::Status(status.as_u16()))
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BackendError> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(AJAX_HEADER, AJAX_VALUE)
            .send()
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        Self::check_status(response)?
            .json::<T>()
            .map_err(|err| BackendError::Decode(err.to_string()))
    }

    fn post_form(&self, path: &str, body: &[(String, String)]) -> Result<String, BackendError> {
        let token = self
            .csrf_token
            .as_deref()
            .ok_or(BackendError::NotConfigured("csrf_token"))?;

        let response = self
            .client
            .post(self.url(path))
            .header(header::ACCEPT, "application/json")
            .header(CSRF_HEADER, token)
            .header(AJAX_HEADER, AJAX_VALUE)
            .form(body)
            .send()
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        Self::check_status(response)?
            .text()
            .map_err(|err| BackendError::Transport(err.to_string()))
    }
}

impl CalendarBackend for HttpBackend {
    fn fetch_day(&self, date: NaiveDate) -> Result<DayEventsResponse, BackendError> {
        let url = format!(
            "{}?date={}",
            self.url(&self.form_path),
            urlencoding::encode(&to_iso(date))
        );
        log::debug!("Fetching games from {}", url);
        self.get_json(&url)
    }

    fn fetch_event_detail(&self, game_id: i64) -> Result<EventDetail, BackendError> {
        let url = format!(
            "{}?game_id={}&fetch_game_details=true",
            self.url(&self.form_path),
            urlencoding::encode(&game_id.to_string())
        );
        self.get_json(&url)
    }

    fn fetch_court(&self, court_id: i64) -> Result<Court, BackendError> {
        let body = vec![
            ("fetch_court_data".to_string(), "true".to_string()),
            ("court_id".to_string(), court_id.to_string()),
        ];
        let text = self.post_form(&self.courts_path, &body)?;
        let mut court: Court =
            serde_json::from_str(&text).map_err(|err| BackendError::Decode(err.to_string()))?;
        court.id.get_or_insert(court_id);
        Ok(court)
    }

    fn fetch_form_choices(&self) -> Result<FormChoices, BackendError> {
        let url = format!("{}?fetch_form_choices=true", self.url(&self.form_path));
        self.get_json(&url)
    }

    fn submit(&self, submission: &FormSubmission) -> Result<SubmitOutcome, BackendError> {
        log::info!(
            "Posting {} ({} fields)",
            submission.operation.flag(),
            submission.fields.len()
        );
        let text = self.post_form(self.path_for(submission.kind), &submission.body())?;
        SubmitOutcome::from_json(&text)
    }
}
