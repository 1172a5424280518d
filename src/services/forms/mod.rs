//! Form controller.
//!
//! One [`FormController`] per form (game, court, category). It owns the
//! entered values and walks the open/submit/confirm state machine; the UI
//! renders whatever state it reports and executes the submissions it hands
//! out.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::category::Category;
use crate::models::court::Court;
use crate::models::event::EventDetail;
use crate::services::backend::SubmitOutcome;

const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";

/// `(value, label)` pairs accepted for `recurrence_type`. The server expands
/// the series; an empty value means a single game.
pub const RECURRENCE_CHOICES: [(&str, &str); 5] = [
    ("", "None"),
    ("daily", "Daily"),
    ("weekly", "Weekly"),
    ("biweekly", "Biweekly"),
    ("monthly", "Monthly"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Game,
    Court,
    Category,
}

impl FormKind {
    pub fn label(&self) -> &'static str {
        match self {
            FormKind::Game => "Game",
            FormKind::Court => "Court",
            FormKind::Category => "Category",
        }
    }

    /// Names of the single-valued fields, in form order.
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            FormKind::Game => &[
                "name",
                "category",
                "start_date_and_time",
                "end_date_and_time",
                "court",
                "recurrence_type",
                "end_date_of_recurrence",
            ],
            FormKind::Court => &[
                "name",
                "building_number",
                "street",
                "postal_code",
                "city",
                "country",
            ],
            FormKind::Category => &["name", "color"],
        }
    }

    /// Field carrying the entity id on edit and delete posts.
    pub fn id_field(&self) -> Option<&'static str> {
        match self {
            FormKind::Game => Some("game_id"),
            FormKind::Court => Some("court_id"),
            FormKind::Category => None,
        }
    }

    pub fn create_operation(&self) -> FormOperation {
        match self {
            FormKind::Game => FormOperation::SubmitGame,
            FormKind::Court => FormOperation::SubmitCourt,
            FormKind::Category => FormOperation::SubmitCategory,
        }
    }

    pub fn update_operation(&self) -> Option<FormOperation> {
        match self {
            FormKind::Game => Some(FormOperation::UpdateGame),
            FormKind::Court => Some(FormOperation::UpdateCourt),
            FormKind::Category => None,
        }
    }

    pub fn delete_operation(&self) -> Option<FormOperation> {
        match self {
            FormKind::Game => Some(FormOperation::DeleteGame),
            FormKind::Court => Some(FormOperation::DeleteCourt),
            FormKind::Category => None,
        }
    }
}

/// Boolean flag field that selects what the server does with a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormOperation {
    SubmitGame,
    UpdateGame,
    DeleteGame,
    SubmitCourt,
    UpdateCourt,
    DeleteCourt,
    SubmitCategory,
}

impl FormOperation {
    pub fn flag(&self) -> &'static str {
        match self {
            FormOperation::SubmitGame => "submit_game",
            FormOperation::UpdateGame => "update_game",
            FormOperation::DeleteGame => "delete_game",
            FormOperation::SubmitCourt => "submit_court",
            FormOperation::UpdateCourt => "update_court",
            FormOperation::DeleteCourt => "delete_court",
            FormOperation::SubmitCategory => "submit_category",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            FormOperation::SubmitGame => "Game added successfully!",
            FormOperation::UpdateGame => "Game updated successfully!",
            FormOperation::DeleteGame => "Game deleted successfully!",
            FormOperation::SubmitCourt | FormOperation::UpdateCourt => {
                "Court added/updated successfully!"
            }
            FormOperation::DeleteCourt => "Court deleted successfully!",
            FormOperation::SubmitCategory => "Category added successfully!",
        }
    }
}

/// Ordered name/value pairs. A name may repeat (`participants`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pairs: Vec<(String, String)>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every field of `kind` present with an empty value.
    pub fn blank(kind: FormKind) -> Self {
        Self {
            pairs: kind
                .field_names()
                .iter()
                .map(|name| (name.to_string(), String::new()))
                .collect(),
        }
    }

    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Edit values for a game, taken from its detail record.
    pub fn for_game(detail: &EventDetail) -> Self {
        let mut fields = Self::blank(FormKind::Game);
        fields.set("name", &detail.name);
        fields.set(
            "category",
            detail.category.map(|id| id.to_string()).unwrap_or_default(),
        );
        fields.set("start_date_and_time", &detail.start_date_and_time);
        fields.set("end_date_and_time", &detail.end_date_and_time);
        fields.set(
            "court",
            detail.court.map(|id| id.to_string()).unwrap_or_default(),
        );
        fields.set_all(
            "participants",
            detail.participants.iter().map(|p| p.identifier.clone()),
        );
        fields
    }

    pub fn for_court(court: &Court) -> Self {
        Self::from_pairs(court.form_fields())
    }

    /// First value of `name`, or an empty string.
    pub fn get(&self, name: &str) -> &str {
        self.pairs
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Replace every value of `name` with a single one, keeping its position.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter().position(|(field, _)| field == name) {
            Some(index) => {
                self.pairs[index].1 = value;
                let mut seen = false;
                self.pairs.retain(|(field, _)| {
                    if field != name {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.pairs.push((name.to_string(), value)),
        }
    }

    pub fn set_all<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remove(name);
        for value in values {
            self.push(name, value);
        }
    }

    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.pairs.push((name.to_string(), value.into()));
    }

    pub fn remove(&mut self, name: &str) {
        self.pairs.retain(|(field, _)| field != name);
    }

    /// Mutable access to the first value of `name`, adding it when absent.
    pub fn value_mut(&mut self, name: &str) -> &mut String {
        let index = match self.pairs.iter().position(|(field, _)| field == name) {
            Some(index) => index,
            None => {
                self.pairs.push((name.to_string(), String::new()));
                self.pairs.len() - 1
            }
        };
        &mut self.pairs[index].1
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A post ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub kind: FormKind,
    pub operation: FormOperation,
    pub target_id: Option<i64>,
    pub fields: FormFields,
    pub confirmed: bool,
}

impl FormSubmission {
    /// Delete post for a game or court. Categories cannot be deleted.
    pub fn delete(kind: FormKind, id: i64) -> Option<Self> {
        Some(Self {
            kind,
            operation: kind.delete_operation()?,
            target_id: Some(id),
            fields: FormFields::new(),
            confirmed: false,
        })
    }

    /// Form-encoded body: the entered fields, the operation flag, the
    /// entity id when editing or deleting and the override flag after a
    /// confirmation.
    pub fn body(&self) -> Vec<(String, String)> {
        let mut body = self.fields.pairs().to_vec();
        body.push((self.operation.flag().to_string(), "true".to_string()));
        if let (Some(id_field), Some(id)) = (self.kind.id_field(), self.target_id) {
            body.push((id_field.to_string(), id.to_string()));
        }
        if self.confirmed {
            body.push(("confirm".to_string(), "true".to_string()));
        }
        body
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// Exists only while a form is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormSession {
    pub mode: FormMode,
    pub target_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Closed,
    OpenCreate,
    OpenEdit { id: i64 },
    Submitting,
    AwaitingConfirm { message: String },
}

/// Where a pointer press landed relative to an open form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Form,
    Trigger,
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    Closed,
    /// Edits would be lost; ask before calling [`FormController::confirm_close`].
    NeedsConfirm,
    Ignored,
}

/// What the UI should do after a server answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEffect {
    /// Show the message and reload the selected date.
    Refresh { message: String },
    Alert(String),
    /// Ask yes/no; answer with `confirm_yes` or `confirm_no`.
    Confirm(String),
    None,
}

impl FormEffect {
    /// Effect of a delete post, which bypasses the form state machine.
    pub fn for_delete(operation: FormOperation, outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Success { message } => FormEffect::Refresh {
                message: message.unwrap_or_else(|| operation.success_message().to_string()),
            },
            SubmitOutcome::Invalid { errors } => FormEffect::Alert(format_errors(&errors)),
            SubmitOutcome::ConfirmNeeded { message } | SubmitOutcome::Rejected { message: Some(message) } => {
                FormEffect::Alert(format!("Failed: {}", message))
            }
            SubmitOutcome::Rejected { message: None } => {
                FormEffect::Alert(format!("Failed: {}", UNEXPECTED_ERROR))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0}")]
    Invalid(String),
    #[error("form is not open for submitting")]
    NotOpen,
    #[error("{0} forms cannot be edited")]
    NotEditable(&'static str),
}

/// `Failed: field: e1, e2\n...` for a validation answer.
pub fn format_errors(errors: &BTreeMap<String, Vec<String>>) -> String {
    let mut text = String::from("Failed: ");
    for (field, messages) in errors {
        text.push_str(&format!("{}: {}\n", field, messages.join(", ")));
    }
    text
}

#[derive(Debug, Clone)]
pub struct FormController {
    kind: FormKind,
    state: FormState,
    session: Option<FormSession>,
    fields: FormFields,
    pending: Option<FormSubmission>,
}

impl FormController {
    pub fn new(kind: FormKind) -> Self {
        Self {
            kind,
            state: FormState::Closed,
            session: None,
            fields: FormFields::blank(kind),
            pending: None,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn session(&self) -> Option<FormSession> {
        self.session
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FormFields {
        &mut self.fields
    }

    /// Whether the form window should be drawn.
    pub fn is_visible(&self) -> bool {
        self.state != FormState::Closed
    }

    /// Whether the values can be edited right now.
    pub fn is_editable(&self) -> bool {
        matches!(self.state, FormState::OpenCreate | FormState::OpenEdit { .. })
    }

    pub fn open_create(&mut self) -> bool {
        if self.state != FormState::Closed {
            return false;
        }
        self.fields = FormFields::blank(self.kind);
        self.session = Some(FormSession {
            mode: FormMode::Create,
            target_id: None,
        });
        self.state = FormState::OpenCreate;
        true
    }

    pub fn open_edit(&mut self, id: i64, prefill: FormFields) -> Result<(), FormError> {
        if self.kind.update_operation().is_none() {
            return Err(FormError::NotEditable(self.kind.label()));
        }
        if self.state != FormState::Closed {
            return Err(FormError::NotOpen);
        }
        self.fields = prefill;
        self.session = Some(FormSession {
            mode: FormMode::Edit,
            target_id: Some(id),
        });
        self.state = FormState::OpenEdit { id };
        Ok(())
    }

    /// Presses on the form itself or on the button that opened it are ignored.
    pub fn outside_click(&mut self, target: ClickTarget) -> CloseDecision {
        match target {
            ClickTarget::Form | ClickTarget::Trigger => CloseDecision::Ignored,
            ClickTarget::Outside => self.request_close(),
        }
    }

    pub fn request_close(&mut self) -> CloseDecision {
        match self.state {
            FormState::OpenCreate => {
                self.reset();
                CloseDecision::Closed
            }
            FormState::OpenEdit { .. } => CloseDecision::NeedsConfirm,
            FormState::Closed | FormState::Submitting | FormState::AwaitingConfirm { .. } => {
                CloseDecision::Ignored
            }
        }
    }

    /// Discard the entered values and close.
    pub fn confirm_close(&mut self) {
        self.reset();
    }

    pub fn submit(&mut self) -> Result<FormSubmission, FormError> {
        let session = match (&self.state, self.session) {
            (FormState::OpenCreate | FormState::OpenEdit { .. }, Some(session)) => session,
            _ => return Err(FormError::NotOpen),
        };

        self.pre_validate()?;

        let operation = match session.mode {
            FormMode::Create => self.kind.create_operation(),
            FormMode::Edit => self
                .kind
                .update_operation()
                .ok_or(FormError::NotEditable(self.kind.label()))?,
        };

        let submission = FormSubmission {
            kind: self.kind,
            operation,
            target_id: session.target_id,
            fields: self.trimmed_fields(),
            confirmed: false,
        };
        self.pending = Some(submission.clone());
        self.state = FormState::Submitting;
        Ok(submission)
    }

    pub fn handle_response(&mut self, outcome: SubmitOutcome) -> FormEffect {
        if self.state != FormState::Submitting {
            log::debug!("Ignoring {} form answer outside of a submit", self.kind.label());
            return FormEffect::None;
        }

        match outcome {
            SubmitOutcome::Success { message } => {
                let default_message = self
                    .pending
                    .as_ref()
                    .map(|pending| pending.operation.success_message())
                    .unwrap_or("Saved");
                let message = message.unwrap_or_else(|| default_message.to_string());
                self.reset();
                FormEffect::Refresh { message }
            }
            SubmitOutcome::Invalid { errors } => {
                self.reopen();
                FormEffect::Alert(format_errors(&errors))
            }
            SubmitOutcome::ConfirmNeeded { message } => {
                self.state = FormState::AwaitingConfirm {
                    message: message.clone(),
                };
                FormEffect::Confirm(message)
            }
            SubmitOutcome::Rejected { message } => {
                self.reopen();
                FormEffect::Alert(format!(
                    "Failed: {}",
                    message.as_deref().unwrap_or(UNEXPECTED_ERROR)
                ))
            }
        }
    }

    /// Resend the pending post with the override flag.
    pub fn confirm_yes(&mut self) -> Option<FormSubmission> {
        if !matches!(self.state, FormState::AwaitingConfirm { .. }) {
            return None;
        }
        let mut submission = self.pending.clone()?;
        submission.confirmed = true;
        self.pending = Some(submission.clone());
        self.state = FormState::Submitting;
        Some(submission)
    }

    pub fn confirm_no(&mut self) {
        if matches!(self.state, FormState::AwaitingConfirm { .. }) {
            self.reopen();
        }
    }

    pub fn transport_failed(&mut self, reason: &str) -> FormEffect {
        log::error!("{} form post failed: {}", self.kind.label(), reason);
        if self.state == FormState::Submitting {
            self.reopen();
        }
        FormEffect::Alert(format!("Failed: {}", UNEXPECTED_ERROR))
    }

    fn reopen(&mut self) {
        self.pending = None;
        self.state = match self.session {
            Some(FormSession {
                mode: FormMode::Edit,
                target_id: Some(id),
            }) => FormState::OpenEdit { id },
            Some(_) => FormState::OpenCreate,
            None => FormState::Closed,
        };
    }

    fn reset(&mut self) {
        self.fields = FormFields::blank(self.kind);
        self.session = None;
        self.pending = None;
        self.state = FormState::Closed;
    }

    fn trimmed_fields(&self) -> FormFields {
        let mut fields = FormFields::from_pairs(
            self.fields
                .pairs()
                .iter()
                .map(|(name, value)| (name.clone(), value.trim().to_string()))
                .collect(),
        );
        // A recurrence end without a recurrence type is meaningless.
        if self.kind == FormKind::Game && fields.get("recurrence_type").is_empty() {
            fields.set("end_date_of_recurrence", "");
        }
        fields
    }

    fn pre_validate(&self) -> Result<(), FormError> {
        match self.kind {
            FormKind::Game => Ok(()),
            FormKind::Court => {
                let court = Court {
                    id: None,
                    name: self.fields.get("name").to_string(),
                    building_number: self.fields.get("building_number").to_string(),
                    street: self.fields.get("street").to_string(),
                    postal_code: self.fields.get("postal_code").to_string(),
                    city: self.fields.get("city").to_string(),
                    country: self.fields.get("country").to_string(),
                };
                court.validate().map_err(|err| FormError::Invalid(err.to_string()))
            }
            FormKind::Category => {
                Category::new(self.fields.get("name"), self.fields.get("color").trim())
                    .validate()
                    .map_err(|err| FormError::Invalid(err.to_string()))
            }
        }
    }
}
