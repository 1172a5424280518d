//! Background requests.
//!
//! Every server call runs on its own thread and reports back through the
//! app's channel. Results are applied on the UI thread at the start of the
//! next frame, where fetch results pass through the controller's stale
//! guard.

use std::sync::mpsc::TryRecvError;
use std::thread;

use chrono::Local;

use super::confirm::ConfirmAction;
use super::detail::DetailWindow;
use super::CalendarApp;
use crate::models::court::Court;
use crate::models::event::EventDetail;
use crate::services::backend::{BackendError, CalendarBackend, FormChoices, SubmitOutcome};
use crate::services::controller::{CalendarController, FetchResult};
use crate::services::forms::{FormEffect, FormFields, FormKind, FormOperation, FormSubmission};
use crate::services::refresh::FetchTicket;

pub(super) enum WorkerMessage {
    Fetched {
        ticket: FetchTicket,
        result: FetchResult,
    },
    Submitted {
        kind: FormKind,
        result: Result<SubmitOutcome, BackendError>,
    },
    Deleted {
        operation: FormOperation,
        result: Result<SubmitOutcome, BackendError>,
    },
    Detail {
        game_id: i64,
        result: Result<EventDetail, BackendError>,
    },
    CourtLoaded {
        court_id: i64,
        result: Result<Court, BackendError>,
    },
    Choices {
        result: Result<FormChoices, BackendError>,
    },
}

impl CalendarApp {
    /// Run `job` against the backend on a worker thread.
    fn spawn_job<F>(&mut self, ctx: &egui::Context, job: F) -> bool
    where
        F: FnOnce(&dyn CalendarBackend) -> WorkerMessage + Send + 'static,
    {
        let Some(backend) = self.backend.clone() else {
            log::warn!("No backend configured; request skipped");
            return false;
        };

        let tx = self.worker_tx.clone();
        let ctx = ctx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let message = job(&*backend);
            if tx.send(message).is_err() {
                log::debug!("Calendar closed before a request finished");
            }
            ctx.request_repaint();
        });
        true
    }

    pub(super) fn spawn_fetch(&mut self, ticket: FetchTicket, ctx: &egui::Context) {
        self.spawn_job(ctx, move |backend| WorkerMessage::Fetched {
            result: CalendarController::run_fetch(backend, &ticket),
            ticket,
        });
    }

    pub(super) fn spawn_submit(&mut self, submission: FormSubmission, ctx: &egui::Context) {
        let kind = submission.kind;
        if !self.can_post() {
            let effect = self
                .form_mut(kind)
                .transport_failed("posting is disabled without a CSRF token");
            self.apply_effect(kind, effect, ctx);
            return;
        }
        self.spawn_job(ctx, move |backend| WorkerMessage::Submitted {
            kind,
            result: backend.submit(&submission),
        });
    }

    pub(super) fn spawn_delete(&mut self, submission: FormSubmission, ctx: &egui::Context) {
        if !self.can_post() {
            self.toast_manager.error("Deleting is disabled without a CSRF token");
            return;
        }
        let operation = submission.operation;
        self.spawn_job(ctx, move |backend| WorkerMessage::Deleted {
            operation,
            result: backend.submit(&submission),
        });
    }

    pub(super) fn open_detail(&mut self, game_id: i64, ctx: &egui::Context) {
        self.spawn_job(ctx, move |backend| WorkerMessage::Detail {
            game_id,
            result: backend.fetch_event_detail(game_id),
        });
    }

    pub(super) fn load_court_for_edit(&mut self, court_id: i64, ctx: &egui::Context) {
        if !self.can_post() {
            self.toast_manager.error("Court editing is disabled without a CSRF token");
            return;
        }
        self.spawn_job(ctx, move |backend| WorkerMessage::CourtLoaded {
            court_id,
            result: backend.fetch_court(court_id),
        });
    }

    /// Category and court options for the game form.
    pub(super) fn load_form_choices(&mut self, ctx: &egui::Context) {
        self.spawn_job(ctx, |backend| WorkerMessage::Choices {
            result: backend.fetch_form_choices(),
        });
    }

    /// Apply every finished request.
    pub(super) fn poll_workers(&mut self, ctx: &egui::Context) {
        loop {
            match self.worker_rx.try_recv() {
                Ok(message) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    self.handle_worker_message(message, ctx);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::error!("Worker channel disconnected");
                    break;
                }
            }
        }
    }

    fn handle_worker_message(&mut self, message: WorkerMessage, ctx: &egui::Context) {
        match message {
            WorkerMessage::Fetched { ticket, result } => {
                self.calendar.apply_fetch(&ticket, result);
            }
            WorkerMessage::Submitted { kind, result } => {
                let effect = match result {
                    Ok(outcome) => self.form_mut(kind).handle_response(outcome),
                    Err(err) => self.form_mut(kind).transport_failed(&err.to_string()),
                };
                self.apply_effect(kind, effect, ctx);
            }
            WorkerMessage::Deleted { operation, result } => {
                let effect = match result {
                    Ok(outcome) => FormEffect::for_delete(operation, outcome),
                    Err(err) => {
                        log::error!("{} failed: {}", operation.flag(), err);
                        FormEffect::Alert(format!("Failed: {}", err))
                    }
                };
                let kind = match operation {
                    FormOperation::DeleteCourt => FormKind::Court,
                    _ => FormKind::Game,
                };
                if matches!(effect, FormEffect::Refresh { .. }) && kind == FormKind::Game {
                    self.detail = None;
                }
                self.apply_effect(kind, effect, ctx);
            }
            WorkerMessage::Detail { game_id, result } => match result {
                Ok(detail) => self.detail = Some(DetailWindow::new(game_id, detail)),
                Err(err) => {
                    log::error!("Failed to load game {}: {}", game_id, err);
                    self.toast_manager.error("Failed to load game details.");
                }
            },
            WorkerMessage::CourtLoaded { court_id, result } => match result {
                Ok(court) => {
                    if let Err(err) = self
                        .court_form
                        .open_edit(court_id, FormFields::for_court(&court))
                    {
                        log::warn!("Court form busy: {}", err);
                    }
                }
                Err(err) => {
                    log::error!("Failed to load court {}: {}", court_id, err);
                    self.toast_manager.error("Failed to load court data for editing.");
                }
            },
            WorkerMessage::Choices { result } => match result {
                Ok(choices) => {
                    log::debug!(
                        "Loaded {} categories and {} courts",
                        choices.categories.len(),
                        choices.courts.len()
                    );
                    self.form_choices = choices;
                }
                // Keep the last list; the form still offers what is on screen.
                Err(err) => log::warn!("Failed to load form choices: {}", err),
            },
        }
    }

    /// Carry out what a form asked for after a server answer.
    pub(super) fn apply_effect(&mut self, kind: FormKind, effect: FormEffect, ctx: &egui::Context) {
        match effect {
            FormEffect::Refresh { message } => {
                self.toast_manager.success(message);
                if kind == FormKind::Game {
                    self.participants_input.clear();
                } else {
                    self.load_form_choices(ctx);
                }
                if let Some(ticket) = self.calendar.refresh(Local::now()) {
                    self.spawn_fetch(ticket, ctx);
                }
            }
            FormEffect::Alert(text) => self.toast_manager.error(text),
            FormEffect::Confirm(message) => {
                self.confirm_dialog
                    .request(ConfirmAction::OverrideConflict { kind, message });
            }
            FormEffect::None => {}
        }
    }
}
