//! Confirmation dialog for destructive or overriding actions.
//!
//! Shows a modal asking the user to confirm deleting a game or court,
//! discarding an edit, or booking despite a conflict the server reported.

use egui::{Context, RichText};

use super::CalendarApp;
use crate::services::forms::{FormKind, FormSubmission};

/// Types of confirmation dialogs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteGame { game_id: i64, title: String },
    DeleteCourt { court_id: i64 },
    /// Close an edit form and lose its values
    DiscardChanges { kind: FormKind },
    /// The server asked before accepting the post (e.g. court already booked)
    OverrideConflict { kind: FormKind, message: String },
}

impl ConfirmAction {
    pub fn title(&self) -> &'static str {
        match self {
            ConfirmAction::DeleteGame { .. } => "Delete Game",
            ConfirmAction::DeleteCourt { .. } => "Delete Court",
            ConfirmAction::DiscardChanges { .. } => "Discard Changes",
            ConfirmAction::OverrideConflict { .. } => "Please Confirm",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ConfirmAction::DeleteGame { title, .. } => {
                format!("Are you sure you want to delete \"{}\"?\n\nThis action cannot be undone.", title)
            }
            ConfirmAction::DeleteCourt { court_id } => {
                format!("Are you sure you want to delete court #{}?\n\nThis action cannot be undone.", court_id)
            }
            ConfirmAction::DiscardChanges { kind } => {
                format!(
                    "You are editing this {}.\n\nAre you sure you want to discard your changes?",
                    kind.label().to_lowercase()
                )
            }
            ConfirmAction::OverrideConflict { message, .. } => message.clone(),
        }
    }

    pub fn confirm_text(&self) -> &'static str {
        match self {
            ConfirmAction::DeleteGame { .. } | ConfirmAction::DeleteCourt { .. } => "Delete",
            ConfirmAction::DiscardChanges { .. } => "Discard",
            ConfirmAction::OverrideConflict { .. } => "Yes",
        }
    }

    pub fn cancel_text(&self) -> &'static str {
        match self {
            ConfirmAction::OverrideConflict { .. } => "No",
            _ => "Cancel",
        }
    }

    /// Destructive actions get a warning icon and a red confirm button.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            ConfirmAction::DeleteGame { .. } | ConfirmAction::DeleteCourt { .. }
        )
    }
}

/// Result of a confirmation dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmResult {
    Confirmed(ConfirmAction),
    Cancelled(ConfirmAction),
    /// Dialog is still open, or there is none
    Pending,
}

#[derive(Debug, Default)]
pub struct ConfirmDialogState {
    pending_action: Option<ConfirmAction>,
}

impl ConfirmDialogState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request confirmation for an action, replacing any open request.
    pub fn request(&mut self, action: ConfirmAction) {
        self.pending_action = Some(action);
    }

    pub fn is_open(&self) -> bool {
        self.pending_action.is_some()
    }

    /// Render the confirmation dialog and return the result
    pub fn render(&mut self, ctx: &Context) -> ConfirmResult {
        let Some(action) = &self.pending_action else {
            return ConfirmResult::Pending;
        };

        let mut confirmed = None;

        egui::Window::new(action.title())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                ui.set_min_width(300.0);
                ui.set_max_width(400.0);
                ui.add_space(10.0);

                if action.is_destructive() {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("⚠").size(24.0).color(egui::Color32::from_rgb(220, 150, 50)));
                        ui.vertical(|ui| {
                            ui.label(action.message());
                        });
                    });
                } else {
                    ui.label(action.message());
                }

                ui.add_space(15.0);
                ui.separator();
                ui.add_space(10.0);

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let confirm_button = if action.is_destructive() {
                        egui::Button::new(RichText::new(action.confirm_text()).color(egui::Color32::WHITE))
                            .fill(egui::Color32::from_rgb(180, 60, 60))
                    } else {
                        egui::Button::new(action.confirm_text())
                    };

                    if ui.add(confirm_button).clicked() {
                        confirmed = Some(true);
                    }
                    ui.add_space(10.0);
                    if ui.button(action.cancel_text()).clicked() {
                        confirmed = Some(false);
                    }
                });
                ui.add_space(5.0);
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            confirmed = Some(false);
        }

        match (confirmed, self.pending_action.take()) {
            (Some(true), Some(action)) => ConfirmResult::Confirmed(action),
            (Some(false), Some(action)) => ConfirmResult::Cancelled(action),
            (_, action) => {
                self.pending_action = action;
                ConfirmResult::Pending
            }
        }
    }
}

impl CalendarApp {
    /// Render the confirmation dialog and act on the answer.
    pub(super) fn handle_confirm_dialog(&mut self, ctx: &Context) {
        match self.confirm_dialog.render(ctx) {
            ConfirmResult::Confirmed(action) => self.execute_confirmed_action(action, ctx),
            ConfirmResult::Cancelled(action) => self.execute_cancelled_action(action),
            ConfirmResult::Pending => {}
        }
    }

    fn execute_confirmed_action(&mut self, action: ConfirmAction, ctx: &Context) {
        match action {
            ConfirmAction::DeleteGame { game_id, title } => {
                log::info!("Deleting game '{}' (ID: {})", title, game_id);
                if let Some(submission) = FormSubmission::delete(FormKind::Game, game_id) {
                    self.spawn_delete(submission, ctx);
                }
            }
            ConfirmAction::DeleteCourt { court_id } => {
                log::info!("Deleting court {}", court_id);
                if let Some(submission) = FormSubmission::delete(FormKind::Court, court_id) {
                    self.spawn_delete(submission, ctx);
                }
            }
            ConfirmAction::DiscardChanges { kind } => {
                log::info!("Discarding {} form changes", kind.label());
                self.form_mut(kind).confirm_close();
            }
            ConfirmAction::OverrideConflict { kind, .. } => {
                if let Some(submission) = self.form_mut(kind).confirm_yes() {
                    self.spawn_submit(submission, ctx);
                }
            }
        }
    }

    fn execute_cancelled_action(&mut self, action: ConfirmAction) {
        if let ConfirmAction::OverrideConflict { kind, .. } = action {
            self.form_mut(kind).confirm_no();
        }
    }
}
