//! Game, court and category form windows.
//!
//! The windows only draw what the [`FormController`]s report; every state
//! change goes through the controllers so the same rules hold for mouse,
//! keyboard and server answers.

use egui::RichText;

use super::confirm::ConfirmAction;
use super::CalendarApp;
use crate::services::backend::FormChoices;
use crate::services::forms::{
    ClickTarget, CloseDecision, FormController, FormKind, FormMode, FormState, RECURRENCE_CHOICES,
};
use crate::ui_egui::views::utils::parse_color;

const FORM_KINDS: [FormKind; 3] = [FormKind::Game, FormKind::Court, FormKind::Category];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormAction {
    Submit,
    Close,
}

impl CalendarApp {
    pub(super) fn render_forms(&mut self, ctx: &egui::Context) {
        // Fresh category and court options each time the game form opens.
        let game_visible = self.game_form.is_visible();
        if game_visible && !self.game_form_was_visible {
            self.load_form_choices(ctx);
        }
        self.game_form_was_visible = game_visible;

        for kind in FORM_KINDS {
            if self.form(kind).is_visible() {
                self.render_form_window(ctx, kind);
            }
        }
    }

    fn render_form_window(&mut self, ctx: &egui::Context, kind: FormKind) {
        let choices = if kind == FormKind::Game {
            FormChoices {
                categories: self.form_choices.categories_with(&self.calendar.categories()),
                courts: self.form_choices.courts.clone(),
            }
        } else {
            FormChoices::default()
        };

        let (form, participants) = match kind {
            FormKind::Game => (&mut self.game_form, Some(&mut self.participants_input)),
            FormKind::Court => (&mut self.court_form, None),
            FormKind::Category => (&mut self.category_form, None),
        };

        let title = match form.session().map(|session| session.mode) {
            Some(FormMode::Edit) => format!("Edit {}", kind.label()),
            _ => format!("New {}", kind.label()),
        };

        let mut open = true;
        let mut action = None;
        let window = egui::Window::new(title)
            .id(egui::Id::new(("club_form", kind)))
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.set_min_width(320.0);
                action = render_form_body(ui, form, participants, &choices);
            });

        if !open {
            action = Some(FormAction::Close);
        }

        match action {
            Some(FormAction::Submit) => self.submit_form(kind, ctx),
            Some(FormAction::Close) => {
                let decision = self.form_mut(kind).request_close();
                self.handle_close_decision(kind, decision);
            }
            None => {
                if let Some(window) = window {
                    self.detect_outside_click(ctx, kind, window.response.rect);
                }
            }
        }
    }

    fn submit_form(&mut self, kind: FormKind, ctx: &egui::Context) {
        if kind == FormKind::Game {
            let participants = split_participants(&self.participants_input);
            self.game_form.fields_mut().set_all("participants", participants);
        }

        match self.form_mut(kind).submit() {
            Ok(submission) => {
                log::info!(
                    "Posting {} ({})",
                    kind.label(),
                    submission.operation.flag()
                );
                self.spawn_submit(submission, ctx);
            }
            Err(err) => self.toast_manager.error(format!("Failed: {}", err)),
        }
    }

    /// A press outside the window (and outside the button that opened it)
    /// closes the form.
    fn detect_outside_click(&mut self, ctx: &egui::Context, kind: FormKind, window_rect: egui::Rect) {
        if self.confirm_dialog.is_open() || ctx.memory(|mem| mem.any_popup_open()) {
            return;
        }

        let press = ctx.input(|i| {
            if i.pointer.any_pressed() {
                i.pointer.interact_pos()
            } else {
                None
            }
        });
        let Some(pos) = press else {
            return;
        };

        let target = if window_rect.contains(pos) {
            ClickTarget::Form
        } else if self
            .form_triggers
            .iter()
            .any(|(trigger, rect)| *trigger == kind && rect.contains(pos))
        {
            ClickTarget::Trigger
        } else {
            ClickTarget::Outside
        };

        let decision = self.form_mut(kind).outside_click(target);
        self.handle_close_decision(kind, decision);
    }

    fn handle_close_decision(&mut self, kind: FormKind, decision: CloseDecision) {
        match decision {
            CloseDecision::Closed => {
                log::debug!("{} form closed", kind.label());
                if kind == FormKind::Game {
                    self.participants_input.clear();
                }
            }
            CloseDecision::NeedsConfirm => {
                self.confirm_dialog.request(ConfirmAction::DiscardChanges { kind });
            }
            CloseDecision::Ignored => {}
        }
    }
}

fn render_form_body(
    ui: &mut egui::Ui,
    form: &mut FormController,
    participants: Option<&mut String>,
    choices: &FormChoices,
) -> Option<FormAction> {
    let kind = form.kind();
    let editable = form.is_editable();
    let mut action = None;

    ui.add_enabled_ui(editable, |ui| {
        egui::Grid::new(("form_fields", kind))
            .num_columns(2)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                for &name in kind.field_names() {
                    ui.label(field_label(name));
                    render_field(ui, form, name, choices);
                    ui.end_row();
                }

                if let Some(participants) = participants {
                    ui.label("Participants");
                    ui.add(
                        egui::TextEdit::singleline(participants)
                            .hint_text("email, email")
                            .desired_width(200.0),
                    );
                    ui.end_row();
                }
            });
    });

    ui.add_space(6.0);
    match form.state() {
        FormState::Submitting => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Saving…");
            });
        }
        FormState::AwaitingConfirm { message } => {
            ui.label(RichText::new(message).italics());
        }
        _ => {}
    }

    ui.separator();
    ui.horizontal(|ui| {
        if ui.add_enabled(editable, egui::Button::new("Save")).clicked() {
            action = Some(FormAction::Submit);
        }
        if ui.add_enabled(editable, egui::Button::new("Cancel")).clicked() {
            action = Some(FormAction::Close);
        }
    });

    if editable && ui.input(|i| i.key_pressed(egui::Key::Escape)) {
        action = Some(FormAction::Close);
    }

    action
}

fn render_field(ui: &mut egui::Ui, form: &mut FormController, name: &str, choices: &FormChoices) {
    let kind = form.kind();
    let value = form.fields_mut().value_mut(name);

    match (kind, name) {
        (FormKind::Game, "recurrence_type") => {
            let selected = RECURRENCE_CHOICES
                .iter()
                .find(|(choice, _)| *choice == value.as_str())
                .map(|(_, label)| *label)
                .unwrap_or("None");
            egui::ComboBox::from_id_source("recurrence_type_combo")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for (choice, label) in RECURRENCE_CHOICES {
                        ui.selectable_value(value, choice.to_string(), label);
                    }
                });
        }
        (FormKind::Game, "category") => {
            let categories = &choices.categories;
            let selected = categories
                .iter()
                .find(|category| category.id.map(|id| id.to_string()).as_deref() == Some(value.as_str()))
                .map(|category| category.name.clone())
                .unwrap_or_else(|| {
                    if value.is_empty() {
                        "(none)".to_string()
                    } else {
                        format!("#{}", value)
                    }
                });
            egui::ComboBox::from_id_source("game_category_combo")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    ui.selectable_value(value, String::new(), "(none)");
                    for category in categories {
                        if let Some(id) = category.id {
                            ui.selectable_value(value, id.to_string(), category.name.as_str());
                        }
                    }
                });
        }
        (FormKind::Category, "color") => {
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut *value)
                        .hint_text("#RRGGBB")
                        .desired_width(90.0),
                );
                if let Some(color) = parse_color(value) {
                    let (rect, _) = ui.allocate_exact_size(egui::vec2(16.0, 16.0), egui::Sense::hover());
                    ui.painter().rect_filled(rect, 3.0, color);
                }
            });
        }
        (_, "start_date_and_time" | "end_date_and_time") => {
            ui.add(
                egui::TextEdit::singleline(value)
                    .hint_text("YYYY-MM-DDTHH:MM")
                    .desired_width(200.0),
            );
        }
        (_, "end_date_of_recurrence") => {
            ui.add(
                egui::TextEdit::singleline(value)
                    .hint_text("YYYY-MM-DD")
                    .desired_width(200.0),
            );
        }
        (FormKind::Game, "court") if !choices.courts.is_empty() => {
            let selected = match choices.court_name(value) {
                Some(name) => name.to_string(),
                None if value.is_empty() => "(choose)".to_string(),
                None => format!("#{}", value),
            };
            egui::ComboBox::from_id_source("game_court_combo")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for court in &choices.courts {
                        if let Some(id) = court.id {
                            ui.selectable_value(value, id.to_string(), court.name.as_str());
                        }
                    }
                });
        }
        (_, "court") => {
            ui.add(
                egui::TextEdit::singleline(value)
                    .hint_text("court id")
                    .desired_width(200.0),
            );
        }
        _ => {
            ui.add(egui::TextEdit::singleline(value).desired_width(200.0));
        }
    }
}

/// `building_number` -> `Building number`
fn field_label(name: &str) -> String {
    let text = name.replace('_', " ");
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn split_participants(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
