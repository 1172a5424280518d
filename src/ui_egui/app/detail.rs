//! Game detail window opened by clicking a tile.

use egui::RichText;

use super::confirm::ConfirmAction;
use super::CalendarApp;
use crate::models::event::EventDetail;
use crate::services::forms::FormFields;

pub(super) struct DetailWindow {
    game_id: i64,
    detail: EventDetail,
}

impl DetailWindow {
    pub(super) fn new(game_id: i64, detail: EventDetail) -> Self {
        Self { game_id, detail }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailAction {
    Edit,
    Delete,
    Close,
}

impl CalendarApp {
    pub(super) fn render_detail(&mut self, ctx: &egui::Context) {
        let Some(window) = &self.detail else {
            return;
        };

        let can_post = self.can_post();
        let mut open = true;
        let mut action = None;

        egui::Window::new(RichText::new(&window.detail.name).strong())
            .id(egui::Id::new(("game_detail", window.game_id)))
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.set_min_width(260.0);
                let detail = &window.detail;

                egui::Grid::new("game_detail_grid")
                    .num_columns(2)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("Start").weak());
                        ui.label(&detail.start_date_and_time);
                        ui.end_row();

                        ui.label(RichText::new("End").weak());
                        ui.label(&detail.end_date_and_time);
                        ui.end_row();

                        if let Some(category) = &detail.category_name {
                            ui.label(RichText::new("Category").weak());
                            ui.label(category);
                            ui.end_row();
                        }

                        if let Some(court) = &detail.court_name {
                            ui.label(RichText::new("Court").weak());
                            ui.label(court);
                            ui.end_row();
                        }
                    });

                if !detail.participants.is_empty() {
                    ui.add_space(6.0);
                    ui.label(RichText::new("Participants").weak());
                    for participant in &detail.participants {
                        ui.label(format!("• {}", participant.label()));
                    }
                }

                ui.add_space(8.0);
                ui.separator();
                ui.horizontal(|ui| {
                    // Only the creator may change a game.
                    if detail.is_creator {
                        if ui.add_enabled(can_post, egui::Button::new("✏ Edit")).clicked() {
                            action = Some(DetailAction::Edit);
                        }
                        if ui.add_enabled(can_post, egui::Button::new("🗑 Delete")).clicked() {
                            action = Some(DetailAction::Delete);
                        }
                    }
                    if ui.button("Close").clicked() {
                        action = Some(DetailAction::Close);
                    }
                });
            });

        if !open {
            action = Some(DetailAction::Close);
        }

        match action {
            Some(DetailAction::Edit) => self.edit_detail(),
            Some(DetailAction::Delete) => {
                if let Some(window) = &self.detail {
                    self.confirm_dialog.request(ConfirmAction::DeleteGame {
                        game_id: window.game_id,
                        title: window.detail.name.clone(),
                    });
                }
            }
            Some(DetailAction::Close) => self.detail = None,
            None => {}
        }
    }

    /// Move from the detail window into the game form, prefilled.
    fn edit_detail(&mut self) {
        let Some(window) = self.detail.take() else {
            return;
        };

        let fields = FormFields::for_game(&window.detail);
        match self.game_form.open_edit(window.game_id, fields) {
            Ok(()) => {
                self.participants_input = window
                    .detail
                    .participants
                    .iter()
                    .map(|participant| participant.identifier.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
            }
            Err(err) => {
                log::warn!("Cannot edit game {}: {}", window.game_id, err);
                self.toast_manager.info("Close the open game form first");
                self.detail = Some(window);
            }
        }
    }
}
