use chrono::Local;
use egui::{Margin, Stroke};

use super::time_grid::render_time_grid;
use super::GridInteraction;
use crate::services::controller::CalendarController;

pub struct DayView;

impl DayView {
    pub fn show(ui: &mut egui::Ui, calendar: &CalendarController) -> GridInteraction {
        let Some(date) = calendar.grid().tiles().first().map(|tile| tile.date) else {
            ui.label("No day selected");
            return GridInteraction::default();
        };
        let is_today = date == Local::now().date_naive();
        let visuals = ui.visuals().clone();

        egui::Frame::none()
            .fill(visuals.faint_bg_color)
            .rounding(egui::Rounding::same(12.0))
            .stroke(Stroke::new(1.0, visuals.widgets.noninteractive.bg_stroke.color))
            .inner_margin(Margin::symmetric(16.0, 12.0))
            .show(ui, |strip_ui| {
                strip_ui.horizontal(|row_ui| {
                    row_ui.vertical(|text_ui| {
                        text_ui.label(
                            egui::RichText::new(date.format("%A").to_string())
                                .size(24.0)
                                .strong(),
                        );
                        text_ui.label(
                            egui::RichText::new(date.format("%B %d, %Y").to_string()).size(14.0),
                        );
                    });
                    if is_today {
                        row_ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(egui::RichText::new("Today").strong());
                        });
                    }
                });
            });

        ui.add_space(8.0);

        if calendar.events_for(date).is_empty() {
            ui.weak("No games booked");
        }

        egui::ScrollArea::vertical()
            .id_source("day_view_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| render_time_grid(ui, calendar))
            .inner
    }
}
