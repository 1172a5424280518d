use chrono::{Datelike, Local};
use egui::{Pos2, Rect, Sense, Vec2};

use super::time_grid::{render_time_grid, COLUMN_SPACING, TIME_LABEL_WIDTH};
use super::GridInteraction;
use crate::services::controller::CalendarController;
use crate::utils::date::weekday_name;

pub struct WeekView;

impl WeekView {
    pub fn show(ui: &mut egui::Ui, calendar: &CalendarController) -> GridInteraction {
        let dates = calendar.grid().dates();
        let today = Local::now().date_naive();

        // Column headers line up with the grid columns below.
        let tile_count = dates.len().max(1) as f32;
        let available = ui.available_width() - TIME_LABEL_WIDTH;
        let col_width = ((available - COLUMN_SPACING * (tile_count - 1.0)) / tile_count).max(60.0);
        let (header_rect, _) =
            ui.allocate_exact_size(Vec2::new(ui.available_width(), 40.0), Sense::hover());
        let painter = ui.painter_at(header_rect);

        for (index, date) in dates.iter().enumerate() {
            let left = header_rect.left()
                + TIME_LABEL_WIDTH
                + index as f32 * (col_width + COLUMN_SPACING);
            let cell = Rect::from_min_size(Pos2::new(left, header_rect.top()), Vec2::new(col_width, 40.0));
            let is_today = *date == today;
            if is_today {
                painter.rect_filled(cell, 6.0, ui.visuals().selection.bg_fill.gamma_multiply(0.3));
            }

            let weekday = weekday_name(date.weekday().num_days_from_sunday());
            painter.text(
                Pos2::new(cell.center().x, cell.top() + 12.0),
                egui::Align2::CENTER_CENTER,
                &weekday[..3],
                egui::FontId::proportional(12.0),
                ui.visuals().weak_text_color(),
            );
            painter.text(
                Pos2::new(cell.center().x, cell.top() + 28.0),
                egui::Align2::CENTER_CENTER,
                date.day().to_string(),
                egui::FontId::proportional(16.0),
                ui.visuals().strong_text_color(),
            );
        }

        ui.separator();

        egui::ScrollArea::vertical()
            .id_source("week_view_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| render_time_grid(ui, calendar))
            .inner
    }
}
