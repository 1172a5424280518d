//! Time grid rendering shared by the day and week views.
//!
//! Draws the hour ruler on the left and one column per tile, then overlays
//! each tile's layout boxes at their computed offsets.

use chrono::{Local, Timelike};
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};

use super::utils::{event_color, format_event_tooltip, text_color_for};
use super::GridInteraction;
use crate::services::controller::CalendarController;
use crate::services::grid::{GridModel, HourRuler};

pub const TIME_LABEL_WIDTH: f32 = 50.0;
pub const COLUMN_SPACING: f32 = 1.0;
const BOX_INSET: f32 = 2.0;

/// Render the grid for every tile the controller currently holds.
pub fn render_time_grid(ui: &mut egui::Ui, calendar: &CalendarController) -> GridInteraction {
    let mut interaction = GridInteraction::default();
    let grid = calendar.grid();
    let layout = calendar.layout();

    // Offsets are in the layout's unit; scale them onto the pixel height.
    let pixel_height = 24.0 * layout.pixels_per_hour;
    let scale = pixel_height / GridModel::total_height(layout).max(f32::EPSILON);

    let tile_count = grid.tiles().len().max(1) as f32;
    let available = ui.available_width() - TIME_LABEL_WIDTH;
    let col_width = ((available - COLUMN_SPACING * (tile_count - 1.0)) / tile_count).max(60.0);

    let total_width = TIME_LABEL_WIDTH + col_width * tile_count + COLUMN_SPACING * (tile_count - 1.0);
    let (grid_rect, _) = ui.allocate_exact_size(Vec2::new(total_width, pixel_height), Sense::hover());
    let painter = ui.painter_at(grid_rect);
    let visuals = ui.visuals().clone();
    let line_color = visuals.widgets.noninteractive.bg_stroke.color;

    // Hour ruler; 0:00 is the top edge and carries no label.
    for cell in grid.ruler().cells() {
        let y = grid_rect.top() + HourRuler::offset_of(cell.hour, layout) * scale;
        painter.text(
            Pos2::new(grid_rect.left() + TIME_LABEL_WIDTH - 5.0, y),
            egui::Align2::RIGHT_CENTER,
            &cell.label,
            egui::FontId::proportional(12.0),
            Color32::GRAY,
        );
        painter.line_segment(
            [
                Pos2::new(grid_rect.left() + TIME_LABEL_WIDTH, y),
                Pos2::new(grid_rect.right(), y),
            ],
            Stroke::new(1.0, line_color),
        );
    }

    let today = Local::now().date_naive();

    for (index, tile) in grid.tiles().iter().enumerate() {
        let left = grid_rect.left() + TIME_LABEL_WIDTH + index as f32 * (col_width + COLUMN_SPACING);
        let column = Rect::from_min_size(
            Pos2::new(left, grid_rect.top()),
            Vec2::new(col_width, pixel_height),
        );
        let column_fill = if tile.date == today {
            visuals.selection.bg_fill.gamma_multiply(0.15)
        } else {
            visuals.extreme_bg_color
        };
        painter.rect_filled(column, 0.0, column_fill);
        painter.rect_stroke(column, 0.0, Stroke::new(1.0, line_color));

        for layout_box in &tile.boxes {
            let Some(event) = calendar
                .events_for(tile.date)
                .iter()
                .find(|event| event.id == layout_box.event_id)
            else {
                continue;
            };

            let (lane_left, lane_width) = layout_box.horizontal_span();
            let rect = Rect::from_min_size(
                Pos2::new(
                    column.left() + col_width * lane_left + BOX_INSET,
                    column.top() + layout_box.top_offset * scale,
                ),
                Vec2::new(
                    (col_width * lane_width - 2.0 * BOX_INSET).max(4.0),
                    (layout_box.height * scale).max(12.0),
                ),
            );

            let fill = event_color(event);
            let text_color = text_color_for(fill);
            painter.rect_filled(rect, 3.0, fill);
            painter.rect_filled(
                Rect::from_min_size(rect.min, Vec2::new(4.0, rect.height())),
                2.0,
                fill.linear_multiply(0.7),
            );

            let mut text = format!("{}\n{}", event.display_title(), event.time_range());
            if let Some(court) = event.court_name.as_deref() {
                text.push('\n');
                text.push_str(court);
            }
            let galley = ui.fonts(|fonts| {
                fonts.layout(
                    text,
                    egui::FontId::proportional(12.0),
                    text_color,
                    (rect.width() - 10.0).max(1.0),
                )
            });
            painter.with_clip_rect(rect).galley(
                Pos2::new(rect.left() + 7.0, rect.top() + 2.0),
                galley,
                text_color,
            );

            let response = ui
                .interact(
                    rect,
                    ui.id().with(("game", tile.date, layout_box.event_id)),
                    Sense::click(),
                )
                .on_hover_text(format_event_tooltip(event));
            if response.clicked() {
                interaction.clicked_event = Some(layout_box.event_id);
            }
        }
    }

    draw_current_time_indicator(ui, &grid_rect, grid, col_width, pixel_height);

    interaction
}

/// Draw the current time line across today's column.
fn draw_current_time_indicator(
    ui: &egui::Ui,
    grid_rect: &Rect,
    grid: &GridModel,
    col_width: f32,
    pixel_height: f32,
) {
    let now = Local::now();
    let Some(day_index) = grid.tiles().iter().position(|tile| tile.date == now.date_naive()) else {
        return;
    };

    let hours = now.time().hour() as f32 + now.time().minute() as f32 / 60.0;
    let y = grid_rect.top() + hours / 24.0 * pixel_height;
    let x_start =
        grid_rect.left() + TIME_LABEL_WIDTH + day_index as f32 * (col_width + COLUMN_SPACING);

    let line_color = Color32::from_rgb(255, 100, 100);
    let painter = ui.painter();
    painter.circle_filled(Pos2::new(x_start - 4.0, y), 3.0, line_color);
    painter.line_segment(
        [Pos2::new(x_start, y), Pos2::new(x_start + col_width, y)],
        Stroke::new(2.0, line_color),
    );
}
