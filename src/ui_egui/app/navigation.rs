use chrono::{DateTime, Local, NaiveDate};
use egui::{Color32, RichText};

use super::CalendarApp;
use crate::models::cursor::{Direction, ViewMode};
use crate::services::forms::FormKind;
use crate::services::refresh::FetchTicket;

impl CalendarApp {
    /// Toolbar with date navigation, view switch and the form buttons.
    pub(super) fn render_header(&mut self, ctx: &egui::Context) {
        let is_dark = ctx.style().visuals.dark_mode;
        let mut ticket: Option<FetchTicket> = None;

        egui::TopBottomPanel::top("calendar_header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let now = Local::now();
                let previous = self.calendar.adjacent_date(Direction::Previous);
                let next = self.calendar.adjacent_date(Direction::Next);

                if ui
                    .button(step_label("◀", previous, true))
                    .on_hover_text(step_hover("Previous", previous))
                    .clicked()
                {
                    ticket = self.step(Direction::Previous, now);
                }
                if ui.button("Today").clicked() {
                    ticket = self.calendar.today(now);
                }
                if ui
                    .button(step_label("▶", next, false))
                    .on_hover_text(step_hover("Next", next))
                    .clicked()
                {
                    ticket = self.step(Direction::Next, now);
                }

                ui.add_space(8.0);
                ui.heading(self.calendar.label());
                ui.add_space(8.0);

                let mode = self.calendar.mode();
                if ui.selectable_label(mode == ViewMode::Day, "Day").clicked() && mode != ViewMode::Day {
                    ticket = self.calendar.set_mode(ViewMode::Day, now);
                }
                if ui.selectable_label(mode == ViewMode::Week, "Week").clicked() && mode != ViewMode::Week
                {
                    ticket = self.calendar.set_mode(ViewMode::Week, now);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let can_post = self.can_post();
                    let courts = ui.add_enabled(can_post, egui::Button::new("Courts"));
                    if courts.clicked() {
                        self.show_courts = !self.show_courts;
                        if self.show_courts {
                            self.load_form_choices(ctx);
                        }
                    }
                    self.form_triggers.push((FormKind::Court, courts.rect));

                    let category = ui.add_enabled(can_post, egui::Button::new("＋ Category"));
                    if category.clicked() {
                        self.category_form.open_create();
                    }
                    self.form_triggers.push((FormKind::Category, category.rect));

                    let game = ui.add_enabled(can_post, egui::Button::new("＋ Game"));
                    if game.clicked() && self.game_form.open_create() {
                        self.participants_input.clear();
                    }
                    self.form_triggers.push((FormKind::Game, game.rect));

                    if !can_post {
                        ui.label(
                            RichText::new("read only")
                                .small()
                                .color(secondary_text_color(is_dark)),
                        )
                        .on_hover_text("Set a CSRF token in the settings file to enable editing");
                    }

                    self.render_fetch_status(ui, is_dark);
                });
            });
        });

        if ticket.is_none() {
            ticket = self.handle_navigation_keys(ctx);
        }
        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket, ctx);
        }
    }

    /// Day view follows the server's adjacent-date hints; week view steps
    /// the cursor.
    fn step(&mut self, direction: Direction, now: DateTime<Local>) -> Option<FetchTicket> {
        match (self.calendar.mode(), self.calendar.adjacent_date(direction)) {
            (ViewMode::Day, Some(date)) => self.calendar.select_date(date, now),
            _ => self.calendar.navigate(direction, now),
        }
    }

    fn render_fetch_status(&self, ui: &mut egui::Ui, is_dark: bool) {
        if let Some(error) = self.calendar.last_error() {
            let color = if is_dark {
                Color32::from_rgb(255, 120, 120)
            } else {
                Color32::from_rgb(180, 40, 40)
            };
            ui.label(RichText::new("⚠ offline").color(color))
                .on_hover_text(error);
        } else if self.in_flight > 0 {
            ui.spinner();
        }
    }

    /// Arrow keys step the cursor, `T` jumps to today. Ignored while typing.
    fn handle_navigation_keys(&mut self, ctx: &egui::Context) -> Option<FetchTicket> {
        if ctx.wants_keyboard_input() || self.confirm_dialog.is_open() {
            return None;
        }

        let now = Local::now();
        let (previous, next, today) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::T),
            )
        });

        if previous {
            self.step(Direction::Previous, now)
        } else if next {
            self.step(Direction::Next, now)
        } else if today {
            self.calendar.today(now)
        } else {
            None
        }
    }
}

fn secondary_text_color(is_dark: bool) -> Color32 {
    if is_dark {
        Color32::from_gray(160)
    } else {
        Color32::from_gray(100)
    }
}

/// `◀ 6 Mar` / `8 Mar ▶`
fn step_label(arrow: &str, date: Option<NaiveDate>, leading: bool) -> String {
    match date {
        Some(date) if leading => format!("{} {}", arrow, date.format("%-d %b")),
        Some(date) => format!("{} {}", date.format("%-d %b"), arrow),
        None => arrow.to_string(),
    }
}

fn step_hover(direction: &str, date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => format!("{}: {}", direction, date.format("%A %-d %B %Y")),
        None => direction.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_labels_show_adjacent_dates() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 6);
        assert_eq!(step_label("◀", date, true), "◀ 6 Mar");
        assert_eq!(step_label("▶", date, false), "6 Mar ▶");
        assert_eq!(step_label("▶", None, false), "▶");
        assert_eq!(step_hover("Previous", date), "Previous: Thursday 6 March 2025");
    }
}
