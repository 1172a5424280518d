//! Sidebar with a mini calendar, category filters and layout options, plus
//! the court management window.

use chrono::{Datelike, Duration, Local, NaiveDate};
use egui::{Color32, RichText};

use super::confirm::ConfirmAction;
use super::CalendarApp;
use crate::models::cursor::days_in_month;
use crate::services::forms::FormKind;
use crate::services::layout::{CategoryKey, LaneMode, LayoutConfig};
use crate::ui_egui::views::utils::{parse_color, DEFAULT_EVENT_COLOR};
use crate::utils::date::{month_name, parse_iso, weekday_name};

const SIDEBAR_MIN_WIDTH: f32 = 160.0;
const SIDEBAR_DEFAULT_WIDTH: f32 = 190.0;
const SIDEBAR_MAX_WIDTH: f32 = 300.0;

impl CalendarApp {
    pub(super) fn render_sidebar(&mut self, ctx: &egui::Context) {
        let mut selected_date = None;

        egui::SidePanel::left("sidebar")
            .default_width(SIDEBAR_DEFAULT_WIDTH)
            .min_width(SIDEBAR_MIN_WIDTH)
            .max_width(SIDEBAR_MAX_WIDTH)
            .resizable(true)
            .show(ctx, |ui| {
                selected_date = self.render_mini_calendar(ui);
                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);
                self.render_category_filters(ui);
                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);
                self.render_layout_options(ui);
            });

        if let Some(date) = selected_date {
            if let Some(ticket) = self.calendar.select_date(date, Local::now()) {
                self.spawn_fetch(ticket, ctx);
            }
        }
    }

    /// Month grid around the cursor. Returns the day the user picked.
    fn render_mini_calendar(&mut self, ui: &mut egui::Ui) -> Option<NaiveDate> {
        let anchor = self.calendar.cursor().anchor()?;
        let visible = self.calendar.cursor().dates();
        let today = Local::now().date_naive();
        let first_day_of_week = u32::from(self.settings.first_day_of_week % 7);
        let mut picked = None;

        ui.label(RichText::new(format!("{} {}", month_name(anchor.month0()), anchor.year())).strong());
        ui.add_space(4.0);

        egui::Grid::new("sidebar_mini_calendar")
            .num_columns(7)
            .spacing([2.0, 2.0])
            .min_col_width(18.0)
            .show(ui, |ui| {
                for offset in 0..7 {
                    let name = weekday_name(first_day_of_week + offset);
                    ui.label(RichText::new(&name[..1]).small().weak());
                }
                ui.end_row();

                let first_of_month = anchor.with_day(1).unwrap_or(anchor);
                let lead = (first_of_month.weekday().num_days_from_sunday() + 7 - first_day_of_week) % 7;
                let grid_start = first_of_month - Duration::days(i64::from(lead));
                let month_len = days_in_month(anchor.month0(), anchor.year());
                let rows = (lead + month_len).div_ceil(7);

                let mut current = grid_start;
                for _ in 0..rows {
                    for _ in 0..7 {
                        let day_str = current.day().to_string();
                        let text = if current == today {
                            RichText::new(&day_str).strong().color(Color32::from_rgb(50, 150, 50))
                        } else if current.month() != anchor.month() {
                            RichText::new(&day_str).weak()
                        } else {
                            RichText::new(&day_str)
                        };

                        let is_selected = visible.contains(&current);
                        if ui.selectable_label(is_selected, text).clicked() {
                            picked = Some(current);
                        }
                        current += Duration::days(1);
                    }
                    ui.end_row();
                }
            });

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.go_to_input)
                    .hint_text("YYYY-MM-DD")
                    .desired_width(90.0),
            );
            let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.small_button("Go").clicked() || submitted {
                match parse_iso(&self.go_to_input) {
                    Some(date) => {
                        picked = Some(date);
                        self.go_to_input.clear();
                    }
                    None => self.toast_manager.error("Enter a date as YYYY-MM-DD"),
                }
            }
        });

        picked
    }

    fn render_category_filters(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Categories").strong());

        let categories = self.calendar.categories();
        if categories.is_empty() {
            ui.label(RichText::new("No categories on screen").small().weak());
            return;
        }

        for category in categories {
            let key = match category.id {
                Some(id) => CategoryKey::Id(id),
                None => CategoryKey::Name(category.name.clone()),
            };
            let mut visible = self.calendar.filter().is_visible(&key);
            let color = parse_color(&category.color).unwrap_or(DEFAULT_EVENT_COLOR);

            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                ui.painter().rect_filled(rect, 2.0, color);
                if ui.checkbox(&mut visible, category.name.as_str()).changed() {
                    log::debug!("Category '{}' visible: {}", category.name, visible);
                    self.calendar.set_category_filter(key, visible);
                }
            });
        }
    }

    fn render_layout_options(&mut self, ui: &mut egui::Ui) {
        let mut lanes = self.calendar.layout().lanes == LaneMode::Lanes;
        if ui
            .checkbox(&mut lanes, "Side by side")
            .on_hover_text("Split overlapping games into columns")
            .changed()
        {
            let layout = LayoutConfig {
                lanes: if lanes { LaneMode::Lanes } else { LaneMode::Overlap },
                ..*self.calendar.layout()
            };
            self.calendar.set_layout(layout);
        }
    }

    /// Add, edit or delete courts by id.
    pub(super) fn render_courts(&mut self, ctx: &egui::Context) {
        if !self.show_courts {
            return;
        }

        let mut open = true;
        let mut add = false;
        let mut edit = None;
        let mut delete = None;

        let window = egui::Window::new("Courts")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                let add_button = ui.button("＋ Add court");
                if add_button.clicked() {
                    add = true;
                }
                ui.separator();

                for court in &self.form_choices.courts {
                    let Some(id) = court.id else {
                        continue;
                    };
                    let picked = self.court_id_input.trim() == id.to_string();
                    if ui
                        .selectable_label(picked, format!("{} (#{})", court.name, id))
                        .clicked()
                    {
                        self.court_id_input = id.to_string();
                    }
                }

                ui.horizontal(|ui| {
                    ui.label("Court id");
                    ui.add(egui::TextEdit::singleline(&mut self.court_id_input).desired_width(60.0));
                });

                let court_id = self.court_id_input.trim().parse::<i64>().ok();
                ui.horizontal(|ui| {
                    if ui.add_enabled(court_id.is_some(), egui::Button::new("Edit")).clicked() {
                        edit = court_id;
                    }
                    if ui.add_enabled(court_id.is_some(), egui::Button::new("Delete")).clicked() {
                        delete = court_id;
                    }
                });
                add_button.rect
            });

        if let Some(rect) = window.and_then(|window| window.inner) {
            self.form_triggers.push((FormKind::Court, rect));
        }

        if add && !self.court_form.open_create() {
            self.toast_manager.info("The court form is already open");
        }
        if let Some(court_id) = edit {
            self.load_court_for_edit(court_id, ctx);
        }
        if let Some(court_id) = delete {
            self.confirm_dialog.request(ConfirmAction::DeleteCourt { court_id });
        }
        if !open {
            self.show_courts = false;
        }
    }
}
