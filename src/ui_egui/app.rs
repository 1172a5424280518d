mod confirm;
mod detail;
mod forms;
mod lifecycle;
mod navigation;
mod requests;
mod sidebar;
mod toast;

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Local;

use self::confirm::ConfirmDialogState;
use self::detail::DetailWindow;
use self::requests::WorkerMessage;
use self::toast::ToastManager;
use crate::models::cursor::ViewMode;
use crate::models::settings::Settings;
use crate::services::backend::{FormChoices, HttpBackend, LiveConnection, LiveFeed};
use crate::services::controller::CalendarController;
use crate::services::forms::{FormController, FormKind};
use crate::ui_egui::views::day_view::DayView;
use crate::ui_egui::views::week_view::WeekView;

/// Longest the UI sleeps between frames while idle.
const MAX_IDLE_WAIT: StdDuration = StdDuration::from_secs(1);

pub struct CalendarApp {
    settings: Settings,
    calendar: CalendarController,
    /// `None` when the HTTP client could not be built; the grid stays empty
    backend: Option<Arc<HttpBackend>>,
    worker_tx: Sender<WorkerMessage>,
    worker_rx: Receiver<WorkerMessage>,
    in_flight: usize,
    live_feed: Option<LiveFeed>,
    live_connection: Option<LiveConnection>,
    game_form: FormController,
    court_form: FormController,
    category_form: FormController,
    /// Category and court options offered by the game form
    form_choices: FormChoices,
    game_form_was_visible: bool,
    /// Comma separated participant identifiers for the game form
    participants_input: String,
    /// Buttons that open each form; presses on them do not count as outside clicks
    form_triggers: Vec<(FormKind, egui::Rect)>,
    detail: Option<DetailWindow>,
    court_id_input: String,
    go_to_input: String,
    show_courts: bool,
    toast_manager: ToastManager,
    confirm_dialog: ConfirmDialogState,
}

impl eframe::App for CalendarApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_update(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.handle_exit();
    }
}

impl CalendarApp {
    fn handle_update(&mut self, ctx: &egui::Context) {
        let now = Local::now();

        self.poll_workers(ctx);
        self.poll_live_feed();
        if let Some(ticket) = self.calendar.tick(now) {
            self.spawn_fetch(ticket, ctx);
        }

        self.form_triggers.clear();
        self.render_header(ctx);
        self.render_sidebar(ctx);

        let interaction = egui::CentralPanel::default()
            .show(ctx, |ui| match self.calendar.mode() {
                ViewMode::Day => DayView::show(ui, &self.calendar),
                ViewMode::Week => WeekView::show(ui, &self.calendar),
            })
            .inner;
        if let Some(game_id) = interaction.clicked_event {
            self.open_detail(game_id, ctx);
        }

        self.render_courts(ctx);
        self.render_forms(ctx);
        self.render_detail(ctx);
        self.handle_confirm_dialog(ctx);
        self.toast_manager.render(ctx, ctx.style().visuals.dark_mode);

        let wait = self
            .calendar
            .next_refresh_in(now)
            .unwrap_or(MAX_IDLE_WAIT)
            .min(MAX_IDLE_WAIT);
        ctx.request_repaint_after(wait);
    }

    /// Open the server's WebSocket next to the polling loop.
    fn connect_live(&mut self) {
        let url = self.settings.live_url();
        log::info!("Connecting live channel at {}", url);
        let (sender, feed) = LiveFeed::channel();
        self.live_connection = Some(LiveConnection::spawn(url, sender));
        self.live_feed = Some(feed);
    }

    /// Apply pushed frames and keep the subscription on the selected date.
    fn poll_live_feed(&mut self) {
        let Some(feed) = self.live_feed.as_mut() else {
            return;
        };
        for message in feed.drain() {
            self.calendar.apply_live(message);
        }
        if !feed.is_connected() {
            self.live_feed = None;
            self.live_connection = None;
            return;
        }

        if let (Some(connection), Some(target)) =
            (self.live_connection.as_mut(), self.calendar.selected())
        {
            connection.subscribe(target.date);
        }
    }

    fn can_post(&self) -> bool {
        self.backend.as_ref().is_some_and(|backend| backend.can_post())
    }

    fn form_mut(&mut self, kind: FormKind) -> &mut FormController {
        match kind {
            FormKind::Game => &mut self.game_form,
            FormKind::Court => &mut self.court_form,
            FormKind::Category => &mut self.category_form,
        }
    }

    fn form(&self, kind: FormKind) -> &FormController {
        match kind {
            FormKind::Game => &self.game_form,
            FormKind::Court => &self.court_form,
            FormKind::Category => &self.category_form,
        }
    }
}
