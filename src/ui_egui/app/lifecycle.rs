use std::sync::mpsc;
use std::sync::Arc;

use chrono::Local;

use super::confirm::ConfirmDialogState;
use super::toast::ToastManager;
use super::CalendarApp;
use crate::models::settings::Settings;
use crate::services::backend::{FormChoices, HttpBackend};
use crate::services::controller::CalendarController;
use crate::services::forms::{FormController, FormKind};
use crate::services::layout::LaneMode;
use crate::services::settings::SettingsService;

impl CalendarApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = load_settings_or_default();
        log::info!(
            "Loaded settings: server={}, view={:?}, refresh={}s",
            settings.server_url,
            settings.default_view,
            settings.refresh_interval_secs
        );

        let live_updates = settings.live_updates;
        let mut app = Self::with_settings(settings);
        if live_updates {
            app.connect_live();
        }
        if let Some(ticket) = app.calendar.today(Local::now()) {
            app.spawn_fetch(ticket, &cc.egui_ctx);
        }
        app
    }

    fn with_settings(settings: Settings) -> Self {
        let backend = match HttpBackend::new(&settings) {
            Ok(backend) => Some(Arc::new(backend)),
            Err(err) => {
                log::error!("Calendar backend unavailable: {:#}", err);
                None
            }
        };

        let (worker_tx, worker_rx) = mpsc::channel();
        let calendar = CalendarController::new(&settings, Local::now().date_naive());

        Self {
            settings,
            calendar,
            backend,
            worker_tx,
            worker_rx,
            in_flight: 0,
            live_feed: None,
            live_connection: None,
            game_form: FormController::new(FormKind::Game),
            court_form: FormController::new(FormKind::Court),
            category_form: FormController::new(FormKind::Category),
            form_choices: FormChoices::default(),
            game_form_was_visible: false,
            participants_input: String::new(),
            form_triggers: Vec::new(),
            detail: None,
            court_id_input: String::new(),
            go_to_input: String::new(),
            show_courts: false,
            toast_manager: ToastManager::new(),
            confirm_dialog: ConfirmDialogState::new(),
        }
    }

    pub(super) fn handle_exit(&mut self) {
        log::info!("Closing calendar ({} requests still in flight)", self.in_flight);
        self.calendar.dispose();
        // Dropping the connection ends its worker.
        self.live_connection = None;
        self.live_feed = None;
        self.persist_settings();
    }

    /// Remember the view mode and lane choice for the next start.
    pub(super) fn persist_settings(&mut self) {
        self.settings.default_view = self.calendar.mode();
        self.settings.lane_layout = self.calendar.layout().lanes == LaneMode::Lanes;

        let service = SettingsService::default_location();
        if let Err(err) =
            service.update_view_preferences(self.settings.default_view, self.settings.lane_layout)
        {
            log::error!("Failed to save settings: {:#}", err);
        }
    }
}

fn load_settings_or_default() -> Settings {
    let service = SettingsService::default_location();
    match service.get() {
        Ok(settings) => settings,
        Err(err) => {
            log::error!(
                "Failed to load settings from {}: {:#}",
                service.path().display(),
                err
            );
            Settings::default()
        }
    }
}
