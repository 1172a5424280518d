// Settings module
// Client configuration persisted as TOML in the platform config directory

use serde::{Deserialize, Serialize};

use crate::models::cursor::ViewMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the club server, without a trailing slash
    pub server_url: String,
    /// CSRF token sent with every form post; posting is disabled without it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
    /// Page the game and category forms are posted to
    pub form_path: String,
    /// Page the court form is posted to
    pub courts_path: String,
    pub pixels_per_hour: f32,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub default_view: ViewMode,
    /// 0 = Sunday, 1 = Monday, ...
    pub first_day_of_week: u8,
    /// Place concurrent games side by side instead of on top of each other
    pub lane_layout: bool,
    /// Also listen for pushed updates on the server's WebSocket
    pub live_updates: bool,
    pub live_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            csrf_token: None,
            form_path: "/day/".to_string(),
            courts_path: "/courts/".to_string(),
            pixels_per_hour: 100.0,
            refresh_interval_secs: 10,
            request_timeout_secs: 20,
            default_view: ViewMode::Day,
            first_day_of_week: 0, // Sunday
            lane_layout: false,
            live_updates: false,
            live_path: "/ws/events/".to_string(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err("Server URL must start with http:// or https://".to_string());
        }
        if !self.form_path.starts_with('/')
            || !self.courts_path.starts_with('/')
            || !self.live_path.starts_with('/')
        {
            return Err("Form paths must start with '/'".to_string());
        }
        if !(10.0..=1000.0).contains(&self.pixels_per_hour) {
            return Err("Pixels per hour must be between 10 and 1000".to_string());
        }
        if self.refresh_interval_secs == 0 {
            return Err("Refresh interval must be at least one second".to_string());
        }
        if self.first_day_of_week > 6 {
            return Err("First day of week must be between 0 and 6".to_string());
        }
        Ok(())
    }

    /// Server URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }

    /// WebSocket address on the same host: `http` becomes `ws`, `https`
    /// becomes `wss`.
    pub fn live_url(&self) -> String {
        let base = self.base_url();
        let socket_base = match base.strip_prefix("https://") {
            Some(rest) => format!("wss://{}", rest),
            None => format!("ws://{}", base.trim_start_matches("http://")),
        };
        format!("{}{}", socket_base, self.live_path)
    }
}
