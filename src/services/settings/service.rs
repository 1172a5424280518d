use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;

use crate::models::cursor::ViewMode;
use crate::models::settings::Settings;

const SETTINGS_FILE: &str = "settings.toml";
const SERVER_ENV: &str = "CLUB_CALENDAR_SERVER";
const CSRF_ENV: &str = "CLUB_CALENDAR_CSRF";

pub struct SettingsService {
    path: PathBuf,
}

impl SettingsService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Settings file in the platform config directory, or the working
    /// directory when no home directory can be resolved.
    pub fn default_location() -> Self {
        let path = ProjectDirs::from("com", "ClubCalendar", "ClubCalendar")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings from disk, falling back to defaults when the file does not exist.
    pub fn get(&self) -> Result<Settings> {
        let settings = apply_env_overrides(self.load_file()?);
        settings
            .validate()
            .map_err(|e| anyhow!("Invalid settings: {}", e))?;
        Ok(settings)
    }

    /// Update settings
    pub fn update(&self, settings: &Settings) -> Result<()> {
        settings
            .validate()
            .map_err(|e| anyhow!("Invalid settings: {}", e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let text = toml::to_string_pretty(settings).context("Failed to serialise settings")?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;
        Ok(())
    }

    /// Store the view choices without writing environment overrides back
    /// into the file.
    pub fn update_view_preferences(&self, default_view: ViewMode, lane_layout: bool) -> Result<()> {
        let mut settings = self.load_file()?;
        settings.default_view = default_view;
        settings.lane_layout = lane_layout;
        self.update(&settings)
    }

    fn load_file(&self) -> Result<Settings> {
        if !self.path.exists() {
            log::info!("No settings file at {}, using defaults", self.path.display());
            return Ok(Settings::default());
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse settings in {}", self.path.display()))
    }
}

fn apply_env_overrides(mut settings: Settings) -> Settings {
    if let Ok(server) = std::env::var(SERVER_ENV) {
        if !server.trim().is_empty() {
            settings.server_url = server.trim().to_string();
        }
    }
    if let Ok(token) = std::env::var(CSRF_ENV) {
        if !token.trim().is_empty() {
            settings.csrf_token = Some(token.trim().to_string());
        }
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let service = SettingsService::new(dir.path().join("settings.toml"));
        let settings = service.get().unwrap();
        assert_eq!(settings.pixels_per_hour, Settings::default().pixels_per_hour);
    }

    #[test]
    fn test_update_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let service = SettingsService::new(dir.path().join("nested").join("settings.toml"));

        let settings = Settings {
            refresh_interval_secs: 30,
            lane_layout: true,
            first_day_of_week: 1,
            ..Settings::default()
        };
        service.update(&settings).unwrap();

        let loaded = service.get().unwrap();
        assert_eq!(loaded.refresh_interval_secs, 30);
        assert!(loaded.lane_layout);
        assert_eq!(loaded.first_day_of_week, 1);
    }

    #[test]
    fn test_update_rejects_invalid_settings() {
        let dir = tempdir().unwrap();
        let service = SettingsService::new(dir.path().join("settings.toml"));
        let settings = Settings {
            refresh_interval_secs: 0,
            ..Settings::default()
        };
        assert!(service.update(&settings).is_err());
        assert!(!service.path().exists());
    }

    #[test]
    fn test_view_preferences_keep_other_fields() {
        let dir = tempdir().unwrap();
        let service = SettingsService::new(dir.path().join("settings.toml"));
        let settings = Settings {
            server_url: "https://club.example.org".to_string(),
            ..Settings::default()
        };
        service.update(&settings).unwrap();

        service.update_view_preferences(ViewMode::Week, true).unwrap();

        let text = std::fs::read_to_string(service.path()).unwrap();
        assert!(!text.contains("csrf_token"));
        let loaded: Settings = toml::from_str(&text).unwrap();
        assert_eq!(loaded.server_url, "https://club.example.org");
        assert_eq!(loaded.default_view, ViewMode::Week);
        assert!(loaded.lane_layout);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "pixels_per_hour = \"lots\"").unwrap();
        assert!(SettingsService::new(path).get().is_err());
    }
}
