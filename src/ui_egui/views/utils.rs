//! Common utility functions for calendar views.
//!
//! This module contains pure helper functions used across different view types.

use egui::Color32;

use crate::models::event::EventRecord;

pub const DEFAULT_EVENT_COLOR: Color32 = Color32::from_rgb(100, 150, 200);

/// Parse a hex color string to Color32.
///
/// # Arguments
/// * `hex` - A hex color string, optionally prefixed with '#' (e.g., "#FF5500" or "FF5500")
///
/// # Returns
/// * `Some(Color32)` if parsing succeeds
/// * `None` if the input is empty or invalid
pub fn parse_color(hex: &str) -> Option<Color32> {
    if hex.is_empty() {
        return None;
    }

    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some(Color32::from_rgb(r, g, b))
}

/// Fill colour for a game tile: its category colour or the default blue.
pub fn event_color(event: &EventRecord) -> Color32 {
    event
        .category_color
        .as_deref()
        .and_then(parse_color)
        .unwrap_or(DEFAULT_EVENT_COLOR)
}

/// Black or white, whichever reads better on `background`.
pub fn text_color_for(background: Color32) -> Color32 {
    let luminance = 0.299 * background.r() as f32
        + 0.587 * background.g() as f32
        + 0.114 * background.b() as f32;
    if luminance > 160.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

/// Hover text for a game tile.
pub fn format_event_tooltip(event: &EventRecord) -> String {
    let mut lines = vec![format!("📌 {}", event.display_title())];
    lines.push(format!("🕐 {}", event.time_range()));

    if let Some(court) = event.court_name.as_deref().filter(|c| !c.is_empty()) {
        lines.push(format!("📍 {}", court));
    }
    if let Some(category) = event.category_name.as_deref().filter(|c| !c.is_empty()) {
        lines.push(format!("🏷️ {}", category));
    }
    if event.warning {
        lines.push("⚠ Check travel time between games".to_string());
    }

    lines.push("\n💡 Click for details".to_string());
    lines.join("\n")
}
