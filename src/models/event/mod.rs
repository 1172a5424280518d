// Event module
// Game records as delivered by the club scheduling server

use serde::{Deserialize, Serialize};

/// A participant of a game, sent by the server as `[email, username]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Participant {
    pub identifier: String,
    pub display_name: String,
}

impl From<(String, String)> for Participant {
    fn from((identifier, display_name): (String, String)) -> Self {
        Self {
            identifier,
            display_name,
        }
    }
}

impl From<Participant> for (String, String) {
    fn from(participant: Participant) -> Self {
        (participant.identifier, participant.display_name)
    }
}

impl Participant {
    /// `username (email)` as shown in the detail window.
    pub fn label(&self) -> String {
        format!("{} ({})", self.display_name, self.identifier)
    }
}

/// One game in a day listing.
///
/// Records are immutable once received and replaced wholesale on every
/// fetch; nothing is diffed against the previous set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "game_id")]
    pub id: i64,
    #[serde(rename = "name")]
    pub title: String,
    #[serde(rename = "start_date_and_time")]
    pub start_time: String,
    #[serde(rename = "end_date_and_time")]
    pub end_time: String,
    #[serde(default, rename = "category_id", alias = "category", alias = "category__category_id")]
    pub category_id: Option<i64>,
    #[serde(default, rename = "category__name")]
    pub category_name: Option<String>,
    #[serde(default, rename = "category__color")]
    pub category_color: Option<String>,
    #[serde(default, rename = "court_id", alias = "court", alias = "court__court_id")]
    pub court_id: Option<i64>,
    #[serde(default)]
    pub court_name: Option<String>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default, rename = "is_creator")]
    pub creator_flag: bool,
    #[serde(default, rename = "profile_picture_url")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub warning: bool,
    /// Offset the server computed itself; used only when the times cannot be parsed.
    #[serde(default)]
    pub margin_top: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
}

impl EventRecord {
    pub fn new(id: i64, title: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            start_time: start.into(),
            end_time: end.into(),
            category_id: None,
            category_name: None,
            category_color: None,
            court_id: None,
            court_name: None,
            participants: Vec::new(),
            creator_flag: false,
            avatar_url: None,
            warning: false,
            margin_top: None,
            height: None,
        }
    }

    pub fn with_category(mut self, id: i64, name: impl Into<String>, color: impl Into<String>) -> Self {
        self.category_id = Some(id);
        self.category_name = Some(name.into());
        self.category_color = Some(color.into());
        self
    }

    /// Title with a marker for games the server flagged (e.g. not enough travel time).
    pub fn display_title(&self) -> String {
        if self.warning {
            format!("⚠ {}", self.title)
        } else {
            self.title.clone()
        }
    }

    /// `HH:MM - HH:MM` for the tile caption.
    pub fn time_range(&self) -> String {
        format!("{} - {}", clock_text(&self.start_time), clock_text(&self.end_time))
    }
}

/// Pull the `HH:MM` part out of either a bare time or a timestamp.
fn clock_text(value: &str) -> String {
    let value = value.trim();
    let time_part = value
        .split_once('T')
        .or_else(|| value.split_once(' '))
        .map(|(_, time)| time)
        .unwrap_or(value);
    time_part.chars().take(5).collect()
}

/// Full record returned by the game detail request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    #[serde(default)]
    pub game_id: Option<i64>,
    pub name: String,
    pub start_date_and_time: String,
    pub end_date_and_time: String,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub court: Option<i64>,
    #[serde(default)]
    pub court_name: Option<String>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub is_creator: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_server_record() {
        let json = r##"{
            "game_id": 7,
            "name": "Doubles",
            "start_date_and_time": "2025-03-07T09:00:00",
            "end_date_and_time": "2025-03-07T10:30:00",
            "category__name": "Training",
            "category__color": "#3B82F6",
            "court_name": "Centre Court",
            "margin_top": 900,
            "height": 150,
            "profile_picture_url": "/media/avatars/a.png",
            "warning": true,
            "is_creator": true
        }"##;

        let record: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.category_name.as_deref(), Some("Training"));
        assert_eq!(record.margin_top, Some(900.0));
        assert!(record.creator_flag);
        assert!(record.participants.is_empty());
        assert_eq!(record.time_range(), "09:00 - 10:30");
        assert_eq!(record.display_title(), "⚠ Doubles");
    }

    #[test]
    fn test_participants_from_pairs() {
        let json = r#"{
            "name": "Singles",
            "start_date_and_time": "2025-03-07 18:00",
            "end_date_and_time": "2025-03-07 19:00",
            "participants": [["ann@example.com", "ann"], ["bo@example.com", "bo"]],
            "is_creator": false
        }"#;

        let detail: EventDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.participants.len(), 2);
        assert_eq!(detail.participants[0].label(), "ann (ann@example.com)");
        assert!(!detail.is_creator);
    }

    #[test]
    fn test_time_range_for_bare_times() {
        let record = EventRecord::new(1, "Clinic", "08:15", "09:45");
        assert_eq!(record.time_range(), "08:15 - 09:45");
        assert_eq!(record.display_title(), "Clinic");
    }
}
