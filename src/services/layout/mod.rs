//! Event layout engine.
//!
//! Converts game records into vertical placements inside a day tile. The day
//! origin is 00:00 and the vertical scale is a fixed number of pixels per
//! hour, so a game starting at 09:00 on a 100 px/h grid sits 900 px down.
//!
//! Concurrent games overlap by default. [`LaneMode::Lanes`] is an optional
//! step that splits each cluster of overlapping games into side-by-side lanes.

use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

use crate::models::event::EventRecord;
use crate::models::settings::Settings;

pub const DEFAULT_PIXELS_PER_HOUR: f32 = 100.0;
pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("unrecognised time value '{0}'")]
    InvalidTime(String),
    #[error("end time {end} is not after start time {start}")]
    InvalidSpan { start: String, end: String },
}

/// Units for [`LayoutBox`] offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutUnit {
    #[default]
    Pixels,
    /// Percent of the full 24 hour tile height
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaneMode {
    #[default]
    Overlap,
    Lanes,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub pixels_per_hour: f32,
    pub unit: LayoutUnit,
    pub lanes: LaneMode,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            pixels_per_hour: DEFAULT_PIXELS_PER_HOUR,
            unit: LayoutUnit::Pixels,
            lanes: LaneMode::Overlap,
        }
    }
}

impl LayoutConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            pixels_per_hour: settings.pixels_per_hour,
            unit: LayoutUnit::Pixels,
            lanes: if settings.lane_layout {
                LaneMode::Lanes
            } else {
                LaneMode::Overlap
            },
        }
    }

    /// Height of a whole day tile in the configured unit.
    pub fn day_extent(&self) -> f32 {
        match self.unit {
            LayoutUnit::Pixels => 24.0 * self.pixels_per_hour,
            LayoutUnit::Percent => 100.0,
        }
    }

    fn offset_for_minutes(&self, minutes: f32) -> f32 {
        match self.unit {
            LayoutUnit::Pixels => minutes / 60.0 * self.pixels_per_hour,
            LayoutUnit::Percent => minutes / MINUTES_PER_DAY as f32 * 100.0,
        }
    }
}

/// Placement of one game inside its tile.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    /// Id of the source record; views bind boxes to games through it
    pub event_id: i64,
    pub category_id: Option<i64>,
    pub top_offset: f32,
    pub height: f32,
    /// 0-based lane, always 0 with [`LaneMode::Overlap`]
    pub lane: usize,
    pub lane_count: usize,
    start_minutes: u32,
    end_minutes: u32,
}

impl LayoutBox {
    /// Horizontal `(left, width)` fractions of the tile for this box.
    pub fn horizontal_span(&self) -> (f32, f32) {
        let count = self.lane_count.max(1) as f32;
        (self.lane as f32 / count, 1.0 / count)
    }

    pub fn start_minutes(&self) -> u32 {
        self.start_minutes
    }

    pub fn end_minutes(&self) -> u32 {
        self.end_minutes
    }
}

/// A parsed time value: either a bare clock time or an absolute timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeValue {
    Clock(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl TimeValue {
    fn parse(text: &str) -> Result<Self, LayoutError> {
        let trimmed = text.trim();

        for format in ["%H:%M", "%H:%M:%S"] {
            if let Ok(time) = NaiveTime::parse_from_str(trimmed, format) {
                return Ok(TimeValue::Clock(time));
            }
        }

        if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(TimeValue::Timestamp(stamp.with_timezone(&Local).naive_local()));
        }

        for format in [
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
        ] {
            if let Ok(stamp) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(TimeValue::Timestamp(stamp));
            }
        }

        Err(LayoutError::InvalidTime(text.to_string()))
    }

    fn minutes(&self) -> u32 {
        let time = match self {
            TimeValue::Clock(time) => *time,
            TimeValue::Timestamp(stamp) => stamp.time(),
        };
        time.hour() * 60 + time.minute()
    }

    fn date(&self) -> Option<NaiveDate> {
        match self {
            TimeValue::Clock(_) => None,
            TimeValue::Timestamp(stamp) => Some(stamp.date()),
        }
    }
}

/// Minutes since midnight for `HH:MM`, `HH:MM:SS` or a timestamp.
///
/// # Examples
/// ```
/// use club_calendar::services::layout::minutes_since_midnight;
///
/// assert_eq!(minutes_since_midnight("09:30").unwrap(), 570);
/// assert_eq!(minutes_since_midnight("2025-03-07T18:15:00").unwrap(), 1095);
/// ```
pub fn minutes_since_midnight(text: &str) -> Result<u32, LayoutError> {
    TimeValue::parse(text).map(|value| value.minutes())
}

/// Calendar date of a timestamp; `None` for bare clock times.
pub fn date_of(text: &str) -> Option<NaiveDate> {
    TimeValue::parse(text).ok()?.date()
}

/// Start and end minutes of a span. An end on a later day than the start
/// is clamped to the end of the start's day.
fn span_minutes(start: &str, end: &str) -> Result<(u32, u32), LayoutError> {
    let start_value = TimeValue::parse(start)?;
    let end_value = TimeValue::parse(end)?;

    let start_minutes = start_value.minutes();
    let end_minutes = match (start_value.date(), end_value.date()) {
        (Some(start_date), Some(end_date)) if end_date > start_date => MINUTES_PER_DAY,
        _ => end_value.minutes(),
    };

    if end_minutes <= start_minutes {
        return Err(LayoutError::InvalidSpan {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok((start_minutes, end_minutes))
}

/// Length of a span in hours.
///
/// # Examples
/// ```
/// use club_calendar::services::layout::event_duration;
///
/// assert_eq!(event_duration("09:00", "10:30").unwrap(), 1.5);
/// ```
pub fn event_duration(start: &str, end: &str) -> Result<f32, LayoutError> {
    let (start_minutes, end_minutes) = span_minutes(start, end)?;
    Ok((end_minutes - start_minutes) as f32 / 60.0)
}

/// Place a single record.
pub fn layout_event(record: &EventRecord, config: &LayoutConfig) -> Result<LayoutBox, LayoutError> {
    let (start_minutes, end_minutes) = span_minutes(&record.start_time, &record.end_time)?;
    let duration_minutes = (end_minutes - start_minutes) as f32;

    Ok(LayoutBox {
        event_id: record.id,
        category_id: record.category_id,
        top_offset: config.offset_for_minutes(start_minutes as f32),
        height: config.offset_for_minutes(duration_minutes),
        lane: 0,
        lane_count: 1,
        start_minutes,
        end_minutes,
    })
}

/// Box built from the server's own `margin_top`/`height` hints, which are
/// pixel values at 100 px per hour.
fn layout_from_server_hint(record: &EventRecord, config: &LayoutConfig) -> Option<LayoutBox> {
    let margin_top = record.margin_top?;
    let height = record.height?;
    if margin_top < 0.0 || height <= 0.0 {
        return None;
    }

    let start_minutes =
        ((margin_top / DEFAULT_PIXELS_PER_HOUR * 60.0).round() as u32).min(MINUTES_PER_DAY);
    let length = (height / DEFAULT_PIXELS_PER_HOUR * 60.0).round() as u32;
    let end_minutes = start_minutes.saturating_add(length).min(MINUTES_PER_DAY);
    if start_minutes >= end_minutes {
        return None;
    }

    Some(LayoutBox {
        event_id: record.id,
        category_id: record.category_id,
        top_offset: config.offset_for_minutes(start_minutes as f32),
        height: config.offset_for_minutes((end_minutes - start_minutes) as f32),
        lane: 0,
        lane_count: 1,
        start_minutes,
        end_minutes,
    })
}

/// Place every record of a tile.
///
/// Records that cannot be placed are logged and skipped. The result is
/// ordered by start, end, then event id, so repeated layouts of the same set
/// compare equal regardless of input order.
pub fn layout_events(records: &[EventRecord], config: &LayoutConfig) -> Vec<LayoutBox> {
    let mut boxes: Vec<LayoutBox> = records
        .iter()
        .filter_map(|record| match layout_event(record, config) {
            Ok(layout) => Some(layout),
            Err(err) => match layout_from_server_hint(record, config) {
                Some(layout) => {
                    log::debug!("Game {} placed from server offsets: {}", record.id, err);
                    Some(layout)
                }
                None => {
                    log::warn!("Skipping game {} ('{}'): {}", record.id, record.title, err);
                    None
                }
            },
        })
        .collect();

    boxes.sort_by(|a, b| {
        a.start_minutes
            .cmp(&b.start_minutes)
            .then(a.end_minutes.cmp(&b.end_minutes))
            .then(a.event_id.cmp(&b.event_id))
    });

    if config.lanes == LaneMode::Lanes {
        assign_lanes(&mut boxes);
    }

    boxes
}

/// Greedy lane assignment over boxes sorted by start time. Each cluster of
/// transitively overlapping boxes shares one lane count.
fn assign_lanes(boxes: &mut [LayoutBox]) {
    let mut cluster_start = 0;
    let mut cluster_end = 0u32;
    let mut lane_ends: Vec<u32> = Vec::new();

    for index in 0..boxes.len() {
        if index > cluster_start && boxes[index].start_minutes >= cluster_end {
            close_cluster(&mut boxes[cluster_start..index], lane_ends.len());
            cluster_start = index;
            lane_ends.clear();
        }

        let start = boxes[index].start_minutes;
        let lane = match lane_ends.iter().position(|end| *end <= start) {
            Some(lane) => lane,
            None => {
                lane_ends.push(start);
                lane_ends.len() - 1
            }
        };
        lane_ends[lane] = boxes[index].end_minutes;
        boxes[index].lane = lane;
        cluster_end = if index == cluster_start {
            boxes[index].end_minutes
        } else {
            cluster_end.max(boxes[index].end_minutes)
        };
    }

    let len = boxes.len();
    close_cluster(&mut boxes[cluster_start..len], lane_ends.len());
}

fn close_cluster(cluster: &mut [LayoutBox], lane_count: usize) {
    for layout in cluster {
        layout.lane_count = lane_count.max(1);
    }
}

/// Identity of a category for filtering: the server id when the listing
/// carries one, otherwise the category name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryKey {
    Id(i64),
    Name(String),
}

impl CategoryKey {
    pub fn of(record: &EventRecord) -> Option<Self> {
        record
            .category_id
            .map(CategoryKey::Id)
            .or_else(|| record.category_name.clone().map(CategoryKey::Name))
    }
}

/// Hidden categories, applied to the records before layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    hidden: HashSet<CategoryKey>,
}

impl CategoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_visible(&mut self, key: CategoryKey, visible: bool) {
        if visible {
            self.hidden.remove(&key);
        } else {
            self.hidden.insert(key);
        }
    }

    pub fn is_visible(&self, key: &CategoryKey) -> bool {
        !self.hidden.contains(key)
    }

    /// Records without a category are always shown.
    pub fn allows(&self, record: &EventRecord) -> bool {
        CategoryKey::of(record).map_or(true, |key| self.is_visible(&key))
    }

    pub fn apply<'a>(&self, records: &'a [EventRecord]) -> Vec<&'a EventRecord> {
        records.iter().filter(|record| self.allows(record)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: i64, start: &str, end: &str) -> EventRecord {
        EventRecord::new(id, format!("Game {}", id), start, end)
    }

    #[test]
    fn test_minutes_since_midnight_formats() {
        assert_eq!(minutes_since_midnight("00:00").unwrap(), 0);
        assert_eq!(minutes_since_midnight("23:59").unwrap(), 1439);
        assert_eq!(minutes_since_midnight("07:05:30").unwrap(), 425);
        assert_eq!(minutes_since_midnight("2025-03-07 18:15").unwrap(), 1095);
        assert_eq!(minutes_since_midnight("2025-03-07T18:15:00.000").unwrap(), 1095);
        assert!(matches!(
            minutes_since_midnight("quarter past nine"),
            Err(LayoutError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_event_duration() {
        assert_eq!(event_duration("09:00", "10:30").unwrap(), 1.5);
        assert_eq!(event_duration("2025-03-07T09:00:00", "2025-03-07T09:45:00").unwrap(), 0.75);
        assert!(matches!(
            event_duration("10:00", "09:00"),
            Err(LayoutError::InvalidSpan { .. })
        ));
        assert!(event_duration("10:00", "10:00").is_err());
    }

    #[test]
    fn test_layout_pixels() {
        let layout = layout_event(&record(1, "09:00", "10:30"), &LayoutConfig::default()).unwrap();
        assert_eq!(layout.top_offset, 900.0);
        assert_eq!(layout.height, 150.0);
        assert_eq!(layout.event_id, 1);
    }

    #[test]
    fn test_layout_percent() {
        let config = LayoutConfig {
            unit: LayoutUnit::Percent,
            ..LayoutConfig::default()
        };
        let layout = layout_event(&record(1, "12:00", "18:00"), &config).unwrap();
        assert_eq!(layout.top_offset, 50.0);
        assert_eq!(layout.height, 25.0);
        assert_eq!(config.day_extent(), 100.0);
    }

    #[test]
    fn test_layout_clamps_overnight_timestamp() {
        let layout = layout_event(
            &record(1, "2025-03-07T22:00:00", "2025-03-08T01:00:00"),
            &LayoutConfig::default(),
        )
        .unwrap();
        assert_eq!(layout.top_offset, 2200.0);
        assert_eq!(layout.height, 200.0);
    }

    #[test]
    fn test_layout_falls_back_to_server_hint() {
        let mut hinted = record(5, "soon", "later");
        hinted.margin_top = Some(800.0);
        hinted.height = Some(50.0);
        let unplaceable = record(6, "soon", "later");

        let boxes = layout_events(&[hinted, unplaceable], &LayoutConfig::default());
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].event_id, 5);
        assert_eq!(boxes[0].top_offset, 800.0);
        assert_eq!(boxes[0].height, 50.0);
    }

    #[test]
    fn test_server_hint_past_midnight_is_skipped() {
        let mut late = record(7, "soon", "later");
        late.margin_top = Some(f32::MAX);
        late.height = Some(f32::MAX);
        let mut tail = record(8, "soon", "later");
        tail.margin_top = Some(2300.0);
        tail.height = Some(1.0e9);

        let boxes = layout_events(&[late, tail], &LayoutConfig::default());
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].event_id, 8);
        assert_eq!(boxes[0].end_minutes, MINUTES_PER_DAY);
        assert_eq!(boxes[0].height, 100.0);
    }

    #[test]
    fn test_overlap_mode_leaves_single_lane() {
        let boxes = layout_events(
            &[record(1, "09:00", "11:00"), record(2, "10:00", "12:00")],
            &LayoutConfig::default(),
        );
        assert!(boxes.iter().all(|b| b.lane == 0 && b.lane_count == 1));
    }

    #[test]
    fn test_lane_assignment() {
        let config = LayoutConfig {
            lanes: LaneMode::Lanes,
            ..LayoutConfig::default()
        };
        let boxes = layout_events(
            &[
                record(1, "09:00", "11:00"),
                record(2, "10:00", "12:00"),
                record(3, "11:00", "12:30"),
                record(4, "14:00", "15:00"),
            ],
            &config,
        );

        let lanes: Vec<(i64, usize, usize)> =
            boxes.iter().map(|b| (b.event_id, b.lane, b.lane_count)).collect();
        assert_eq!(lanes, vec![(1, 0, 2), (2, 1, 2), (3, 0, 2), (4, 0, 1)]);
        assert_eq!(boxes[1].horizontal_span(), (0.5, 0.5));
    }

    #[test]
    fn test_layout_order_independent() {
        let records = vec![
            record(3, "15:00", "16:00"),
            record(1, "09:00", "10:00"),
            record(2, "09:00", "10:00"),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let config = LayoutConfig::default();
        assert_eq!(layout_events(&records, &config), layout_events(&reversed, &config));
    }

    #[test]
    fn test_category_filter() {
        let training = record(1, "09:00", "10:00").with_category(4, "Training", "#10B981");
        let mut named_only = record(2, "11:00", "12:00");
        named_only.category_name = Some("Match".to_string());
        let uncategorised = record(3, "13:00", "14:00");
        let records = vec![training, named_only, uncategorised];

        let mut filter = CategoryFilter::new();
        filter.set_visible(CategoryKey::Id(4), false);
        filter.set_visible(CategoryKey::Name("Match".to_string()), false);
        let visible: Vec<i64> = filter.apply(&records).iter().map(|r| r.id).collect();
        assert_eq!(visible, vec![3]);

        filter.set_visible(CategoryKey::Id(4), true);
        let visible: Vec<i64> = filter.apply(&records).iter().map(|r| r.id).collect();
        assert_eq!(visible, vec![1, 3]);
    }
}
