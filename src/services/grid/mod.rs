//! Grid renderer model.
//!
//! Holds the static hour ruler and one tile per displayed day. Painting
//! always clears every tile first, so the same records produce the same
//! tiles no matter how often or in which order they are painted.

use chrono::NaiveDate;

use crate::models::event::EventRecord;
use crate::services::layout::{layout_events, CategoryFilter, LayoutBox, LayoutConfig};

/// Hours labelled on the ruler. Hour 0 is the origin and carries no cell.
pub const RULER_HOURS: std::ops::RangeInclusive<u32> = 1..=23;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulerCell {
    pub hour: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourRuler {
    cells: Vec<RulerCell>,
}

impl Default for HourRuler {
    fn default() -> Self {
        Self::new()
    }
}

impl HourRuler {
    pub fn new() -> Self {
        let cells = RULER_HOURS
            .map(|hour| RulerCell {
                hour,
                label: format!("{}:00", hour),
            })
            .collect();
        Self { cells }
    }

    pub fn cells(&self) -> &[RulerCell] {
        &self.cells
    }

    /// Vertical position of an hour line.
    pub fn offset_of(hour: u32, config: &LayoutConfig) -> f32 {
        config.day_extent() * hour as f32 / 24.0
    }
}

/// One day's drawing area.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub date: NaiveDate,
    pub boxes: Vec<LayoutBox>,
}

impl Tile {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            boxes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridModel {
    ruler: HourRuler,
    tiles: Vec<Tile>,
}

impl GridModel {
    pub fn day(date: NaiveDate) -> Self {
        Self::with_dates(&[date])
    }

    pub fn week(dates: &[NaiveDate]) -> Self {
        Self::with_dates(dates)
    }

    fn with_dates(dates: &[NaiveDate]) -> Self {
        Self {
            ruler: HourRuler::new(),
            tiles: dates.iter().copied().map(Tile::empty).collect(),
        }
    }

    pub fn ruler(&self) -> &HourRuler {
        &self.ruler
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.tiles.iter().map(|tile| tile.date).collect()
    }

    pub fn clear(&mut self) {
        for tile in &mut self.tiles {
            tile.boxes.clear();
        }
    }

    /// Repaint every tile from `records`, keyed by tile date.
    ///
    /// Records for dates the grid does not show are ignored.
    pub fn paint(
        &mut self,
        records: &[(NaiveDate, Vec<EventRecord>)],
        config: &LayoutConfig,
        filter: &CategoryFilter,
    ) {
        self.clear();

        for tile in &mut self.tiles {
            let visible: Vec<EventRecord> = records
                .iter()
                .filter(|(date, _)| *date == tile.date)
                .flat_map(|(_, events)| filter.apply(events))
                .cloned()
                .collect();

            let mut boxes = layout_events(&visible, config);
            boxes.sort_by(|a, b| {
                a.top_offset
                    .total_cmp(&b.top_offset)
                    .then(a.event_id.cmp(&b.event_id))
            });
            tile.boxes = boxes;
        }
    }

    pub fn box_count(&self) -> usize {
        self.tiles.iter().map(|tile| tile.boxes.len()).sum()
    }

    pub fn total_height(config: &LayoutConfig) -> f32 {
        config.day_extent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn test_ruler_has_hours_one_to_twenty_three() {
        let ruler = HourRuler::new();
        assert_eq!(ruler.cells().len(), 23);
        assert_eq!(ruler.cells()[0].label, "1:00");
        assert_eq!(ruler.cells()[22].label, "23:00");
        assert_eq!(HourRuler::offset_of(9, &LayoutConfig::default()), 900.0);
    }

    #[test]
    fn test_week_grid_has_seven_tiles() {
        let dates: Vec<NaiveDate> = (2..=8).map(date).collect();
        let grid = GridModel::week(&dates);
        assert_eq!(grid.tiles().len(), 7);
        assert_eq!(grid.dates(), dates);
        assert_eq!(GridModel::total_height(&LayoutConfig::default()), 2400.0);
    }

    #[test]
    fn test_paint_is_idempotent_and_order_independent() {
        let events = vec![
            EventRecord::new(2, "Doubles", "10:00", "11:00"),
            EventRecord::new(1, "Singles", "10:00", "10:30"),
            EventRecord::new(3, "Coaching", "07:00", "08:00"),
        ];
        let mut reversed = events.clone();
        reversed.reverse();

        let config = LayoutConfig::default();
        let filter = CategoryFilter::new();
        let mut grid = GridModel::day(date(7));

        grid.paint(&[(date(7), events.clone())], &config, &filter);
        let first = grid.clone();
        grid.paint(&[(date(7), events)], &config, &filter);
        assert_eq!(grid, first);
        grid.paint(&[(date(7), reversed)], &config, &filter);
        assert_eq!(grid, first);

        let ids: Vec<i64> = grid.tiles()[0].boxes.iter().map(|b| b.event_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_paint_replaces_previous_boxes() {
        let config = LayoutConfig::default();
        let filter = CategoryFilter::new();
        let mut grid = GridModel::day(date(7));

        grid.paint(
            &[(date(7), vec![EventRecord::new(1, "Old", "09:00", "10:00")])],
            &config,
            &filter,
        );
        grid.paint(&[(date(7), Vec::new())], &config, &filter);
        assert_eq!(grid.box_count(), 0);
    }

    #[test]
    fn test_paint_routes_records_to_their_tile() {
        let dates: Vec<NaiveDate> = (2..=8).map(date).collect();
        let mut grid = GridModel::week(&dates);
        grid.paint(
            &[
                (date(3), vec![EventRecord::new(1, "Mon", "09:00", "10:00")]),
                (date(20), vec![EventRecord::new(2, "Elsewhere", "09:00", "10:00")]),
            ],
            &LayoutConfig::default(),
            &CategoryFilter::new(),
        );
        assert_eq!(grid.box_count(), 1);
        assert_eq!(grid.tiles()[1].boxes[0].event_id, 1);
    }
}
