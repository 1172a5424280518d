//! Date cursor for the day and week grids.
//!
//! The cursor holds the calendar position shown by a navigator and moves it
//! one day (day mode) or seven days (week mode) at a time. Month lengths are
//! resolved through three classes (30-day months, 31-day months and February)
//! so rollover across month, year and leap-year boundaries never produces an
//! impossible date.

use chrono::{Datelike, Duration, NaiveDate};
use thiserror::Error;

use crate::utils::date::{month_name, short_month_name, weekday_name};

/// Leap year rule of the Gregorian calendar.
pub fn is_leap_year(year: i32) -> bool {
    if year % 100 == 0 {
        year % 400 == 0
    } else {
        year % 4 == 0
    }
}

/// Length class of a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthClass {
    Thirty,
    ThirtyOne,
    February,
}

/// Classify a 0-based month index (0 = January).
pub fn month_class(month: u32) -> MonthClass {
    match month {
        3 | 5 | 8 | 10 => MonthClass::Thirty,
        1 => MonthClass::February,
        _ => MonthClass::ThirtyOne,
    }
}

/// Number of days in a 0-based month of the given year.
pub fn days_in_month(month: u32, year: i32) -> u32 {
    match month_class(month) {
        MonthClass::Thirty => 30,
        MonthClass::ThirtyOne => 31,
        MonthClass::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

/// Direction of a navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Next => Direction::Previous,
            Direction::Previous => Direction::Next,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("month index {0} is out of range (expected 0..=11)")]
    InvalidMonth(u32),
    #[error("day {date} does not exist in month {month} of {year}")]
    InvalidDate { date: u32, month: u32, year: i32 },
}

fn check_date(date: u32, month: u32, year: i32) -> Result<(), CursorError> {
    if month > 11 {
        return Err(CursorError::InvalidMonth(month));
    }
    if date == 0 || date > days_in_month(month, year) {
        return Err(CursorError::InvalidDate { date, month, year });
    }
    Ok(())
}

fn step_month_forward(month: &mut u32, year: &mut i32) {
    if *month == 11 {
        *month = 0;
        *year += 1;
    } else {
        *month += 1;
    }
}

fn step_month_backward(month: &mut u32, year: &mut i32) {
    if *month == 0 {
        *month = 11;
        *year -= 1;
    } else {
        *month -= 1;
    }
}

/// Single-day cursor.
///
/// `day` is the weekday index (0 = Sunday), `date` the day of month and
/// `month` a 0-based month index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayCursor {
    pub day: u32,
    pub date: u32,
    pub month: u32,
    pub year: i32,
}

impl DayCursor {
    /// Build a cursor for `date` of the 0-based `month` in `year`.
    ///
    /// # Examples
    /// ```
    /// use club_calendar::models::cursor::DayCursor;
    ///
    /// let cursor = DayCursor::new(2024, 1, 29).unwrap();
    /// assert_eq!(cursor.iso(), "2024-02-29");
    /// assert!(DayCursor::new(2023, 1, 29).is_err());
    /// ```
    pub fn new(year: i32, month: u32, date: u32) -> Result<Self, CursorError> {
        check_date(date, month, year)?;
        let naive = NaiveDate::from_ymd_opt(year, month + 1, date)
            .ok_or(CursorError::InvalidDate { date, month, year })?;
        Ok(Self::from_date(naive))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: date.weekday().num_days_from_sunday(),
            date: date.day(),
            month: date.month0(),
            year: date.year(),
        }
    }

    /// True when the fields describe a real calendar day.
    pub fn is_valid(&self) -> bool {
        self.day <= 6 && check_date(self.date, self.month, self.year).is_ok()
    }

    /// Move one day forwards or backwards and return the new position.
    pub fn advance(&mut self, direction: Direction) -> Self {
        match direction {
            Direction::Next => {
                self.day = (self.day + 1) % 7;
                self.date += 1;
                if self.date > days_in_month(self.month, self.year) {
                    self.date = 1;
                    step_month_forward(&mut self.month, &mut self.year);
                }
            }
            Direction::Previous => {
                self.day = (self.day + 6) % 7;
                if self.date <= 1 {
                    step_month_backward(&mut self.month, &mut self.year);
                    self.date = days_in_month(self.month, self.year);
                } else {
                    self.date -= 1;
                }
            }
        }
        *self
    }

    pub fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, self.date)
    }

    /// ISO `YYYY-MM-DD` string sent to the server.
    pub fn iso(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month + 1, self.date)
    }

    /// Header label, e.g. `Thursday 29 February 2024`.
    pub fn label(&self) -> String {
        format!(
            "{} {} {} {}",
            weekday_name(self.day),
            self.date,
            month_name(self.month),
            self.year
        )
    }
}

/// Seven-day span whose endpoints may sit in different months or years.
///
/// `year` belongs to the first endpoint; the year of the last endpoint is
/// derived by [`WeekCursor::last_year`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekCursor {
    pub first_date: u32,
    pub first_month: u32,
    pub last_date: u32,
    pub last_month: u32,
    pub year: i32,
}

impl WeekCursor {
    /// Span starting on `first_date` of the 0-based `first_month`.
    pub fn starting(year: i32, first_month: u32, first_date: u32) -> Result<Self, CursorError> {
        check_date(first_date, first_month, year)?;
        let mut cursor = Self {
            first_date,
            first_month,
            last_date: first_date,
            last_month: first_month,
            year,
        };
        cursor.derive_last();
        Ok(cursor)
    }

    /// Span containing `date`, beginning on `first_day_of_week` (0 = Sunday).
    pub fn containing(date: NaiveDate, first_day_of_week: u8) -> Self {
        let weekday = date.weekday().num_days_from_sunday() as i64;
        let offset = (weekday - first_day_of_week as i64).rem_euclid(7);
        let start = date - Duration::days(offset);
        let mut cursor = Self {
            first_date: start.day(),
            first_month: start.month0(),
            last_date: start.day(),
            last_month: start.month0(),
            year: start.year(),
        };
        cursor.derive_last();
        cursor
    }

    // The span is fixed at first_date + 6; the last endpoint takes the next
    // month when that overflows the first endpoint's month.
    fn derive_last(&mut self) {
        let length = days_in_month(self.first_month, self.year);
        let last = self.first_date + 6;
        if last > length {
            self.last_date = last - length;
            self.last_month = (self.first_month + 1) % 12;
        } else {
            self.last_date = last;
            self.last_month = self.first_month;
        }
    }

    pub fn next_week(&mut self) -> Self {
        self.first_date += 7;
        let length = days_in_month(self.first_month, self.year);
        if self.first_date > length {
            self.first_date -= length;
            step_month_forward(&mut self.first_month, &mut self.year);
        }
        self.derive_last();
        *self
    }

    pub fn prev_week(&mut self) -> Self {
        if self.first_date <= 7 {
            step_month_backward(&mut self.first_month, &mut self.year);
            self.first_date = self.first_date + days_in_month(self.first_month, self.year) - 7;
        } else {
            self.first_date -= 7;
        }
        self.derive_last();
        *self
    }

    pub fn step(&mut self, direction: Direction) -> Self {
        match direction {
            Direction::Next => self.next_week(),
            Direction::Previous => self.prev_week(),
        }
    }

    /// Year of the last endpoint (differs from `year` across New Year).
    pub fn last_year(&self) -> i32 {
        if self.last_month < self.first_month {
            self.year + 1
        } else {
            self.year
        }
    }

    pub fn is_valid(&self) -> bool {
        check_date(self.first_date, self.first_month, self.year).is_ok()
            && check_date(self.last_date, self.last_month, self.last_year()).is_ok()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.first_month + 1, self.first_date)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.last_year(), self.last_month + 1, self.last_date)
    }

    /// The seven dates of the span in display order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        match self.first_day() {
            Some(first) => (0..7).map(|offset| first + Duration::days(offset)).collect(),
            None => Vec::new(),
        }
    }

    /// Header label, e.g. `29 Dec 2024 – 4 Jan 2025`.
    pub fn label(&self) -> String {
        format!(
            "{} {} {} – {} {} {}",
            self.first_date,
            short_month_name(self.first_month),
            self.year,
            self.last_date,
            short_month_name(self.last_month),
            self.last_year()
        )
    }
}

/// Which navigator is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum ViewMode {
    #[default]
    Day,
    Week,
}

/// Cursor for either navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCursor {
    Day(DayCursor),
    Week(WeekCursor),
}

impl ViewCursor {
    pub fn new(mode: ViewMode, date: NaiveDate, first_day_of_week: u8) -> Self {
        match mode {
            ViewMode::Day => ViewCursor::Day(DayCursor::from_date(date)),
            ViewMode::Week => ViewCursor::Week(WeekCursor::containing(date, first_day_of_week)),
        }
    }

    pub fn mode(&self) -> ViewMode {
        match self {
            ViewCursor::Day(_) => ViewMode::Day,
            ViewCursor::Week(_) => ViewMode::Week,
        }
    }

    pub fn step(&mut self, direction: Direction) {
        match self {
            ViewCursor::Day(cursor) => {
                cursor.advance(direction);
            }
            ViewCursor::Week(cursor) => {
                cursor.step(direction);
            }
        }
    }

    /// Dates covered by the cursor (one for day mode, seven for week mode).
    pub fn dates(&self) -> Vec<NaiveDate> {
        match self {
            ViewCursor::Day(cursor) => cursor.to_date().into_iter().collect(),
            ViewCursor::Week(cursor) => cursor.dates(),
        }
    }

    /// Date that keys server requests: the day itself or the first day of the week.
    pub fn anchor(&self) -> Option<NaiveDate> {
        match self {
            ViewCursor::Day(cursor) => cursor.to_date(),
            ViewCursor::Week(cursor) => cursor.first_day(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ViewCursor::Day(cursor) => cursor.label(),
            ViewCursor::Week(cursor) => cursor.label(),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            ViewCursor::Day(cursor) => cursor.is_valid(),
            ViewCursor::Week(cursor) => cursor.is_valid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn day(year: i32, month: u32, date: u32) -> DayCursor {
        DayCursor::new(year, month, date).unwrap()
    }

    #[test_case(2000, true ; "divisible by 400")]
    #[test_case(1900, false ; "century not divisible by 400")]
    #[test_case(2024, true ; "divisible by 4")]
    #[test_case(2023, false ; "common year")]
    fn test_is_leap_year(year: i32, expected: bool) {
        assert_eq!(is_leap_year(year), expected);
    }

    #[test]
    fn test_days_in_month_classes() {
        assert_eq!(days_in_month(0, 2023), 31);
        assert_eq!(days_in_month(3, 2023), 30);
        assert_eq!(days_in_month(1, 2023), 28);
        assert_eq!(days_in_month(1, 2024), 29);
        assert_eq!(days_in_month(11, 2023), 31);
    }

    #[test_case((2024, 1, 28), (2024, 1, 29) ; "leap february")]
    #[test_case((2023, 1, 28), (2023, 2, 1) ; "common february")]
    #[test_case((2024, 11, 31), (2025, 0, 1) ; "new year")]
    #[test_case((2024, 3, 30), (2024, 4, 1) ; "thirty day month")]
    #[test_case((2024, 6, 31), (2024, 7, 1) ; "thirty one day month")]
    fn test_advance_next(from: (i32, u32, u32), to: (i32, u32, u32)) {
        let mut cursor = day(from.0, from.1, from.2);
        let next = cursor.advance(Direction::Next);
        assert_eq!((next.year, next.month, next.date), to);
        assert!(next.is_valid());
    }

    #[test_case((2025, 0, 1), (2024, 11, 31) ; "back over new year")]
    #[test_case((2024, 2, 1), (2024, 1, 29) ; "back into leap february")]
    #[test_case((2023, 2, 1), (2023, 1, 28) ; "back into common february")]
    #[test_case((2024, 4, 1), (2024, 3, 30) ; "back into thirty day month")]
    fn test_advance_previous(from: (i32, u32, u32), to: (i32, u32, u32)) {
        let mut cursor = day(from.0, from.1, from.2);
        let prev = cursor.advance(Direction::Previous);
        assert_eq!((prev.year, prev.month, prev.date), to);
        assert!(prev.is_valid());
    }

    #[test]
    fn test_weekday_wraps() {
        // 2024-12-28 is a Saturday
        let mut cursor = day(2024, 11, 28);
        assert_eq!(cursor.day, 6);
        assert_eq!(cursor.advance(Direction::Next).day, 0);
        assert_eq!(cursor.advance(Direction::Previous).day, 6);
    }

    #[test]
    fn test_every_day_matches_chrono() {
        let mut cursor = day(2023, 0, 1);
        let mut expected = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        for _ in 0..(365 * 3 + 1) {
            cursor.advance(Direction::Next);
            expected = expected.succ_opt().unwrap();
            assert!(cursor.is_valid(), "invalid cursor {:?}", cursor);
            assert_eq!(cursor, DayCursor::from_date(expected));
        }
    }

    #[test]
    fn test_new_rejects_impossible_dates() {
        assert_eq!(
            DayCursor::new(2023, 1, 29),
            Err(CursorError::InvalidDate { date: 29, month: 1, year: 2023 })
        );
        assert_eq!(DayCursor::new(2023, 12, 1), Err(CursorError::InvalidMonth(12)));
        assert!(DayCursor::new(2023, 0, 0).is_err());
    }

    #[test]
    fn test_iso_and_label() {
        let cursor = day(2024, 1, 29);
        assert_eq!(cursor.iso(), "2024-02-29");
        assert_eq!(cursor.label(), "Thursday 29 February 2024");
    }

    #[test]
    fn test_week_span_straddles_month() {
        let week = WeekCursor::starting(2024, 0, 28).unwrap();
        assert_eq!((week.last_date, week.last_month), (3, 1));
        assert_eq!(week.label(), "28 Jan 2024 – 3 Feb 2024");
    }

    #[test]
    fn test_week_span_straddles_year() {
        let mut week = WeekCursor::starting(2024, 11, 22).unwrap();
        week.next_week();
        assert_eq!(
            (week.first_date, week.first_month, week.last_date, week.last_month, week.year),
            (29, 11, 4, 0, 2024)
        );
        assert_eq!(week.last_year(), 2025);
        assert_eq!(week.label(), "29 Dec 2024 – 4 Jan 2025");

        week.next_week();
        assert_eq!((week.first_date, week.first_month, week.year), (5, 0, 2025));
    }

    #[test]
    fn test_prev_week_over_leap_february() {
        let mut week = WeekCursor::starting(2024, 2, 3).unwrap();
        week.prev_week();
        assert_eq!((week.first_date, week.first_month), (25, 1));
        assert_eq!((week.last_date, week.last_month), (2, 2));
        assert!(week.is_valid());
    }

    #[test]
    fn test_prev_week_from_january() {
        let mut week = WeekCursor::starting(2025, 0, 5).unwrap();
        week.prev_week();
        assert_eq!((week.first_date, week.first_month, week.year), (29, 11, 2024));
        assert_eq!(week.last_year(), 2025);
    }

    #[test]
    fn test_week_containing_respects_first_day() {
        // 2025-01-15 is a Wednesday
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let sunday_start = WeekCursor::containing(date, 0);
        assert_eq!((sunday_start.first_date, sunday_start.last_date), (12, 18));
        let monday_start = WeekCursor::containing(date, 1);
        assert_eq!((monday_start.first_date, monday_start.last_date), (13, 19));
        assert_eq!(monday_start.dates().len(), 7);
    }

    #[test]
    fn test_view_cursor_anchor() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let mut cursor = ViewCursor::new(ViewMode::Week, date, 0);
        assert_eq!(cursor.anchor(), NaiveDate::from_ymd_opt(2025, 1, 12));
        cursor.step(Direction::Next);
        assert_eq!(cursor.anchor(), NaiveDate::from_ymd_opt(2025, 1, 19));
        assert_eq!(cursor.mode(), ViewMode::Week);
    }
}
