// Date utility functions
// Names and ISO helpers shared by the cursor, the backend and the views

use chrono::NaiveDate;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Full month name for a 0-based month index.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month % 12) as usize]
}

/// Three-letter month name for a 0-based month index.
pub fn short_month_name(month: u32) -> &'static str {
    &MONTH_NAMES[(month % 12) as usize][..3]
}

/// Weekday name for an index counted from Sunday.
pub fn weekday_name(day: u32) -> &'static str {
    WEEKDAY_NAMES[(day % 7) as usize]
}

pub fn to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` date; single-digit month and day are accepted.
pub fn parse_iso(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}
