// Test fixtures - reusable test data and an in-memory backend

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use club_calendar::models::court::Court;
use club_calendar::models::event::{EventDetail, EventRecord};
use club_calendar::services::backend::{
    BackendError, CalendarBackend, DayEventsResponse, FormChoices, SubmitOutcome,
};
use club_calendar::services::forms::FormSubmission;

/// Sample dates for testing
pub mod dates {
    use super::*;

    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// Friday 7 March 2025
    pub fn club_night() -> NaiveDate {
        date(2025, 3, 7)
    }

    /// Thursday 29 February 2024
    pub fn leap_day_2024() -> NaiveDate {
        date(2024, 2, 29)
    }

    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .from_local_datetime(&date.and_hms_opt(hour, minute, 0).unwrap())
            .single()
            .unwrap()
    }
}

/// Sample games for testing
pub mod events {
    use super::*;

    pub fn game(id: i64, date: NaiveDate, start: &str, end: &str) -> EventRecord {
        EventRecord::new(
            id,
            format!("Game {}", id),
            format!("{}T{}:00", date, start),
            format!("{}T{}:00", date, end),
        )
    }

    pub fn training(id: i64, date: NaiveDate, start: &str, end: &str) -> EventRecord {
        game(id, date, start, end).with_category(1, "Training", "#3B82F6")
    }

    pub fn lesson(id: i64, date: NaiveDate, start: &str, end: &str) -> EventRecord {
        game(id, date, start, end).with_category(2, "Lesson", "#10B981")
    }

    pub fn listing(date: NaiveDate, events: Vec<EventRecord>) -> DayEventsResponse {
        DayEventsResponse {
            events,
            current_date: Some(date.to_string()),
            prev_date: date.pred_opt().map(|d| d.to_string()),
            next_date: date.succ_opt().map(|d| d.to_string()),
        }
    }
}

/// Backend answering from memory and recording what was asked.
#[derive(Default)]
pub struct FakeBackend {
    pub days: HashMap<NaiveDate, Vec<EventRecord>>,
    pub failing: bool,
    pub answers: RefCell<VecDeque<SubmitOutcome>>,
    pub submissions: RefCell<Vec<FormSubmission>>,
    pub fetched: RefCell<Vec<NaiveDate>>,
    pub choices: FormChoices,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(mut self, date: NaiveDate, events: Vec<EventRecord>) -> Self {
        self.days.insert(date, events);
        self
    }

    pub fn answer(&self, outcome: SubmitOutcome) {
        self.answers.borrow_mut().push_back(outcome);
    }
}

impl CalendarBackend for FakeBackend {
    fn fetch_day(&self, date: NaiveDate) -> Result<DayEventsResponse, BackendError> {
        self.fetched.borrow_mut().push(date);
        if self.failing {
            return Err(BackendError::Status(500));
        }
        let events = self.days.get(&date).cloned().unwrap_or_default();
        Ok(events::listing(date, events))
    }

    fn fetch_event_detail(&self, game_id: i64) -> Result<EventDetail, BackendError> {
        self.days
            .values()
            .flatten()
            .find(|event| event.id == game_id)
            .map(|event| EventDetail {
                game_id: Some(event.id),
                name: event.title.clone(),
                start_date_and_time: event.start_time.clone(),
                end_date_and_time: event.end_time.clone(),
                category: event.category_id,
                category_name: event.category_name.clone(),
                court: event.court_id,
                court_name: event.court_name.clone(),
                participants: event.participants.clone(),
                is_creator: event.creator_flag,
            })
            .ok_or(BackendError::Status(404))
    }

    fn fetch_court(&self, court_id: i64) -> Result<Court, BackendError> {
        let mut court = Court::new(format!("Court {}", court_id));
        court.id = Some(court_id);
        Ok(court)
    }

    fn fetch_form_choices(&self) -> Result<FormChoices, BackendError> {
        if self.failing {
            return Err(BackendError::Status(500));
        }
        Ok(self.choices.clone())
    }

    fn submit(&self, submission: &FormSubmission) -> Result<SubmitOutcome, BackendError> {
        self.submissions.borrow_mut().push(submission.clone());
        Ok(self
            .answers
            .borrow_mut()
            .pop_front()
            .unwrap_or(SubmitOutcome::Success { message: None }))
    }
}
