// Integration tests for the calendar controller, forms and settings
// persistence, run against an in-memory backend.

mod fixtures;

use chrono::Duration;
use club_calendar::models::cursor::{Direction, ViewMode};
use club_calendar::models::settings::Settings;
use club_calendar::models::category::Category;
use club_calendar::models::court::Court;
use club_calendar::services::backend::{
    CalendarBackend, FormChoices, LiveFeed, LiveMessage, SubmitOutcome,
};
use club_calendar::services::controller::CalendarController;
use club_calendar::services::forms::{FormController, FormEffect, FormKind, FormState};
use club_calendar::services::layout::CategoryKey;
use club_calendar::services::settings::SettingsService;
use fixtures::dates::{at, club_night, date};
use fixtures::events::{game, lesson, training};
use fixtures::FakeBackend;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn controller_on(day: chrono::NaiveDate) -> CalendarController {
    CalendarController::new(&Settings::default(), day)
}

#[test]
fn test_day_fetch_paints_boxes_at_100px_per_hour() {
    let day = club_night();
    let backend = FakeBackend::new().with_day(
        day,
        vec![game(1, day, "09:00", "10:30"), game(2, day, "13:15", "14:00")],
    );
    let mut calendar = controller_on(day);

    let ticket = calendar.select_date(day, at(day, 8, 0)).unwrap();
    let result = CalendarController::run_fetch(&backend, &ticket);
    assert!(calendar.apply_fetch(&ticket, result));

    let tile = &calendar.grid().tiles()[0];
    assert_eq!(tile.date, day);
    assert_eq!(tile.boxes.len(), 2);
    assert_eq!(tile.boxes[0].top_offset, 900.0);
    assert_eq!(tile.boxes[0].height, 150.0);
    assert_eq!(tile.boxes[1].top_offset, 1325.0);
    assert_eq!(tile.boxes[1].height, 75.0);
    assert_eq!(calendar.hints().prev_date, Some(date(2025, 3, 6)));
    assert_eq!(calendar.hints().next_date, Some(date(2025, 3, 8)));
}

#[test]
fn test_response_for_previous_date_is_discarded() {
    let day = club_night();
    let next = date(2025, 3, 8);
    let backend = FakeBackend::new()
        .with_day(day, vec![game(1, day, "09:00", "10:00")])
        .with_day(next, vec![game(2, next, "11:00", "12:00")]);
    let mut calendar = controller_on(day);
    let now = at(day, 8, 0);

    let slow = calendar.select_date(day, now).unwrap();
    let fast = calendar.navigate(Direction::Next, now).unwrap();

    let fast_result = CalendarController::run_fetch(&backend, &fast);
    assert!(calendar.apply_fetch(&fast, fast_result));

    // The earlier request for the 7th arrives late and must not replace the 8th.
    let slow_result = CalendarController::run_fetch(&backend, &slow);
    assert!(!calendar.apply_fetch(&slow, slow_result));

    assert_eq!(calendar.grid().dates(), vec![next]);
    assert_eq!(calendar.events_for(next)[0].id, 2);
    assert!(calendar.events_for(day).is_empty());
}

#[test]
fn test_refresh_is_idempotent() {
    let day = club_night();
    let backend = FakeBackend::new().with_day(
        day,
        vec![training(1, day, "09:00", "10:00"), lesson(2, day, "09:30", "11:00")],
    );
    let mut calendar = controller_on(day);
    let now = at(day, 8, 0);

    let first = calendar.select_date(day, now).unwrap();
    let result = CalendarController::run_fetch(&backend, &first);
    calendar.apply_fetch(&first, result);
    let painted = calendar.grid().clone();

    let again = calendar.refresh(now).unwrap();
    let result = CalendarController::run_fetch(&backend, &again);
    assert!(calendar.apply_fetch(&again, result));

    assert_eq!(calendar.grid(), &painted);
    assert_eq!(calendar.grid().box_count(), 2);
}

#[test]
fn test_failed_refresh_keeps_last_render() {
    let day = club_night();
    let good = FakeBackend::new().with_day(day, vec![game(1, day, "09:00", "10:00")]);
    let broken = FakeBackend {
        failing: true,
        ..FakeBackend::new()
    };
    let mut calendar = controller_on(day);
    let now = at(day, 8, 0);

    let ticket = calendar.select_date(day, now).unwrap();
    calendar.apply_fetch(&ticket, CalendarController::run_fetch(&good, &ticket));

    let ticket = calendar.refresh(now).unwrap();
    assert!(!calendar.apply_fetch(&ticket, CalendarController::run_fetch(&broken, &ticket)));

    assert_eq!(calendar.grid().box_count(), 1);
    assert!(calendar.last_error().is_some());
}

#[test]
fn test_timer_follows_selected_date() {
    let day = club_night();
    let mut calendar = controller_on(day);
    let start = at(day, 8, 0);

    calendar.select_date(day, start).unwrap();
    assert!(calendar.tick(start + Duration::seconds(5)).is_none());

    // Navigating rebinds the single timer to the new date.
    calendar
        .navigate(Direction::Next, start + Duration::seconds(5))
        .unwrap();
    assert!(calendar.tick(start + Duration::seconds(11)).is_none());

    let ticket = calendar.tick(start + Duration::seconds(15)).unwrap();
    assert_eq!(ticket.target.date, date(2025, 3, 8));
    assert!(calendar.tick(start + Duration::seconds(16)).is_none());
}

#[test]
fn test_week_fetch_requests_every_day() {
    let day = club_night();
    let mut settings = Settings::default();
    settings.default_view = ViewMode::Week;
    let backend = FakeBackend::new()
        .with_day(date(2025, 3, 2), vec![game(1, date(2025, 3, 2), "10:00", "11:00")])
        .with_day(day, vec![game(2, day, "18:00", "20:00")]);
    let mut calendar = CalendarController::new(&settings, day);

    let ticket = calendar.select_date(day, at(day, 8, 0)).unwrap();
    let result = CalendarController::run_fetch(&backend, &ticket);
    assert!(calendar.apply_fetch(&ticket, result));

    let fetched = backend.fetched.borrow().clone();
    assert_eq!(fetched.len(), 7);
    assert_eq!(fetched[0], date(2025, 3, 2));
    assert_eq!(fetched[6], date(2025, 3, 8));
    assert_eq!(calendar.grid().tiles().len(), 7);
    assert_eq!(calendar.grid().box_count(), 2);
    assert_eq!(calendar.label(), "2 Mar 2025 – 8 Mar 2025");
}

#[test]
fn test_category_filter_hides_boxes_without_refetch() {
    let day = club_night();
    let backend = FakeBackend::new().with_day(
        day,
        vec![
            training(1, day, "09:00", "10:00"),
            lesson(2, day, "10:00", "11:00"),
            game(3, day, "12:00", "13:00"),
        ],
    );
    let mut calendar = controller_on(day);
    let ticket = calendar.select_date(day, at(day, 8, 0)).unwrap();
    calendar.apply_fetch(&ticket, CalendarController::run_fetch(&backend, &ticket));

    calendar.set_category_filter(CategoryKey::Id(2), false);
    let ids: Vec<i64> = calendar.grid().tiles()[0]
        .boxes
        .iter()
        .map(|layout| layout.event_id)
        .collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(backend.fetched.borrow().len(), 1);

    calendar.set_category_filter(CategoryKey::Id(2), true);
    assert_eq!(calendar.grid().box_count(), 3);
}

#[test]
fn test_live_update_replaces_game_in_place() {
    let day = club_night();
    let backend = FakeBackend::new().with_day(day, vec![game(1, day, "09:00", "10:00")]);
    let mut calendar = controller_on(day);
    let ticket = calendar.select_date(day, at(day, 8, 0)).unwrap();
    calendar.apply_fetch(&ticket, CalendarController::run_fetch(&backend, &ticket));

    let (sender, mut feed) = LiveFeed::channel();
    assert!(sender.push(LiveMessage::SendEventUpdate {
        event: game(1, day, "15:00", "16:00"),
    }));
    for message in feed.drain() {
        assert!(calendar.apply_live(message));
    }

    assert_eq!(calendar.events_for(day).len(), 1);
    assert_eq!(calendar.grid().tiles()[0].boxes[0].top_offset, 1500.0);
}

#[test]
fn test_live_update_moves_game_between_week_days() {
    let day = club_night();
    let saturday = date(2025, 3, 8);
    let mut settings = Settings::default();
    settings.default_view = ViewMode::Week;
    let backend = FakeBackend::new().with_day(day, vec![game(1, day, "09:00", "10:00")]);
    let mut calendar = CalendarController::new(&settings, day);
    let ticket = calendar.select_date(day, at(day, 8, 0)).unwrap();
    calendar.apply_fetch(&ticket, CalendarController::run_fetch(&backend, &ticket));

    assert!(calendar.apply_live(LiveMessage::SendEventUpdate {
        event: game(1, saturday, "09:00", "10:00"),
    }));

    let boxes: Vec<(chrono::NaiveDate, i64)> = calendar
        .grid()
        .tiles()
        .iter()
        .flat_map(|tile| tile.boxes.iter().map(move |layout| (tile.date, layout.event_id)))
        .collect();
    assert_eq!(boxes, vec![(saturday, 1)]);
    assert!(calendar.events_for(day).is_empty());
}

#[test]
fn test_navigation_hints_follow_fetched_date() {
    let day = club_night();
    let monday = date(2025, 3, 10);
    let backend = FakeBackend::new();
    let mut calendar = controller_on(day);
    let now = at(day, 8, 0);

    let ticket = calendar.select_date(day, now).unwrap();
    calendar.apply_fetch(&ticket, CalendarController::run_fetch(&backend, &ticket));
    assert_eq!(calendar.adjacent_date(Direction::Previous), Some(date(2025, 3, 6)));
    assert_eq!(calendar.adjacent_date(Direction::Next), Some(date(2025, 3, 8)));

    let ticket = calendar.select_date(monday, now).unwrap();
    calendar.apply_fetch(&ticket, CalendarController::run_fetch(&backend, &ticket));
    assert_eq!(calendar.hints().prev_date, Some(date(2025, 3, 9)));
    assert_eq!(calendar.adjacent_date(Direction::Next), Some(date(2025, 3, 11)));
}

#[test]
fn test_dispose_ignores_late_responses() {
    let day = club_night();
    let backend = FakeBackend::new().with_day(day, vec![game(1, day, "09:00", "10:00")]);
    let mut calendar = controller_on(day);
    let now = at(day, 8, 0);
    let ticket = calendar.select_date(day, now).unwrap();

    calendar.dispose();

    assert!(!calendar.apply_fetch(&ticket, CalendarController::run_fetch(&backend, &ticket)));
    assert!(calendar.tick(now + Duration::seconds(60)).is_none());
    assert!(calendar.refresh(now).is_none());
    assert_eq!(calendar.grid().box_count(), 0);
}

#[test]
fn test_game_form_reports_field_errors_then_succeeds() {
    let backend = FakeBackend::new();
    let mut form = FormController::new(FormKind::Game);
    assert!(form.open_create());
    form.fields_mut().set("start_date_and_time", "2025-03-07T09:00");

    let mut errors = BTreeMap::new();
    errors.insert("name".to_string(), vec!["required".to_string()]);
    backend.answer(SubmitOutcome::Invalid { errors });

    let submission = form.submit().unwrap();
    let outcome = backend.submit(&submission).unwrap();
    assert_eq!(
        form.handle_response(outcome),
        FormEffect::Alert("Failed: name: required\n".to_string())
    );
    assert_eq!(form.state(), &FormState::OpenCreate);
    assert_eq!(form.fields().get("start_date_and_time"), "2025-03-07T09:00");

    form.fields_mut().set("name", "Doubles");
    let submission = form.submit().unwrap();
    let outcome = backend.submit(&submission).unwrap();
    assert_eq!(
        form.handle_response(outcome),
        FormEffect::Refresh {
            message: "Game added successfully!".to_string()
        }
    );
    assert!(!form.is_visible());

    let sent = backend.submissions.borrow();
    assert_eq!(sent.len(), 2);
    assert!(sent[1]
        .body()
        .contains(&("submit_game".to_string(), "true".to_string())));
}

#[test]
fn test_game_form_offers_server_categories_and_courts() {
    let day = club_night();
    let mut matches = Category::new("Match", "#EF4444");
    matches.id = Some(3);
    let mut court = Court::new("Court 4");
    court.id = Some(4);
    let backend = FakeBackend {
        choices: FormChoices {
            categories: vec![matches],
            courts: vec![court],
        },
        ..FakeBackend::new().with_day(day, vec![training(1, day, "09:00", "10:00")])
    };
    let mut calendar = controller_on(day);
    let ticket = calendar.select_date(day, at(day, 8, 0)).unwrap();
    calendar.apply_fetch(&ticket, CalendarController::run_fetch(&backend, &ticket));

    // "Match" has no games on screen but the server still offers it.
    let choices = backend.fetch_form_choices().unwrap();
    let offered: Vec<(Option<i64>, String)> = choices
        .categories_with(&calendar.categories())
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect();
    assert_eq!(
        offered,
        vec![(Some(3), "Match".to_string()), (Some(1), "Training".to_string())]
    );
    assert_eq!(choices.court_name("4"), Some("Court 4"));

    let mut form = FormController::new(FormKind::Game);
    form.open_create();
    form.fields_mut().set("name", "Final");
    form.fields_mut().set("category", "3");
    form.fields_mut().set("court", "4");
    let submission = form.submit().unwrap();
    backend.submit(&submission).unwrap();

    let body = backend.submissions.borrow()[0].body();
    assert!(body.contains(&("category".to_string(), "3".to_string())));
    assert!(body.contains(&("court".to_string(), "4".to_string())));
}

#[test]
fn test_confirmed_booking_is_resent_with_override() {
    let backend = FakeBackend::new();
    let mut form = FormController::new(FormKind::Game);
    form.open_create();
    form.fields_mut().set("name", "Ladder");
    backend.answer(SubmitOutcome::ConfirmNeeded {
        message: "Court 1 is already booked. Continue?".to_string(),
    });

    let submission = form.submit().unwrap();
    let outcome = backend.submit(&submission).unwrap();
    assert!(matches!(form.handle_response(outcome), FormEffect::Confirm(_)));

    let resend = form.confirm_yes().unwrap();
    assert!(resend
        .body()
        .contains(&("confirm".to_string(), "true".to_string())));
    let outcome = backend.submit(&resend).unwrap();
    assert!(matches!(form.handle_response(outcome), FormEffect::Refresh { .. }));
}

#[test]
fn test_settings_persistence() {
    let dir = TempDir::new().unwrap();
    let service = SettingsService::new(dir.path().join("settings.toml"));

    let mut settings = service.get().expect("defaults when the file is missing");
    assert_eq!(settings.refresh_interval_secs, 10);
    assert_eq!(settings.default_view, ViewMode::Day);

    settings.default_view = ViewMode::Week;
    settings.lane_layout = true;
    service.update(&settings).expect("Failed to update settings");

    let loaded = service.get().expect("Failed to load settings");
    assert_eq!(loaded.default_view, ViewMode::Week);
    assert!(loaded.lane_layout);
}
