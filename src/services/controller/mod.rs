//! Calendar controller.
//!
//! Owns everything the calendar shows: the cursor, the selected fetch
//! target, the refresh timer, the stale-response guard and the painted
//! grid. It performs no I/O itself. Methods that need data return a
//! [`FetchTicket`]; the caller runs it (see [`CalendarController::run_fetch`])
//! and hands the result back through [`CalendarController::apply_fetch`].

use std::time::Duration as StdDuration;

use chrono::{DateTime, Local, NaiveDate};

use crate::models::category::{categories_in, Category};
use crate::models::cursor::{Direction, ViewCursor, ViewMode};
use crate::models::event::EventRecord;
use crate::models::settings::Settings;
use crate::services::backend::{BackendError, CalendarBackend, DayEventsResponse, LiveMessage};
use crate::services::grid::GridModel;
use crate::services::layout::{date_of, CategoryFilter, CategoryKey, LayoutConfig};
use crate::services::refresh::{FetchTarget, FetchTicket, RefreshScheduler, RequestTracker};
use crate::utils::date::parse_iso;

/// Listings for every date of a target, in date order.
pub type FetchResult = Result<Vec<(NaiveDate, DayEventsResponse)>, BackendError>;

/// Adjacent-date hints the server sends with a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationHints {
    pub current_date: Option<String>,
    pub prev_date: Option<NaiveDate>,
    pub next_date: Option<NaiveDate>,
}

impl NavigationHints {
    fn from_listing(listing: &DayEventsResponse) -> Self {
        Self {
            current_date: listing.current_date.clone(),
            prev_date: listing.prev_date.as_deref().and_then(parse_iso),
            next_date: listing.next_date.as_deref().and_then(parse_iso),
        }
    }
}

pub struct CalendarController {
    cursor: ViewCursor,
    first_day_of_week: u8,
    selected: Option<FetchTarget>,
    scheduler: RefreshScheduler,
    tracker: RequestTracker,
    grid: GridModel,
    listings: Vec<(NaiveDate, Vec<EventRecord>)>,
    hints: NavigationHints,
    filter: CategoryFilter,
    layout: LayoutConfig,
    last_error: Option<String>,
    disposed: bool,
}

impl CalendarController {
    pub fn new(settings: &Settings, today: NaiveDate) -> Self {
        let cursor = ViewCursor::new(settings.default_view, today, settings.first_day_of_week);
        Self {
            grid: Self::grid_for(&cursor),
            cursor,
            first_day_of_week: settings.first_day_of_week,
            selected: None,
            scheduler: RefreshScheduler::new(settings.refresh_interval_secs),
            tracker: RequestTracker::new(),
            listings: Vec::new(),
            hints: NavigationHints::default(),
            filter: CategoryFilter::new(),
            layout: LayoutConfig::from_settings(settings),
            last_error: None,
            disposed: false,
        }
    }

    fn grid_for(cursor: &ViewCursor) -> GridModel {
        match cursor {
            ViewCursor::Day(_) => match cursor.anchor() {
                Some(date) => GridModel::day(date),
                None => GridModel::week(&[]),
            },
            ViewCursor::Week(_) => GridModel::week(&cursor.dates()),
        }
    }

    /// Show the view containing `date` and fetch it.
    pub fn select_date(&mut self, date: NaiveDate, now: DateTime<Local>) -> Option<FetchTicket> {
        if self.disposed {
            return None;
        }
        self.cursor = ViewCursor::new(self.cursor.mode(), date, self.first_day_of_week);
        self.retarget(now)
    }

    pub fn navigate(&mut self, direction: Direction, now: DateTime<Local>) -> Option<FetchTicket> {
        if self.disposed {
            return None;
        }
        self.cursor.step(direction);
        self.retarget(now)
    }

    pub fn today(&mut self, now: DateTime<Local>) -> Option<FetchTicket> {
        self.select_date(now.date_naive(), now)
    }

    pub fn set_mode(&mut self, mode: ViewMode, now: DateTime<Local>) -> Option<FetchTicket> {
        if self.disposed || self.cursor.mode() == mode {
            return None;
        }
        let date = self.cursor.anchor()?;
        self.cursor = ViewCursor::new(mode, date, self.first_day_of_week);
        self.retarget(now)
    }

    /// New cursor position: empty tiles for the new dates, timer rebound,
    /// and a fetch for the new target.
    fn retarget(&mut self, now: DateTime<Local>) -> Option<FetchTicket> {
        let Some(target) = FetchTarget::of(&self.cursor) else {
            log::error!("Cursor left the calendar: {:?}", self.cursor);
            return None;
        };

        if self.selected != Some(target) {
            self.grid = Self::grid_for(&self.cursor);
            self.listings.clear();
            self.hints = NavigationHints::default();
        }
        self.selected = Some(target);
        self.scheduler.rebind(target, now);
        Some(self.tracker.issue(target))
    }

    /// Fetch the selected target again and restart the refresh countdown.
    pub fn refresh(&mut self, now: DateTime<Local>) -> Option<FetchTicket> {
        if self.disposed {
            return None;
        }
        match self.selected {
            Some(target) => {
                self.scheduler.rebind(target, now);
                Some(self.tracker.issue(target))
            }
            None => self.retarget(now),
        }
    }

    /// Ticket for the periodic refresh, when it is due.
    pub fn tick(&mut self, now: DateTime<Local>) -> Option<FetchTicket> {
        if self.disposed {
            return None;
        }
        let target = self.scheduler.tick(now)?;
        Some(self.tracker.issue(target))
    }

    /// Run a ticket against a backend: one request per date of the target.
    pub fn run_fetch<B: CalendarBackend + ?Sized>(backend: &B, ticket: &FetchTicket) -> FetchResult {
        ticket
            .target
            .dates()
            .into_iter()
            .map(|date| backend.fetch_day(date).map(|listing| (date, listing)))
            .collect()
    }

    /// Apply a fetch result. Returns whether the grid was repainted.
    ///
    /// Responses for a target that is no longer selected, or older than one
    /// already applied, are dropped. Failures keep the current render.
    pub fn apply_fetch(&mut self, ticket: &FetchTicket, result: FetchResult) -> bool {
        if self.disposed || !self.tracker.accept(ticket, self.selected.as_ref()) {
            return false;
        }

        match result {
            Ok(listings) => {
                self.hints = listings
                    .iter()
                    .find(|(date, _)| *date == ticket.target.date)
                    .map(|(_, listing)| NavigationHints::from_listing(listing))
                    .unwrap_or_default();
                self.listings = listings
                    .into_iter()
                    .map(|(date, listing)| (date, listing.events))
                    .collect();
                self.last_error = None;
                self.repaint();
                log::debug!(
                    "Applied fetch #{}: {} games on {} tiles",
                    ticket.seq,
                    self.grid.box_count(),
                    self.grid.tiles().len()
                );
                true
            }
            Err(err) => {
                log::warn!("Failed to fetch games for {}: {}", ticket.target.date, err);
                self.last_error = Some(err.to_string());
                false
            }
        }
    }

    /// Apply a frame from the live channel. Returns whether the grid changed.
    pub fn apply_live(&mut self, message: LiveMessage) -> bool {
        if self.disposed {
            return false;
        }

        match message {
            LiveMessage::InitialEventLoad { listing } => {
                let date = match listing.current_date.as_deref().and_then(parse_iso) {
                    Some(date) => date,
                    None if self.cursor.mode() == ViewMode::Day => match self.cursor.anchor() {
                        Some(date) => date,
                        None => return false,
                    },
                    None => {
                        log::debug!("Live listing without a date ignored in week view");
                        return false;
                    }
                };
                if !self.shows(date) {
                    return false;
                }
                if self.cursor.mode() == ViewMode::Day {
                    self.hints = NavigationHints::from_listing(&listing);
                }
                self.replace_listing(date, listing.events);
            }
            LiveMessage::SendEventUpdate { event } => {
                let date = date_of(&event.start_time).or_else(|| {
                    (self.cursor.mode() == ViewMode::Day)
                        .then(|| self.cursor.anchor())
                        .flatten()
                });

                // A game keeps a single box: drop it wherever it was shown
                // before placing it under its current date.
                let removed = self.remove_event(event.id);
                match date.filter(|date| self.shows(*date)) {
                    Some(date) => {
                        let mut events = self.events_for(date).to_vec();
                        events.push(event);
                        self.replace_listing(date, events);
                    }
                    None if removed => {
                        log::debug!("Game {} moved off the shown dates", event.id);
                    }
                    None => return false,
                }
            }
        }
        self.repaint();
        true
    }

    fn shows(&self, date: NaiveDate) -> bool {
        self.grid.tiles().iter().any(|tile| tile.date == date)
    }

    fn remove_event(&mut self, id: i64) -> bool {
        let mut removed = false;
        for (_, events) in &mut self.listings {
            let before = events.len();
            events.retain(|event| event.id != id);
            removed |= events.len() != before;
        }
        removed
    }

    fn replace_listing(&mut self, date: NaiveDate, events: Vec<EventRecord>) {
        match self.listings.iter_mut().find(|(listed, _)| *listed == date) {
            Some((_, existing)) => *existing = events,
            None => {
                self.listings.push((date, events));
                self.listings.sort_by_key(|(listed, _)| *listed);
            }
        }
    }

    fn repaint(&mut self) {
        self.grid.paint(&self.listings, &self.layout, &self.filter);
    }

    pub fn set_category_filter(&mut self, key: CategoryKey, visible: bool) {
        self.filter.set_visible(key, visible);
        self.repaint();
    }

    pub fn set_layout(&mut self, layout: LayoutConfig) {
        self.layout = layout;
        self.repaint();
    }

    /// Stop the refresh timer and ignore anything that arrives afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        log::info!("Disposing calendar controller");
        self.scheduler.cancel();
        self.selected = None;
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn cursor(&self) -> &ViewCursor {
        &self.cursor
    }

    pub fn mode(&self) -> ViewMode {
        self.cursor.mode()
    }

    pub fn label(&self) -> String {
        self.cursor.label()
    }

    pub fn selected(&self) -> Option<FetchTarget> {
        self.selected
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn hints(&self) -> &NavigationHints {
        &self.hints
    }

    /// Date the previous/next button leads to. In day view the server's
    /// hint wins; otherwise the cursor is stepped once.
    pub fn adjacent_date(&self, direction: Direction) -> Option<NaiveDate> {
        let hint = match (self.cursor.mode(), direction) {
            (ViewMode::Day, Direction::Previous) => self.hints.prev_date,
            (ViewMode::Day, Direction::Next) => self.hints.next_date,
            (ViewMode::Week, _) => None,
        };
        hint.or_else(|| {
            let mut stepped = self.cursor;
            stepped.step(direction);
            stepped.anchor()
        })
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn events_for(&self, date: NaiveDate) -> &[EventRecord] {
        self.listings
            .iter()
            .find(|(listed, _)| *listed == date)
            .map(|(_, events)| events.as_slice())
            .unwrap_or(&[])
    }

    pub fn find_event(&self, id: i64) -> Option<&EventRecord> {
        self.listings
            .iter()
            .flat_map(|(_, events)| events.iter())
            .find(|event| event.id == id)
    }

    /// Categories present in the loaded listings, for the filter checkboxes.
    pub fn categories(&self) -> Vec<Category> {
        let all: Vec<EventRecord> = self
            .listings
            .iter()
            .flat_map(|(_, events)| events.iter().cloned())
            .collect();
        categories_in(&all)
    }

    pub fn next_refresh_in(&self, now: DateTime<Local>) -> Option<StdDuration> {
        self.scheduler.next_due_in(now)
    }
}
