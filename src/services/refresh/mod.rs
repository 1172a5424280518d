//! Periodic refresh and stale-response bookkeeping.
//!
//! There is exactly one refresh timer. Navigating rebinds it to the new
//! target instead of starting another one, and every fetch carries a
//! sequence number so answers that arrive late can be recognised.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Local, NaiveDate};

use crate::models::cursor::{ViewCursor, ViewMode};

pub const DEFAULT_REFRESH_SECS: u64 = 10;

/// What a fetch is for: a day, or the week starting at `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTarget {
    pub mode: ViewMode,
    pub date: NaiveDate,
}

impl FetchTarget {
    pub fn day(date: NaiveDate) -> Self {
        Self {
            mode: ViewMode::Day,
            date,
        }
    }

    pub fn week(first_day: NaiveDate) -> Self {
        Self {
            mode: ViewMode::Week,
            date: first_day,
        }
    }

    pub fn of(cursor: &ViewCursor) -> Option<Self> {
        cursor.anchor().map(|date| Self {
            mode: cursor.mode(),
            date,
        })
    }

    /// Dates whose listings make up this target.
    pub fn dates(&self) -> Vec<NaiveDate> {
        match self.mode {
            ViewMode::Day => vec![self.date],
            ViewMode::Week => self.date.iter_days().take(7).collect(),
        }
    }
}

/// Handle for one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub target: FetchTarget,
}

/// Issues tickets and decides which responses may still be applied.
#[derive(Debug, Default)]
pub struct RequestTracker {
    last_issued: u64,
    applied: HashMap<FetchTarget, u64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, target: FetchTarget) -> FetchTicket {
        self.last_issued += 1;
        FetchTicket {
            seq: self.last_issued,
            target,
        }
    }

    /// Admit a response only when its target is still selected and nothing
    /// newer for that target has been applied yet.
    pub fn accept(&mut self, ticket: &FetchTicket, selected: Option<&FetchTarget>) -> bool {
        if selected != Some(&ticket.target) {
            log::debug!(
                "Discarding stale response #{} for {:?} {}",
                ticket.seq,
                ticket.target.mode,
                ticket.target.date
            );
            return false;
        }

        // Only the selected target can still receive answers.
        self.applied.retain(|target, _| *target == ticket.target);
        let applied = self.applied.entry(ticket.target).or_insert(0);
        if ticket.seq <= *applied {
            log::debug!(
                "Discarding response #{}; #{} already applied for {}",
                ticket.seq,
                applied,
                ticket.target.date
            );
            return false;
        }

        *applied = ticket.seq;
        true
    }

    pub fn last_issued(&self) -> u64 {
        self.last_issued
    }
}

/// Single fixed-interval timer bound to the selected target.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    interval: Duration,
    target: Option<FetchTarget>,
    next_run_at: Option<DateTime<Local>>,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_SECS)
    }
}

impl RefreshScheduler {
    pub fn new(interval_secs: u64) -> Self {
        let secs = interval_secs.clamp(1, 24 * 60 * 60) as i64;
        Self {
            interval: Duration::seconds(secs),
            target: None,
            next_run_at: None,
        }
    }

    /// Point the timer at `target` and restart its countdown.
    pub fn rebind(&mut self, target: FetchTarget, now: DateTime<Local>) {
        self.target = Some(target);
        self.next_run_at = Some(now + self.interval);
    }

    /// Returns the bound target when the interval has elapsed.
    pub fn tick(&mut self, now: DateTime<Local>) -> Option<FetchTarget> {
        let target = self.target?;
        let due = self.next_run_at.is_none_or(|next_run_at| now >= next_run_at);
        if !due {
            return None;
        }
        self.next_run_at = Some(now + self.interval);
        Some(target)
    }

    pub fn cancel(&mut self) {
        self.target = None;
        self.next_run_at = None;
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<FetchTarget> {
        self.target
    }

    pub fn interval(&self) -> StdDuration {
        self.interval.to_std().unwrap_or(StdDuration::from_secs(DEFAULT_REFRESH_SECS))
    }

    pub fn next_due_in(&self, now: DateTime<Local>) -> Option<StdDuration> {
        self.target?;
        let next_run_at = self.next_run_at?;
        Some(
            (next_run_at - now)
                .to_std()
                .unwrap_or_else(|_| StdDuration::from_secs(0)),
        )
    }
}
