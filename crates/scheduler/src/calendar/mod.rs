//! Business calendars: named strategies that turn a resolved timer
//! expression into a concrete due date.
//!
//! Split into submodules:
//! - [`iso`]: ISO-8601 durations, date-times and intervals
//! - [`cron`]: Quartz-style cron expressions
//! - [`due_date`], [`duration`], [`cycle`]: the built-in calendars

pub mod cron;
pub mod cycle;
pub mod due_date;
pub mod duration;
pub mod iso;

pub use cycle::CycleCalendar;
pub use due_date::DueDateCalendar;
pub use duration::DurationCalendar;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use ft_domain::error::{Error, Result};

use crate::clock::ClockSnapshot;

/// Registry name of the fixed-date calendar (`timeDate`).
pub const DUE_DATE: &str = "dueDate";
/// Registry name of the duration calendar (`timeDuration`).
pub const DURATION: &str = "duration";
/// Registry name of the cycle calendar (`timeCycle`).
pub const CYCLE: &str = "cycle";

/// Converts calendar-specific text into a due date.
///
/// Implementations are pure: the only notion of "now" is the snapshot the
/// caller passes in.
pub trait BusinessCalendar: Send + Sync {
    fn resolve_due_date(&self, text: &str, now: &ClockSnapshot) -> Result<DateTime<Utc>>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CalendarRegistry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Holds calendars by (case-sensitive) name.
#[derive(Clone)]
pub struct CalendarRegistry {
    calendars: HashMap<String, Arc<dyn BusinessCalendar>>,
}

impl CalendarRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            calendars: HashMap::new(),
        }
    }

    /// The three built-in calendars under their standard names.
    pub fn with_defaults(cron_horizon_days: u32) -> Self {
        let mut registry = Self::new();
        registry.register(DUE_DATE, DueDateCalendar);
        registry.register(DURATION, DurationCalendar);
        registry.register(CYCLE, CycleCalendar::new(cron_horizon_days));
        registry
    }

    /// Add or replace a calendar.
    pub fn register(&mut self, name: impl Into<String>, calendar: impl BusinessCalendar + 'static) {
        let name = name.into();
        tracing::debug!(calendar = %name, "registered business calendar");
        self.calendars.insert(name, Arc::new(calendar));
    }

    /// Look up a calendar by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn BusinessCalendar>> {
        self.calendars
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownCalendar(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.calendars.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for CalendarRegistry {
    fn default() -> Self {
        Self::with_defaults(cycle::DEFAULT_CRON_HORIZON_DAYS)
    }
}
