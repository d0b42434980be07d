//! Engine clock: an overridable time source.
//!
//! Scheduling never reads the operating system clock directly. Every
//! resolution takes exactly one [`ClockSnapshot`] and threads it through
//! calendar arithmetic and recurrence anchoring, so both observe the same
//! instant.

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;

/// Time source consulted by the scheduler.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Zone used for local date-times and calendar arithmetic.
    fn timezone(&self) -> Tz;

    /// Read the clock once.
    fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot::new(self.now(), self.timezone())
    }
}

/// A single clock reading: instant plus engine zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSnapshot {
    now: DateTime<Utc>,
    timezone: Tz,
}

impl ClockSnapshot {
    pub fn new(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self { now, timezone }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// `now` expressed in the engine zone.
    pub fn local(&self) -> DateTime<Tz> {
        self.now.with_timezone(&self.timezone)
    }

    /// `now` in the fixed ISO profile, see [`format_instant`].
    pub fn format_iso(&self) -> String {
        format_instant(self.now, self.timezone)
    }
}

/// Render an instant as `yyyy-MM-ddTHH:mm:ss.SSS±hh:mm` in `tz`
/// (`Z` when the offset is zero).
pub fn format_instant(instant: DateTime<Utc>, tz: Tz) -> String {
    instant
        .with_timezone(&tz)
        .fixed_offset()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Implementations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Wall clock in a configured zone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono_tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}

/// Settable clock for tests and simulated time.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    timezone: Tz,
}

impl ManualClock {
    /// Clock pinned at `now`, in UTC.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::in_zone(now, chrono_tz::UTC)
    }

    pub fn in_zone(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            now: Mutex::new(now),
            timezone,
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}
