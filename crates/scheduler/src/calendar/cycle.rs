use chrono::{DateTime, Utc};

use ft_domain::error::{Error, Result};

use super::cron::CronExpression;
use super::iso::IsoInterval;
use super::{BusinessCalendar, CYCLE};
use crate::clock::ClockSnapshot;

pub const DEFAULT_CRON_HORIZON_DAYS: u32 = 366;

/// Recurring calendar for `timeCycle`.
///
/// `R[n]/...` texts are ISO-8601 repeating intervals and resolve to their
/// first occurrence after now; anything else is a cron expression. Later
/// occurrences are the dispatcher's business, via the rewritten repeat.
#[derive(Debug, Clone, Copy)]
pub struct CycleCalendar {
    horizon_days: u32,
}

impl CycleCalendar {
    pub fn new(horizon_days: u32) -> Self {
        Self { horizon_days }
    }
}

impl Default for CycleCalendar {
    fn default() -> Self {
        Self::new(DEFAULT_CRON_HORIZON_DAYS)
    }
}

impl BusinessCalendar for CycleCalendar {
    fn resolve_due_date(&self, text: &str, now: &ClockSnapshot) -> Result<DateTime<Utc>> {
        let t = text.trim();
        let undetermined = || Error::DueDateUndetermined(Some(text.to_string()));

        if t.starts_with('R') {
            let interval =
                IsoInterval::parse(t, now).map_err(|e| Error::calendar_input(CYCLE, text, e))?;
            return interval
                .due_date(now.now())
                .map_err(|e| Error::calendar_input(CYCLE, text, e))?
                .ok_or_else(undetermined);
        }

        let cron = CronExpression::parse(t).map_err(|e| Error::calendar_input(CYCLE, text, e))?;
        cron.next_after(&now.now(), now.timezone(), self.horizon_days)
            .ok_or_else(undetermined)
    }
}
