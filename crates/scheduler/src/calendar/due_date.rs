use chrono::{DateTime, Utc};

use ft_domain::error::{Error, Result};

use super::iso::{self, IsoDuration};
use super::{BusinessCalendar, DUE_DATE};
use crate::clock::ClockSnapshot;

/// Fixed-instant calendar for `timeDate`.
///
/// The text is an absolute ISO-8601 date-time, returned as is. A text
/// starting with `P` is read as a period from now.
#[derive(Debug, Clone, Copy, Default)]
pub struct DueDateCalendar;

impl BusinessCalendar for DueDateCalendar {
    fn resolve_due_date(&self, text: &str, now: &ClockSnapshot) -> Result<DateTime<Utc>> {
        let t = text.trim();

        if t.starts_with('P') {
            let period =
                IsoDuration::parse(t).map_err(|e| Error::calendar_input(DUE_DATE, text, e))?;
            return period
                .add_to(now.local())
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| Error::calendar_input(DUE_DATE, text, "date out of range"));
        }

        iso::parse_date_time(t, now.timezone()).map_err(|e| Error::calendar_input(DUE_DATE, text, e))
    }
}
