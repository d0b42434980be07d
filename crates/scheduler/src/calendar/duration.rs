use chrono::{DateTime, Utc};

use ft_domain::error::{Error, Result};

use super::iso::IsoInterval;
use super::{BusinessCalendar, DURATION};
use crate::clock::ClockSnapshot;

/// Relative calendar for `timeDuration`: now + ISO-8601 duration.
///
/// Interval forms are accepted too: `<start>/<duration>` gives start +
/// duration, anything with an end gives the end, and a repeating interval
/// gives its first occurrence after now.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationCalendar;

impl BusinessCalendar for DurationCalendar {
    fn resolve_due_date(&self, text: &str, now: &ClockSnapshot) -> Result<DateTime<Utc>> {
        let interval =
            IsoInterval::parse(text, now).map_err(|e| Error::calendar_input(DURATION, text, e))?;
        interval
            .due_date(now.now())
            .map_err(|e| Error::calendar_input(DURATION, text, e))?
            .ok_or_else(|| Error::DueDateUndetermined(Some(text.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> ClockSnapshot {
        ClockSnapshot::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), chrono_tz::UTC)
    }

    #[test]
    fn adds_duration_to_now() {
        let due = DurationCalendar.resolve_due_date("PT10M", &now()).unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 1, 1, 0, 10, 0).unwrap());
    }

    #[test]
    fn calendar_parts() {
        let due = DurationCalendar.resolve_due_date("P1Y2M3DT4H", &now()).unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2025, 3, 4, 4, 0, 0).unwrap());
    }

    #[test]
    fn start_plus_duration() {
        let due = DurationCalendar
            .resolve_due_date("2024-02-01T00:00:00Z/P1D", &now())
            .unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_plain_dates_and_garbage() {
        for bad in ["2024-02-01T00:00:00Z", "10 minutes", "PT"] {
            assert!(
                matches!(
                    DurationCalendar.resolve_due_date(bad, &now()),
                    Err(Error::InvalidCalendarInput { .. })
                ),
                "accepted {bad:?}"
            );
        }
    }
}
