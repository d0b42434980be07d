//! Recurrence rewriting for cycle timers.
//!
//! A stored `R[n]/<interval>` string carries no anchor. Each time a cycle job
//! is (re)scheduled the dispatcher calls [`prepare_repeat`] so that the next
//! occurrence is computed from an explicit start instead of "whenever the
//! string happens to be parsed".

use ft_domain::trace::TraceEvent;

use crate::clock::{Clock, ClockSnapshot};

/// Anchor a two-part repeating interval at the clock's current instant.
///
/// `R3/PT1H` becomes `R3/<now>/PT1H`. Everything else is returned unchanged.
pub fn prepare_repeat(text: &str, clock: &dyn Clock) -> String {
    prepare_repeat_at(text, &clock.snapshot())
}

/// [`prepare_repeat`] against an already-read clock snapshot, so a caller
/// resolving a timer can anchor with the same instant it computed the due
/// date from.
pub fn prepare_repeat_at(text: &str, now: &ClockSnapshot) -> String {
    if !text.starts_with('R') || segment_count(text) != 2 {
        return text.to_string();
    }

    let prepared = text.replace('/', &format!("/{}/", now.format_iso()));
    tracing::debug!(original = %text, prepared = %prepared, "anchored repeating interval");
    TraceEvent::RepeatPrepared {
        original: text.to_string(),
        prepared: prepared.clone(),
    }
    .emit();
    prepared
}

/// Number of `/`-separated segments, not counting trailing empty ones.
fn segment_count(text: &str) -> usize {
    let mut segments: Vec<&str> = text.split('/').collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    segments.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn anchors_two_part_cycle() {
        assert_eq!(
            prepare_repeat("R3/PT1H", &clock()),
            "R3/2024-01-01T00:00:00.000Z/PT1H"
        );
        assert_eq!(
            prepare_repeat("R/P1D", &clock()),
            "R/2024-01-01T00:00:00.000Z/P1D"
        );
    }

    #[test]
    fn uses_clock_zone_offset() {
        let clock = ManualClock::in_zone(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            chrono_tz::Europe::Brussels,
        );
        assert_eq!(
            prepare_repeat("R5/PT1H", &clock),
            "R5/2024-01-01T01:00:00.000+01:00/PT1H"
        );
    }

    #[test]
    fn non_cycle_strings_are_untouched() {
        assert_eq!(prepare_repeat("P1D", &clock()), "P1D");
        assert_eq!(prepare_repeat("PT1H/R3", &clock()), "PT1H/R3");
        assert_eq!(prepare_repeat("0 0 9 * * ?", &clock()), "0 0 9 * * ?");
    }

    #[test]
    fn already_anchored_strings_are_untouched() {
        assert_eq!(prepare_repeat("R3/PT1H/PT2H", &clock()), "R3/PT1H/PT2H");
        assert_eq!(prepare_repeat("R3/A/B/C", &clock()), "R3/A/B/C");
        assert_eq!(prepare_repeat("R3", &clock()), "R3");
    }

    #[test]
    fn trailing_separators_do_not_count() {
        assert_eq!(prepare_repeat("R3//", &clock()), "R3//");
        assert_eq!(
            prepare_repeat("R3/PT1H/", &clock()),
            "R3/2024-01-01T00:00:00.000Z/PT1H/2024-01-01T00:00:00.000Z/"
        );
    }

    #[test]
    fn rewritten_string_is_stable() {
        let once = prepare_repeat("R3/PT1H", &clock());
        assert_eq!(prepare_repeat(&once, &clock()), once);
    }
}
