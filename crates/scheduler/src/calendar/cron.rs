//! Timezone-aware cron evaluator for cycle timers.
//!
//! Quartz field layout: `sec min hour day-of-month month day-of-week [year]`.
//! Each field accepts `*`, `?`, values, names (`JAN`, `MON`), ranges
//! `a-b`, lists `a,b` and steps `*/n`, `a/n`, `a-b/n`. Day-of-week runs
//! 1–7 with 1 = Sunday.

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
}

const SECONDS: FieldSpec = FieldSpec { name: "seconds", min: 0, max: 59, names: &[] };
const MINUTES: FieldSpec = FieldSpec { name: "minutes", min: 0, max: 59, names: &[] };
const HOURS: FieldSpec = FieldSpec { name: "hours", min: 0, max: 23, names: &[] };
const DAY_OF_MONTH: FieldSpec = FieldSpec { name: "day-of-month", min: 1, max: 31, names: &[] };
const MONTH: FieldSpec = FieldSpec {
    name: "month",
    min: 1,
    max: 12,
    names: &["JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC"],
};
const DAY_OF_WEEK: FieldSpec = FieldSpec {
    name: "day-of-week",
    min: 1,
    max: 7,
    names: &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"],
};
const YEAR: FieldSpec = FieldSpec { name: "year", min: 1970, max: 2199, names: &[] };

/// Set of allowed values for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldSet {
    min: u32,
    allowed: Vec<bool>,
    restricted: bool,
}

impl FieldSet {
    fn contains(&self, value: u32) -> bool {
        value
            .checked_sub(self.min)
            .and_then(|i| self.allowed.get(i as usize))
            .copied()
            .unwrap_or(false)
    }

    fn parse(field: &str, spec: &FieldSpec) -> Result<Self, String> {
        let mut allowed = vec![false; (spec.max - spec.min + 1) as usize];
        let restricted = !(field == "*" || field == "?");

        for part in field.split(',') {
            let (range, step) = match part.split_once('/') {
                Some((r, s)) => {
                    let n: u32 = s.parse().map_err(|_| {
                        format!("{}: invalid step '{}', expected a number", spec.name, s)
                    })?;
                    if n == 0 || n > spec.max {
                        return Err(format!("{}: step {} out of range 1..={}", spec.name, n, spec.max));
                    }
                    (r, Some(n))
                }
                None => (part, None),
            };

            let (start, end) = if range == "*" || range == "?" {
                (spec.min, spec.max)
            } else if let Some((start_s, end_s)) = range.split_once('-') {
                (field_value(start_s, spec)?, field_value(end_s, spec)?)
            } else {
                let n = field_value(range, spec)?;
                // `a/n` runs from a to the end of the field.
                if step.is_some() { (n, spec.max) } else { (n, n) }
            };

            if start > end {
                return Err(format!("{}: range start {} > end {}", spec.name, start, end));
            }

            let step = step.unwrap_or(1);
            let mut v = start;
            while v <= end {
                allowed[(v - spec.min) as usize] = true;
                v += step;
            }
        }

        Ok(Self {
            min: spec.min,
            allowed,
            restricted,
        })
    }
}

fn field_value(raw: &str, spec: &FieldSpec) -> Result<u32, String> {
    let upper = raw.to_ascii_uppercase();
    let n = match spec.names.iter().position(|name| *name == upper) {
        Some(i) => i as u32 + spec.min,
        None => raw
            .parse::<u32>()
            .map_err(|_| format!("{}: invalid value '{}'", spec.name, raw))?,
    };
    if n < spec.min || n > spec.max {
        return Err(format!(
            "{}: value {} out of range {}..={}",
            spec.name, n, spec.min, spec.max
        ));
    }
    Ok(n)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Expression
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A parsed cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpression {
    seconds: FieldSet,
    minutes: FieldSet,
    hours: FieldSet,
    days_of_month: FieldSet,
    months: FieldSet,
    days_of_week: FieldSet,
    years: Option<FieldSet>,
}

impl CronExpression {
    pub fn parse(cron: &str) -> Result<Self, String> {
        let fields: Vec<&str> = cron.split_whitespace().collect();
        if fields.len() != 6 && fields.len() != 7 {
            return Err(format!(
                "expected 6 or 7 fields (sec min hour day-of-month month day-of-week [year]), got {}",
                fields.len()
            ));
        }

        Ok(Self {
            seconds: FieldSet::parse(fields[0], &SECONDS)?,
            minutes: FieldSet::parse(fields[1], &MINUTES)?,
            hours: FieldSet::parse(fields[2], &HOURS)?,
            days_of_month: FieldSet::parse(fields[3], &DAY_OF_MONTH)?,
            months: FieldSet::parse(fields[4], &MONTH)?,
            days_of_week: FieldSet::parse(fields[5], &DAY_OF_WEEK)?,
            years: fields
                .get(6)
                .map(|f| FieldSet::parse(f, &YEAR))
                .transpose()?,
        })
    }

    /// Day match: when both day fields are restricted either may match.
    fn day_matches(&self, dt: &NaiveDateTime) -> bool {
        let dom = self.days_of_month.contains(dt.day());
        let dow = self.days_of_week.contains(dt.weekday().number_from_sunday());
        match (self.days_of_month.restricted, self.days_of_week.restricted) {
            (true, true) => dom || dow,
            (true, false) => dom,
            (false, true) => dow,
            (false, false) => true,
        }
    }

    /// Everything but the seconds field.
    fn minute_matches(&self, dt: &NaiveDateTime) -> bool {
        self.minutes.contains(dt.minute())
            && self.hours.contains(dt.hour())
            && self.months.contains(dt.month())
            && self.day_matches(dt)
            && self.years.as_ref().map_or(true, |y| {
                u32::try_from(dt.year()).map_or(false, |year| y.contains(year))
            })
    }

    /// Check whether a **local** naive datetime matches.
    pub fn matches_local(&self, dt: &NaiveDateTime) -> bool {
        self.seconds.contains(dt.second()) && self.minute_matches(dt)
    }

    /// Next fire time strictly after `after`, evaluated in `tz`, looking at
    /// most `horizon_days` ahead. Returns a UTC `DateTime`.
    ///
    /// **DST handling:**
    /// - Spring-forward gaps: local times that don't exist are skipped.
    /// - Fall-back overlaps: the earliest mapping still after `after` wins.
    pub fn next_after(
        &self,
        after: &DateTime<Utc>,
        tz: Tz,
        horizon_days: u32,
    ) -> Option<DateTime<Utc>> {
        let local_after = after.with_timezone(&tz).naive_local();
        let start = local_after.with_nanosecond(0)? + chrono::Duration::seconds(1);
        let mut minute = start.with_second(0)?;
        let mut first_second = start.second();

        let max_checks = u64::from(horizon_days) * 24 * 60;
        for _ in 0..max_checks {
            if self.minute_matches(&minute) {
                for s in first_second..60 {
                    if !self.seconds.contains(s) {
                        continue;
                    }
                    let candidate = minute.with_second(s)?;
                    match tz.from_local_datetime(&candidate) {
                        chrono::LocalResult::Single(dt) => {
                            if dt > *after {
                                return Some(dt.with_timezone(&Utc));
                            }
                        }
                        chrono::LocalResult::Ambiguous(earliest, latest) => {
                            if let Some(dt) = [earliest, latest].into_iter().find(|dt| dt > after) {
                                return Some(dt.with_timezone(&Utc));
                            }
                        }
                        chrono::LocalResult::None => {
                            // DST gap: this local time doesn't exist. Skip.
                        }
                    }
                }
            }
            minute += chrono::Duration::minutes(1);
            first_second = 0;
        }
        None
    }

    /// Compute up to N next occurrences.
    pub fn next_n(
        &self,
        after: &DateTime<Utc>,
        n: usize,
        tz: Tz,
        horizon_days: u32,
    ) -> Vec<DateTime<Utc>> {
        let mut results = Vec::with_capacity(n);
        let mut cursor = *after;
        for _ in 0..n {
            match self.next_after(&cursor, tz, horizon_days) {
                Some(next) => {
                    results.push(next);
                    cursor = next;
                }
                None => break,
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cron(expr: &str) -> CronExpression {
        CronExpression::parse(expr).unwrap()
    }

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap().naive_utc()
    }

    #[test]
    fn every_5_minutes() {
        let c = cron("0 0/5 * * * ?");
        assert!(c.matches_local(&local(2024, 6, 15, 10, 0, 0)));
        assert!(c.matches_local(&local(2024, 6, 15, 10, 55, 0)));
        assert!(!c.matches_local(&local(2024, 6, 15, 10, 3, 0)));
        assert!(!c.matches_local(&local(2024, 6, 15, 10, 5, 30)));
    }

    #[test]
    fn specific_time_and_range() {
        let c = cron("0 30 9-17 * * ?");
        assert!(c.matches_local(&local(2024, 6, 15, 9, 30, 0)));
        assert!(!c.matches_local(&local(2024, 6, 15, 20, 30, 0)));
    }

    #[test]
    fn names_and_lists() {
        // Weekdays only; 2024-06-15 is a Saturday.
        let c = cron("0 0 8 ? JAN,JUN MON-FRI");
        assert!(!c.matches_local(&local(2024, 6, 15, 8, 0, 0)));
        assert!(c.matches_local(&local(2024, 6, 17, 8, 0, 0)));
        assert!(!c.matches_local(&local(2024, 7, 17, 8, 0, 0)));
    }

    #[test]
    fn sunday_is_one() {
        // 2024-06-16 is a Sunday.
        let c = cron("0 0 0 ? * 1");
        assert!(c.matches_local(&local(2024, 6, 16, 0, 0, 0)));
        assert!(!c.matches_local(&local(2024, 6, 17, 0, 0, 0)));
    }

    #[test]
    fn year_field() {
        let c = cron("0 0 0 1 1 ? 2030");
        assert!(c.matches_local(&local(2030, 1, 1, 0, 0, 0)));
        assert!(!c.matches_local(&local(2031, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn next_after_is_strictly_later() {
        let after = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let next = cron("0 0 * * * ?").next_after(&after, chrono_tz::UTC, 366).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 15, 11, 0, 0).unwrap());
    }

    #[test]
    fn next_after_honours_seconds() {
        let after = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 10).unwrap();
        let next = cron("*/15 * * * * ?").next_after(&after, chrono_tz::UTC, 1).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 15).unwrap());
    }

    #[test]
    fn next_n_returns_multiple() {
        let after = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let results = cron("0 0 * * * ?").next_n(&after, 5, chrono_tz::UTC, 366);
        assert_eq!(results.len(), 5);
        assert_eq!(results[4].hour(), 15);
    }

    // ── Timezone-aware tests ─────────────────────────────────────────

    #[test]
    fn next_after_tz_basic() {
        let after = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let next = cron("0 0 9 * * ?")
            .next_after(&after, chrono_tz::US::Eastern, 366)
            .unwrap();
        assert_eq!(next.hour(), 13); // 9 ET = 13 UTC (EDT is UTC-4)
        assert_eq!(next.day(), 15);
    }

    #[test]
    fn next_after_tz_spring_forward() {
        let after = Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap();
        let next = cron("0 30 2 * * ?")
            .next_after(&after, chrono_tz::US::Eastern, 366)
            .unwrap();
        assert_eq!(next.day(), 11);
        assert_eq!(next.hour(), 6);
        assert_eq!(next.minute(), 30);
    }

    #[test]
    fn next_after_tz_fall_back() {
        let after = Utc.with_ymd_and_hms(2024, 11, 3, 4, 0, 0).unwrap();
        let next = cron("0 30 1 * * ?")
            .next_after(&after, chrono_tz::US::Eastern, 366)
            .unwrap();
        assert_eq!(next.hour(), 5);
        assert_eq!(next.minute(), 30);
    }

    #[test]
    fn horizon_limits_search() {
        let after = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let c = cron("0 0 0 1 1 ? 2030");
        assert!(c.next_after(&after, chrono_tz::UTC, 366).is_none());
    }

    // ── Validation ───────────────────────────────────────────────────

    #[test]
    fn parse_rejects_invalid() {
        for bad in [
            "* * * * *",
            "* * * * * * * *",
            "60 * * * * ?",
            "* 60 * * * ?",
            "* * 24 * * ?",
            "* * * 0 * ?",
            "* * * * 13 ?",
            "* * * ? * 8",
            "*/0 * * * * ?",
            "abc * * * * ?",
            "0 0 12 L * ?",
            "0 0 12 ? * 2#1",
            "0 0 12-10 * * ?",
        ] {
            assert!(CronExpression::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn parse_accepts_valid() {
        for good in [
            "0 0 12 * * ?",
            "0 15 10 ? * MON-FRI",
            "0 0/5 14,18 * * ?",
            "0 0-5 14 * * ?",
            "0 10,44 14 ? 3 WED",
            "0 0 0 1 1 ? 2025-2030",
        ] {
            assert!(CronExpression::parse(good).is_ok(), "rejected {good:?}");
        }
    }
}
