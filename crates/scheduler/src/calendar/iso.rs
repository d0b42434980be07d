//! ISO-8601 grammar used by the calendars: durations, date-times and
//! (repeating) intervals.
//!
//! Parse errors are plain `String` reasons; the calendar wraps them into
//! `Error::InvalidCalendarInput` with its own name.

use chrono::{DateTime, Days, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::clock::ClockSnapshot;

/// Upper bound on occurrence walking for a repeating interval whose period
/// has calendar parts. Exact periods are skipped ahead arithmetically.
const MAX_OCCURRENCE_STEPS: u64 = 1_000_000;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Local time resolution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Map a local wall-clock time in `tz` to an instant.
///
/// Overlaps (fall-back) take the earlier instant; gaps (spring-forward)
/// shift forward by one hour.
pub(crate) fn resolve_local(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => Some(dt),
        chrono::LocalResult::Ambiguous(earliest, _) => Some(earliest),
        chrono::LocalResult::None => {
            let shifted = naive.checked_add_signed(chrono::Duration::hours(1))?;
            tz.from_local_datetime(&shifted).earliest()
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Durations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `[-]PnYnMnWnDTnHnMnS`. Calendar parts (years, months, weeks, days) are
/// applied on the local calendar; time parts are exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsoDuration {
    negative: bool,
    years: u32,
    months: u32,
    weeks: u32,
    days: u32,
    hours: i64,
    minutes: i64,
    millis: i64,
}

/// Whether `text` looks like a duration rather than a date-time.
pub fn is_duration(text: &str) -> bool {
    let t = text.trim();
    t.starts_with('P') || t.starts_with("-P")
}

impl IsoDuration {
    pub fn parse(text: &str) -> Result<Self, String> {
        let t = text.trim();
        let (negative, body) = match t.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, t),
        };
        let body = body
            .strip_prefix('P')
            .ok_or_else(|| format!("'{t}' is not an ISO-8601 duration (missing 'P')"))?;

        let (date_part, time_part) = match body.split_once('T') {
            Some((d, tp)) => {
                if tp.is_empty() {
                    return Err(format!("'{t}': 'T' must be followed by a time component"));
                }
                (d, Some(tp))
            }
            None => (body, None),
        };
        if date_part.is_empty() && time_part.is_none() {
            return Err(format!("'{t}': empty duration"));
        }

        let mut d = IsoDuration {
            negative,
            ..Default::default()
        };

        for (value, designator) in components(date_part, &['Y', 'M', 'W', 'D'], t)? {
            let n = whole(&value, designator, t)?;
            match designator {
                'Y' => d.years = n,
                'M' => d.months = n,
                'W' => d.weeks = n,
                _ => d.days = n,
            }
        }

        if let Some(tp) = time_part {
            for (value, designator) in components(tp, &['H', 'M', 'S'], t)? {
                match designator {
                    'H' => d.hours = i64::from(whole(&value, designator, t)?),
                    'M' => d.minutes = i64::from(whole(&value, designator, t)?),
                    _ => d.millis = seconds_to_millis(&value, t)?,
                }
            }
        }

        Ok(d)
    }

    /// An exact (time-only) duration, e.g. the gap between two instants.
    pub fn exact(span: chrono::Duration) -> Self {
        let millis = span.num_milliseconds();
        Self {
            negative: millis < 0,
            millis: millis.abs(),
            ..Default::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        self.years == 0
            && self.months == 0
            && self.weeks == 0
            && self.days == 0
            && self.hours == 0
            && self.minutes == 0
            && self.millis == 0
    }

    /// Signed length in milliseconds, when there are no calendar parts.
    fn exact_millis(&self) -> Option<i64> {
        if self.years != 0 || self.months != 0 || self.weeks != 0 || self.days != 0 {
            return None;
        }
        let total = self
            .hours
            .checked_mul(3_600_000)?
            .checked_add(self.minutes.checked_mul(60_000)?)?
            .checked_add(self.millis)?;
        Some(if self.negative { -total } else { total })
    }

    pub fn add_to(&self, start: DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.apply(start, self.negative)
    }

    pub fn subtract_from(&self, start: DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.apply(start, !self.negative)
    }

    fn apply(&self, start: DateTime<Tz>, backwards: bool) -> Option<DateTime<Tz>> {
        let months = self.years.checked_mul(12)?.checked_add(self.months)?;
        let days = u64::from(self.weeks) * 7 + u64::from(self.days);

        let mut t = start;
        if months > 0 || days > 0 {
            let mut naive = start.naive_local();
            if months > 0 {
                naive = if backwards {
                    naive.checked_sub_months(Months::new(months))?
                } else {
                    naive.checked_add_months(Months::new(months))?
                };
            }
            if days > 0 {
                naive = if backwards {
                    naive.checked_sub_days(Days::new(days))?
                } else {
                    naive.checked_add_days(Days::new(days))?
                };
            }
            t = resolve_local(start.timezone(), naive)?;
        }

        let exact = chrono::Duration::try_hours(self.hours)?
            .checked_add(&chrono::Duration::try_minutes(self.minutes)?)?
            .checked_add(&chrono::Duration::try_milliseconds(self.millis)?)?;
        if backwards {
            t.checked_sub_signed(exact)
        } else {
            t.checked_add_signed(exact)
        }
    }
}

/// Split `part` into `(number, designator)` pairs, enforcing designator
/// order and uniqueness.
fn components(part: &str, designators: &[char], whole_text: &str) -> Result<Vec<(String, char)>, String> {
    let mut out = Vec::new();
    let mut number = String::new();
    let mut next_allowed = 0usize;

    for c in part.chars() {
        if c.is_ascii_digit() || c == '.' || c == ',' {
            number.push(c);
            continue;
        }
        let pos = designators[next_allowed..]
            .iter()
            .position(|d| *d == c)
            .map(|p| p + next_allowed)
            .ok_or_else(|| format!("'{whole_text}': unexpected '{c}'"))?;
        if number.is_empty() {
            return Err(format!("'{whole_text}': '{c}' without a value"));
        }
        out.push((std::mem::take(&mut number), c));
        next_allowed = pos + 1;
    }

    if !number.is_empty() {
        return Err(format!("'{whole_text}': trailing number without designator"));
    }
    Ok(out)
}

fn whole(value: &str, designator: char, whole_text: &str) -> Result<u32, String> {
    value.parse::<u32>().map_err(|_| {
        format!("'{whole_text}': '{value}{designator}' must be a whole number")
    })
}

fn seconds_to_millis(value: &str, whole_text: &str) -> Result<i64, String> {
    let normalized = value.replace(',', ".");
    let (secs, frac) = match normalized.split_once('.') {
        Some((s, f)) => (s, f),
        None => (normalized.as_str(), ""),
    };
    let bad = || format!("'{whole_text}': invalid seconds '{value}'");
    let secs: i64 = if secs.is_empty() { 0 } else { secs.parse().map_err(|_| bad())? };
    let frac_millis: i64 = if frac.is_empty() {
        0
    } else {
        let digits: String = frac.chars().chain("000".chars()).take(3).collect();
        digits.parse().map_err(|_| bad())?
    };
    secs.checked_mul(1000)
        .and_then(|ms| ms.checked_add(frac_millis))
        .ok_or_else(bad)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Date-times
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const OFFSET_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M%:z",
];

const LOCAL_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601 date-time. Values without an offset are local times
/// in `tz`; a bare date means local midnight.
pub fn parse_date_time(text: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    let s = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    if let Some(utc_part) = s.strip_suffix('Z') {
        for fmt in LOCAL_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(utc_part, fmt) {
                return Ok(Utc.from_utc_datetime(&naive));
            }
        }
    }

    for fmt in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return resolve_local(tz, naive)
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| format!("'{s}' does not exist in {tz}"));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        return resolve_local(tz, midnight)
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| format!("'{s}' does not exist in {tz}"));
    }

    Err(format!("'{s}' is not an ISO-8601 date-time"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Intervals
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `[R[n]/]<start|duration>[/<end|duration>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoInterval {
    /// `None` = not repeating; `Some(None)` = repeating without bound.
    repetitions: Option<Option<u32>>,
    start: Option<DateTime<Tz>>,
    end: Option<DateTime<Tz>>,
    period: IsoDuration,
}

impl IsoInterval {
    /// Parse relative to `now`: an interval with neither start nor end is
    /// anchored at the snapshot instant.
    pub fn parse(text: &str, now: &ClockSnapshot) -> Result<Self, String> {
        let tz = now.timezone();
        let t = text.trim();

        let mut parts: Vec<&str> = t.split('/').collect();
        while parts.last().is_some_and(|p| p.is_empty()) {
            parts.pop();
        }
        if parts.is_empty() || parts.len() > 3 {
            return Err(format!("cannot parse interval '{t}'"));
        }

        let mut repetitions = None;
        if let Some(count) = parts[0].strip_prefix('R') {
            repetitions = Some(if count.is_empty() {
                None
            } else {
                Some(count.parse::<u32>().map_err(|_| {
                    format!("'{t}': invalid repetition count '{count}'")
                })?)
            });
            parts.remove(0);
        }

        let local = |s: &str| -> Result<DateTime<Tz>, String> {
            parse_date_time(s, tz).map(|dt| dt.with_timezone(&tz))
        };

        let (mut start, end, period) = match parts.as_slice() {
            [] => return Err(format!("'{t}': missing interval after repetition count")),
            [first, rest @ ..] if is_duration(first) => {
                let period = IsoDuration::parse(first)?;
                let end = match rest {
                    [] => None,
                    [end] => Some(local(*end)?),
                    _ => return Err(format!("cannot parse interval '{t}'")),
                };
                (None, end, period)
            }
            [first, second] => {
                let start = local(*first)?;
                if is_duration(second) {
                    (Some(start), None, IsoDuration::parse(second)?)
                } else {
                    let end = local(*second)?;
                    (Some(start), Some(end), IsoDuration::exact(end - start))
                }
            }
            [_] => return Err(format!("'{t}': a start needs a duration or an end")),
            _ => return Err(format!("cannot parse interval '{t}'")),
        };

        if start.is_none() && end.is_none() {
            start = Some(now.local());
        }

        Ok(Self {
            repetitions,
            start,
            end,
            period,
        })
    }

    pub fn is_repeating(&self) -> bool {
        self.repetitions.is_some()
    }

    /// The instant this interval denotes relative to `now`: the first
    /// occurrence strictly after `now` for repeating intervals, otherwise
    /// the end, or start + period. `Ok(None)` when repetitions are used up.
    pub fn due_date(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, String> {
        match self.repetitions {
            Some(times) => self.first_after(now, times),
            None => {
                if let Some(end) = self.end {
                    return Ok(Some(end.with_timezone(&Utc)));
                }
                let start = self.start.ok_or("interval without anchor")?;
                self.period
                    .add_to(start)
                    .map(|dt| Some(dt.with_timezone(&Utc)))
                    .ok_or_else(|| "date out of range".to_string())
            }
        }
    }

    fn first_after(
        &self,
        now: DateTime<Utc>,
        times: Option<u32>,
    ) -> Result<Option<DateTime<Utc>>, String> {
        if self.period.is_zero() {
            return Err("repeating interval with an empty period".into());
        }
        if let Some(step) = self.period.exact_millis().filter(|ms| *ms > 0) {
            return self.first_after_exact(now, times, step);
        }
        let limit = times.map_or(MAX_OCCURRENCE_STEPS, u64::from);

        if let Some(start) = self.start {
            let mut cur = start;
            let mut i = 0u64;
            while i < limit && cur <= now {
                let next = self.period.add_to(cur).ok_or("date out of range")?;
                if next <= cur {
                    return Err("repeating interval with a non-positive period".into());
                }
                cur = next;
                i += 1;
            }
            if cur <= now && times.is_none() {
                return Err("too many repetitions before the current time".into());
            }
            return Ok((cur > now).then(|| cur.with_timezone(&Utc)));
        }

        let end = self.end.ok_or("interval without anchor")?;
        let mut cur = end;
        let mut next = end;
        let mut i = 0u64;
        while i < limit && cur > now {
            next = cur;
            let prev = self.period.subtract_from(cur).ok_or("date out of range")?;
            if prev >= cur {
                return Err("repeating interval with a non-positive period".into());
            }
            cur = prev;
            i += 1;
        }
        Ok((next > now).then(|| next.with_timezone(&Utc)))
    }

    /// Same occurrence as the walk in [`first_after`](Self::first_after),
    /// computed by division for a fixed `step` in milliseconds.
    fn first_after_exact(
        &self,
        now: DateTime<Utc>,
        times: Option<u32>,
        step: i64,
    ) -> Result<Option<DateTime<Utc>>, String> {
        let limit = times.map_or(u64::MAX, u64::from);
        let offset = |anchor: DateTime<Tz>, steps: u64, forward: bool| -> Result<DateTime<Tz>, String> {
            let span = i64::try_from(steps)
                .ok()
                .and_then(|n| n.checked_mul(step))
                .and_then(chrono::Duration::try_milliseconds)
                .ok_or("date out of range")?;
            let shifted = if forward {
                anchor.checked_add_signed(span)
            } else {
                anchor.checked_sub_signed(span)
            };
            shifted.ok_or_else(|| "date out of range".to_string())
        };

        if let Some(start) = self.start {
            let start_utc = start.with_timezone(&Utc);
            let needed = if start_utc > now {
                0
            } else {
                ((now - start_utc).num_milliseconds() / step) as u64 + 1
            };
            if needed > limit {
                return Ok(None);
            }
            return offset(start, needed, true).map(|dt| Some(dt.with_timezone(&Utc)));
        }

        let end = self.end.ok_or("interval without anchor")?;
        let end_utc = end.with_timezone(&Utc);
        if end_utc <= now {
            return Ok(None);
        }
        let gap = (end_utc - now).num_milliseconds();
        let to_reach_now = ((gap + step - 1) / step) as u64;
        let back = to_reach_now.min(limit).saturating_sub(1);
        offset(end, back, false).map(|dt| Some(dt.with_timezone(&Utc)))
    }
}
