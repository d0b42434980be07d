//! Timer resolution: declaration + execution context → [`TimerJob`].
//!
//! Steps, in order:
//! 1. pick the timing field (`timeDate` > `timeCycle` > `timeDuration`)
//! 2. evaluate the calendar-name override, if any
//! 3. look the calendar up
//! 4. evaluate the timing expression and turn it into a due date
//! 5. build the job, deciding whether a declared cycle may repeat
//!
//! The repeat decision looks at whether `timeCycle` is declared, not at
//! which field won priority; the repeat text is the evaluated due-date
//! text of the winning field.
//!
//! The clock is read exactly once per resolution; the due date and the
//! repeat anchor are both computed from that one reading.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use ft_domain::config::TimerConfig;
use ft_domain::error::{Error, Result};
use ft_domain::trace::TraceEvent;

use super::declaration::{FlowElementKind, TimerDeclaration};
use super::execution::Execution;
use super::job::TimerJob;
use crate::calendar::CalendarRegistry;
use crate::clock::{format_instant, Clock, SystemClock};
use crate::expression::{
    ExpressionEvaluator, NoExecutionScope, TemplateEvaluator, Value, VariableScope,
};
use crate::repeat;

/// Default retry count when no configuration is supplied.
pub const DEFAULT_RETRIES: u32 = 3;

/// An evaluated timing expression the resolver knows how to schedule.
enum DueDateValue {
    /// Already an instant: used as the due date, no calendar parsing.
    Instant(DateTime<Utc>),
    /// Text for the selected calendar.
    Text(String),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TimerResolver
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Turns timer declarations into timer jobs.
#[derive(Clone)]
pub struct TimerResolver {
    evaluator: Arc<dyn ExpressionEvaluator>,
    calendars: CalendarRegistry,
    clock: Arc<dyn Clock>,
    default_retries: u32,
}

impl TimerResolver {
    /// Template evaluator, built-in calendars, UTC wall clock.
    pub fn new(default_retries: u32) -> Self {
        Self {
            evaluator: Arc::new(TemplateEvaluator::new()),
            calendars: CalendarRegistry::default(),
            clock: Arc::new(SystemClock::default()),
            default_retries,
        }
    }

    /// Default wiring from the `[timers]` config section. Fails when the
    /// configured timezone is not a known IANA name.
    pub fn from_config(config: &TimerConfig) -> Result<Self> {
        let timezone = config.parsed_timezone()?;
        tracing::debug!(
            timezone = %timezone,
            default_retries = config.default_retries,
            cron_horizon_days = config.cron_horizon_days,
            "timer resolver configured"
        );
        Ok(Self {
            evaluator: Arc::new(TemplateEvaluator::new()),
            calendars: CalendarRegistry::with_defaults(config.cron_horizon_days),
            clock: Arc::new(SystemClock::new(timezone)),
            default_retries: config.default_retries,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_calendars(mut self, calendars: CalendarRegistry) -> Self {
        self.calendars = calendars;
        self
    }

    pub fn calendars(&self) -> &CalendarRegistry {
        &self.calendars
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn default_retries(&self) -> u32 {
        self.default_retries
    }

    /// Resolve a timer into a job. Any failure aborts; no partial job is
    /// ever returned.
    pub fn resolve(
        &self,
        declaration: &TimerDeclaration,
        is_interrupting: bool,
        execution: Option<&dyn Execution>,
        handler_type: &str,
        handler_configuration: Option<&str>,
    ) -> Result<TimerJob> {
        let timer_id = declaration.id.as_deref();

        let (field, expression) = declaration.timing().ok_or_else(|| {
            Error::MissingTimerConfiguration {
                timer_id: timer_id.map(str::to_string),
            }
        })?;

        let now = self.clock.snapshot();
        let no_execution = NoExecutionScope;
        let scope: &dyn VariableScope = match execution {
            Some(exec) => exec.scope(),
            None => &no_execution,
        };

        let default_calendar = field.default_calendar();
        let calendar_name = match declaration.calendar_expression() {
            Some(expr) => {
                let name = self.calendar_name(expr, scope)?;
                if name != default_calendar {
                    TraceEvent::CalendarOverridden {
                        timer_id: timer_id.map(str::to_string),
                        default_calendar: default_calendar.to_string(),
                        calendar: name.clone(),
                    }
                    .emit();
                }
                name
            }
            None => default_calendar.to_string(),
        };
        tracing::debug!(
            timer_id = ?timer_id,
            field = ?field,
            calendar = %calendar_name,
            "selected business calendar"
        );

        let calendar = self.calendars.get(&calendar_name)?;

        let value = self.evaluator.evaluate(expression, scope)?;
        let due_value = classify(value, declaration, execution)?;
        let (due_at, due_text) = match due_value {
            DueDateValue::Instant(instant) => (instant, format_instant(instant, now.timezone())),
            DueDateValue::Text(text) => (calendar.resolve_due_date(&text, &now)?, text),
        };
        tracing::debug!(
            timer_id = ?timer_id,
            expression = %due_text,
            due_at = %due_at,
            "computed due date"
        );

        let mut job = TimerJob::new(
            handler_type,
            handler_configuration,
            self.default_retries,
            due_at,
        );

        if declaration.has_cycle()
            && may_repeat(timer_id, declaration.owner, is_interrupting, execution)
        {
            job.repeat = Some(repeat::prepare_repeat_at(&due_text, &now));
        }

        if let Some(exec) = execution {
            job.execution_id = exec.id().map(str::to_string);
            job.process_definition_id = exec.process_definition_id().map(str::to_string);
            job.process_instance_id = exec.process_instance_id().map(str::to_string);
            job.tenant_id = exec.tenant_id().map(str::to_string);
        }

        tracing::info!(
            timer_id = ?timer_id,
            calendar = %calendar_name,
            due_at = %due_at,
            repeat = ?job.repeat,
            "timer job resolved"
        );
        TraceEvent::TimerResolved {
            timer_id: timer_id.map(str::to_string),
            calendar: calendar_name,
            due_at,
            repeat: job.repeat.clone(),
            execution_id: job.execution_id.clone(),
            tenant_id: job.tenant_id.clone(),
        }
        .emit();

        Ok(job)
    }

    /// Anchor a stored cycle string at the resolver clock's current instant.
    pub fn prepare_repeat(&self, text: &str) -> String {
        repeat::prepare_repeat(text, self.clock.as_ref())
    }

    fn calendar_name(&self, expression: &str, scope: &dyn VariableScope) -> Result<String> {
        match self.evaluator.evaluate(expression, scope)? {
            Value::Null => Err(Error::UnknownCalendar(expression.to_string())),
            other => Ok(other.to_text()),
        }
    }
}

impl Default for TimerResolver {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn classify(
    value: Value,
    declaration: &TimerDeclaration,
    execution: Option<&dyn Execution>,
) -> Result<DueDateValue> {
    match value {
        Value::Instant(instant) => Ok(DueDateValue::Instant(instant)),
        Value::String(text) => Ok(DueDateValue::Text(text)),
        Value::Null => Err(Error::DueDateUndetermined(None)),
        other => Err(Error::InvalidTimerValue {
            activity_id: execution
                .and_then(|e| e.activity_id())
                .or(declaration.id.as_deref())
                .map(str::to_string),
            found: other.type_name().to_string(),
        }),
    }
}

/// Interrupting boundary timers and intermediate catch events fire once.
/// Without an execution the declaration's owner stands in for the
/// current element.
fn may_repeat(
    timer_id: Option<&str>,
    owner: FlowElementKind,
    is_interrupting: bool,
    execution: Option<&dyn Execution>,
) -> bool {
    let element = execution.map_or(owner, |e| e.current_element_kind());
    let reason = if element == FlowElementKind::IntermediateCatchEvent {
        "intermediate catch event"
    } else if is_interrupting {
        "interrupting timer"
    } else {
        return true;
    };

    tracing::warn!(timer_id = ?timer_id, reason, "cycle timer will not repeat");
    TraceEvent::RepeatSuppressed {
        timer_id: timer_id.map(str::to_string),
        reason: reason.to_string(),
    }
    .emit();
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::expression::Variables;
    use crate::timer::ExecutionSnapshot;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn resolver() -> TimerResolver {
        TimerResolver::default().with_clock(Arc::new(ManualClock::new(t0())))
    }

    #[test]
    fn duration_adds_to_clock() {
        let job = resolver()
            .resolve(&TimerDeclaration::duration("PT10M"), false, None, "timer", None)
            .unwrap();
        assert_eq!(job.due_at, t0() + chrono::Duration::minutes(10));
        assert_eq!(job.repeat, None);
        assert_eq!(job.retries, DEFAULT_RETRIES);
    }

    #[test]
    fn missing_configuration_names_timer() {
        let decl = TimerDeclaration::default().with_id("timer-1");
        let err = resolver().resolve(&decl, false, None, "timer", None).unwrap_err();
        assert_eq!(
            err,
            Error::MissingTimerConfiguration {
                timer_id: Some("timer-1".into())
            }
        );
    }

    #[test]
    fn missing_configuration_wins_over_bad_calendar() {
        let decl = TimerDeclaration::default().with_calendar("${nope}");
        let err = resolver().resolve(&decl, false, None, "timer", None).unwrap_err();
        assert!(matches!(err, Error::MissingTimerConfiguration { .. }));
    }

    #[test]
    fn null_expression_is_undetermined() {
        let exec = ExecutionSnapshot::new("e1")
            .with_variables(Variables::new().with("due", Value::Null));
        let err = resolver()
            .resolve(&TimerDeclaration::date("${due}"), false, Some(&exec), "timer", None)
            .unwrap_err();
        assert_eq!(err, Error::DueDateUndetermined(None));
    }

    #[test]
    fn non_date_value_is_invalid() {
        let exec = ExecutionSnapshot::new("e1")
            .at("wait", FlowElementKind::IntermediateCatchEvent)
            .with_variables(Variables::new().with("due", 42i64));
        let err = resolver()
            .resolve(&TimerDeclaration::date("${due}"), false, Some(&exec), "timer", None)
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidTimerValue {
                activity_id: Some("wait".into()),
                found: "integer".into()
            }
        );
    }

    #[test]
    fn null_calendar_name_is_unknown() {
        let exec = ExecutionSnapshot::new("e1")
            .with_variables(Variables::new().with("cal", Value::Null));
        let decl = TimerDeclaration::duration("PT1M").with_calendar("${cal}");
        let err = resolver().resolve(&decl, false, Some(&exec), "timer", None).unwrap_err();
        assert_eq!(err, Error::UnknownCalendar("${cal}".into()));
    }

    #[test]
    fn cycle_instant_still_repeats() {
        let due = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let exec = ExecutionSnapshot::new("e1")
            .at("boundary", FlowElementKind::BoundaryEvent)
            .with_variables(Variables::new().with("at", due));
        let job = resolver()
            .resolve(&TimerDeclaration::cycle("${at}"), false, Some(&exec), "timer", None)
            .unwrap();
        assert_eq!(job.due_at, due);
        assert_eq!(job.repeat.as_deref(), Some("2024-03-01T12:00:00.000Z"));
    }

    #[test]
    fn declared_cycle_repeats_behind_a_date() {
        let mut decl = TimerDeclaration::date("2024-05-05T05:05:05Z");
        decl.time_cycle = Some("R/PT1H".into());
        let job = resolver().resolve(&decl, false, None, "timer", None).unwrap();
        assert_eq!(job.due_at, Utc.with_ymd_and_hms(2024, 5, 5, 5, 5, 5).unwrap());
        assert_eq!(job.repeat.as_deref(), Some("2024-05-05T05:05:05Z"));
    }

    #[test]
    fn whitespace_date_is_not_skipped() {
        let mut decl = TimerDeclaration::date(" ");
        decl.time_duration = Some("PT1M".into());
        let err = resolver().resolve(&decl, false, None, "timer", None).unwrap_err();
        assert!(matches!(err, Error::InvalidCalendarInput { .. }));
    }

    #[test]
    fn whitespace_calendar_name_is_looked_up() {
        let decl = TimerDeclaration::duration("PT1M").with_calendar(" ");
        let err = resolver().resolve(&decl, false, None, "timer", None).unwrap_err();
        assert_eq!(err, Error::UnknownCalendar(" ".into()));
    }

    #[test]
    fn catch_event_owner_stops_repeat_without_execution() {
        let decl = TimerDeclaration::cycle("R3/PT1H")
            .owned_by(FlowElementKind::IntermediateCatchEvent);
        let job = resolver().resolve(&decl, false, None, "timer", None).unwrap();
        assert_eq!(job.repeat, None);

        // A bound execution takes precedence over the declared owner.
        let exec = ExecutionSnapshot::new("e1").at("b1", FlowElementKind::BoundaryEvent);
        let job = resolver().resolve(&decl, false, Some(&exec), "timer", None).unwrap();
        assert_eq!(job.repeat.as_deref(), Some("R3/2024-01-01T00:00:00.000Z/PT1H"));
    }

    #[test]
    fn resolver_prepare_repeat_uses_its_clock() {
        assert_eq!(
            resolver().prepare_repeat("R2/PT30S"),
            "R2/2024-01-01T00:00:00.000Z/PT30S"
        );
    }

    #[test]
    fn from_config_rejects_unknown_zone() {
        let config = TimerConfig {
            timezone: "Mars/Olympus".into(),
            ..TimerConfig::default()
        };
        assert!(matches!(
            TimerResolver::from_config(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn from_config_copies_retries() {
        let config = TimerConfig {
            default_retries: 7,
            ..TimerConfig::default()
        };
        let resolver = TimerResolver::from_config(&config).unwrap();
        assert_eq!(resolver.default_retries(), 7);
        assert_eq!(resolver.calendars().names(), vec!["cycle", "dueDate", "duration"]);
    }
}
