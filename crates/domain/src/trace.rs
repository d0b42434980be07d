use chrono::{DateTime, Utc};
use serde::Serialize;

/// Structured trace events emitted across all flowtimer crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    CalendarOverridden {
        timer_id: Option<String>,
        default_calendar: String,
        calendar: String,
    },
    TimerResolved {
        timer_id: Option<String>,
        calendar: String,
        due_at: DateTime<Utc>,
        repeat: Option<String>,
        execution_id: Option<String>,
        tenant_id: Option<String>,
    },
    RepeatSuppressed {
        timer_id: Option<String>,
        reason: String,
    },
    RepeatPrepared {
        original: String,
        prepared: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "ft_event");
    }
}
