/// Shared error type used across all flowtimer crates.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("timer needs configuration (either timeDate, timeCycle or timeDuration is needed){}", timer_suffix(.timer_id))]
    MissingTimerConfiguration { timer_id: Option<String> },

    #[error("unknown business calendar: '{0}'")]
    UnknownCalendar(String),

    #[error("calendar {calendar}: couldn't resolve due date from '{input}': {reason}")]
    InvalidCalendarInput {
        calendar: String,
        input: String,
        reason: String,
    },

    #[error("due date could not be determined for timer job{}", input_suffix(.0))]
    DueDateUndetermined(Option<String>),

    #[error(
        "timer{} was not configured with a valid duration/time, \
         either hand in a date or a string in format 'yyyy-MM-ddTHH:mm:ss' (got {found})",
        activity_suffix(.activity_id)
    )]
    InvalidTimerValue {
        activity_id: Option<String>,
        found: String,
    },

    #[error("expression '{expression}': {message}")]
    ExpressionEvaluation { expression: String, message: String },

    #[error("config: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for calendar parse failures.
    pub fn calendar_input(
        calendar: &str,
        input: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidCalendarInput {
            calendar: calendar.to_string(),
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub fn expression(expression: &str, message: impl Into<String>) -> Self {
        Self::ExpressionEvaluation {
            expression: expression.to_string(),
            message: message.into(),
        }
    }
}

fn timer_suffix(timer_id: &Option<String>) -> String {
    timer_id
        .as_deref()
        .map(|id| format!(" ({id})"))
        .unwrap_or_default()
}

fn input_suffix(input: &Option<String>) -> String {
    input
        .as_deref()
        .map(|s| format!(" {s}"))
        .unwrap_or_default()
}

fn activity_suffix(activity_id: &Option<String>) -> String {
    activity_id
        .as_deref()
        .map(|id| format!(" '{id}'"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
