//! Timer declaration model: what a process definition says about a timer.

use serde::{Deserialize, Serialize};

use crate::calendar;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Flow element kinds
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Structural position of the element a timer is attached to.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowElementKind {
    StartEvent,
    BoundaryEvent,
    /// Catches at most once per token visit, so never repeats.
    IntermediateCatchEvent,
    #[default]
    Other,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Timer fields
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Which timing field a declaration's expression came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerField {
    Date,
    Cycle,
    Duration,
}

impl TimerField {
    /// Calendar used when the declaration names none.
    pub fn default_calendar(self) -> &'static str {
        match self {
            TimerField::Date => calendar::DUE_DATE,
            TimerField::Cycle => calendar::CYCLE,
            TimerField::Duration => calendar::DURATION,
        }
    }
}

/// Immutable timer definition, parsed once at deploy time.
///
/// Exactly one of the three timing fields should be set. When several are,
/// `time_date` wins over `time_cycle`, which wins over `time_duration`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerDeclaration {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "timeDate")]
    pub time_date: Option<String>,
    #[serde(default, alias = "timeCycle")]
    pub time_cycle: Option<String>,
    #[serde(default, alias = "timeDuration")]
    pub time_duration: Option<String>,
    /// Expression naming the calendar to use instead of the field default.
    #[serde(default, alias = "calendarName")]
    pub calendar_name: Option<String>,
    /// Element the timer is attached to. Used to decide whether a cycle
    /// may repeat when no execution is bound.
    #[serde(default)]
    pub owner: FlowElementKind,
}

impl TimerDeclaration {
    pub fn date(expression: impl Into<String>) -> Self {
        Self {
            time_date: Some(expression.into()),
            ..Self::default()
        }
    }

    pub fn cycle(expression: impl Into<String>) -> Self {
        Self {
            time_cycle: Some(expression.into()),
            ..Self::default()
        }
    }

    pub fn duration(expression: impl Into<String>) -> Self {
        Self {
            time_duration: Some(expression.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_calendar(mut self, expression: impl Into<String>) -> Self {
        self.calendar_name = Some(expression.into());
        self
    }

    pub fn owned_by(mut self, owner: FlowElementKind) -> Self {
        self.owner = owner;
        self
    }

    /// The first non-empty timing field in priority order, with its text.
    pub fn timing(&self) -> Option<(TimerField, &str)> {
        [
            (TimerField::Date, &self.time_date),
            (TimerField::Cycle, &self.time_cycle),
            (TimerField::Duration, &self.time_duration),
        ]
        .into_iter()
        .find_map(|(field, text)| {
            text.as_deref()
                .filter(|t| !t.is_empty())
                .map(|t| (field, t))
        })
    }

    /// Whether a cycle is declared, regardless of which field won priority.
    pub fn has_cycle(&self) -> bool {
        self.time_cycle.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Calendar-name expression, if one is set.
    pub fn calendar_expression(&self) -> Option<&str> {
        self.calendar_name.as_deref().filter(|t| !t.is_empty())
    }
}
