use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of job handed to the dispatcher. Only timers are produced here.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Timer,
}

/// Initial optimistic-concurrency stamp of a freshly created job.
pub const INITIAL_REVISION: u32 = 1;

/// A scheduled timer, ready for persistence.
///
/// Identity is assigned by whoever stores it. `retries` is the engine
/// default at creation time; decrementing it is the dispatcher's job.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerJob {
    pub job_type: JobType,
    pub revision: u32,
    pub handler_type: String,
    pub handler_configuration: Option<String>,
    /// Always true: timer jobs never run alongside other jobs of the
    /// same process instance.
    pub exclusive: bool,
    pub retries: u32,
    pub due_at: DateTime<Utc>,
    /// Anchored repeating interval, set only for cycle timers allowed to
    /// fire again.
    pub repeat: Option<String>,
    pub execution_id: Option<String>,
    pub process_definition_id: Option<String>,
    pub process_instance_id: Option<String>,
    pub tenant_id: Option<String>,
}

impl TimerJob {
    pub(crate) fn new(
        handler_type: &str,
        handler_configuration: Option<&str>,
        retries: u32,
        due_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_type: JobType::Timer,
            revision: INITIAL_REVISION,
            handler_type: handler_type.to_string(),
            handler_configuration: handler_configuration.map(str::to_string),
            exclusive: true,
            retries,
            due_at,
            repeat: None,
            execution_id: None,
            process_definition_id: None,
            process_instance_id: None,
            tenant_id: None,
        }
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat.is_some()
    }
}
