use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use ft_domain::config::TimerConfig;
use ft_scheduler::timer::{Execution, ExecutionSnapshot, TimerDeclaration, TimerJob};
use ft_scheduler::TimerResolver;

use super::engine_clock;

/// One timer to resolve, as read from a request file.
///
/// ```toml
/// interrupting = false
/// handler_type = "trigger-timer"
///
/// [declaration]
/// id = "reminder"
/// time_cycle = "R3/PT${hours}H"
///
/// [execution]
/// id = "exec-1"
/// element_kind = "boundary_event"
///
/// [execution.variables]
/// hours = 2
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TimerRequest {
    pub declaration: TimerDeclaration,
    #[serde(default)]
    pub execution: Option<ExecutionSnapshot>,
    #[serde(default)]
    pub interrupting: bool,
    #[serde(default = "default_handler_type")]
    pub handler_type: String,
    #[serde(default)]
    pub handler_configuration: Option<String>,
}

fn default_handler_type() -> String {
    "trigger-timer".into()
}

impl TimerRequest {
    /// Parse a request; `.json` files are JSON, anything else TOML.
    pub fn parse(path: &Path, raw: &str) -> anyhow::Result<Self> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(raw).with_context(|| format!("parsing {}", path.display()))
        } else {
            toml::from_str(raw).with_context(|| format!("parsing {}", path.display()))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(path, &raw)
    }

    pub fn resolve(&self, resolver: &TimerResolver) -> ft_domain::error::Result<TimerJob> {
        resolver.resolve(
            &self.declaration,
            self.interrupting,
            self.execution.as_ref().map(|e| e as &dyn Execution),
            &self.handler_type,
            self.handler_configuration.as_deref(),
        )
    }
}

/// Resolve the request in `file` and render the job as pretty JSON.
pub fn run(timers: &TimerConfig, file: &str, now: Option<&str>) -> anyhow::Result<String> {
    let request = TimerRequest::load(Path::new(file))?;
    tracing::debug!(file, timer_id = ?request.declaration.id, "loaded timer request");
    let resolver = TimerResolver::from_config(timers)?.with_clock(engine_clock(timers, now)?);

    let job = request
        .resolve(&resolver)
        .with_context(|| format!("resolving timer from {file}"))?;
    serde_json::to_string_pretty(&job).context("serializing timer job")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ft_scheduler::ManualClock;
    use std::sync::Arc;

    fn resolver() -> TimerResolver {
        TimerResolver::default().with_clock(Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )))
    }

    #[test]
    fn toml_request_with_execution() {
        let raw = r#"
            handler_type = "trigger-timer"

            [declaration]
            id = "reminder"
            time_cycle = "R3/PT${hours}H"

            [execution]
            id = "exec-1"
            element_kind = "boundary_event"
            tenant_id = "acme"

            [execution.variables]
            hours = 2
        "#;
        let request = TimerRequest::parse(Path::new("timer.toml"), raw).unwrap();
        let job = request.resolve(&resolver()).unwrap();

        assert_eq!(job.due_at, Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap());
        assert_eq!(job.repeat.as_deref(), Some("R3/2024-01-01T00:00:00.000Z/PT2H"));
        assert_eq!(job.tenant_id.as_deref(), Some("acme"));
    }

    #[test]
    fn json_request_defaults() {
        let raw = r#"{"declaration": {"timeDuration": "PT10M"}}"#;
        let request = TimerRequest::parse(Path::new("timer.json"), raw).unwrap();
        assert!(!request.interrupting);
        assert_eq!(request.handler_type, "trigger-timer");
        assert!(request.execution.is_none());

        let job = request.resolve(&resolver()).unwrap();
        assert_eq!(job.due_at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 10, 0).unwrap());
        assert_eq!(job.execution_id, None);
    }

    #[test]
    fn unreadable_request_names_file() {
        let err = TimerRequest::parse(Path::new("broken.toml"), "declaration = 3").unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
