mod observability;
mod timers;

pub use observability::*;
pub use timers::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timers: TimerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = self.timers.parsed_timezone() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "timers.timezone".into(),
                message: e.to_string(),
            });
        }

        // Jobs are still created, but a failing handler is never retried.
        if self.timers.default_retries == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "timers.default_retries".into(),
                message: "0 retries: failed timer jobs are never attempted again".into(),
            });
        }

        if self.timers.cron_horizon_days == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "timers.cron_horizon_days".into(),
                message: "horizon must be at least one day".into(),
            });
        }

        if self.observability.log_filter.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "observability.log_filter".into(),
                message: "empty filter, falling back to \"info\"".into(),
            });
        }

        errors
    }
}
