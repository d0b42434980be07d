use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Timer scheduling configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Engine-wide settings consumed when timer jobs are created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Retry count copied into every new timer job. The dispatcher
    /// decrements it; the scheduler never does.
    #[serde(default = "default_retries")]
    pub default_retries: u32,

    /// IANA zone of the engine clock. Local date-times without an offset
    /// and calendar arithmetic (months, days, cron fields) use this zone.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// How many days ahead the cron search looks for a next fire time.
    #[serde(default = "default_cron_horizon_days")]
    pub cron_horizon_days: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_retries: default_retries(),
            timezone: default_timezone(),
            cron_horizon_days: default_cron_horizon_days(),
        }
    }
}

impl TimerConfig {
    /// Parse `timezone` into a `chrono_tz::Tz`.
    pub fn parsed_timezone(&self) -> Result<chrono_tz::Tz> {
        self.timezone.parse::<chrono_tz::Tz>().map_err(|_| {
            Error::Config(format!(
                "invalid timezone: '{}', use IANA names like 'Europe/Brussels' or 'UTC'",
                self.timezone
            ))
        })
    }
}

fn default_retries() -> u32 {
    3
}

fn default_timezone() -> String {
    "UTC".into()
}

fn default_cron_horizon_days() -> u32 {
    366
}
