pub mod config;
pub mod repeat;
pub mod resolve;

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use ft_domain::config::TimerConfig;
use ft_scheduler::{Clock, ManualClock, SystemClock};

/// flowtimer: compute BPMN timer due dates and recurrence anchors.
#[derive(Debug, Parser)]
#[command(name = "flowtimer", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a timer request file (TOML or JSON) into a timer job.
    Resolve {
        /// Path to the request file.
        file: String,
        /// Pin the engine clock (RFC 3339), e.g. 2024-01-01T00:00:00Z.
        #[arg(long)]
        now: Option<String>,
    },
    /// Anchor a repeating interval (`R3/PT1H`) at the engine clock.
    PrepareRepeat {
        /// The stored cycle string.
        cycle: String,
        /// Pin the engine clock (RFC 3339).
        #[arg(long)]
        now: Option<String>,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `FT_CONFIG` (or
/// `config.toml` by default). Returns the parsed [`Config`] and the
/// path that was used. A missing file yields the defaults.
///
/// [`Config`]: ft_domain::config::Config
pub fn load_config() -> anyhow::Result<(ft_domain::config::Config, String)> {
    let config_path = std::env::var("FT_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        ft_domain::config::Config::default()
    };

    Ok((config, config_path))
}

/// Engine clock for a one-shot command: pinned when `--now` is given,
/// the wall clock otherwise. Either way in the configured zone.
pub fn engine_clock(timers: &TimerConfig, now: Option<&str>) -> anyhow::Result<Arc<dyn Clock>> {
    let timezone = timers.parsed_timezone()?;
    match now {
        Some(raw) => {
            let pinned = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("--now '{raw}' is not an RFC 3339 timestamp"))?
                .with_timezone(&Utc);
            Ok(Arc::new(ManualClock::in_zone(pinned, timezone)))
        }
        None => Ok(Arc::new(SystemClock::new(timezone))),
    }
}
