use ft_domain::config::{Config, ConfigSeverity};

/// Outcome of checking a config file: printable lines and whether the
/// timer resolver can be built from it.
pub struct ValidationReport {
    pub lines: Vec<String>,
    pub usable: bool,
}

/// Check the config and describe the timer settings that would apply.
pub fn report(config: &Config, config_path: &str) -> ValidationReport {
    let issues = config.validate();
    let usable = !issues.iter().any(|i| i.severity == ConfigSeverity::Error);
    let mut lines: Vec<String> = issues.iter().map(ToString::to_string).collect();

    if usable {
        let timers = &config.timers;
        lines.push(format!(
            "{config_path}: timers resolve in {} with {} retries, cron horizon {} days",
            timers.timezone, timers.default_retries, timers.cron_horizon_days
        ));
    } else {
        lines.push(format!(
            "{config_path}: timer resolver cannot start ({} issue(s))",
            issues.len()
        ));
    }

    ValidationReport { lines, usable }
}

/// Print the report. Returns false when the config has errors; warnings
/// alone still pass.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let report = report(config, config_path);
    for line in &report.lines {
        println!("{line}");
    }
    report.usable
}

/// Render the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<String> {
    toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serializing config: {e}"))
}
