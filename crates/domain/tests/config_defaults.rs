use ft_domain::config::{Config, ConfigSeverity};

#[test]
fn default_timezone_is_utc() {
    let config = Config::default();
    assert_eq!(config.timers.timezone, "UTC");
}

#[test]
fn default_retries_match_async_executor() {
    let config = Config::default();
    assert_eq!(config.timers.default_retries, 3);
}

#[test]
fn explicit_timer_section_parses() {
    let toml_str = r#"
[timers]
default_retries = 5
timezone = "Europe/Brussels"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.timers.default_retries, 5);
    assert_eq!(config.timers.timezone, "Europe/Brussels");
    assert_eq!(config.timers.cron_horizon_days, 366);
    assert!(config.validate().is_empty());
}

#[test]
fn observability_section_parses() {
    let toml_str = r#"
[observability]
log_filter = "debug"
json = true
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.observability.log_filter, "debug");
    assert!(config.observability.json);
}

#[test]
fn unknown_timezone_fails_validation() {
    let toml_str = r#"
[timers]
timezone = "Not/Real"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.severity == ConfigSeverity::Error && i.field == "timers.timezone"));
}

#[test]
fn empty_file_is_default() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.timers.default_retries, 3);
    assert_eq!(config.observability.log_filter, "info");
}
