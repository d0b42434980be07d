//! End-to-end runs of the `resolve` and `prepare-repeat` commands against
//! request files on disk, with the engine clock pinned via `--now`.

use ft_cli::cli::{repeat, resolve};
use ft_domain::config::TimerConfig;

const NOW: &str = "2024-01-01T00:00:00Z";

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn resolve_prints_job_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(
        &dir,
        "boundary.toml",
        r#"
interrupting = false
handler_configuration = "escalate"

[declaration]
id = "escalation"
time_cycle = "R2/PT${hours}H"

[execution]
id = "exec-7"
activity_id = "escalation"
element_kind = "boundary_event"
process_definition_id = "support:1:3"
process_instance_id = "pi-11"

[execution.variables]
hours = 4
"#,
    );

    let out = resolve::run(&TimerConfig::default(), &file, Some(NOW)).unwrap();
    let job: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(job["job_type"], "timer");
    assert_eq!(job["revision"], 1);
    assert_eq!(job["exclusive"], true);
    assert_eq!(job["retries"], 3);
    assert_eq!(job["due_at"], "2024-01-01T04:00:00Z");
    assert_eq!(job["repeat"], "R2/2024-01-01T00:00:00.000Z/PT4H");
    assert_eq!(job["handler_type"], "trigger-timer");
    assert_eq!(job["handler_configuration"], "escalate");
    assert_eq!(job["process_instance_id"], "pi-11");
    assert!(job["tenant_id"].is_null());
}

#[test]
fn resolve_uses_configured_zone_for_local_dates() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(
        &dir,
        "start.json",
        r#"{"declaration": {"timeDate": "2024-03-01T09:00:00", "owner": "start_event"}}"#,
    );
    let timers = TimerConfig {
        timezone: "Europe/Brussels".into(),
        ..TimerConfig::default()
    };

    let out = resolve::run(&timers, &file, Some(NOW)).unwrap();
    let job: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(job["due_at"], "2024-03-01T08:00:00Z");
    assert!(job["execution_id"].is_null());
}

#[test]
fn resolve_reports_scheduling_errors() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(&dir, "empty.toml", "[declaration]\nid = \"nothing\"\n");

    let err = resolve::run(&TimerConfig::default(), &file, Some(NOW)).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("resolving timer from"), "{chain}");
    assert!(chain.contains("timer needs configuration"), "{chain}");
}

#[test]
fn resolve_missing_file_fails() {
    let err = resolve::run(&TimerConfig::default(), "/nonexistent/timer.toml", Some(NOW))
        .unwrap_err();
    assert!(err.to_string().contains("reading"));
}

#[test]
fn prepare_repeat_anchors_at_now() {
    let out = repeat::run(&TimerConfig::default(), "R3/PT1H", Some(NOW)).unwrap();
    assert_eq!(out, "R3/2024-01-01T00:00:00.000Z/PT1H");
}
