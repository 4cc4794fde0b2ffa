//! `prune` specs

use crate::prelude::*;

const OLD_ID: &str = "job-oldaaaaaaaaaaaaaaaaa";
const RECENT_ID: &str = "job-recentaaaaaaaaaaaaaa";
const LIVE_ID: &str = "job-livelivelivelivelive";
const ORPHAN_ID: &str = "job-orphanaaaaaaaaaaaaaa";

fn finished(finished_at_ms: u64) -> Value {
    json!({
        "type": "count-pages",
        "status": "completed",
        "created_at_ms": finished_at_ms - 1_000,
        "finished_at_ms": finished_at_ms,
        "result": { "output": "" }
    })
}

#[test]
fn prune_removes_jobs_finished_before_the_window() {
    let temp = Project::empty();
    let now = now_ms();
    temp.record(OLD_ID, finished(now - 3 * HOUR_MS));
    temp.record(RECENT_ID, finished(now - HOUR_MS / 2));

    temp.cli()
        .args(&["prune", "--hours", "2"])
        .passes()
        .stdout_has(&format!("Pruned {OLD_ID}"))
        .stdout_has("1 job(s) pruned");

    assert!(!temp.record_path(OLD_ID).exists());
    assert!(temp.record_path(RECENT_ID).exists());
}

#[test]
fn prune_defaults_to_retention_setting() {
    let temp = Project::empty();
    temp.record(OLD_ID, finished(now_ms() - 3 * HOUR_MS));

    temp.cli()
        .env("JOB_RETENTION_HOURS", "1")
        .args(&["prune", "-o", "json"])
        .passes()
        .stdout_has(OLD_ID)
        .stdout_has("\"retention_hours\": 1");
    assert!(!temp.record_path(OLD_ID).exists());
}

#[test]
fn prune_fails_interrupted_jobs_instead_of_removing_them() {
    let temp = Project::empty();
    temp.record(
        ORPHAN_ID,
        json!({
            "type": "fetch",
            "status": "running",
            "created_at_ms": now_ms() - 5 * HOUR_MS,
            "started_at_ms": now_ms() - 5 * HOUR_MS,
        }),
    );

    temp.cli().args(&["prune", "--hours", "1"]).passes().stdout_has("0 job(s) pruned");

    let record = temp.read_record(ORPHAN_ID);
    assert_eq!(record["status"], "failed");
    assert_eq!(record["result"]["error"], "Job interrupted by service restart");
}

#[test]
fn prune_leaves_jobs_of_live_processes_running() {
    let temp = Project::empty();
    temp.record(
        LIVE_ID,
        json!({
            "type": "fetch-all",
            "status": "running",
            "created_at_ms": now_ms() - 5 * HOUR_MS,
            "started_at_ms": now_ms() - 5 * HOUR_MS,
            "owner": { "pid": std::process::id(), "instance": "peer" },
        }),
    );

    temp.cli().args(&["prune", "--hours", "1"]).passes().stdout_has("0 job(s) pruned");

    let record = temp.read_record(LIVE_ID);
    assert_eq!(record["status"], "running");
    assert!(record["result"].get("error").is_none());
}
