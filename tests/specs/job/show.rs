//! `show`, `list` and `clear-reported` specs over persisted records.

use crate::prelude::*;

const FAILED_ID: &str = "job-failedaaaaaaaaaaaaaa";
const DONE_ID: &str = "job-doneaaaaaaaaaaaaaaaa";

fn failed_record(created_at_ms: u64) -> Value {
    json!({
        "type": "translate",
        "status": "failed",
        "created_at_ms": created_at_ms,
        "started_at_ms": created_at_ms + 1_000,
        "finished_at_ms": created_at_ms + 6_000,
        "result": { "error": "Job failed with exit code 1" },
        "github": {
            "owner": "acme",
            "repo": "docs",
            "commit_sha": "4f2c1a9e",
            "status_context": "docsync/translate"
        },
        "github_status_reported": true
    })
}

fn completed_record(created_at_ms: u64) -> Value {
    json!({
        "type": "fetch",
        "status": "completed",
        "created_at_ms": created_at_ms,
        "finished_at_ms": created_at_ms + 2_000,
        "result": { "output": "fetched 4 pages" }
    })
}

#[test]
fn list_empty() {
    let temp = Project::empty();
    temp.cli().args(&["list"]).passes().stdout_eq("No jobs\n");
}

#[test]
fn list_empty_json() {
    let temp = Project::empty();
    let out = temp.cli().args(&["list", "-o", "json"]).passes();
    assert_eq!(out.json(), json!([]));
}

#[test]
fn list_shows_jobs_newest_first() {
    let temp = Project::empty();
    let now = now_ms();
    temp.record(FAILED_ID, failed_record(now - 2 * HOUR_MS));
    temp.record(DONE_ID, completed_record(now - HOUR_MS));

    let out = temp.cli().args(&["list"]).passes();
    let rows: Vec<&str> = out.stdout().lines().skip(1).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with(DONE_ID));
    assert!(rows[1].starts_with(FAILED_ID));
    assert!(rows[1].contains("translate"));
    assert!(rows[1].trim_end().ends_with("yes"));
}

#[test]
fn list_filters_by_status_and_type() {
    let temp = Project::empty();
    let now = now_ms();
    temp.record(FAILED_ID, failed_record(now));
    temp.record(DONE_ID, completed_record(now));

    temp.cli()
        .args(&["list", "--status", "failed"])
        .passes()
        .stdout_has(FAILED_ID)
        .stdout_lacks(DONE_ID);
    temp.cli()
        .args(&["list", "--type", "fetch"])
        .passes()
        .stdout_has(DONE_ID)
        .stdout_lacks(FAILED_ID);
}

#[test]
fn list_rejects_unknown_status() {
    let temp = Project::empty();
    temp.cli().args(&["list", "--status", "stuck"]).exits(2);
}

#[test]
fn show_not_found_exits_two() {
    let temp = Project::empty();
    temp.cli().args(&["show", "job-nope"]).exits(2).stderr_has("Job not found: job-nope");
}

#[test]
fn show_prints_error_and_commit_status() {
    let temp = Project::empty();
    temp.record(FAILED_ID, failed_record(now_ms()));

    temp.cli()
        .args(&["show", FAILED_ID])
        .passes()
        .stdout_has(&format!("Job: {FAILED_ID}"))
        .stdout_has("Status: failed")
        .stdout_has("Run time: 5.0s")
        .stdout_has("acme/docs@4f2c1a9e (docsync/translate, reported)")
        .stdout_has("Error: Job failed with exit code 1");
}

#[test]
fn show_json_round_trips_the_record() {
    let temp = Project::empty();
    temp.record(DONE_ID, completed_record(now_ms()));

    let job = temp.cli().args(&["show", DONE_ID, "-o", "json"]).passes().json();
    assert_eq!(job["id"], DONE_ID);
    assert_eq!(job["result"]["output"], "fetched 4 pages");
    assert_eq!(job["github_status_reported"], false);
}

#[test]
fn clear_reported_resets_the_flag() {
    let temp = Project::empty();
    temp.record(FAILED_ID, failed_record(now_ms()));

    temp.cli()
        .args(&["clear-reported", FAILED_ID])
        .passes()
        .stdout_has(&format!("Cleared reported flag for {FAILED_ID}"));
    assert_eq!(temp.read_record(FAILED_ID)["github_status_reported"], false);
}

#[test]
fn clear_reported_not_found_exits_two() {
    let temp = Project::empty();
    temp.cli().args(&["clear-reported", "job-nope"]).exits(2);
}
