//! `docsync-jobs run` specs
//!
//! Jobs run `bun`; each spec puts a shell stub named `bun` first on PATH.

use crate::prelude::*;

#[test]
fn run_completed_job_prints_output_and_exits_zero() {
    let temp = Project::empty();
    temp.fake_bun(r#"echo "pages: 12""#);

    temp.cli()
        .args(&["run", "count-pages"])
        .passes()
        .stdout_has("Status: completed")
        .stdout_has("pages: 12");
}

#[test]
fn run_passes_trailing_args_to_the_command() {
    let temp = Project::empty();
    temp.fake_bun(r#"echo "argv: $*""#);

    temp.cli()
        .args(&["run", "count-pages", "--", "--max-pages", "5"])
        .passes()
        .stdout_has("argv: scripts/notion-count-pages/index.ts --max-pages 5");
}

#[test]
fn run_failed_job_exits_one_with_generic_error() {
    let temp = Project::empty();
    temp.fake_bun("echo 'secret detail' >&2; exit 3");

    temp.cli()
        .args(&["run", "count-pages"])
        .exits(1)
        .stdout_has("Status: failed")
        .stdout_has("Error: Job failed with exit code 3")
        .stdout_lacks("secret detail");
}

#[test]
fn run_records_the_job() {
    let temp = Project::empty();
    temp.fake_bun("exit 0");

    let out = temp.cli().args(&["run", "status-draft", "-o", "json"]).passes();
    let job = out.json();
    assert_eq!(job["type"], "status-draft");
    assert_eq!(job["status"], "completed");

    let id = job["id"].as_str().unwrap();
    assert_eq!(temp.read_record(id)["status"], "completed");
    assert!(temp.read_record(id)["owner"]["pid"].as_u64().is_some());
}

#[test]
fn run_mutating_job_releases_repository_lock() {
    let temp = Project::empty();
    temp.fake_bun("test -f .docsync.lock && echo locked");

    temp.cli().args(&["run", "fetch"]).passes().stdout_has("locked");
    assert!(!temp.content_dir().join(".docsync.lock").exists());
}

#[test]
fn run_child_sees_only_allowlisted_env() {
    let temp = Project::empty();
    temp.fake_bun(r#"echo "key=${NOTION_API_KEY:-unset} token=${GITHUB_TOKEN:-unset}""#);

    temp.cli()
        .env("NOTION_API_KEY", "ntn_123")
        .env("GITHUB_TOKEN", "ghp_leak")
        .args(&["run", "count-pages"])
        .passes()
        .stdout_has("key=ntn_123 token=unset");
}

#[test]
fn run_that_cannot_spawn_fails_the_job() {
    let temp = Project::empty();
    temp.fake_bun("exit 0");

    temp.cli()
        .env("DOCSYNC_CONTENT_DIR", temp.path().join("missing"))
        .args(&["run", "count-pages"])
        .exits(1)
        .stdout_has("Error: Job process failed to start");
}

#[test]
fn run_times_out_with_override() {
    let temp = Project::empty();
    temp.fake_bun("sleep 30");

    temp.cli()
        .env("JOB_TIMEOUT_MS", "200")
        .args(&["run", "count-pages"])
        .exits(1)
        .stdout_has("Error: Job timed out after 0.2 seconds");
}

#[test]
fn run_unknown_job_type_is_a_usage_error() {
    let temp = Project::empty();
    temp.cli().args(&["run", "deploy"]).exits(2).stderr_has("deploy");
}

#[test]
fn run_with_commit_status_requires_token() {
    let temp = Project::empty();
    temp.fake_bun("exit 0");

    temp.cli()
        .args(&[
            "run",
            "count-pages",
            "--github-owner",
            "acme",
            "--github-repo",
            "docs",
            "--github-sha",
            "4f2c1a9e",
        ])
        .exits(1)
        .stderr_has("GITHUB_STATUS_TOKEN");
}
