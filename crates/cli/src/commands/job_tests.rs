// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use docsync_core::test_support::github_context;
use docsync_core::{FakeClock, JobId};
use tempfile::TempDir;

use super::*;

fn setup() -> (TempDir, CliConfig, JobStore) {
    let dir = tempfile::tempdir().unwrap();
    let config = CliConfig { state_dir: dir.path().to_path_buf(), retention: Duration::ZERO };
    let store = JobStore::open(config.jobs_dir()).unwrap();
    (dir, config, store)
}

fn job_at(id: &str, job_type: JobType, created_ms: u64) -> Job {
    Job::new(JobId::from(id), job_type, None, &FakeClock::at(created_ms))
}

fn exit_code(err: &anyhow::Error) -> Option<i32> {
    err.downcast_ref::<ExitError>().map(|e| e.code)
}

#[test]
fn show_unknown_job_exits_not_found() {
    let (_dir, config, _store) = setup();

    let err = show(&config, "job-missing", OutputFormat::Text).unwrap_err();
    assert_eq!(exit_code(&err), Some(crate::exit_error::EXIT_NOT_FOUND));
}

#[test]
fn show_malformed_id_exits_not_found() {
    let (_dir, config, _store) = setup();

    let err = show(&config, "../etc/passwd", OutputFormat::Text).unwrap_err();
    assert_eq!(exit_code(&err), Some(crate::exit_error::EXIT_NOT_FOUND));
}

#[test]
fn clear_reported_resets_flag_on_disk() {
    let (_dir, config, store) = setup();
    let mut job = job_at("job-reported", JobType::Fetch, 1_000);
    job.github = Some(github_context());
    job.github_status_reported = true;
    store.save(&job).unwrap();

    clear_reported(&config, "job-reported").unwrap();

    let reloaded = store.load("job-reported").unwrap().unwrap();
    assert!(!reloaded.github_status_reported);
}

#[test]
fn clear_reported_on_unreported_job_is_a_no_op() {
    let (_dir, config, store) = setup();
    store.save(&job_at("job-quiet", JobType::Fetch, 1_000)).unwrap();

    clear_reported(&config, "job-quiet").unwrap();
    assert!(!store.load("job-quiet").unwrap().unwrap().github_status_reported);
}

#[test]
fn clear_reported_unknown_job_exits_not_found() {
    let (_dir, config, _store) = setup();

    let err = clear_reported(&config, "job-missing").unwrap_err();
    assert_eq!(exit_code(&err), Some(crate::exit_error::EXIT_NOT_FOUND));
}
