// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! docsync-engine: job tracking, repository locking, status reporting and
//! process execution.

pub mod env;
mod executor;
mod job_logger;
mod repo_lock;
mod reporter;
mod tracker;

pub use executor::{
    ExecutorConfig, ExecutorDeps, JobExecutor, CANCELLED_ERROR, KILL_FAILSAFE, LOCK_FAILED_ERROR,
    SPAWN_FAILED_ERROR, TERMINATE_GRACE, UNKNOWN_JOB_TYPE_ERROR,
};
pub use job_logger::JobLogger;
pub use repo_lock::{acquire_repo_lock, LockError, RepoLockGuard, LOCK_RETRY_INTERVAL};
pub use reporter::{
    completion_description, GitHubStatusReporter, StatusError, StatusPayload,
    INITIAL_RETRY_BACKOFF, MAX_DESCRIPTION_CHARS, MAX_STATUS_RETRIES,
};
pub use tracker::{JobTracker, TrackerError, RESTART_INTERRUPTED_ERROR};
