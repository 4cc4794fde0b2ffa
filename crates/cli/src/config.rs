// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Paths the CLI works under, resolved once at startup.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use docsync_core::SystemClock;
use docsync_engine::{env, JobTracker};
use docsync_storage::JobStore;

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub state_dir: PathBuf,
    /// Retention applied when a run opens the store.
    pub retention: Duration,
}

impl CliConfig {
    pub fn load() -> Result<Self> {
        let state_dir = env::state_dir().ok_or_else(|| {
            anyhow!("cannot determine state directory; set DOCSYNC_STATE_DIR")
        })?;
        Ok(Self { state_dir, retention: env::retention() })
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.state_dir.join("jobs")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }

    /// Open the job store and load it into a tracker. Jobs left running by a
    /// previous process come back failed.
    pub fn open_tracker(&self) -> Result<JobTracker> {
        let store = JobStore::open(self.jobs_dir())?;
        Ok(JobTracker::open(store, SystemClock))
    }
}

/// Token for the commit-status API, from `GITHUB_STATUS_TOKEN`.
pub fn github_status_token() -> Option<String> {
    std::env::var("GITHUB_STATUS_TOKEN").ok().filter(|t| !t.is_empty())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
