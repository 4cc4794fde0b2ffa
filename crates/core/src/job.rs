// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and state machine.

use crate::clock::Clock;
use crate::github::GitHubContext;
use crate::job_type::JobType;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a job instance.
    ///
    /// Ids read back from disk or the command line are taken as-is, so
    /// lookups must tolerate ids that were never issued.
    pub struct JobId("job-");
}

/// Lifecycle status of a job.
///
/// Transitions are monotonic: `Pending → Running → {Completed | Failed}`,
/// or `Pending → {Completed | Failed}` for jobs that end before they ever run
/// (cancelled or refused the repository lock). Nothing leaves a terminal
/// status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether moving from `self` to `next` respects the state machine.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Pending, JobStatus::Running) => true,
            (JobStatus::Pending | JobStatus::Running, next) => next.is_terminal(),
            _ => false,
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// What a finished job produced. Failed jobs carry only a generic error;
/// diagnostic detail lives in the job log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self { output: Some(output.into()), error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { output: None, error: Some(error.into()) }
    }
}

/// The process driving a job. Only the owner moves a job forward, so
/// restart recovery leaves jobs of live owners alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOwner {
    pub pid: u32,
    /// Random per-tracker token; two trackers in one process differ here.
    pub instance: String,
}

impl JobOwner {
    /// Owner for trackers in the current process.
    pub fn current() -> Self {
        Self { pid: std::process::id(), instance: nanoid::nanoid!(12) }
    }
}

/// A job instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    #[serde(default)]
    pub result: JobResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubContext>,
    /// Set once the outcome has been pushed to the commit-status API.
    #[serde(default)]
    pub github_status_reported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<JobOwner>,
}

impl Job {
    pub fn new(
        id: JobId,
        job_type: JobType,
        github: Option<GitHubContext>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id,
            job_type,
            status: JobStatus::Pending,
            created_at_ms: clock.epoch_ms(),
            started_at_ms: None,
            finished_at_ms: None,
            result: JobResult::default(),
            github,
            github_status_reported: false,
            owner: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Pending → running. Returns false (and changes nothing) otherwise.
    pub fn start(&mut self, epoch_ms: u64) -> bool {
        if !self.status.can_transition_to(JobStatus::Running) {
            return false;
        }
        self.status = JobStatus::Running;
        self.started_at_ms = Some(epoch_ms);
        true
    }

    /// Move to a terminal status. Returns false if the job is already
    /// terminal or `status` is not terminal.
    pub fn finish(&mut self, status: JobStatus, result: JobResult, epoch_ms: u64) -> bool {
        if !self.status.can_transition_to(status) || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.result = result;
        self.finished_at_ms = Some(epoch_ms);
        true
    }

    /// Wall time between start (or creation) and finish, once finished.
    pub fn duration_ms(&self) -> Option<u64> {
        let finished = self.finished_at_ms?;
        Some(finished.saturating_sub(self.started_at_ms.unwrap_or(self.created_at_ms)))
    }
}

/// Criteria for listing jobs; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub job_type: Option<JobType>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        self.status.map_or(true, |s| s == job.status)
            && self.job_type.map_or(true, |t| t == job.job_type)
    }

    /// Matching jobs, newest first. Ties on creation time order by id so
    /// listings are stable.
    pub fn apply(&self, jobs: impl IntoIterator<Item = Job>) -> Vec<Job> {
        let mut jobs: Vec<Job> = jobs.into_iter().filter(|job| self.matches(job)).collect();
        jobs.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms).then_with(|| b.id.cmp(&a.id)));
        jobs
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
