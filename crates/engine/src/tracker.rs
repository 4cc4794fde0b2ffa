// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job registry and state machine.
//!
//! The tracker owns the authoritative copy of every job and the flag that
//! records whether a job's outcome was pushed to the commit-status API.
//! Every mutation is written through to the [`JobStore`], so status and the
//! reported flag survive a restart.
//!
//! Several processes may share one store. Each job records the tracker that
//! created it ([`JobOwner`]); only that tracker moves the job forward, and
//! restart recovery only touches jobs whose owning process is gone.
//!
//! Lookups of unknown ids return `None`/`false` rather than an error.

use std::collections::HashMap;
use std::time::Duration;

use docsync_adapters::is_process_alive;
use docsync_core::{
    Clock, GitHubContext, Job, JobFilter, JobId, JobOwner, JobResult, JobStatus, JobType,
    SystemClock,
};
use docsync_storage::{JobStore, StoreError};
use parking_lot::Mutex;
use thiserror::Error;

/// Failure recorded on jobs that were still pending or running when the
/// previous process went away.
pub const RESTART_INTERRUPTED_ERROR: &str = "Job interrupted by service restart";

/// Temp files older than this were left by a writer that died mid-save.
pub const STALE_TEMP_AGE: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("failed to persist job {job_id}: {source}")]
    Persist { job_id: JobId, source: StoreError },
    #[error("job tracker has been destroyed")]
    Destroyed,
}

#[derive(Default)]
struct TrackerState {
    jobs: HashMap<JobId, Job>,
    destroyed: bool,
}

/// Explicitly constructed job registry; share it as `Arc<JobTracker>`.
pub struct JobTracker<C: Clock = SystemClock> {
    state: Mutex<TrackerState>,
    store: JobStore,
    clock: C,
    owner: JobOwner,
}

impl<C: Clock> JobTracker<C> {
    /// Load every persisted job.
    ///
    /// Pending or running jobs whose owner process no longer exists (or that
    /// carry no owner) are failed with [`RESTART_INTERRUPTED_ERROR`] and
    /// written back. Jobs of live owners, terminal jobs, and every job's
    /// reported flag are kept as loaded.
    pub fn open(store: JobStore, clock: C) -> Self {
        let now = clock.epoch_ms();
        let owner = JobOwner::current();
        let mut jobs = HashMap::new();
        let mut interrupted = 0usize;

        store.remove_stale_temp_files(STALE_TEMP_AGE);
        for mut job in store.load_all() {
            if is_orphaned(&job) {
                job.finish(JobStatus::Failed, JobResult::failure(RESTART_INTERRUPTED_ERROR), now);
                match store.save(&job) {
                    Ok(()) => {
                        tracing::warn!(job_id = %job.id, "interrupted by restart, marked failed");
                        interrupted += 1;
                    }
                    // Its owner finished it after our scan.
                    Err(StoreError::TerminalConflict { .. }) => match store.load(job.id.as_str()) {
                        Ok(Some(current)) => job = current,
                        _ => continue,
                    },
                    Err(e) => {
                        tracing::warn!(job_id = %job.id, error = %e, "failed to persist job");
                    }
                }
            }
            jobs.insert(job.id.clone(), job);
        }

        tracing::info!(
            jobs = jobs.len(),
            interrupted,
            owner_pid = owner.pid,
            instance = %owner.instance,
            dir = %store.dir().display(),
            "job tracker opened"
        );

        Self { state: Mutex::new(TrackerState { jobs, destroyed: false }), store, clock, owner }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Stamped on every job this tracker creates.
    pub fn owner(&self) -> &JobOwner {
        &self.owner
    }

    /// Register a new pending job and persist it before returning.
    pub fn create_job(
        &self,
        job_type: JobType,
        github: Option<GitHubContext>,
    ) -> Result<Job, TrackerError> {
        let mut job = Job::new(JobId::generate(), job_type, github, &self.clock);
        job.owner = Some(self.owner.clone());

        let mut state = self.state.lock();
        if state.destroyed {
            return Err(TrackerError::Destroyed);
        }
        self.store
            .save(&job)
            .map_err(|source| TrackerError::Persist { job_id: job.id.clone(), source })?;
        state.jobs.insert(job.id.clone(), job.clone());
        drop(state);

        tracing::info!(job_id = %job.id, job_type = %job.job_type, "job created");
        Ok(job)
    }

    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.state.lock().jobs.get(job_id).cloned()
    }

    /// Pending → running.
    pub fn mark_running(&self, job_id: &str) -> bool {
        self.update(job_id, "mark_running", |job, now| job.start(now))
    }

    /// Terminal transition to completed. No-op on an already terminal job.
    pub fn mark_completed(&self, job_id: &str, result: JobResult) -> bool {
        self.update(job_id, "mark_completed", |job, now| {
            job.finish(JobStatus::Completed, result, now)
        })
    }

    /// Terminal transition to failed. No-op on an already terminal job.
    pub fn mark_failed(&self, job_id: &str, result: JobResult) -> bool {
        self.update(job_id, "mark_failed", |job, now| job.finish(JobStatus::Failed, result, now))
    }

    /// Set the reported flag. Returns true only for the call that set it.
    pub fn mark_github_status_reported(&self, job_id: &str) -> bool {
        self.update(job_id, "mark_github_status_reported", |job, _| {
            !std::mem::replace(&mut job.github_status_reported, true)
        })
    }

    /// Reset the reported flag so the outcome can be reported again.
    pub fn clear_github_status_reported(&self, job_id: &str) -> bool {
        self.update(job_id, "clear_github_status_reported", |job, _| {
            std::mem::replace(&mut job.github_status_reported, false)
        })
    }

    pub fn is_github_status_reported(&self, job_id: &str) -> bool {
        self.state.lock().jobs.get(job_id).is_some_and(|job| job.github_status_reported)
    }

    /// Jobs matching `filter`, newest first.
    pub fn list_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        let jobs: Vec<Job> = self.state.lock().jobs.values().cloned().collect();
        filter.apply(jobs)
    }

    /// Forget terminal jobs that finished more than `retention` ago, in
    /// memory and on disk. Returns the removed ids.
    pub fn prune_expired(&self, retention: Duration) -> Vec<JobId> {
        let retention_ms = u64::try_from(retention.as_millis()).unwrap_or(u64::MAX);
        let cutoff = self.clock.epoch_ms().saturating_sub(retention_ms);
        let mut state = self.state.lock();

        let expired: Vec<JobId> = state
            .jobs
            .values()
            .filter(|job| job.is_terminal() && job.finished_at_ms.is_some_and(|at| at < cutoff))
            .map(|job| job.id.clone())
            .collect();

        for id in &expired {
            state.jobs.remove(id);
            if let Err(e) = self.store.remove(id.as_str()) {
                tracing::warn!(job_id = %id, error = %e, "failed to delete expired job record");
            }
        }
        drop(state);

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "pruned expired jobs");
        }
        expired
    }

    /// Drop every in-memory job. Records on disk stay; they are what the
    /// next [`open`](Self::open) recovers from.
    pub fn destroy(&self) {
        let mut state = self.state.lock();
        state.jobs.clear();
        state.destroyed = true;
        tracing::debug!("job tracker destroyed");
    }

    /// Apply `op` to the job and persist it if it reports a change.
    ///
    /// If the record was finished with a different status on disk in the
    /// meantime, the disk copy wins and the change is dropped.
    fn update(&self, job_id: &str, op: &str, f: impl FnOnce(&mut Job, u64) -> bool) -> bool {
        let now = self.clock.epoch_ms();
        let mut state = self.state.lock();
        let Some(job) = state.jobs.get_mut(job_id) else {
            tracing::debug!(job_id, op, "job not found");
            return false;
        };
        let mut next = job.clone();
        if !f(&mut next, now) {
            tracing::debug!(job_id, op, status = %job.status, "no state change");
            return false;
        }
        match self.store.save(&next) {
            Ok(()) => {}
            Err(StoreError::TerminalConflict { on_disk, .. }) => {
                tracing::warn!(job_id, op, %on_disk, "job already finished on disk, keeping it");
                if let Ok(Some(mut current)) = self.store.load(job_id) {
                    // The token is never persisted.
                    if let (Some(disk), Some(mem)) = (&mut current.github, &job.github) {
                        disk.token.clone_from(&mem.token);
                    }
                    *job = current;
                }
                return false;
            }
            Err(e) => tracing::warn!(job_id, op, error = %e, "failed to persist job"),
        }
        *job = next;
        true
    }
}

/// Non-terminal job whose owner process is gone, or that never had one.
/// Jobs owned by this process are never orphaned here, whichever tracker
/// created them.
fn is_orphaned(job: &Job) -> bool {
    !job.is_terminal() && job.owner.as_ref().map_or(true, |owner| !is_process_alive(owner.pid))
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
