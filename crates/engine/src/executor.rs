// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job executor.
//!
//! Runs one job as a child process: takes the repository lock when the job
//! writes content, spawns the command with an allow-listed environment,
//! supervises it against its timeout, records the outcome in the tracker and
//! reports it as a commit status.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use docsync_adapters::{
    ChildProcess, ProcessAdapter, ProcessError, ProcessExit, SpawnSpec, StatusApi,
};
use docsync_core::{Clock, JobId, JobResult, JobStatus, JobType, SystemClock};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::env;
use crate::job_logger::JobLogger;
use crate::repo_lock::{acquire_repo_lock, LockError};
use crate::reporter::GitHubStatusReporter;
use crate::tracker::JobTracker;

/// How long a child has to exit after SIGTERM before it gets SIGKILL.
pub const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// How long after SIGKILL the job is failed even if the child never
/// reports an exit.
pub const KILL_FAILSAFE: Duration = Duration::from_secs(1);

pub const SPAWN_FAILED_ERROR: &str = "Job process failed to start";
pub const CANCELLED_ERROR: &str = "Job cancelled while waiting for repository lock";
pub const LOCK_FAILED_ERROR: &str = "Failed to acquire repository lock";
pub const UNKNOWN_JOB_TYPE_ERROR: &str = "Unknown job type";

/// Where and how jobs run.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Working directory of every child.
    pub content_dir: PathBuf,
    pub lock_path: PathBuf,
    /// Root for per-job diagnostic logs.
    pub log_dir: PathBuf,
    /// Replaces every job type's own timeout when set.
    pub timeout_override: Option<Duration>,
}

impl ExecutorConfig {
    /// Build from the process environment, logging under `<state_dir>/logs`.
    pub fn from_env(state_dir: &Path) -> Self {
        let content_dir = env::content_dir();
        Self {
            lock_path: env::lock_path(&content_dir),
            content_dir,
            log_dir: state_dir.join("logs"),
            timeout_override: env::timeout_override(),
        }
    }
}

/// Adapters and shared state the executor drives.
pub struct ExecutorDeps<P, S, C: Clock = SystemClock> {
    pub tracker: Arc<JobTracker<C>>,
    pub processes: P,
    pub status_api: S,
}

/// Runs jobs in background tasks. Cheap to clone.
pub struct JobExecutor<P, S, C: Clock = SystemClock> {
    inner: Arc<ExecutorInner<P, S, C>>,
}

impl<P, S, C: Clock> Clone for JobExecutor<P, S, C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

struct ExecutorInner<P, S, C: Clock> {
    tracker: Arc<JobTracker<C>>,
    processes: P,
    reporter: GitHubStatusReporter<S>,
    logger: JobLogger,
    config: ExecutorConfig,
    /// Source environment for children; `None` reads the live process
    /// environment at each spawn.
    parent_env: Option<HashMap<String, String>>,
    /// Cancellation for jobs that have not spawned yet.
    cancellations: Mutex<HashMap<JobId, CancellationToken>>,
}

/// How a supervised child ended.
enum Supervised {
    Exited(ProcessExit),
    Errored(ProcessError),
    /// The timeout fired. `exited` is whatever the child's own wait returned
    /// during escalation, or `None` if it never did.
    TimedOut { exited: Option<Result<ProcessExit, ProcessError>> },
}

/// What the supervisor has observed of the child. Only a result from
/// `wait` produces `Exited`; sending a signal never does.
enum ProcessLiveness {
    Alive,
    Exited(Result<ProcessExit, ProcessError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escalation {
    Running,
    Terminated,
    Killed,
}

impl<P, S, C> JobExecutor<P, S, C>
where
    P: ProcessAdapter,
    S: StatusApi,
    C: Clock,
{
    pub fn new(deps: ExecutorDeps<P, S, C>, config: ExecutorConfig) -> Self {
        let logger = JobLogger::new(config.log_dir.clone());
        Self {
            inner: Arc::new(ExecutorInner {
                tracker: deps.tracker,
                processes: deps.processes,
                reporter: GitHubStatusReporter::new(deps.status_api),
                logger,
                config,
                parent_env: None,
                cancellations: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Take child environments from `vars` instead of the live process
    /// environment. Must be called before the executor is cloned.
    pub fn with_parent_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.parent_env = Some(vars);
        } else {
            tracing::warn!("executor already shared, ignoring parent environment override");
        }
        self
    }

    pub fn tracker(&self) -> &Arc<JobTracker<C>> {
        &self.inner.tracker
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.inner.config
    }

    /// Run `job_id` in a background task and return immediately.
    ///
    /// Outcomes are only observable through the tracker. The handle may be
    /// awaited or dropped; dropping it does not stop the job.
    pub fn execute_job_async(
        &self,
        job_type: JobType,
        job_id: &JobId,
        args: Vec<String>,
    ) -> JoinHandle<()> {
        let token = CancellationToken::new();
        self.inner.cancellations.lock().insert(job_id.clone(), token.clone());

        let inner = Arc::clone(&self.inner);
        let job_id = job_id.clone();
        tokio::spawn(async move {
            inner.run(job_type, &job_id, &args, &token).await;
            inner.cancellations.lock().remove(&job_id);
            inner.report_job_outcome(job_id.as_str()).await;
        })
    }

    /// Cancel a job that is still waiting for the repository lock. Has no
    /// effect once the child is spawned. Returns whether the job was found.
    pub fn cancel(&self, job_id: &str) -> bool {
        match self.inner.cancellations.lock().get(job_id) {
            Some(token) => {
                token.cancel();
                tracing::info!(job_id, "job cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Report a finished job's outcome as a commit status, at most once.
    ///
    /// Returns true if this call posted the status and set the reported
    /// flag.
    pub async fn report_job_outcome(&self, job_id: &str) -> bool {
        self.inner.report_job_outcome(job_id).await
    }
}

impl<P, S, C> ExecutorInner<P, S, C>
where
    P: ProcessAdapter,
    S: StatusApi,
    C: Clock,
{
    async fn run(
        &self,
        job_type: JobType,
        job_id: &JobId,
        args: &[String],
        cancel: &CancellationToken,
    ) {
        let Some(job) = self.tracker.get_job(job_id.as_str()) else {
            tracing::warn!(%job_id, "job not found, nothing to execute");
            return;
        };
        if job.is_terminal() {
            tracing::debug!(%job_id, status = %job.status, "job already finished, not executing");
            return;
        }
        if job.job_type != job_type {
            self.fail(
                job_id,
                UNKNOWN_JOB_TYPE_ERROR,
                &format!("requested {job_type} but job was created as {}", job.job_type),
            );
            return;
        }

        let command = job_type.command();
        let lock = if command.mutates_content {
            self.logger.append(job_id.as_str(), "lock", "waiting for repository lock");
            match acquire_repo_lock(&self.config.lock_path, || cancel.is_cancelled()).await {
                Ok(guard) => Some(guard),
                Err(LockError::Cancelled) => {
                    self.fail(job_id, CANCELLED_ERROR, "lock wait cancelled");
                    return;
                }
                Err(e) => {
                    self.fail(job_id, LOCK_FAILED_ERROR, &e.to_string());
                    return;
                }
            }
        } else {
            None
        };

        let timeout = self.config.timeout_override.unwrap_or_else(|| command.timeout());
        let spec = SpawnSpec {
            program: command.executable.to_string(),
            args: command.argv(args),
            env: self.child_env(),
            cwd: self.config.content_dir.clone(),
        };
        let argv = spec.args.join(" ");

        let mut child = match self.processes.spawn(spec) {
            Ok(child) => child,
            Err(e) => {
                self.fail(job_id, SPAWN_FAILED_ERROR, &e.to_string());
                return;
            }
        };
        self.tracker.mark_running(job_id.as_str());
        tracing::info!(
            %job_id,
            %job_type,
            pid = ?child.pid(),
            timeout_ms = timeout.as_millis() as u64,
            "job started"
        );
        self.logger.append(
            job_id.as_str(),
            "spawn",
            &format!("{} {} (timeout {}ms)", command.executable, argv, timeout.as_millis()),
        );

        let outcome = supervise(&mut child, timeout, job_id).await;
        let output = child.output();
        self.logger.append_fenced(job_id.as_str(), "output", "stdout", &output.stdout);
        self.logger.append_fenced(job_id.as_str(), "output", "stderr", &output.stderr);

        match outcome {
            Supervised::Exited(exit) if exit.success() => {
                self.logger.append(job_id.as_str(), "exit", "exit code 0");
                if self.tracker.mark_completed(job_id.as_str(), JobResult::success(output.stdout)) {
                    tracing::info!(%job_id, "job completed");
                }
            }
            Supervised::Exited(exit) => {
                let error = match exit.code {
                    Some(code) => format!("Job failed with exit code {code}"),
                    None => "Job terminated by signal".to_string(),
                };
                self.fail(job_id, &error, &format!("child exited: {exit:?}"));
            }
            Supervised::Errored(e) => {
                self.fail(job_id, SPAWN_FAILED_ERROR, &e.to_string());
            }
            Supervised::TimedOut { exited } => {
                let detail = match exited {
                    Some(Ok(exit)) => format!("exited during escalation: {exit:?}"),
                    Some(Err(e)) => format!("errored during escalation: {e}"),
                    None => "no exit observed after SIGKILL".to_string(),
                };
                self.fail(job_id, &timeout_error(timeout), &detail);
            }
        }

        if let Some(lock) = lock {
            lock.release();
        }
    }

    /// Fail the job with the job-visible `error`; `detail` only goes to the
    /// logs.
    fn fail(&self, job_id: &JobId, error: &str, detail: &str) {
        self.logger.append(job_id.as_str(), "error", &format!("{error}: {detail}"));
        if self.tracker.mark_failed(job_id.as_str(), JobResult::failure(error)) {
            tracing::warn!(%job_id, error, detail, "job failed");
        }
    }

    fn child_env(&self) -> HashMap<String, String> {
        match &self.parent_env {
            Some(vars) => env::build_child_env(vars.iter().map(|(k, v)| (k.clone(), v.clone()))),
            None => env::build_child_env(std::env::vars()),
        }
    }

    async fn report_job_outcome(&self, job_id: &str) -> bool {
        let Some(job) = self.tracker.get_job(job_id) else {
            return false;
        };
        if !job.is_terminal() {
            tracing::debug!(job_id, status = %job.status, "job not finished, nothing to report");
            return false;
        }
        let Some(github) = job.github else {
            return false;
        };
        if self.tracker.is_github_status_reported(job_id) {
            tracing::debug!(job_id, "commit status already reported");
            return false;
        }

        let success = job.status == JobStatus::Completed;
        let duration = job.finished_at_ms.zip(job.started_at_ms).map(|(finished, started)| {
            Duration::from_millis(finished.saturating_sub(started))
        });

        // Another completion may have reported while we were getting here.
        if self.tracker.is_github_status_reported(job_id) {
            return false;
        }
        let payload =
            self.reporter.report_job_completion(&github, success, job.job_type, duration).await;

        match payload {
            Some(payload) => {
                let marked = self.tracker.mark_github_status_reported(job_id);
                tracing::info!(job_id, status_id = ?payload.id, marked, "commit status reported");
                marked
            }
            None => false,
        }
    }
}

fn timeout_error(timeout: Duration) -> String {
    format!("Job timed out after {} seconds", timeout.as_millis() as f64 / 1000.0)
}

/// Wait for the child, escalating once `timeout` passes: SIGTERM, then
/// SIGKILL after [`TERMINATE_GRACE`] if it is still alive, then give up
/// [`KILL_FAILSAFE`] later whether or not it ever exits.
///
/// The timer is dropped when this returns, so nothing fires late.
async fn supervise<Ch: ChildProcess>(
    child: &mut Ch,
    timeout: Duration,
    job_id: &JobId,
) -> Supervised {
    let timer = tokio::time::sleep(timeout);
    tokio::pin!(timer);
    let mut stage = Escalation::Running;

    loop {
        let liveness = tokio::select! {
            biased;
            result = child.wait() => ProcessLiveness::Exited(result),
            () = &mut timer => ProcessLiveness::Alive,
        };

        match (liveness, stage) {
            (ProcessLiveness::Exited(Ok(exit)), Escalation::Running) => {
                return Supervised::Exited(exit);
            }
            (ProcessLiveness::Exited(Err(e)), Escalation::Running) => {
                return Supervised::Errored(e);
            }
            (ProcessLiveness::Exited(result), _) => {
                return Supervised::TimedOut { exited: Some(result) };
            }
            (ProcessLiveness::Alive, Escalation::Running) => {
                tracing::warn!(
                    %job_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "job timed out, sending SIGTERM"
                );
                if let Err(e) = child.terminate() {
                    tracing::warn!(%job_id, error = %e, "failed to send SIGTERM");
                }
                stage = Escalation::Terminated;
                timer.as_mut().reset(Instant::now() + TERMINATE_GRACE);
            }
            (ProcessLiveness::Alive, Escalation::Terminated) => {
                tracing::warn!(%job_id, "job still running after grace period, sending SIGKILL");
                if let Err(e) = child.kill() {
                    tracing::warn!(%job_id, error = %e, "failed to send SIGKILL");
                }
                stage = Escalation::Killed;
                timer.as_mut().reset(Instant::now() + KILL_FAILSAFE);
            }
            (ProcessLiveness::Alive, Escalation::Killed) => {
                tracing::error!(%job_id, "no exit observed after SIGKILL, failing job");
                return Supervised::TimedOut { exited: None };
            }
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
