// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `docsync-jobs run` - execute one job in the foreground

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use docsync_adapters::{ReqwestStatusApi, TokioProcessAdapter, DEFAULT_GITHUB_API_URL};
use docsync_core::{GitHubContext, JobStatus, JobType};
use docsync_engine::{env, ExecutorConfig, ExecutorDeps, JobExecutor};

use crate::config::{self, CliConfig};
use crate::exit_error::{ExitError, EXIT_INTERRUPTED, EXIT_JOB_FAILED};
use crate::output::{format_job_detail, format_or_json, now_ms, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// Job type (see `docsync-jobs job-types`)
    pub job_type: JobType,

    /// Extra arguments appended to the job's command
    #[arg(last = true)]
    pub args: Vec<String>,

    #[command(flatten)]
    pub github: GitHubArgs,
}

/// Where to post the outcome as a commit status. The token is read from
/// `GITHUB_STATUS_TOKEN`, never from the command line.
#[derive(Args, Debug, Default)]
pub struct GitHubArgs {
    /// Repository owner
    #[arg(long, requires_all = ["github_repo", "github_sha"])]
    pub github_owner: Option<String>,

    /// Repository name
    #[arg(long, requires = "github_owner")]
    pub github_repo: Option<String>,

    /// Commit SHA the status is attached to
    #[arg(long, requires = "github_owner")]
    pub github_sha: Option<String>,

    /// Status context label
    #[arg(long, default_value = "docsync")]
    pub github_context: String,

    /// Link shown next to the status
    #[arg(long, requires = "github_owner")]
    pub github_target_url: Option<String>,
}

impl GitHubArgs {
    pub fn into_context(self, token: Option<String>) -> Result<Option<GitHubContext>> {
        let (Some(owner), Some(repo), Some(sha)) =
            (self.github_owner, self.github_repo, self.github_sha)
        else {
            return Ok(None);
        };
        let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
            bail!("GITHUB_STATUS_TOKEN must be set to report a commit status");
        };

        let mut context = GitHubContext::new(owner, repo, sha, token, self.github_context);
        if let Some(url) = self.github_target_url {
            context = context.with_target_url(url);
        }
        if let Some(field) = context.missing_field() {
            bail!("commit status {field} must not be empty");
        }
        Ok(Some(context))
    }
}

pub async fn handle(args: RunArgs, config: &CliConfig, format: OutputFormat) -> Result<()> {
    let github = args.github.into_context(config::github_status_token())?;

    let tracker = Arc::new(config.open_tracker()?);
    tracker.prune_expired(config.retention);

    let api_url = env::github_api_url().unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string());
    let executor = JobExecutor::new(
        ExecutorDeps {
            tracker: Arc::clone(&tracker),
            processes: TokioProcessAdapter,
            status_api: ReqwestStatusApi::new(api_url)?,
        },
        ExecutorConfig::from_env(&config.state_dir),
    );

    let job = tracker.create_job(args.job_type, github)?;
    tracing::info!(job_id = %job.id, job_type = %job.job_type, "running job");
    let mut handle = executor.execute_job_async(job.job_type, &job.id, args.args);

    tokio::select! {
        joined = &mut handle => joined?,
        _ = tokio::signal::ctrl_c() => {
            // Only a job still waiting for the lock can be cancelled cleanly.
            let spawned = tracker
                .get_job(job.id.as_str())
                .is_some_and(|j| j.status == JobStatus::Running);
            if spawned {
                return Err(ExitError::new(
                    EXIT_INTERRUPTED,
                    format!("Interrupted while {} was running", job.id),
                )
                .into());
            }
            executor.cancel(job.id.as_str());
            handle.await?;
        }
    }

    let job = tracker
        .get_job(job.id.as_str())
        .ok_or_else(|| ExitError::job_not_found(job.id.as_str()))?;
    tracker.destroy();

    format_or_json(format, &job, || format_job_detail(&mut std::io::stdout(), &job, now_ms()))?;
    if job.status == JobStatus::Failed {
        return Err(ExitError::new(EXIT_JOB_FAILED, "").into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
