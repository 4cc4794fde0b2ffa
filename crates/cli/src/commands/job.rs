// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `show`, `list` and `clear-reported`.
//!
//! These read and write records straight through the store. They never open
//! a tracker, so they do not run restart recovery and are safe to use while
//! a `run` is in progress.

use anyhow::Result;
use clap::Args;
use docsync_core::{Job, JobFilter, JobStatus, JobType};
use docsync_storage::JobStore;

use crate::config::CliConfig;
use crate::exit_error::ExitError;
use crate::output::{
    format_job_detail, format_job_list, format_or_json, handle_list, now_ms, OutputFormat,
};

#[derive(Args)]
pub struct ListArgs {
    /// Only jobs in this status (pending, running, completed, failed)
    #[arg(long)]
    pub status: Option<JobStatus>,

    /// Only jobs of this type
    #[arg(long = "type")]
    pub job_type: Option<JobType>,
}

fn load_job(store: &JobStore, id: &str) -> Result<Job> {
    match store.load(id) {
        Ok(Some(job)) => Ok(job),
        // Ids that cannot name a record are just as unknown.
        Ok(None) | Err(docsync_storage::StoreError::InvalidId(_)) => {
            Err(ExitError::job_not_found(id).into())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn show(config: &CliConfig, id: &str, format: OutputFormat) -> Result<()> {
    let store = JobStore::open(config.jobs_dir())?;
    let job = load_job(&store, id)?;
    format_or_json(format, &job, || format_job_detail(&mut std::io::stdout(), &job, now_ms()))
}

pub fn list(config: &CliConfig, args: ListArgs, format: OutputFormat) -> Result<()> {
    let store = JobStore::open(config.jobs_dir())?;
    let filter = JobFilter { status: args.status, job_type: args.job_type };
    let jobs = filter.apply(store.load_all());

    handle_list(format, &jobs, |items, out| format_job_list(out, items, now_ms()))
}

pub fn clear_reported(config: &CliConfig, id: &str) -> Result<()> {
    let store = JobStore::open(config.jobs_dir())?;
    let mut job = load_job(&store, id)?;

    if !job.github_status_reported {
        println!("Job {} has no reported commit status", job.id);
        return Ok(());
    }
    job.github_status_reported = false;
    store.save(&job)?;
    tracing::info!(job_id = %job.id, "cleared reported flag");
    println!("Cleared reported flag for {}", job.id);
    Ok(())
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
