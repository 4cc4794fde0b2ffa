// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use clap::ValueEnum;
use docsync_core::{Job, JobId};
use serde::Serialize;

use crate::color;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Compact elapsed time: "45s", "2m", "3h", "4d".
pub fn format_elapsed(secs: u64) -> String {
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m", secs / 60),
        3600..=86_399 => format!("{}h", secs / 3600),
        _ => format!("{}d", secs / 86_400),
    }
}

/// Format a timestamp relative to `now_ms`, e.g. "5m ago"
pub fn format_time_ago(epoch_ms: u64, now_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    format!("{} ago", format_elapsed(now_ms.saturating_sub(epoch_ms) / 1000))
}

/// Run time of a finished job, "-" while it has none.
pub fn format_run_time(duration_ms: Option<u64>) -> String {
    let Some(ms) = duration_ms else {
        return "-".to_string();
    };
    let secs = ms / 1000;
    if secs < 60 {
        format!("{}.{}s", secs, (ms % 1000) / 100)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

pub fn format_job_list(out: &mut (impl Write + ?Sized), jobs: &[Job], now_ms: u64) {
    if jobs.is_empty() {
        let _ = writeln!(out, "No jobs");
        return;
    }

    let type_width = jobs.iter().map(|j| j.job_type.to_string().len()).max().unwrap_or(4).max(4);
    let _ = writeln!(
        out,
        "{:<23}  {:<type_width$}  {:<9}  {:<8}  {:<8}  REPORTED",
        "ID", "TYPE", "STATUS", "CREATED", "TIME"
    );
    for job in jobs {
        let reported = match (&job.github, job.github_status_reported) {
            (None, _) => "-",
            (Some(_), true) => "yes",
            (Some(_), false) => "no",
        };
        let _ = writeln!(
            out,
            "{:<23}  {:<type_width$}  {:<9}  {:<8}  {:<8}  {}",
            job.id.as_str(),
            job.job_type.to_string(),
            job.status.to_string(),
            format_time_ago(job.created_at_ms, now_ms),
            format_run_time(job.duration_ms()),
            reported
        );
    }
}

/// Human-readable detail view for `show` and `run`.
pub fn format_job_detail(out: &mut (impl Write + ?Sized), job: &Job, now_ms: u64) {
    let _ = writeln!(out, "{} {}", color::header("Job:"), job.id);
    let _ = writeln!(out, "  {} {}", color::context("Type:"), job.job_type);
    let _ = writeln!(out, "  {} {}", color::context("Status:"), color::status(job.status));
    let _ = writeln!(
        out,
        "  {} {}",
        color::context("Created:"),
        format_time_ago(job.created_at_ms, now_ms)
    );
    if job.finished_at_ms.is_some() {
        let _ = writeln!(
            out,
            "  {} {}",
            color::context("Run time:"),
            format_run_time(job.duration_ms())
        );
    }
    if let Some(github) = &job.github {
        let _ = writeln!(
            out,
            "  {} {}/{}@{} ({}, {})",
            color::context("Commit status:"),
            github.owner,
            github.repo,
            docsync_core::short(&github.commit_sha, 12),
            github.status_context,
            if job.github_status_reported { "reported" } else { "not reported" }
        );
    }
    if let Some(error) = &job.result.error {
        let _ = writeln!(out);
        let _ = writeln!(out, "  {} {}", color::context("Error:"), error);
    }
    if let Some(output) = job.result.output.as_deref().filter(|o| !o.trim().is_empty()) {
        let _ = writeln!(out);
        let _ = writeln!(out, "  {}", color::header("Output:"));
        for line in output.trim_end().lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
}

/// Render a list as text or JSON.
pub fn handle_list<T: Serialize>(
    format: OutputFormat,
    items: &[T],
    render_text: impl FnOnce(&[T], &mut dyn Write),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Text => render_text(items, &mut std::io::stdout()),
    }
    Ok(())
}

/// Format-branch helper for single-item commands.
pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => text_fn(),
    }
    Ok(())
}

pub fn print_prune_results(
    pruned: &[JobId],
    retention_hours: u64,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for id in pruned {
                println!("Pruned {id}");
            }
            println!(
                "{} job(s) pruned (finished more than {}h ago)",
                pruned.len(),
                retention_hours
            );
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "pruned": pruned,
                "retention_hours": retention_hours,
            });
            println!("{}", serde_json::to_string_pretty(&obj)?);
        }
    }
    Ok(())
}
