// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `docsync-jobs job-types` - print the command table

use std::io::Write;

use anyhow::Result;
use docsync_core::JobType;
use serde::Serialize;

use crate::output::{handle_list, OutputFormat};

#[derive(Debug, Serialize)]
pub(crate) struct JobTypeRow {
    pub job_type: JobType,
    pub command: String,
    pub timeout_ms: u64,
    pub mutates_content: bool,
}

pub(crate) fn rows() -> Vec<JobTypeRow> {
    JobType::ALL
        .iter()
        .map(|&job_type| {
            let command = job_type.command();
            JobTypeRow {
                job_type,
                command: std::iter::once(command.executable)
                    .chain(command.args.iter().copied())
                    .collect::<Vec<_>>()
                    .join(" "),
                timeout_ms: command.timeout_ms,
                mutates_content: command.mutates_content,
            }
        })
        .collect()
}

pub(crate) fn format_rows(out: &mut (impl Write + ?Sized), rows: &[JobTypeRow]) {
    let _ = writeln!(out, "{:<26} {:<8} {:<6} COMMAND", "TYPE", "TIMEOUT", "LOCK");
    for row in rows {
        let _ = writeln!(
            out,
            "{:<26} {:<8} {:<6} {}",
            row.job_type.to_string(),
            format!("{}m", row.timeout_ms / 60_000),
            if row.mutates_content { "yes" } else { "no" },
            row.command
        );
    }
}

pub fn handle(format: OutputFormat) -> Result<()> {
    handle_list(format, &rows(), |items, out| format_rows(out, items))
}

#[cfg(test)]
#[path = "job_types_tests.rs"]
mod tests;
