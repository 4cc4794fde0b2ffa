// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only logger for per-job diagnostic logs.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only logger for per-job diagnostic logs.
///
/// Writes human-readable timestamped lines to:
///   `<log_dir>/job/<job_id>.log`
///
/// This is where raw child output and failure detail go; the job record
/// itself only ever carries a generic error message.
#[derive(Debug, Clone)]
pub struct JobLogger {
    log_dir: PathBuf,
}

impl JobLogger {
    pub fn new(log_dir: PathBuf) -> Self {
        Self { log_dir }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn log_path(&self, job_id: &str) -> PathBuf {
        self.log_dir.join("job").join(format!("{job_id}.log"))
    }

    /// Append a log line for the given job.
    ///
    /// Format: `2026-01-30T08:14:09Z [step] message`
    ///
    /// Failures are logged via tracing but do not propagate.
    pub fn append(&self, job_id: &str, step: &str, message: &str) {
        if let Err(e) = self.write_line(job_id, step, message) {
            tracing::warn!(job_id, error = %e, "failed to write job log");
        }
    }

    /// Append a fenced block, e.g. a captured output stream. Empty content
    /// is skipped.
    pub fn append_fenced(&self, job_id: &str, step: &str, label: &str, content: &str) {
        if content.is_empty() {
            return;
        }
        if let Err(e) = self.write_fenced(job_id, step, label, content) {
            tracing::warn!(job_id, error = %e, "failed to write job log");
        }
    }

    fn open(&self, job_id: &str) -> std::io::Result<fs::File> {
        let path = self.log_path(job_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn write_line(&self, job_id: &str, step: &str, message: &str) -> std::io::Result<()> {
        let mut file = self.open(job_id)?;
        writeln!(file, "{} [{}] {}", format_utc_now(), step, message)
    }

    fn write_fenced(
        &self,
        job_id: &str,
        step: &str,
        label: &str,
        content: &str,
    ) -> std::io::Result<()> {
        let mut file = self.open(job_id)?;
        writeln!(file, "{} [{}] ```{}", format_utc_now(), step, label)?;
        write!(file, "{}", content)?;
        if !content.ends_with('\n') {
            writeln!(file)?;
        }
        writeln!(file, "{} [{}] ```", format_utc_now(), step)
    }
}

fn format_utc_now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
#[path = "job_logger_tests.rs"]
mod tests;
