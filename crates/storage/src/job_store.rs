// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job record files.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use docsync_core::{Job, JobId, JobStatus};
use thiserror::Error;

const RECORD_EXT: &str = "json";
const TMP_SUFFIX: &str = ".tmp";

/// Errors that can occur in job store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("job id not usable as a file name: {0:?}")]
    InvalidId(String),
    #[error("job {job_id} is already {on_disk} on disk, refusing to record it as {attempted}")]
    TerminalConflict { job_id: JobId, on_disk: JobStatus, attempted: JobStatus },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io { path: path.to_path_buf(), source }
    }
}

/// Directory of `<job-id>.json` records, shared by every process using the
/// same state directory.
///
/// Each write goes to its own uniquely named `.<job-id>.*.tmp` file, is
/// synced, then renamed over the record, so a crash leaves either the
/// previous record or the new one and concurrent writers never share a temp
/// file.
#[derive(Debug, Clone)]
pub struct JobStore {
    dir: PathBuf,
}

impl JobStore {
    /// Open (creating if needed) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `job_id`.
    ///
    /// Ids are restricted to `[A-Za-z0-9_-]` so a record path can never
    /// escape the store directory.
    pub fn record_path(&self, job_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !job_id.is_empty()
            && job_id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !valid {
            return Err(StoreError::InvalidId(job_id.to_string()));
        }
        Ok(self.dir.join(format!("{job_id}.{RECORD_EXT}")))
    }

    /// Atomically replace the record for `job`.
    ///
    /// A record that is already terminal on disk only accepts writes with
    /// the same status; anything else is a [`StoreError::TerminalConflict`].
    /// An unreadable existing record is overwritten.
    pub fn save(&self, job: &Job) -> Result<(), StoreError> {
        let path = self.record_path(job.id.as_str())?;
        if let Some(on_disk) = read_status(&path) {
            if on_disk.is_terminal() && on_disk != job.status {
                return Err(StoreError::TerminalConflict {
                    job_id: job.id.clone(),
                    on_disk,
                    attempted: job.status,
                });
            }
        }
        let json = serde_json::to_vec_pretty(job)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}.", job.id))
            .suffix(TMP_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(|e| StoreError::io(&self.dir, e))?;
        tmp.write_all(&json)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| StoreError::io(&path, e.error))?;
        Ok(())
    }

    /// Load a single record, `None` if it does not exist.
    pub fn load(&self, job_id: &str) -> Result<Option<Job>, StoreError> {
        let path = self.record_path(job_id)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Delete the record for `job_id`; a missing record is not an error.
    pub fn remove(&self, job_id: &str) -> Result<(), StoreError> {
        let path = self.record_path(job_id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Read every record in the store.
    ///
    /// Corrupt or unreadable records are skipped with a warning. Temp files
    /// are never touched: they may belong to a write in progress.
    pub fn load_all(&self) -> Vec<Job> {
        let mut jobs = Vec::new();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "failed to read job store");
                return jobs;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            // Dotfiles are in-flight writes.
            if name.starts_with('.') {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }

            match fs::read(&path) {
                Ok(bytes) => match serde_json::from_slice::<Job>(&bytes) {
                    Ok(job) => jobs.push(job),
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "skipping corrupt job record"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read job record");
                }
            }
        }

        jobs
    }

    /// Delete temp files last modified at least `older_than` ago, left by
    /// writers that died between create and rename. Returns how many were
    /// removed.
    pub fn remove_stale_temp_files(&self, older_than: Duration) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        let now = SystemTime::now();
        let mut removed = 0;

        for entry in entries.flatten() {
            let path = entry.path();
            let is_temp = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.') && n.ends_with(TMP_SUFFIX));
            if !is_temp {
                continue;
            }
            let age = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| now.duration_since(modified).unwrap_or_default());
            match age {
                Ok(age) if age >= older_than => {}
                _ => continue,
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "removed stale job record temp file");
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove temp");
                }
            }
        }
        removed
    }
}

/// Status of the record at `path`, if it exists and parses.
fn read_status(path: &Path) -> Option<JobStatus> {
    #[derive(serde::Deserialize)]
    struct StatusOnly {
        status: JobStatus,
    }
    let bytes = fs::read(path).ok()?;
    serde_json::from_slice::<StatusOnly>(&bytes).ok().map(|r| r.status)
}

#[cfg(test)]
#[path = "job_store_tests.rs"]
mod tests;
