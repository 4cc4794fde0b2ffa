// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-based mutex over the shared content directory.
//!
//! The lock is the existence of a file. Whoever creates it with
//! `create_new` holds it; deleting it releases it. Nothing about the lock
//! lives in memory, so it holds across processes and across restarts.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Fixed wait between attempts while another holder has the lock.
pub const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum LockError {
    #[error("cancelled while waiting for repository lock")]
    Cancelled,
    #[error("failed to acquire repository lock at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

/// Acquire the lock at `path`, waiting out contention.
///
/// Only "already exists" counts as contention. Any other error from the
/// create (missing parent, permissions, read-only filesystem) fails at once.
/// `should_abort` is polled before every retry; once it returns true no
/// further attempt is made.
pub async fn acquire_repo_lock(
    path: impl Into<PathBuf>,
    should_abort: impl Fn() -> bool,
) -> Result<RepoLockGuard, LockError> {
    let path = path.into();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", std::process::id()) {
                    tracing::debug!(path = %path.display(), error = %e, "failed to write lock pid");
                }
                tracing::debug!(path = %path.display(), attempts, "acquired repository lock");
                return Ok(RepoLockGuard { path, file: Some(file) });
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if attempts == 1 {
                    tracing::info!(path = %path.display(), "repository lock held, waiting");
                }
                if should_abort() {
                    return Err(LockError::Cancelled);
                }
                tokio::time::sleep(LOCK_RETRY_INTERVAL).await;
                if should_abort() {
                    return Err(LockError::Cancelled);
                }
            }
            Err(source) => return Err(LockError::Io { path, source }),
        }
    }
}

/// A held repository lock. Released by [`release`](Self::release) or on drop.
#[derive(Debug)]
pub struct RepoLockGuard {
    path: PathBuf,
    file: Option<File>,
}

impl RepoLockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the handle and remove the lock file. A file someone else
    /// already removed is not an error.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        // Already released
        let Some(file) = self.file.take() else {
            return;
        };
        drop(file);
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "released repository lock"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove lock");
            }
        }
    }
}

impl Drop for RepoLockGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}

#[cfg(test)]
#[path = "repo_lock_tests.rs"]
mod tests;
