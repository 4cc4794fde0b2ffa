// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Handlers return `ExitError` through `anyhow` and `main()` turns it into
//! the exit status, so no command calls `std::process::exit()` itself.

use std::fmt;

/// The job ran and ended `failed`.
pub const EXIT_JOB_FAILED: i32 = 1;
/// The requested job does not exist.
pub const EXIT_NOT_FOUND: i32 = 2;
/// Interrupted while the job was already running.
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn job_not_found(job_id: &str) -> Self {
        Self::new(EXIT_NOT_FOUND, format!("Job not found: {job_id}"))
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExitError {}
