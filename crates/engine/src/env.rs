// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.
//!
//! Parsing lives in pure `parse_*` functions over `Option<&str>`; the
//! accessors below only read the variable and delegate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use docsync_core::MAX_JOB_TIMEOUT;

/// Variables copied from the parent into every child process. Anything not
/// listed here never reaches a child, whatever its name.
pub const CHILD_ENV_ALLOWLIST: &[&str] = &[
    // content source and AI provider
    "NOTION_API_KEY",
    "NOTION_DATABASE_ID",
    "DATABASE_ID",
    "DATA_SOURCE_ID",
    "OPENAI_API_KEY",
    "OPENAI_MODEL",
    // app config
    "DEFAULT_DOCS_PAGE",
    "BASE_URL",
    "NODE_ENV",
    // debug and telemetry
    "DEBUG",
    "NOTION_PERF_LOG",
    "NOTION_PERF_OUTPUT",
    // runtime resolution
    "PATH",
    "HOME",
    "BUN_INSTALL",
    // locale
    "LANG",
    "LC_ALL",
    "LC_CTYPE",
];

/// Default retention for finished job records (7 days).
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(168 * 60 * 60);

/// Build a child environment from `parent`, keeping allow-listed names only.
pub fn build_child_env<I, K, V>(parent: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    parent
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .filter(|(k, _)| CHILD_ENV_ALLOWLIST.contains(&k.as_str()))
        .collect()
}

/// Strictly parse a timeout override in milliseconds.
///
/// Only a plain run of ASCII digits is accepted: signs, decimals, exponents
/// and words like `Infinity` are rejected with a warning, as is zero.
/// Values above [`MAX_JOB_TIMEOUT`] (including ones too large for `u64`)
/// are clamped to it with a warning. `None` means "use the job type's own
/// timeout".
pub fn parse_timeout_override(raw: Option<&str>) -> Option<Duration> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        tracing::warn!(value = raw, "ignoring invalid JOB_TIMEOUT_MS, using job type default");
        return None;
    }

    let max_ms = MAX_JOB_TIMEOUT.as_millis() as u64;
    let ms = match raw.parse::<u64>() {
        Ok(0) => {
            tracing::warn!(value = raw, "ignoring zero JOB_TIMEOUT_MS, using job type default");
            return None;
        }
        Ok(ms) => ms,
        // All digits, so the only failure left is overflow.
        Err(_) => u64::MAX,
    };
    if ms > max_ms {
        tracing::warn!(value = raw, max_ms, "JOB_TIMEOUT_MS exceeds maximum, clamping");
        return Some(MAX_JOB_TIMEOUT);
    }
    Some(Duration::from_millis(ms))
}

/// Parse a retention window in whole hours; malformed input falls back to
/// [`DEFAULT_RETENTION`].
pub fn parse_retention_hours(raw: Option<&str>) -> Duration {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_RETENTION;
    };
    match raw.parse::<u64>() {
        Ok(hours) => Duration::from_secs(hours.saturating_mul(60 * 60)),
        Err(_) => {
            tracing::warn!(value = raw, "ignoring invalid JOB_RETENTION_HOURS");
            DEFAULT_RETENTION
        }
    }
}

/// Timeout override from `JOB_TIMEOUT_MS`
pub fn timeout_override() -> Option<Duration> {
    parse_timeout_override(std::env::var("JOB_TIMEOUT_MS").ok().as_deref())
}

/// Retention window from `JOB_RETENTION_HOURS` (default 7 days)
pub fn retention() -> Duration {
    parse_retention_hours(std::env::var("JOB_RETENTION_HOURS").ok().as_deref())
}

/// Resolve state directory:
/// DOCSYNC_STATE_DIR > XDG_STATE_HOME/docsync > platform state dir > ~/.local/state/docsync
pub fn state_dir() -> Option<PathBuf> {
    if let Some(dir) = non_empty_var("DOCSYNC_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Some(xdg) = non_empty_var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("docsync"));
    }
    if let Some(dir) = dirs::state_dir() {
        return Some(dir.join("docsync"));
    }
    non_empty_var("HOME").map(|home| PathBuf::from(home).join(".local/state/docsync"))
}

/// Working directory of every child: DOCSYNC_CONTENT_DIR, else the current
/// directory.
pub fn content_dir() -> PathBuf {
    non_empty_var("DOCSYNC_CONTENT_DIR")
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Repository lock file: DOCSYNC_LOCK_PATH, else `<content_dir>/.docsync.lock`
pub fn lock_path(content_dir: &Path) -> PathBuf {
    non_empty_var("DOCSYNC_LOCK_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| content_dir.join(".docsync.lock"))
}

/// Commit-status API base URL (GitHub Enterprise override)
pub fn github_api_url() -> Option<String> {
    non_empty_var("GITHUB_API_URL")
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
