// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job kinds and the static command table that backs them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const MINUTE_MS: u64 = 60 * 1000;

/// Hard ceiling for any job timeout, including operator overrides (2 hours).
pub const MAX_JOB_TIMEOUT: Duration = Duration::from_millis(120 * MINUTE_MS);

/// The fixed set of jobs the orchestrator knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    Fetch,
    FetchAll,
    Translate,
    CountPages,
    StatusDraft,
    StatusPublish,
    StatusPublishProduction,
    StatusTranslation,
}

crate::simple_display! {
    JobType {
        Fetch => "fetch",
        FetchAll => "fetch-all",
        Translate => "translate",
        CountPages => "count-pages",
        StatusDraft => "status-draft",
        StatusPublish => "status-publish",
        StatusPublishProduction => "status-publish-production",
        StatusTranslation => "status-translation",
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown job type: {0}")]
pub struct ParseJobTypeError(pub String);

impl FromStr for JobType {
    type Err = ParseJobTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobType::ALL
            .iter()
            .copied()
            .find(|t| t.to_string() == s)
            .ok_or_else(|| ParseJobTypeError(s.to_string()))
    }
}

/// How a job type is executed: the child process, its default timeout and
/// whether it writes to the shared content directory.
#[derive(Debug, PartialEq, Eq)]
pub struct JobCommand {
    pub executable: &'static str,
    /// Fixed leading arguments; caller-supplied arguments are appended.
    pub args: &'static [&'static str],
    pub timeout_ms: u64,
    /// Content-mutating jobs must hold the repository lock while they run.
    pub mutates_content: bool,
    /// Human-readable name used in commit-status descriptions.
    pub label: &'static str,
}

impl JobCommand {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Full argument vector: the fixed template followed by `extra`.
    pub fn argv(&self, extra: &[String]) -> Vec<String> {
        self.args.iter().map(|a| a.to_string()).chain(extra.iter().cloned()).collect()
    }
}

static FETCH: JobCommand = JobCommand {
    executable: "bun",
    args: &["scripts/notion-fetch/index.ts"],
    timeout_ms: 5 * MINUTE_MS,
    mutates_content: true,
    label: "Content fetch",
};

static FETCH_ALL: JobCommand = JobCommand {
    executable: "bun",
    args: &["scripts/notion-fetch-all/index.ts"],
    timeout_ms: 60 * MINUTE_MS,
    mutates_content: true,
    label: "Full content fetch",
};

static TRANSLATE: JobCommand = JobCommand {
    executable: "bun",
    args: &["scripts/notion-translate/index.ts"],
    timeout_ms: 30 * MINUTE_MS,
    mutates_content: true,
    label: "Translation",
};

static COUNT_PAGES: JobCommand = JobCommand {
    executable: "bun",
    args: &["scripts/notion-count-pages/index.ts"],
    timeout_ms: 5 * MINUTE_MS,
    mutates_content: false,
    label: "Page count",
};

static STATUS_DRAFT: JobCommand = JobCommand {
    executable: "bun",
    args: &["scripts/notion-status/index.ts", "--workflow", "draft"],
    timeout_ms: 5 * MINUTE_MS,
    mutates_content: false,
    label: "Draft status update",
};

static STATUS_PUBLISH: JobCommand = JobCommand {
    executable: "bun",
    args: &["scripts/notion-status/index.ts", "--workflow", "publish"],
    timeout_ms: 5 * MINUTE_MS,
    mutates_content: false,
    label: "Publish status update",
};

static STATUS_PUBLISH_PRODUCTION: JobCommand = JobCommand {
    executable: "bun",
    args: &["scripts/notion-status/index.ts", "--workflow", "publish-production"],
    timeout_ms: 5 * MINUTE_MS,
    mutates_content: false,
    label: "Production publish status update",
};

static STATUS_TRANSLATION: JobCommand = JobCommand {
    executable: "bun",
    args: &["scripts/notion-status/index.ts", "--workflow", "translation"],
    timeout_ms: 5 * MINUTE_MS,
    mutates_content: false,
    label: "Translation status update",
};

impl JobType {
    pub const ALL: [JobType; 8] = [
        JobType::Fetch,
        JobType::FetchAll,
        JobType::Translate,
        JobType::CountPages,
        JobType::StatusDraft,
        JobType::StatusPublish,
        JobType::StatusPublishProduction,
        JobType::StatusTranslation,
    ];

    /// The command-table entry for this job type.
    pub fn command(self) -> &'static JobCommand {
        match self {
            JobType::Fetch => &FETCH,
            JobType::FetchAll => &FETCH_ALL,
            JobType::Translate => &TRANSLATE,
            JobType::CountPages => &COUNT_PAGES,
            JobType::StatusDraft => &STATUS_DRAFT,
            JobType::StatusPublish => &STATUS_PUBLISH,
            JobType::StatusPublishProduction => &STATUS_PUBLISH_PRODUCTION,
            JobType::StatusTranslation => &STATUS_TRANSLATION,
        }
    }

    pub fn mutates_content(self) -> bool {
        self.command().mutates_content
    }

    pub fn default_timeout(self) -> Duration {
        self.command().timeout()
    }
}

#[cfg(test)]
#[path = "job_type_tests.rs"]
mod tests;
