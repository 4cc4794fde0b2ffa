// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commit-status context attached to a job.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where (and as whom) a job's outcome is reported as a commit status.
///
/// Immutable once attached to a job. The token is accepted on input but is
/// never serialized, so persisted job records do not carry credentials, and
/// `Debug` redacts it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubContext {
    pub owner: String,
    pub repo: String,
    pub commit_sha: String,
    #[serde(default, skip_serializing)]
    pub token: String,
    /// The status `context` label, e.g. `docsync/fetch`.
    pub status_context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
}

impl GitHubContext {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        commit_sha: impl Into<String>,
        token: impl Into<String>,
        status_context: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            commit_sha: commit_sha.into(),
            token: token.into(),
            status_context: status_context.into(),
            target_url: None,
        }
    }

    pub fn with_target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = Some(url.into());
        self
    }

    /// Name of the first required field that is empty, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("owner", &self.owner),
            ("repo", &self.repo),
            ("commit_sha", &self.commit_sha),
            ("token", &self.token),
            ("status_context", &self.status_context),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

impl fmt::Debug for GitHubContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubContext")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("commit_sha", &self.commit_sha)
            .field("token", &if self.token.is_empty() { "<none>" } else { "<redacted>" })
            .field("status_context", &self.status_context)
            .field("target_url", &self.target_url)
            .finish()
    }
}

/// Commit status states accepted by the status API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Pending,
    Success,
    Failure,
    Error,
}

crate::simple_display! {
    StatusState {
        Pending => "pending",
        Success => "success",
        Failure => "failure",
        Error => "error",
    }
}

#[cfg(test)]
#[path = "github_tests.rs"]
mod tests;
