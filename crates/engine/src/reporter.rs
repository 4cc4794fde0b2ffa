// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commit-status reporting with retry.
//!
//! The status API is not idempotent and this reporter does no
//! deduplication; callers consult the tracker's reported flag first.

use std::time::Duration;

use docsync_adapters::{HttpResponse, StatusApi, StatusBody, StatusRequest, TransportError};
use docsync_core::{short, GitHubContext, JobType, StatusState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Retries after the first attempt for transient failures.
pub const MAX_STATUS_RETRIES: u32 = 3;

/// First backoff; doubles on each retry (1s, 2s, 4s).
pub const INITIAL_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// The API rejects longer descriptions.
pub const MAX_DESCRIPTION_CHARS: usize = 140;

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("invalid status context: {field} is empty")]
    InvalidContext { field: &'static str },
    #[error("status API rejected request ({status}): {message}")]
    Permanent { status: u16, message: String },
    #[error("status API still failing after {attempts} attempts (last status {status})")]
    Exhausted { status: u16, attempts: u32 },
    #[error("status API unreachable: {0}")]
    Network(#[from] TransportError),
}

impl StatusError {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StatusError::Exhausted { .. } | StatusError::Network(_))
    }
}

/// What the API returned for a created status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub id: Option<u64>,
    pub state: StatusState,
    #[serde(default)]
    pub context: Option<String>,
}

enum Classified {
    Created,
    Transient,
    Permanent,
}

/// A 403 counts as rate-limiting only when the API says so, either through
/// the remaining-quota header or in the message of a secondary limit.
fn is_rate_limited(response: &HttpResponse) -> bool {
    response.status == 403
        && (response.rate_limit_remaining == Some(0)
            || response.body.to_ascii_lowercase().contains("rate limit"))
}

fn classify(response: &HttpResponse) -> Classified {
    match response.status {
        200..=299 => Classified::Created,
        500..=599 => Classified::Transient,
        403 if is_rate_limited(response) => Classified::Transient,
        _ => Classified::Permanent,
    }
}

/// The API's own `message` field if present, otherwise a short prefix of
/// the body.
fn error_message(response: &HttpResponse) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        message: String,
    }
    match serde_json::from_str::<ApiError>(&response.body) {
        Ok(err) => err.message,
        Err(_) => short(response.body.trim(), 200).to_string(),
    }
}

fn truncate_description(description: &str) -> String {
    if description.chars().count() <= MAX_DESCRIPTION_CHARS {
        return description.to_string();
    }
    let mut truncated: String = description.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Description posted for a finished job, e.g. `Content fetch completed (in 12s)`.
pub fn completion_description(
    job_type: JobType,
    success: bool,
    duration: Option<Duration>,
) -> String {
    let outcome = if success { "completed" } else { "failed" };
    let mut description = format!("{} {}", job_type.command().label, outcome);
    if let Some(duration) = duration {
        description.push_str(&format!(" (in {})", format_duration(duration)));
    }
    description
}

/// Posts commit statuses through a [`StatusApi`].
#[derive(Clone)]
pub struct GitHubStatusReporter<S> {
    api: S,
}

impl<S: StatusApi> GitHubStatusReporter<S> {
    pub fn new(api: S) -> Self {
        Self { api }
    }

    /// Post one status, retrying transient failures.
    ///
    /// 5xx and rate-limited 403 responses are retried up to
    /// [`MAX_STATUS_RETRIES`] times with doubling backoff. Any other non-2xx
    /// response fails at once, as does a request that never got a response.
    pub async fn report_github_status(
        &self,
        context: &GitHubContext,
        state: StatusState,
        description: &str,
    ) -> Result<StatusPayload, StatusError> {
        if let Some(field) = context.missing_field() {
            return Err(StatusError::InvalidContext { field });
        }

        let request = StatusRequest {
            owner: context.owner.clone(),
            repo: context.repo.clone(),
            commit_sha: context.commit_sha.clone(),
            token: context.token.clone(),
            body: StatusBody {
                state,
                description: truncate_description(description),
                context: context.status_context.clone(),
                target_url: context.target_url.clone(),
            },
        };

        let mut backoff = INITIAL_RETRY_BACKOFF;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let response = self.api.post_status(&request).await?;

            match classify(&response) {
                Classified::Created => {
                    tracing::info!(
                        owner = %context.owner,
                        repo = %context.repo,
                        sha = short(&context.commit_sha, 7),
                        %state,
                        attempts,
                        "posted commit status"
                    );
                    return Ok(serde_json::from_str(&response.body).unwrap_or(StatusPayload {
                        id: None,
                        state,
                        context: Some(context.status_context.clone()),
                    }));
                }
                Classified::Permanent => {
                    return Err(StatusError::Permanent {
                        status: response.status,
                        message: error_message(&response),
                    });
                }
                Classified::Transient if attempts > MAX_STATUS_RETRIES => {
                    return Err(StatusError::Exhausted { status: response.status, attempts });
                }
                Classified::Transient => {
                    tracing::warn!(
                        status = response.status,
                        attempt = attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        "commit status request failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    /// Report a finished job. Never fails: every error is logged and
    /// becomes `None`, and has no bearing on the job itself.
    pub async fn report_job_completion(
        &self,
        context: &GitHubContext,
        success: bool,
        job_type: JobType,
        duration: Option<Duration>,
    ) -> Option<StatusPayload> {
        let state = if success { StatusState::Success } else { StatusState::Failure };
        let description = completion_description(job_type, success, duration);

        match self.report_github_status(context, state, &description).await {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(
                    owner = %context.owner,
                    repo = %context.repo,
                    %job_type,
                    transient = e.is_transient(),
                    error = %e,
                    "failed to report job completion"
                );
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "reporter_tests.rs"]
mod tests;
