// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport for the commit-status API.
//!
//! This layer only moves bytes: it returns whatever status code came back
//! and leaves retry and classification to the reporter.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use docsync_core::StatusState;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("docsync-jobs/", env!("CARGO_PKG_VERSION"));

/// Errors below HTTP: no response was received at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("request failed: {0}")]
    Request(String),
}

/// JSON body of a commit-status request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBody {
    pub state: StatusState,
    pub description: String,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
}

/// One commit-status POST.
#[derive(Clone, PartialEq, Eq)]
pub struct StatusRequest {
    pub owner: String,
    pub repo: String,
    pub commit_sha: String,
    pub token: String,
    pub body: StatusBody,
}

impl fmt::Debug for StatusRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusRequest")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("commit_sha", &self.commit_sha)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// The parts of an HTTP response the reporter classifies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Value of `x-ratelimit-remaining`, when present and numeric.
    pub rate_limit_remaining: Option<u64>,
    pub body: String,
}

/// Sends commit-status requests.
#[async_trait]
pub trait StatusApi: Clone + Send + Sync + 'static {
    async fn post_status(&self, request: &StatusRequest) -> Result<HttpResponse, TransportError>;
}

/// `reqwest` transport against GitHub (or a GitHub Enterprise base URL).
#[derive(Clone, Debug)]
pub struct ReqwestStatusApi {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestStatusApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn statuses_url(&self, request: &StatusRequest) -> String {
        format!(
            "{}/repos/{}/{}/statuses/{}",
            self.base_url, request.owner, request.repo, request.commit_sha
        )
    }
}

#[async_trait]
impl StatusApi for ReqwestStatusApi {
    async fn post_status(&self, request: &StatusRequest) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(self.statuses_url(request))
            .bearer_auth(&request.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(&request.body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let rate_limit_remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();

        Ok(HttpResponse { status, rate_limit_remaining, body })
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{HttpResponse, StatusApi, StatusRequest, TransportError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Recorded status request
    #[derive(Debug, Clone)]
    pub struct StatusCall {
        pub request: StatusRequest,
        pub at: Instant,
    }

    struct FakeStatusState {
        script: VecDeque<Result<HttpResponse, String>>,
        calls: Vec<StatusCall>,
        latency: Duration,
    }

    /// Fake status API for testing.
    ///
    /// Returns scripted responses in order, then `201 Created` for every
    /// further call.
    #[derive(Clone)]
    pub struct FakeStatusApi {
        inner: Arc<Mutex<FakeStatusState>>,
    }

    impl Default for FakeStatusApi {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeStatusState {
                    script: VecDeque::new(),
                    calls: Vec::new(),
                    latency: Duration::ZERO,
                })),
            }
        }
    }

    impl FakeStatusApi {
        pub fn new() -> Self {
            Self::default()
        }

        /// Delay every response by `latency` (tokio time).
        pub fn with_latency(self, latency: Duration) -> Self {
            self.inner.lock().latency = latency;
            self
        }

        /// Queue an HTTP response.
        pub fn respond(&self, status: u16, body: &str) -> &Self {
            self.respond_with(HttpResponse {
                status,
                rate_limit_remaining: None,
                body: body.to_string(),
            })
        }

        pub fn respond_with(&self, response: HttpResponse) -> &Self {
            self.inner.lock().script.push_back(Ok(response));
            self
        }

        /// Queue a transport failure.
        pub fn fail_network(&self, message: &str) -> &Self {
            self.inner.lock().script.push_back(Err(message.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<StatusCall> {
            self.inner.lock().calls.clone()
        }

        pub fn call_count(&self) -> usize {
            self.inner.lock().calls.len()
        }
    }

    #[async_trait]
    impl StatusApi for FakeStatusApi {
        async fn post_status(
            &self,
            request: &StatusRequest,
        ) -> Result<HttpResponse, TransportError> {
            let (next, latency) = {
                let mut state = self.inner.lock();
                state.calls.push(StatusCall { request: request.clone(), at: Instant::now() });
                (state.script.pop_front(), state.latency)
            };
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            match next {
                Some(Ok(response)) => Ok(response),
                Some(Err(message)) => Err(TransportError::Request(message)),
                None => Ok(HttpResponse {
                    status: 201,
                    rate_limit_remaining: None,
                    body: r#"{"id":1,"state":"success"}"#.to_string(),
                }),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeStatusApi, StatusCall};

#[cfg(test)]
#[path = "status_api_tests.rs"]
mod tests;
