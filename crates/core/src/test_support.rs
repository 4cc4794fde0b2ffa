// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{GitHubContext, Job, JobId, JobType, SystemClock};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::job::JobStatus;
    use crate::job_type::JobType;
    use proptest::prelude::*;

    pub fn arb_job_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Pending),
            Just(JobStatus::Running),
            Just(JobStatus::Completed),
            Just(JobStatus::Failed),
        ]
    }

    pub fn arb_job_type() -> impl Strategy<Value = JobType> {
        proptest::sample::select(JobType::ALL.to_vec())
    }
}

// ── Factories ───────────────────────────────────────────────────────────

/// A context with every field populated, token included.
pub fn github_context() -> GitHubContext {
    GitHubContext::new("acme", "docs", "4f2c1a9e", "test-token", "docsync/test")
}

/// A pending job with a fixed id.
pub fn pending_job(id: &str, job_type: JobType) -> Job {
    Job::new(JobId::from(id), job_type, None, &SystemClock)
}
