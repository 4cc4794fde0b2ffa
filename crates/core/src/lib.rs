// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! docsync-core: shared job model for the docsync job orchestrator

pub mod macros;

pub mod clock;
pub mod github;
pub mod id;
pub mod job;
pub mod job_type;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use github::{GitHubContext, StatusState};
pub use id::short;
pub use job::{Job, JobFilter, JobId, JobOwner, JobResult, JobStatus};
pub use job_type::{JobCommand, JobType, ParseJobTypeError, MAX_JOB_TIMEOUT};
