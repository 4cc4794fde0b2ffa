// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters to the outside world: child processes and the commit-status API.

pub mod process;
pub mod status_api;

pub use process::{
    is_process_alive, CapturedOutput, ChildProcess, ProcessAdapter, ProcessError, ProcessExit,
    SpawnSpec, TokioProcessAdapter, MAX_CAPTURED_BYTES,
};
pub use status_api::{
    HttpResponse, ReqwestStatusApi, StatusApi, StatusBody, StatusRequest, TransportError,
    DEFAULT_GITHUB_API_URL,
};

#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeBehavior, FakeChildHandle, FakeProcessAdapter, SignalKind, SignalRecord};
#[cfg(any(test, feature = "test-support"))]
pub use status_api::{FakeStatusApi, StatusCall};
