// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable job records for docsync.
//!
//! Each job is one JSON file under the store directory, replaced atomically on
//! every write. Independent files keep concurrent jobs from contending on a
//! shared log or snapshot.

mod job_store;

pub use job_store::{JobStore, StoreError};
