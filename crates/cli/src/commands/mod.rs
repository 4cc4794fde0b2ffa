// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod job;
pub mod job_types;
pub mod prune;
pub mod run;
