// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `docsync-jobs prune` - delete expired job records

use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::config::CliConfig;
use crate::output::{print_prune_results, OutputFormat};

#[derive(Args)]
pub struct PruneArgs {
    /// Retention window in hours (default: JOB_RETENTION_HOURS, else 168)
    #[arg(long)]
    pub hours: Option<u64>,
}

pub fn handle(config: &CliConfig, args: PruneArgs, format: OutputFormat) -> Result<()> {
    let retention = match args.hours {
        Some(hours) => Duration::from_secs(hours.saturating_mul(3600)),
        None => config.retention,
    };

    let tracker = config.open_tracker()?;
    let pruned = tracker.prune_expired(retention);
    tracker.destroy();

    print_prune_results(&pruned, retention.as_secs() / 3600, format)
}
