// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! docsync-jobs: run and inspect docs-sync jobs

mod color;
mod commands;
mod config;
mod exit_error;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{job, job_types, prune, run};
use crate::config::CliConfig;
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "docsync-jobs",
    version,
    about = "Run docs-sync jobs and inspect their records",
    styles = color::styles()
)]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    /// Also write logs to a daily file under <state dir>/logs
    #[arg(long, global = true)]
    log_file: bool,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a job in the foreground and wait for it to finish
    Run(run::RunArgs),
    /// Show a single job
    Show {
        /// Job ID
        id: String,
    },
    /// List jobs, newest first
    List(job::ListArgs),
    /// Clear a job's reported flag so its commit status can be posted again
    ClearReported {
        /// Job ID
        id: String,
    },
    /// Remove finished jobs older than the retention window
    Prune(prune::PruneArgs),
    /// List the job types and how they run
    JobTypes,
}

fn main() {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        let _ = <Cli as clap::CommandFactory>::command().print_help();
        return;
    };

    if let Err(err) = run_command(command, cli.output, cli.log_file, cli.verbose) {
        if let Some(exit) = err.downcast_ref::<ExitError>() {
            if !exit.message.is_empty() {
                eprintln!("{}", exit.message);
            }
            std::process::exit(exit.code);
        }
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run_command(
    command: Commands,
    format: OutputFormat,
    log_file: bool,
    verbose: bool,
) -> Result<()> {
    let config = CliConfig::load()?;
    let log_dir = config.log_dir();
    let _guard = logging::init(log_file.then_some(log_dir.as_path()), verbose)?;

    match command {
        Commands::Run(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
            runtime.block_on(run::handle(args, &config, format))
        }
        Commands::Show { id } => job::show(&config, &id, format),
        Commands::List(args) => job::list(&config, args, format),
        Commands::ClearReported { id } => job::clear_reported(&config, &id),
        Commands::Prune(args) => prune::handle(&config, args, format),
        Commands::JobTypes => job_types::handle(format),
    }
}
