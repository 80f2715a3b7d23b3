// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0
//! Main entry point for the ectest-pkg CLI application.
//!
//! This module initializes the CLI, sets up tracing, and runs the specified
//! command against the INF files of the `ectest` driver package.

mod actions;
mod cli;
mod providers;
mod trace;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tracing::error;

/// Parses the command line, initializes tracing and runs the selected
/// subcommand. Errors are logged before they are returned, which makes the
/// process exit with a non-zero status.
fn main() -> Result<()> {
    let cli = Cli::parse();
    trace::init_tracing(cli.verbose);
    cli.run().inspect_err(|e| error!("{e:#}"))?;
    Ok(())
}
