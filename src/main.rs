//! # graphsmith CLI
//!
//! This is the binary entry point for the `graphsmith` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Setting up logging from `--log-level` and `RUST_LOG`.
//! - Executing the appropriate command and reporting any failure as a single
//!   message with a non-zero exit code.
//!
//! The core logic lives in the `graphsmith` library crate; the binary is a
//! thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
