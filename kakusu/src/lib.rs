// kakusu/src/lib.rs
//! # kakusu CLI Application
//!
//! Command-line front end for `kakusu-core`: `mask` writes masked text and a
//! mapping, `decode` restores the original from them, `categories` lists the
//! category codes the masking filter understands.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
pub mod utils;

use anyhow::Result;

use crate::cli::{Cli, Commands};

/// Dispatches a parsed command line.
pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Mask(cmd) => commands::mask::run_mask(cmd, cli.quiet),
        Commands::Decode(cmd) => commands::decode::run_decode(cmd, cli.quiet),
        Commands::Categories => commands::categories::run_categories(),
    }
}
