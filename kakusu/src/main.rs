// kakusu/src/main.rs
//! kakusu entry point.
//!
//! Loads `.env`, initializes logging from `--debug` / `--quiet` / `RUST_LOG`, and
//! runs the selected command. Any error is printed once and exits with status 1.

use clap::Parser;
use is_terminal::IsTerminal;
use std::io;
use std::process::ExitCode;

use kakusu::cli::Cli;
use kakusu::logger;
use kakusu::ui::output_format;

fn main() -> ExitCode {
    // A missing .env file is the normal case.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.debug {
        Some(log::LevelFilter::Debug)
    } else if cli.quiet {
        Some(log::LevelFilter::Off)
    } else {
        None
    };
    logger::init_logger(level);

    match kakusu::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let supports_color = io::stderr().is_terminal();
            let _ = output_format::print_error_message(&mut io::stderr(), &format!("{:#}", e), supports_color);
            ExitCode::FAILURE
        }
    }
}
