// kakusu/src/logger.rs
//! Logger setup for the kakusu binary.
//!
//! `RUST_LOG` is honoured as usual (default `warn`). An explicit level, from
//! `--debug` or `--quiet`, overrides it for the kakusu crates.

use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// Initializes `env_logger` once; later calls are ignored.
pub fn init_logger(level_override: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    builder.format(|buf, record| {
        writeln!(buf, "[{} {}] {}", record.level(), record.target(), record.args())
    });

    if let Some(level) = level_override {
        builder.filter_module("kakusu", level);
        builder.filter_module("kakusu_core", level);
    }

    // A second initialization (e.g. from tests) is not an error worth reporting.
    let _ = builder.try_init();
}
