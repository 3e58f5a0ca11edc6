// kakusu/src/utils/mod.rs
//! Helpers shared by the CLI commands.

pub mod files;
