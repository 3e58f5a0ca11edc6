// kakusu/src/ui/mod.rs
//! Terminal output: status messages and the masking summary.

pub mod output_format;
pub mod summary;
