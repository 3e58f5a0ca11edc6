// kakusu/src/commands/mod.rs
//! One module per subcommand.

pub mod categories;
pub mod decode;
pub mod mask;
