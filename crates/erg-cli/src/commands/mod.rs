//! CLI subcommand implementations.

pub mod import;
pub mod list;
pub mod util;
