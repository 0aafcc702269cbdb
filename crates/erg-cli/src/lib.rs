//! Rowing log importer CLI library.
//!
//! This crate provides the CLI interface and the import orchestration.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
