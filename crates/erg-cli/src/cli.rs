//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Rowing monitor log importer.
///
/// Replays raw monitor logs into workout activities, stores them in a local
/// database and archives the raw log alongside.
#[derive(Debug, Parser)]
#[command(name = "erg", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import a raw monitor log into the database.
    Import {
        /// Raw log to import.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Replay the log at the pace it was originally recorded.
        #[arg(long)]
        replay: bool,
    },

    /// List imported activities.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
