use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use erg_cli::commands::util::millis_to_zulu;
use erg_cli::commands::{import, list};
use erg_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match &cli.command {
        Some(Commands::Import { input, replay }) => {
            if let Some(activity) = import::run(&config, input.as_deref(), *replay)? {
                println!(
                    "Imported activity starting {}: {} m in {} samples",
                    millis_to_zulu(activity.start_time_ms)?,
                    activity.distance_m(),
                    activity.samples.len()
                );
            }
        }
        Some(Commands::List { json }) => {
            if let Some(parent) = config.database_path.parent() {
                std::fs::create_dir_all(parent).context("failed to create database directory")?;
            }
            list::run(&mut io::stdout().lock(), &config, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
