//! scenesync CLI - Command-line interface
//!
//! This binary drives the scenesync engine: a long-running mode fed with
//! positions on stdin, a one-shot sync around a single position, and
//! configuration management.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::run::RunArgs;
use commands::sync::SyncArgs;

#[derive(Parser)]
#[command(name = "scenesync")]
#[command(version, about = "Keep local scenery in sync around a moving position", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize continuously, reading `lat,lon` positions from stdin
    Run {
        /// Enable debug-level logging
        #[arg(long)]
        debug: bool,

        /// Do not prime airports and models after the worker starts
        #[arg(long)]
        no_bootstrap: bool,

        /// Milliseconds between status polls
        #[arg(long, default_value = "250")]
        poll_ms: u64,
    },

    /// Synchronize the areas around one position and exit
    Sync {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Give up after this many seconds
        #[arg(long, default_value = "600")]
        timeout: u64,

        /// Also prime airports and models
        #[arg(long)]
        bootstrap: bool,

        /// Enable debug-level logging
        #[arg(long)]
        debug: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            debug,
            no_bootstrap,
            poll_ms,
        } => commands::run::run(RunArgs {
            debug,
            no_bootstrap,
            poll_ms,
        }),
        Commands::Sync {
            lat,
            lon,
            timeout,
            bootstrap,
            debug,
        } => commands::sync::run(SyncArgs {
            lat,
            lon,
            timeout,
            bootstrap,
            debug,
        }),
        Commands::Config { command } => commands::config::run(command),
    };

    scenesync::transport::shutdown_client_context();

    if let Err(e) = result {
        e.exit();
    }
}
