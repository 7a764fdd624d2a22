//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (get, set, list, path, init)
//! - [`run`] - Continuous synchronization driven by stdin positions
//! - [`sync`] - One-shot synchronization around a single position

pub mod config;
pub mod run;
pub mod sync;

use scenesync::sync::StatusSnapshot;

/// Print the worker counters in the CLI's summary format.
pub fn print_summary(status: &StatusSnapshot) {
    println!("Synchronization {}", status.state);
    println!("  Synced:        {}", status.success_count);
    println!("  Failed:        {}", status.fail_count);
    println!("  Tiles updated: {}", status.updated_tile_count);
}
