//! scenesync - background terrain scenery synchronization
//!
//! Keeps a local scenery directory in step with a remote repository while
//! an observer moves across the globe. Requests for the 1° areas around the
//! observer are served newest-first by a single background worker through
//! one of several interchangeable transports.
//!
//! # High-Level API
//!
//! The [`service`] module wires everything together:
//!
//! ```ignore
//! use scenesync::config::ConfigFile;
//! use scenesync::service::SyncOrchestrator;
//! use scenesync::sync::SyncConfig;
//!
//! let config = SyncConfig::from_config_file(&ConfigFile::load()?);
//! let mut orchestrator = SyncOrchestrator::new(config);
//! orchestrator.init()?;
//! orchestrator.schedule_location(53.6, 8.4);
//! ```

pub mod config;
pub mod logging;
pub mod prefetch;
pub mod service;
pub mod sync;
pub mod transport;

/// Version of the scenesync library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
