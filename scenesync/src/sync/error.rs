//! Errors reported synchronously by [`super::SyncWorker::start`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration problems that prevent the worker from starting.
///
/// These are never retried automatically; the caller must fix the
/// configuration and start again.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No local scenery directory was configured.
    #[error("Local scenery directory is undefined")]
    LocalDirUndefined,

    /// The configured local directory does not exist.
    #[error(
        "Directory '{}' does not exist. Set correct directory path or create directory folder",
        .0.display()
    )]
    LocalDirMissing(PathBuf),

    /// The configured local directory is the main scenery installation.
    #[error(
        "Directory '{}' contains the base package. Use a separate directory",
        .0.display()
    )]
    BasePackageDir(PathBuf),

    /// The selected transport has no remote endpoint configured.
    #[error("Remote endpoint '{0}' is undefined for the selected transport")]
    EndpointUndefined(&'static str),

    /// The transport could not be initialized.
    #[error("Failed to initialize transport: {0}")]
    TransportInit(String),

    /// `start()` was called while the worker is running.
    #[error("Sync worker is already running")]
    AlreadyRunning,

    /// The worker thread could not be spawned.
    #[error("Failed to spawn sync worker thread: {0}")]
    Spawn(#[source] io::Error),
}
