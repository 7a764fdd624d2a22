//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::io;
use std::process;

use scenesync::config::ConfigFileError;
use scenesync::service::ServiceError;
use scenesync::sync::SyncError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// The sync service could not start
    Service(ServiceError),
    /// Failed to build the async runtime or read input
    Io(io::Error),
    /// The worker stalled after repeated failures
    Stalled { failures: u32 },
    /// One-shot sync did not finish in time
    Timeout { seconds: u64, pending: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Service(ServiceError::Sync(
                SyncError::LocalDirUndefined | SyncError::LocalDirMissing(_),
            )) => {
                eprintln!();
                eprintln!("Set an existing scenery directory with:");
                eprintln!("  scenesync config set sync.scenery_dir <path>");
            }
            CliError::Service(ServiceError::Sync(SyncError::EndpointUndefined(key))) => {
                eprintln!();
                eprintln!("Set the remote endpoint with:");
                eprintln!("  scenesync config set sync.{} <value>", key);
            }
            CliError::Stalled { .. } => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. The remote server is unreachable or the address is wrong");
                eprintln!("  2. The external tool is not installed (sync.ext_svn_utility)");
                eprintln!("  3. The scenery directory is not writable");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Service(e) => write!(f, "{}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::Stalled { failures } => write!(
                f,
                "Scenery synchronization stalled after {} failed request(s)",
                failures
            ),
            CliError::Timeout { seconds, pending } => write!(
                f,
                "Synchronization did not finish within {}s ({} request(s) pending)",
                seconds, pending
            ),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Service(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
