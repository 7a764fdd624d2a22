//! Service error types.

use crate::sync::SyncError;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that can occur during orchestrator operations.
#[derive(Debug)]
pub enum ServiceError {
    /// The worker refused to start
    Sync(SyncError),
    /// A freshly synced directory could not be scanned for tiles
    Scan { path: PathBuf, source: io::Error },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(e) => write!(f, "Cannot start scenery synchronization: {}", e),
            Self::Scan { path, source } => {
                write!(f, "Failed to scan '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sync(e) => Some(e),
            Self::Scan { source, .. } => Some(source),
        }
    }
}

impl From<SyncError> for ServiceError {
    fn from(e: SyncError) -> Self {
        Self::Sync(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_sync_error_display_and_source() {
        let err = ServiceError::from(SyncError::LocalDirUndefined);
        assert_eq!(
            err.to_string(),
            "Cannot start scenery synchronization: Local scenery directory is undefined"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_scan_error_names_path() {
        let err = ServiceError::Scan {
            path: PathBuf::from("/scenery/Terrain"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/scenery/Terrain"));
    }
}
