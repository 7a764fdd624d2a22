//! Interchangeable strategies for synchronizing one scenery directory.
//!
//! A [`SyncTransport`] is selected once when the worker starts and is then
//! called from the worker thread for every directory that needs syncing.
//!
//! # Variants
//!
//! | Kind       | Type                       | Remote endpoint        |
//! |------------|----------------------------|------------------------|
//! | `builtin`  | [`BuiltinTransport`]       | `svn_server`           |
//! | `external` | [`ExternalCommandTransport`] | `svn_server` + tool  |
//! | `rsync`    | [`MirrorTransport`]        | `rsync_server`         |
//!
//! Every variant reports a remote subtree that legitimately does not exist
//! (sparse or oceanic regions) as [`SyncOutcome::RemoteAbsent`], never as an
//! error, so empty areas cannot stall the worker.

mod builtin;
mod command;
mod context;
mod dirindex;
mod mirror;

pub use builtin::{BuiltinTransport, RemoteSource};
pub use command::ExternalCommandTransport;
pub use context::{
    builtin_transport_available, client_context, shutdown_client_context, ClientContext,
};
pub use dirindex::{DirIndex, IndexedFile};
pub use mirror::MirrorTransport;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::sync::{SyncConfig, SyncError};

/// Result of a successful transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The local directory now mirrors the remote one.
    Updated,
    /// The remote directory does not exist; nothing to fetch.
    RemoteAbsent,
}

/// A single failed transport call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The external program could not be launched.
    #[error("failed to launch '{program}': {source}")]
    Spawn { program: String, source: io::Error },

    /// The external program exited unsuccessfully.
    #[error("'{program}' exited with {status}: {stderr}")]
    ExitStatus {
        program: String,
        status: String,
        stderr: String,
    },

    /// An HTTP request failed.
    #[error("request for {url} failed: {reason}")]
    Http { url: String, reason: String },

    /// The remote directory listing could not be understood.
    #[error("invalid listing for '{dir}': {reason}")]
    InvalidListing { dir: String, reason: String },

    /// A local filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The transport panicked; caught on the worker thread.
    #[error("transport panicked: {0}")]
    Panicked(String),
}

impl TransportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TransportError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Capability to synchronize one directory relative to the scenery root.
///
/// Implementations are called from a single worker thread and may block for
/// as long as the sync takes; they are never interrupted.
pub trait SyncTransport: Send {
    /// Short name for log messages.
    fn name(&self) -> &'static str;

    /// Bring `dir` (relative, `/`-separated) up to date with the remote.
    fn sync(&self, dir: &str) -> Result<SyncOutcome, TransportError>;
}

impl<T: SyncTransport + ?Sized> SyncTransport for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn sync(&self, dir: &str) -> Result<SyncOutcome, TransportError> {
        (**self).sync(dir)
    }
}

/// Which transport a worker uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// In-process client with a process-wide context.
    #[default]
    Builtin,
    /// External version-control command-line tool.
    External,
    /// Bulk mirroring utility (rsync).
    Mirror,
}

impl TransportKind {
    /// Name used in the configuration file.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Builtin => "builtin",
            TransportKind::External => "external",
            TransportKind::Mirror => "rsync",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "builtin" | "built-in" => Ok(TransportKind::Builtin),
            "external" | "svn" => Ok(TransportKind::External),
            "rsync" | "mirror" => Ok(TransportKind::Mirror),
            other => Err(format!(
                "unknown transport '{}', expected builtin, external or rsync",
                other
            )),
        }
    }
}

/// Build the transport selected by `config`, checking its endpoint.
pub fn from_config(config: &SyncConfig) -> Result<Box<dyn SyncTransport>, SyncError> {
    let local_root = config.scenery_dir.clone().ok_or(SyncError::LocalDirUndefined)?;

    match config.transport {
        TransportKind::Builtin => {
            let server = required(&config.svn_server, "svn_server")?;
            let context = client_context().map_err(|e| SyncError::TransportInit(e.to_string()))?;
            Ok(Box::new(BuiltinTransport::new(context, server, local_root)))
        }
        TransportKind::External => {
            let server = required(&config.svn_server, "svn_server")?;
            let program = required(&config.ext_svn_utility, "ext_svn_utility")?;
            Ok(Box::new(ExternalCommandTransport::new(
                program, server, local_root,
            )))
        }
        TransportKind::Mirror => {
            let server = required(&config.rsync_server, "rsync_server")?;
            Ok(Box::new(MirrorTransport::new(server, local_root)))
        }
    }
}

fn required(value: &str, key: &'static str) -> Result<String, SyncError> {
    if value.is_empty() {
        Err(SyncError::EndpointUndefined(key))
    } else {
        Ok(value.to_string())
    }
}

/// Local path for a relative, `/`-separated directory.
pub fn local_path(root: &Path, dir: &str) -> PathBuf {
    dir.split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |path, part| path.join(part))
}

/// Remote URL for a relative directory below `server`.
pub(crate) fn remote_url(server: &str, dir: &str) -> String {
    format!("{}/{}", server.trim_end_matches('/'), dir.trim_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncConfig;

    #[test]
    fn test_transport_kind_parse_and_display() {
        assert_eq!("builtin".parse::<TransportKind>(), Ok(TransportKind::Builtin));
        assert_eq!("SVN".parse::<TransportKind>(), Ok(TransportKind::External));
        assert_eq!("rsync".parse::<TransportKind>(), Ok(TransportKind::Mirror));
        assert!("ftp".parse::<TransportKind>().is_err());
        assert_eq!(TransportKind::Mirror.to_string(), "rsync");
    }

    #[test]
    fn test_local_path_splits_components() {
        let path = local_path(Path::new("/scenery"), "Terrain/w020s10/w012s05");
        assert_eq!(
            path,
            Path::new("/scenery").join("Terrain").join("w020s10").join("w012s05")
        );
    }

    #[test]
    fn test_remote_url_joins_without_double_slash() {
        assert_eq!(
            remote_url("http://example.org/scenery/", "Models"),
            "http://example.org/scenery/Models"
        );
    }

    #[test]
    fn test_from_config_requires_mirror_endpoint() {
        let config = SyncConfig {
            transport: TransportKind::Mirror,
            scenery_dir: Some(PathBuf::from("/tmp/scenery")),
            ..SyncConfig::default()
        };
        match from_config(&config) {
            Err(SyncError::EndpointUndefined(key)) => assert_eq!(key, "rsync_server"),
            other => panic!("expected missing endpoint, got {:?}", other.map(|t| t.name())),
        }
    }

    #[test]
    fn test_from_config_requires_external_tool() {
        let config = SyncConfig {
            transport: TransportKind::External,
            svn_server: "http://example.org/scenery".to_string(),
            ext_svn_utility: String::new(),
            scenery_dir: Some(PathBuf::from("/tmp/scenery")),
            ..SyncConfig::default()
        };
        match from_config(&config) {
            Err(SyncError::EndpointUndefined(key)) => assert_eq!(key, "ext_svn_utility"),
            other => panic!("expected missing tool, got {:?}", other.map(|t| t.name())),
        }
    }

    #[test]
    fn test_from_config_builds_selected_transport() {
        let config = SyncConfig {
            transport: TransportKind::Mirror,
            rsync_server: "rsync://example.org/scenery".to_string(),
            scenery_dir: Some(PathBuf::from("/tmp/scenery")),
            ..SyncConfig::default()
        };
        let transport = from_config(&config).unwrap();
        assert_eq!(transport.name(), "rsync");
    }
}
