//! External version-control tool transport.
//!
//! Runs `<tool> checkout -q <server>/<dir> <local>/<dir>` as a child process
//! and waits for it. Each argument is passed separately, so no shell quoting
//! is involved.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::{local_path, remote_url, SyncOutcome, SyncTransport, TransportError};

/// Markers the tool prints when the requested URL does not exist.
const MISSING_REMOTE_MARKERS: &[&str] = &[
    "E170000",
    "E160013",
    "doesn't exist",
    "path not found",
];

/// Sync through an external command-line client.
#[derive(Debug, Clone)]
pub struct ExternalCommandTransport {
    program: PathBuf,
    server: String,
    local_root: PathBuf,
}

impl ExternalCommandTransport {
    /// Create a transport invoking `program` against `server`.
    pub fn new(
        program: impl Into<PathBuf>,
        server: impl Into<String>,
        local_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            server: server.into(),
            local_root: local_root.into(),
        }
    }

    /// Tool being invoked.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the checkout command for `dir`.
    pub fn command(&self, dir: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("checkout")
            .arg("-q")
            .arg(remote_url(&self.server, dir))
            .arg(local_path(&self.local_root, dir));
        command
    }
}

impl SyncTransport for ExternalCommandTransport {
    fn name(&self) -> &'static str {
        "external"
    }

    fn sync(&self, dir: &str) -> Result<SyncOutcome, TransportError> {
        run_to_completion(self.command(dir), is_missing_remote)
    }
}

/// True if the tool's stderr says the remote path does not exist.
pub(super) fn is_missing_remote(stderr: &str) -> bool {
    MISSING_REMOTE_MARKERS
        .iter()
        .any(|marker| stderr.contains(marker))
}

/// Run `command`, mapping a nonzero exit to an error unless `absent` matches
/// its stderr.
pub(super) fn run_to_completion(
    mut command: Command,
    absent: fn(&str) -> bool,
) -> Result<SyncOutcome, TransportError> {
    let program = command.get_program().to_string_lossy().into_owned();
    debug!(command = ?command, "Running sync command");

    let output = command.output().map_err(|source| TransportError::Spawn {
        program: program.clone(),
        source,
    })?;

    if output.status.success() {
        return Ok(SyncOutcome::Updated);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if absent(&stderr) {
        return Ok(SyncOutcome::RemoteAbsent);
    }

    Err(TransportError::ExitStatus {
        program,
        status: output.status.to_string(),
        stderr: stderr.lines().last().unwrap_or_default().trim().to_string(),
    })
}
