//! Bulk-mirror transport built on rsync.
//!
//! Archive semantics: local files that vanished remotely are deleted and
//! permissions are preserved.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use super::command::run_to_completion;
use super::{local_path, remote_url, SyncOutcome, SyncTransport, TransportError};

/// Options passed to rsync before source and destination.
pub const RSYNC_OPTIONS: &[&str] = &[
    "--verbose",
    "--archive",
    "--delete",
    "--perms",
    "--owner",
    "--group",
];

/// Sync by mirroring the remote directory with rsync.
#[derive(Debug, Clone)]
pub struct MirrorTransport {
    program: PathBuf,
    server: String,
    local_root: PathBuf,
}

impl MirrorTransport {
    /// Create a transport mirroring from `server` using the `rsync` on PATH.
    pub fn new(server: impl Into<String>, local_root: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("rsync"),
            server: server.into(),
            local_root: local_root.into(),
        }
    }

    /// Use a specific rsync binary.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Build the mirror command for `dir`.
    pub fn command(&self, dir: &str) -> Command {
        let source = format!("{}/", remote_url(&self.server, dir));
        let mut destination = OsString::from(local_path(&self.local_root, dir));
        destination.push("/");

        let mut command = Command::new(&self.program);
        command.args(RSYNC_OPTIONS).arg(source).arg(destination);
        command
    }
}

impl SyncTransport for MirrorTransport {
    fn name(&self) -> &'static str {
        "rsync"
    }

    fn sync(&self, dir: &str) -> Result<SyncOutcome, TransportError> {
        run_to_completion(self.command(dir), is_missing_remote)
    }
}

/// rsync reports a missing source directory with the OS error text.
fn is_missing_remote(stderr: &str) -> bool {
    stderr.contains("No such file or directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_uses_archive_options_and_trailing_slashes() {
        let transport = MirrorTransport::new("rsync://example.org/scenery", "/scenery");
        let command = transport.command("Objects/e000n50/e008n53");
        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(command.get_program(), "rsync");
        assert_eq!(&args[..RSYNC_OPTIONS.len()], RSYNC_OPTIONS);
        assert_eq!(
            args[RSYNC_OPTIONS.len()],
            "rsync://example.org/scenery/Objects/e000n50/e008n53/"
        );
        assert!(args[RSYNC_OPTIONS.len() + 1].ends_with("e008n53/"));
    }

    #[test]
    fn test_missing_source_is_absent() {
        assert!(is_missing_remote(
            "rsync: change_dir \"/Terrain/w020s10\" (in scenery) failed: No such file or directory (2)"
        ));
        assert!(!is_missing_remote("rsync: connection unexpectedly closed"));
    }

    #[cfg(unix)]
    #[test]
    fn test_custom_program() {
        let transport = MirrorTransport::new("rsync://x", "/tmp").with_program("true");
        assert_eq!(transport.sync("Models").unwrap(), SyncOutcome::Updated);
    }
}
