//! In-process transport backed by the shared client context.
//!
//! Mirrors a remote directory described by `.dirindex` listings into the
//! local scenery tree. A missing top-level listing means the remote subtree
//! does not exist (normal for ocean), which is reported as absent. Any other
//! failure is logged by the worker; before returning it the transport removes
//! partial downloads from the destination.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::dirindex::DirIndex;
use super::{local_path, remote_url, SyncOutcome, SyncTransport, TransportError};

/// Name of the listing file fetched for every directory.
pub const DIRINDEX_FILE: &str = ".dirindex";

/// Suffix of files still being downloaded.
const PARTIAL_SUFFIX: &str = ".part";

/// Source of remote bytes. `Ok(None)` means the resource does not exist.
pub trait RemoteSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, TransportError>;
}

/// Sync through the in-process client.
pub struct BuiltinTransport {
    source: Arc<dyn RemoteSource>,
    server: String,
    local_root: PathBuf,
}

impl BuiltinTransport {
    /// Create a transport fetching from `server` through `source`.
    pub fn new(
        source: Arc<dyn RemoteSource>,
        server: impl Into<String>,
        local_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            server: server.into(),
            local_root: local_root.into(),
        }
    }

    fn fetch_index(&self, dir: &str) -> Result<Option<DirIndex>, TransportError> {
        let url = format!("{}/{}", remote_url(&self.server, dir), DIRINDEX_FILE);
        match self.source.fetch(&url)? {
            None => Ok(None),
            Some(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                DirIndex::parse(dir, &text).map(Some)
            }
        }
    }

    fn mirror_dir(&self, dir: &str, index: &DirIndex) -> Result<(), TransportError> {
        let target = local_path(&self.local_root, dir);
        fs::create_dir_all(&target).map_err(|e| TransportError::io(&target, e))?;

        for file in &index.files {
            let path = target.join(&file.name);
            if is_current(&path, file.size) {
                continue;
            }

            let url = format!("{}/{}", remote_url(&self.server, dir), file.name);
            let bytes = self.source.fetch(&url)?.ok_or_else(|| TransportError::Http {
                url: url.clone(),
                reason: "listed file is missing on the server".to_string(),
            })?;

            let partial = target.join(format!("{}{}", file.name, PARTIAL_SUFFIX));
            fs::write(&partial, &bytes).map_err(|e| TransportError::io(&partial, e))?;
            fs::rename(&partial, &path).map_err(|e| TransportError::io(&path, e))?;
            debug!(file = %path.display(), bytes = bytes.len(), "Fetched scenery file");
        }

        for child in &index.dirs {
            let child_dir = format!("{}/{}", dir.trim_end_matches('/'), child);
            let child_index = self.fetch_index(&child_dir)?.ok_or_else(|| {
                TransportError::InvalidListing {
                    dir: child_dir.clone(),
                    reason: "listed subdirectory has no index".to_string(),
                }
            })?;
            self.mirror_dir(&child_dir, &child_index)?;
        }

        Ok(())
    }

    /// Remove partial downloads left under `dir`. Best effort.
    fn cleanup(&self, dir: &str) -> bool {
        let target = local_path(&self.local_root, dir);
        match remove_partials(&target) {
            Ok(removed) => {
                info!(dir, removed, "Cleanup after failed sync successful");
                true
            }
            Err(e) => {
                warn!(dir, error = %e, "Cleanup after failed sync failed");
                false
            }
        }
    }
}

impl SyncTransport for BuiltinTransport {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn sync(&self, dir: &str) -> Result<SyncOutcome, TransportError> {
        let index = match self.fetch_index(dir)? {
            Some(index) => index,
            None => return Ok(SyncOutcome::RemoteAbsent),
        };

        match self.mirror_dir(dir, &index) {
            Ok(()) => Ok(SyncOutcome::Updated),
            Err(e) => {
                self.cleanup(dir);
                Err(e)
            }
        }
    }
}

fn is_current(path: &Path, size: u64) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() == size)
        .unwrap_or(false)
}

fn remove_partials(dir: &Path) -> std::io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            removed += remove_partials(&path)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(PARTIAL_SUFFIX))
        {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    const SERVER: &str = "http://mirror.test/scenery";

    /// In-memory remote keyed by URL.
    #[derive(Default)]
    struct FakeRemote {
        resources: HashMap<String, Vec<u8>>,
        fail_urls: Vec<String>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeRemote {
        fn with(mut self, path: &str, body: &str) -> Self {
            self.resources
                .insert(format!("{}/{}", SERVER, path), body.as_bytes().to_vec());
            self
        }

        fn failing(mut self, path: &str) -> Self {
            self.fail_urls.push(format!("{}/{}", SERVER, path));
            self
        }
    }

    impl RemoteSource for FakeRemote {
        fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, TransportError> {
            self.fetched.lock().push(url.to_string());
            if self.fail_urls.iter().any(|u| u == url) {
                return Err(TransportError::Http {
                    url: url.to_string(),
                    reason: "HTTP 500".to_string(),
                });
            }
            Ok(self.resources.get(url).cloned())
        }
    }

    fn transport(remote: FakeRemote, root: &Path) -> (BuiltinTransport, Arc<FakeRemote>) {
        let remote = Arc::new(remote);
        let source: Arc<dyn RemoteSource> = remote.clone();
        (BuiltinTransport::new(source, SERVER, root), remote)
    }

    #[test]
    fn test_missing_listing_is_absent() {
        let temp = tempfile::TempDir::new().unwrap();
        let (transport, _) = transport(FakeRemote::default(), temp.path());

        let outcome = transport.sync("Terrain/w030s40/w025s35").unwrap();
        assert_eq!(outcome, SyncOutcome::RemoteAbsent);
    }

    #[test]
    fn test_mirrors_files_and_subdirectories() {
        let temp = tempfile::TempDir::new().unwrap();
        let remote = FakeRemote::default()
            .with("Terrain/e000n50/.dirindex", "version:1\nd:e008n53:h1\n")
            .with(
                "Terrain/e000n50/e008n53/.dirindex",
                "version:1\nf:3088961.stg:h2:5\n",
            )
            .with("Terrain/e000n50/e008n53/3088961.stg", "12345");
        let (transport, _) = transport(remote, temp.path());

        assert_eq!(
            transport.sync("Terrain/e000n50").unwrap(),
            SyncOutcome::Updated
        );
        let file = temp.path().join("Terrain/e000n50/e008n53/3088961.stg");
        assert_eq!(fs::read(file).unwrap(), b"12345");
    }

    #[test]
    fn test_current_files_are_not_refetched() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("Models");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("tower.ac"), b"abc").unwrap();

        let remote = FakeRemote::default()
            .with("Models/.dirindex", "f:tower.ac:h:3\n")
            .with("Models/tower.ac", "xyz");
        let (transport, remote) = transport(remote, temp.path());

        transport.sync("Models").unwrap();
        assert_eq!(fs::read(dir.join("tower.ac")).unwrap(), b"abc");
        assert_eq!(remote.fetched.lock().len(), 1);
    }

    #[test]
    fn test_failure_cleans_partial_downloads() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("Models");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stale.ac.part"), b"half").unwrap();

        let remote = FakeRemote::default()
            .with("Models/.dirindex", "f:tower.ac:h:3\n")
            .failing("Models/tower.ac");
        let (transport, _) = transport(remote, temp.path());

        assert!(matches!(
            transport.sync("Models"),
            Err(TransportError::Http { .. })
        ));
        assert!(!dir.join("stale.ac.part").exists());
    }

    #[test]
    fn test_listing_server_error_is_failure() {
        let temp = tempfile::TempDir::new().unwrap();
        let remote = FakeRemote::default().failing("Models/.dirindex");
        let (transport, _) = transport(remote, temp.path());

        assert!(transport.sync("Models").is_err());
    }
}
