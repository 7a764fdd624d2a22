//! Directory synchronization requests.

use std::fmt;

/// A request to synchronize one directory below the local scenery root.
///
/// Requests are immutable values. They are created by the position scheduler
/// or by startup priming, copied into the worker queue, and consumed exactly
/// once by the worker loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncRequest {
    dir: String,
    refresh: bool,
}

impl SyncRequest {
    /// Create a request for `dir` (relative to the scenery root).
    ///
    /// When `refresh` is set and the sync materializes a directory that did
    /// not exist locally, the directory is reported for a display refresh.
    pub fn new(dir: impl Into<String>, refresh: bool) -> Self {
        Self {
            dir: dir.into(),
            refresh,
        }
    }

    /// Request for a background directory that never triggers a refresh.
    pub fn background(dir: impl Into<String>) -> Self {
        Self::new(dir, false)
    }

    /// Relative directory path, `/`-separated.
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Whether a newly materialized directory should trigger a refresh.
    pub fn refresh(&self) -> bool {
        self.refresh
    }
}

/// Anything that accepts sync requests.
///
/// Implemented by the worker and its request handles so the scheduler and
/// priming code do not depend on the worker's lifecycle.
pub trait RequestSink {
    /// Enqueue `request`. Never blocks.
    fn request(&self, request: SyncRequest);
}

impl fmt::Display for SyncRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.refresh {
            write!(f, "{} (refresh)", self.dir)
        } else {
            f.write_str(&self.dir)
        }
    }
}
