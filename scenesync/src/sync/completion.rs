//! Per-directory record of the last sync attempt.
//!
//! Used only to cut traffic: a directory attempted within the freshness
//! window is not synced again. A missing entry just means one extra,
//! harmless sync.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default time after which a synced directory may be synced again.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Last-attempt timestamps keyed by relative directory.
///
/// Written only by the worker thread. Entries never expire explicitly; they
/// are treated as stale once older than the freshness window.
#[derive(Debug, Clone)]
pub struct CompletionCache {
    attempts: HashMap<String, Instant>,
    window: Duration,
}

impl Default for CompletionCache {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_WINDOW)
    }
}

impl CompletionCache {
    /// Create an empty cache with the given freshness window.
    pub fn new(window: Duration) -> Self {
        Self {
            attempts: HashMap::new(),
            window,
        }
    }

    /// The freshness window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Change the freshness window, keeping recorded attempts.
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// True if `dir` has never been attempted or its record is stale at `now`.
    pub fn should_sync(&self, dir: &str, now: Instant) -> bool {
        match self.attempts.get(dir) {
            None => true,
            Some(last) => now.saturating_duration_since(*last) > self.window,
        }
    }

    /// Store `now` as the latest attempt for `dir`, success or not.
    pub fn record_attempt(&mut self, dir: &str, now: Instant) {
        self.attempts.insert(dir.to_string(), now);
    }

    /// Time of the last recorded attempt for `dir`.
    pub fn last_attempt(&self, dir: &str) -> Option<Instant> {
        self.attempts.get(dir).copied()
    }

    /// Number of directories with a record.
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}
