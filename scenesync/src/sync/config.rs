//! Runtime configuration consumed by the sync worker at start.

use std::path::PathBuf;
use std::time::Duration;

use super::completion::DEFAULT_FRESHNESS_WINDOW;
use crate::config::ConfigFile;
use crate::transport::TransportKind;

/// Consecutive transport failures after which the worker stalls.
pub const DEFAULT_STALL_THRESHOLD: u32 = 5;

/// Default external tool.
pub const DEFAULT_EXT_SVN_UTILITY: &str = "svn";

/// Everything the worker reads once at `start()`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Whether synchronization should run at all.
    pub enabled: bool,
    /// Remote address for the builtin and external transports.
    pub svn_server: String,
    /// Remote address for the mirror transport.
    pub rsync_server: String,
    /// External tool for the external transport.
    pub ext_svn_utility: String,
    /// Local scenery root. Must exist and must not be the base package.
    pub scenery_dir: Option<PathBuf>,
    /// Transport selection.
    pub transport: TransportKind,
    /// Refresh the display when new tiles appear.
    pub refresh_display: bool,
    /// Time before a synced directory may be synced again.
    pub freshness_window: Duration,
    /// Consecutive failures that stall the worker.
    pub stall_threshold: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            svn_server: String::new(),
            rsync_server: String::new(),
            ext_svn_utility: DEFAULT_EXT_SVN_UTILITY.to_string(),
            scenery_dir: None,
            transport: TransportKind::default(),
            refresh_display: true,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            stall_threshold: DEFAULT_STALL_THRESHOLD,
        }
    }
}

impl SyncConfig {
    /// Build from the `[sync]` section of the configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let sync = &config.sync;
        Self {
            enabled: sync.enabled,
            svn_server: sync.svn_server.clone().unwrap_or_default(),
            rsync_server: sync.rsync_server.clone().unwrap_or_default(),
            ext_svn_utility: sync.ext_svn_utility.clone(),
            scenery_dir: sync.scenery_dir.clone(),
            transport: sync.transport,
            refresh_display: sync.refresh_display,
            ..Self::default()
        }
    }

    /// Set the local scenery root.
    pub fn with_scenery_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scenery_dir = Some(dir.into());
        self
    }

    /// Override the freshness window.
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Override the stall threshold.
    pub fn with_stall_threshold(mut self, threshold: u32) -> Self {
        self.stall_threshold = threshold.max(1);
        self
    }
}
