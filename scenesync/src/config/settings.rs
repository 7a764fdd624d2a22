//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use crate::transport::TransportKind;
use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Scenery synchronization settings
    pub sync: SyncSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Scenery synchronization configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Start synchronization at launch
    pub enabled: bool,
    /// Remote address for the builtin and external transports
    pub svn_server: Option<String>,
    /// Remote address for the rsync transport
    pub rsync_server: Option<String>,
    /// External client program for the external transport
    pub ext_svn_utility: String,
    /// Local scenery root (must exist, must not hold the base package)
    pub scenery_dir: Option<PathBuf>,
    /// Transport selection
    pub transport: TransportKind,
    /// Reload displayed tiles when new ones arrive
    pub refresh_display: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
