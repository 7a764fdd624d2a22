//! Default values and constants for all configuration settings.

use std::path::PathBuf;

use super::settings::*;
use crate::sync::DEFAULT_EXT_SVN_UTILITY;
use crate::transport::TransportKind;

/// Directory below the home directory holding config and logs.
pub const CONFIG_DIR_NAME: &str = ".scenesync";

/// Config file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default log file name inside [`CONFIG_DIR_NAME`].
pub const DEFAULT_LOG_FILE_NAME: &str = "scenesync.log";

/// Synchronization is opt-in.
pub const DEFAULT_SYNC_ENABLED: bool = false;

/// Refresh the display for new tiles by default.
pub const DEFAULT_REFRESH_DISPLAY: bool = true;

/// Default transport.
pub const DEFAULT_TRANSPORT: TransportKind = TransportKind::Builtin;

/// Default log file path (~/.scenesync/scenesync.log).
pub fn default_log_file() -> PathBuf {
    super::file::config_directory().join(DEFAULT_LOG_FILE_NAME)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            sync: SyncSettings::default(),
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_SYNC_ENABLED,
            svn_server: None,
            rsync_server: None,
            ext_svn_utility: DEFAULT_EXT_SVN_UTILITY.to_string(),
            scenery_dir: None,
            transport: DEFAULT_TRANSPORT,
            refresh_display: DEFAULT_REFRESH_DISPLAY,
        }
    }
}
