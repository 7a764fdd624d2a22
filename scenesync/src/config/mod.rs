//! Configuration file support.
//!
//! The user configuration lives in `~/.scenesync/config.ini` and has two
//! sections, `[sync]` and `[logging]`. [`ConfigFile`] is the parsed form;
//! [`ConfigKey`] gives typed access to individual `section.key` values.
//!
//! # Example
//!
//! ```
//! use scenesync::config::{ConfigFile, ConfigKey};
//!
//! let mut config = ConfigFile::default();
//! ConfigKey::SyncSceneryDir.set(&mut config, "/data/TerraSync/").unwrap();
//! assert_eq!(ConfigKey::SyncSceneryDir.get(&config), "/data/TerraSync");
//! ```

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    default_log_file, CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_LOG_FILE_NAME,
    DEFAULT_REFRESH_DISPLAY, DEFAULT_SYNC_ENABLED, DEFAULT_TRANSPORT,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use parser::strip_path;
pub use settings::{ConfigFile, LoggingSettings, SyncSettings};
