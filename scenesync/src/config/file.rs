//! Reading and writing `~/.scenesync/config.ini`.
//!
//! A missing file is not an error: every setting has a default, so the
//! engine runs with [`ConfigFile::default`] until the user saves something.

use ini::Ini;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::defaults::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};
use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Load the user configuration, or defaults when there is none.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        super::parser::parse_ini(&ini)
    }

    /// Save to the user configuration path.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Write the file, creating parent directories as needed.
    ///
    /// The content goes to a sibling `.tmp` file first and is renamed into
    /// place, so a failed write leaves the previous file intact.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        let write_error = |source| ConfigFileError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let staging = path.with_extension("ini.tmp");
        fs::write(&staging, super::writer::to_config_string(self)).map_err(write_error)?;
        fs::rename(&staging, path).map_err(write_error)
    }

    /// Write a default file unless one exists.
    ///
    /// Returns the path and whether the file was created by this call.
    pub fn ensure_exists() -> Result<(PathBuf, bool), ConfigFileError> {
        let path = config_file_path();
        if path.exists() {
            return Ok((path, false));
        }
        Self::default().save_to(&path)?;
        Ok((path, true))
    }
}

/// `~/.scenesync`, or `./.scenesync` when there is no home directory.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LOG_FILE_NAME;
    use crate::transport::TransportKind;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert!(!config.sync.enabled);
        assert!(config.sync.svn_server.is_none());
        assert!(config.sync.rsync_server.is_none());
        assert_eq!(config.sync.ext_svn_utility, "svn");
        assert!(config.sync.scenery_dir.is_none());
        assert_eq!(config.sync.transport, TransportKind::Builtin);
        assert!(config.sync.refresh_display);
        assert!(config.logging.file.ends_with(DEFAULT_LOG_FILE_NAME));
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_creates_parent_and_leaves_no_staging_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/config.ini");

        ConfigFile::default().save_to(&path).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("ini.tmp").exists());
    }

    #[test]
    fn test_save_into_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let err = ConfigFile::default()
            .save_to(&blocker.join("config.ini"))
            .unwrap_err();
        assert!(matches!(err, ConfigFileError::Write { .. }));
        assert!(err.to_string().contains("blocker"));
    }

    #[test]
    fn test_config_file_path() {
        assert!(config_file_path().ends_with(".scenesync/config.ini"));
    }
}
