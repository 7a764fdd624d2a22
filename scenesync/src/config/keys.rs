//! Configuration key access and validation.
//!
//! Type-safe get/set of configuration values by `section.key` name, used by
//! the CLI `config` command.

use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use super::parser::{expand_tilde, optional_string, parse_bool, strip_path};
use super::settings::ConfigFile;
use crate::transport::TransportKind;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
///
/// Each key maps to a specific field in [`ConfigFile`] and knows how to
/// get and set its value with proper validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Sync settings
    SyncEnabled,
    SyncSvnServer,
    SyncRsyncServer,
    SyncExtSvnUtility,
    SyncSceneryDir,
    SyncTransport,
    SyncRefreshDisplay,

    // Logging settings
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sync.enabled" => Ok(ConfigKey::SyncEnabled),
            "sync.svn_server" => Ok(ConfigKey::SyncSvnServer),
            "sync.rsync_server" => Ok(ConfigKey::SyncRsyncServer),
            "sync.ext_svn_utility" => Ok(ConfigKey::SyncExtSvnUtility),
            "sync.scenery_dir" => Ok(ConfigKey::SyncSceneryDir),
            "sync.transport" => Ok(ConfigKey::SyncTransport),
            "sync.refresh_display" => Ok(ConfigKey::SyncRefreshDisplay),

            "logging.file" => Ok(ConfigKey::LoggingFile),

            _ => Err(ConfigKeyError::UnknownKey(s.to_string())),
        }
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "sync.scenery_dir").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::SyncEnabled => "sync.enabled",
            ConfigKey::SyncSvnServer => "sync.svn_server",
            ConfigKey::SyncRsyncServer => "sync.rsync_server",
            ConfigKey::SyncExtSvnUtility => "sync.ext_svn_utility",
            ConfigKey::SyncSceneryDir => "sync.scenery_dir",
            ConfigKey::SyncTransport => "sync.transport",
            ConfigKey::SyncRefreshDisplay => "sync.refresh_display",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "sync").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "scenery_dir").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        let sync = &config.sync;
        match self {
            ConfigKey::SyncEnabled => sync.enabled.to_string(),
            ConfigKey::SyncSvnServer => sync.svn_server.clone().unwrap_or_default(),
            ConfigKey::SyncRsyncServer => sync.rsync_server.clone().unwrap_or_default(),
            ConfigKey::SyncExtSvnUtility => sync.ext_svn_utility.clone(),
            ConfigKey::SyncSceneryDir => sync
                .scenery_dir
                .as_ref()
                .map(|p| path_to_display(p))
                .unwrap_or_default(),
            ConfigKey::SyncTransport => sync.transport.to_string(),
            ConfigKey::SyncRefreshDisplay => sync.refresh_display.to_string(),
            ConfigKey::LoggingFile => path_to_display(&config.logging.file),
        }
    }

    /// Set the value in a config file.
    ///
    /// Validates the value according to the key's specification, then stores
    /// it normalized the same way the config file parser does.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        self.validate(value)?;
        let sync = &mut config.sync;
        match self {
            ConfigKey::SyncEnabled => sync.enabled = parse_bool(value),
            ConfigKey::SyncSvnServer => sync.svn_server = optional_string(&strip_path(value)),
            ConfigKey::SyncRsyncServer => {
                sync.rsync_server = optional_string(&strip_path(value))
            }
            ConfigKey::SyncExtSvnUtility => sync.ext_svn_utility = value.trim().to_string(),
            ConfigKey::SyncSceneryDir => {
                sync.scenery_dir = optional_string(&strip_path(value)).map(|v| expand_tilde(&v))
            }
            ConfigKey::SyncTransport => {
                sync.transport = value
                    .trim()
                    .parse::<TransportKind>()
                    .map_err(|reason| self.invalid(reason))?
            }
            ConfigKey::SyncRefreshDisplay => sync.refresh_display = parse_bool(value),
            ConfigKey::LoggingFile => config.logging.file = expand_tilde(value.trim()),
        }
        Ok(())
    }

    /// Validate a value according to this key's specification.
    pub fn validate(&self, value: &str) -> Result<(), ConfigKeyError> {
        self.specification()
            .is_satisfied_by(value)
            .map_err(|reason| self.invalid(reason))
    }

    fn invalid(&self, reason: String) -> ConfigKeyError {
        ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason,
        }
    }

    /// Get the validation specification for this key.
    fn specification(&self) -> Box<dyn ValueSpecification> {
        match self {
            ConfigKey::SyncEnabled => Box::new(BooleanSpec),
            ConfigKey::SyncSvnServer => Box::new(OptionalUrlSpec),
            ConfigKey::SyncRsyncServer => Box::new(AnyStringSpec),
            ConfigKey::SyncExtSvnUtility => Box::new(PathSpec),
            ConfigKey::SyncSceneryDir => Box::new(OptionalPathSpec),
            ConfigKey::SyncTransport => {
                Box::new(OneOfSpec::new(&["builtin", "external", "rsync"]))
            }
            ConfigKey::SyncRefreshDisplay => Box::new(BooleanSpec),
            ConfigKey::LoggingFile => Box::new(PathSpec),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::SyncEnabled,
            ConfigKey::SyncSvnServer,
            ConfigKey::SyncRsyncServer,
            ConfigKey::SyncExtSvnUtility,
            ConfigKey::SyncSceneryDir,
            ConfigKey::SyncTransport,
            ConfigKey::SyncRefreshDisplay,
            ConfigKey::LoggingFile,
        ]
    }
}

// ============================================================================
// Value Specifications (Specification Pattern)
// ============================================================================

/// Trait for value validation specifications.
trait ValueSpecification {
    /// Returns Ok(()) if valid, Err(reason) if invalid.
    fn is_satisfied_by(&self, value: &str) -> Result<(), String>;
}

/// Specification that accepts any string value.
struct AnyStringSpec;

impl ValueSpecification for AnyStringSpec {
    fn is_satisfied_by(&self, _value: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Specification that requires the value to be one of a set of options.
struct OneOfSpec {
    options: &'static [&'static str],
}

impl OneOfSpec {
    fn new(options: &'static [&'static str]) -> Self {
        Self { options }
    }
}

impl ValueSpecification for OneOfSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.trim().to_lowercase();
        if self.options.iter().any(|opt| *opt == lower) {
            Ok(())
        } else {
            Err(format!("must be one of: {}", self.options.join(", ")))
        }
    }
}

/// Specification for boolean values.
struct BooleanSpec;

impl ValueSpecification for BooleanSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.trim().to_lowercase();
        let valid = ["true", "false", "yes", "no", "1", "0", "on", "off"];
        if valid.contains(&lower.as_str()) {
            Ok(())
        } else {
            Err("must be true/false, yes/no, 1/0, or on/off".to_string())
        }
    }
}

/// Specification for path values (non-empty).
struct PathSpec;

impl ValueSpecification for PathSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err("must be a valid path".to_string())
        } else {
            Ok(())
        }
    }
}

/// Specification for optional path values (empty allowed).
struct OptionalPathSpec;

impl ValueSpecification for OptionalPathSpec {
    fn is_satisfied_by(&self, _value: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Specification for optional URL values.
struct OptionalUrlSpec;

impl ValueSpecification for OptionalUrlSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(())
        } else {
            Err("must be a URL starting with 'http://' or 'https://'".to_string())
        }
    }
}

/// Convert path to display string, collapsing home dir to ~.
fn path_to_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
