//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module is the single place where INI key names are mapped to struct
//! fields. Remote addresses and directories are normalized on the way in:
//! surrounding whitespace and trailing path separators are removed.

use ini::Ini;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [sync] section
    if let Some(section) = ini.section(Some("sync")) {
        if let Some(v) = section.get("enabled") {
            config.sync.enabled = parse_bool(v);
        }
        if let Some(v) = section.get("svn_server") {
            config.sync.svn_server = optional_string(&strip_path(v));
        }
        if let Some(v) = section.get("rsync_server") {
            config.sync.rsync_server = optional_string(&strip_path(v));
        }
        if let Some(v) = section.get("ext_svn_utility") {
            let v = v.trim();
            if !v.is_empty() {
                config.sync.ext_svn_utility = v.to_string();
            }
        }
        if let Some(v) = section.get("scenery_dir") {
            let v = strip_path(v);
            if !v.is_empty() {
                config.sync.scenery_dir = Some(expand_tilde(&v));
            }
        }
        if let Some(v) = section.get("transport") {
            config.sync.transport =
                v.trim()
                    .parse()
                    .map_err(|reason| ConfigFileError::InvalidValue {
                        section: "sync".to_string(),
                        key: "transport".to_string(),
                        value: v.to_string(),
                        reason,
                    })?;
        }
        if let Some(v) = section.get("refresh_display") {
            config.sync.refresh_display = parse_bool(v);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Trim whitespace and trailing `/` or `\` from a path or address.
pub fn strip_path(value: &str) -> String {
    value.trim().trim_end_matches(['/', '\\']).to_string()
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Convert empty string to None, non-empty to Some.
pub(super) fn optional_string(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
