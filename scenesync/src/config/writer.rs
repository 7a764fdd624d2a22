//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let sync = &config.sync;
    let svn_server = sync.svn_server.as_deref().unwrap_or("");
    let rsync_server = sync.rsync_server.as_deref().unwrap_or("");
    let scenery_dir = sync
        .scenery_dir
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();

    format!(
        r#"[sync]
; Start automatic scenery synchronization (default: false)
enabled = {}
; Scenery server for the builtin and external transports
; Example: svn_server = https://terrasync.example.org/ws2
svn_server = {}
; Scenery server for the rsync transport
; Example: rsync_server = scenery.example.org::Scenery
rsync_server = {}
; External client used by the external transport (default: svn)
ext_svn_utility = {}
; Local scenery directory. Must exist and must not be the base package
; (a directory containing a 'version' file is rejected)
scenery_dir = {}
; Transport:
;   builtin  - in-process HTTP client (default)
;   external - external command-line client (ext_svn_utility)
;   rsync    - rsync mirror of rsync_server
transport = {}
; Reload displayed tiles when new ones arrive (default: true)
refresh_display = {}

[logging]
; Log file path (default: ~/.scenesync/scenesync.log)
file = {}
"#,
        sync.enabled,
        svn_server,
        rsync_server,
        sync.ext_svn_utility,
        scenery_dir,
        sync.transport,
        sync.refresh_display,
        path_to_string(&config.logging.file),
    )
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
