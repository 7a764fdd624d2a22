//! End-to-end tests for the `scenesync` binary.
//!
//! Each test points `HOME` at a scratch directory so the configuration file
//! and log file never touch the real home directory.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn scenesync(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scenesync"))
        .args(args)
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run scenesync binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_config_path_is_under_home() {
    let home = TempDir::new().unwrap();
    let output = scenesync(home.path(), &["config", "path"]);

    assert!(output.status.success());
    let expected = home.path().join(".scenesync").join("config.ini");
    assert_eq!(stdout(&output).trim(), expected.display().to_string());
}

#[test]
fn test_config_set_then_get_normalizes_value() {
    let home = TempDir::new().unwrap();

    let set = scenesync(
        home.path(),
        &["config", "set", "sync.svn_server", " http://example.org/scenery/ "],
    );
    assert!(set.status.success(), "stderr: {}", stderr(&set));

    let get = scenesync(home.path(), &["config", "get", "sync.svn_server"]);
    assert!(get.status.success());
    assert_eq!(stdout(&get).trim(), "http://example.org/scenery");

    assert!(home.path().join(".scenesync/config.ini").exists());
}

#[test]
fn test_config_rejects_unknown_key_and_bad_value() {
    let home = TempDir::new().unwrap();

    let unknown = scenesync(home.path(), &["config", "get", "sync.nonsense"]);
    assert!(!unknown.status.success());
    assert!(stderr(&unknown).contains("Unknown configuration key"));

    let bad = scenesync(home.path(), &["config", "set", "sync.transport", "ftp"]);
    assert!(!bad.status.success());
    assert!(!home.path().join(".scenesync/config.ini").exists());
}

#[test]
fn test_config_list_shows_sections() {
    let home = TempDir::new().unwrap();
    let output = scenesync(home.path(), &["config", "list"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("[sync]"));
    assert!(text.contains("[logging]"));
    assert!(text.contains("transport = builtin"));
    assert!(text.contains("scenery_dir = (not set)"));
}

#[test]
fn test_config_init_creates_file_once() {
    let home = TempDir::new().unwrap();

    let first = scenesync(home.path(), &["config", "init"]);
    assert!(first.status.success());
    assert!(stdout(&first).contains("Created"));

    let second = scenesync(home.path(), &["config", "init"]);
    assert!(second.status.success());
    assert!(stdout(&second).contains("already exists"));
}

#[test]
fn test_sync_without_scenery_dir_fails_with_hint() {
    let home = TempDir::new().unwrap();
    let output = scenesync(home.path(), &["sync", "--lat", "53.5", "--lon", "8.5"]);

    assert!(!output.status.success());
    let text = stderr(&output);
    assert!(text.contains("undefined"), "stderr: {}", text);
    assert!(text.contains("sync.scenery_dir"));
}

#[cfg(unix)]
mod external_tool {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable stand-in for the version-control tool.
    fn write_tool(dir: &Path, body: &str) -> String {
        let path = dir.join("fake-svn");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    fn configure(home: &Path, scenery: &Path, tool: &str) {
        let scenery = scenery.display().to_string();
        for (key, value) in [
            ("sync.transport", "external"),
            ("sync.svn_server", "http://example.invalid/scenery"),
            ("sync.ext_svn_utility", tool),
            ("sync.scenery_dir", scenery.as_str()),
        ] {
            let output = scenesync(home, &["config", "set", key, value]);
            assert!(output.status.success(), "stderr: {}", stderr(&output));
        }
    }

    #[test]
    fn test_sync_runs_tool_for_every_area() {
        let home = TempDir::new().unwrap();
        let scenery = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        // checkout -q <url> <local>
        let tool = write_tool(tools.path(), "mkdir -p \"$4\" && touch \"$4/synced\"");
        configure(home.path(), scenery.path(), &tool);

        let output = scenesync(
            home.path(),
            &["sync", "--lat", "53.5", "--lon", "8.5", "--timeout", "60"],
        );
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let text = stdout(&output);
        assert!(text.contains("Synced:        18"), "stdout: {}", text);
        assert!(text.contains("Failed:        0"));
        let root = scenery.path();
        assert!(root.join("Terrain/e000n50/e008n53/synced").exists());
        assert!(root.join("Objects/e000n50/e009n54/synced").exists());
    }

    #[test]
    fn test_sync_reports_stall_when_tool_fails() {
        let home = TempDir::new().unwrap();
        let scenery = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        let tool = write_tool(tools.path(), "echo 'svn: E175002: Unable to connect' >&2\nexit 1");
        configure(home.path(), scenery.path(), &tool);

        let output = scenesync(
            home.path(),
            &["sync", "--lat", "53.5", "--lon", "8.5", "--timeout", "60"],
        );
        assert!(!output.status.success());
        assert!(stderr(&output).contains("stalled"), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("Failed:        5"));
    }
}
