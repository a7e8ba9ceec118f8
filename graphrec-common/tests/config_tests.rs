//! Tests for configuration resolution and graceful degradation
//!
//! Covers:
//! - Missing TOML files do not fail resolution
//! - Malformed TOML falls back to defaults
//! - Priority order: CLI > environment > TOML > defaults
//!
//! Note: Uses serial_test to prevent environment variable races.
//! Tests that touch GRAPHREC_* variables are marked with #[serial].

use graphrec_common::config::{
    ClientConfig, ConfigResolver, ENV_API_URL, ENV_CONFIG, ENV_STATE_FILE,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(ENV_API_URL);
    env::remove_var(ENV_STATE_FILE);
    env::remove_var(ENV_CONFIG);
}

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
#[serial]
fn test_missing_config_file_uses_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();

    let config = ConfigResolver::new()
        .config_path(Some(dir.path().join("absent.toml")))
        .resolve();

    assert_eq!(config, ClientConfig::default());
}

#[test]
#[serial]
fn test_malformed_config_file_uses_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "base_url = [not, valid");

    let config = ConfigResolver::new().config_path(Some(path)).resolve();

    assert_eq!(config.base_url, "http://localhost:8000");
}

#[test]
#[serial]
fn test_invalid_values_in_config_file_use_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "default_k = 0\n");

    let config = ConfigResolver::new().config_path(Some(path)).resolve();

    assert_eq!(config.default_k, 5);
}

#[test]
#[serial]
fn test_toml_values_are_loaded() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
base_url = "http://recs.internal:8000"
request_timeout_secs = 5
state_file = "/var/tmp/graphrec.toml"
default_k = 10

[logging]
level = "debug"
"#,
    );

    let config = ConfigResolver::new().config_path(Some(path)).resolve();

    assert_eq!(config.base_url, "http://recs.internal:8000");
    assert_eq!(config.request_timeout_secs, 5);
    assert_eq!(config.state_file, Some(PathBuf::from("/var/tmp/graphrec.toml")));
    assert_eq!(config.default_k, 10);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_config_path_from_environment() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "default_k = 8\n");
    env::set_var(ENV_CONFIG, &path);

    let config = ConfigResolver::new().resolve();
    clear_env();

    assert_eq!(config.default_k, 8);
}

#[test]
#[serial]
fn test_environment_overrides_toml() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "base_url = \"http://from-toml:8000\"\n");
    env::set_var(ENV_API_URL, "http://from-env:8000");
    env::set_var(ENV_STATE_FILE, "/tmp/env-session.toml");

    let config = ConfigResolver::new().config_path(Some(path)).resolve();
    clear_env();

    assert_eq!(config.base_url, "http://from-env:8000");
    assert_eq!(config.state_file, Some(PathBuf::from("/tmp/env-session.toml")));
}

#[test]
#[serial]
fn test_cli_overrides_environment() {
    clear_env();
    let dir = TempDir::new().unwrap();
    env::set_var(ENV_API_URL, "http://from-env:8000");

    let config = ConfigResolver::new()
        .config_path(Some(dir.path().join("absent.toml")))
        .api_url(Some("http://from-cli:8000".to_string()))
        .state_file(Some(PathBuf::from("/tmp/cli-session.toml")))
        .resolve();
    clear_env();

    assert_eq!(config.base_url, "http://from-cli:8000");
    assert_eq!(config.state_file, Some(PathBuf::from("/tmp/cli-session.toml")));
}

#[test]
#[serial]
fn test_blank_environment_value_is_ignored() {
    clear_env();
    let dir = TempDir::new().unwrap();
    env::set_var(ENV_API_URL, "   ");

    let config = ConfigResolver::new()
        .config_path(Some(dir.path().join("absent.toml")))
        .resolve();
    clear_env();

    assert_eq!(config.base_url, "http://localhost:8000");
}
