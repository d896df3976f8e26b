//! Integration tests for Settings loading with layered precedence.
//!
//! These run against temp directories only, so the local layer overlays the
//! compiled defaults (or whatever global config the machine has).

use std::fs;

use tempfile::TempDir;

use codetree::application::ApplicationError;
use codetree::config::{local_config_path, Settings};

#[test]
fn given_local_config_when_load_then_overrides_only_given_fields() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        r#"
page_size = 25

[cache]
ttl_secs = 30
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.page_size, 25);
    assert_eq!(settings.cache.ttl_secs, 30);
    assert_eq!(settings.cache.capacity, 500);
}

#[test]
fn given_local_data_file_with_tilde_when_load_then_path_is_expanded() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "data_file = \"~/somewhere/codes.toml\"\n",
    )
    .unwrap();

    let settings = Settings::load(Some(dir.path())).unwrap();

    assert!(!settings.data_file.to_string_lossy().starts_with('~'));
    assert!(settings.data_file.ends_with("somewhere/codes.toml"));
}

#[test]
fn given_zero_capacity_in_local_config_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "[cache]\ncapacity = 0\n").unwrap();

    let result = Settings::load(Some(dir.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_malformed_local_config_when_load_then_config_error_names_file() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "page_size = [").unwrap();

    let err = Settings::load(Some(dir.path())).unwrap_err();

    assert!(err.to_string().contains(".codetree.toml"), "{err}");
}

#[test]
fn given_no_local_dir_when_load_then_local_layer_is_skipped() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "page_size = 99\n").unwrap();

    let settings = Settings::load(None).unwrap();

    assert_ne!(settings.page_size, 99);
}
