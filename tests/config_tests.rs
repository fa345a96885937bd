// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use photobooth::Config;
use photobooth::pipelines::strip::TextureSource;
use std::path::PathBuf;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.title, "Photo Booth");
    assert_eq!(config.date_format, "%-m/%-d/%Y");
    assert_eq!(config.texture, TextureSource::Procedural);
    assert!(!config.hardware_flash, "Hardware flash should be opt-in");
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        title: "Wedding".to_string(),
        texture: TextureSource::File(PathBuf::from("/srv/paper.jpg")),
        output_dir: Some(dir.path().join("strips")),
        ..Config::default()
    };
    config.save_to(&path).unwrap();

    assert_eq!(Config::load(Some(path.as_path())).unwrap(), config);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "title": "Prom", "texture": "none" }"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.title, "Prom");
    assert_eq!(config.texture, TextureSource::None);
    assert_eq!(config.capture_width, 1280);
}

#[test]
fn test_invalid_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "not json").unwrap();
    assert!(Config::load_from(&garbage).is_err());

    let bad_date = dir.path().join("bad_date.json");
    std::fs::write(&bad_date, r#"{ "date_format": "%Q" }"#).unwrap();
    assert!(Config::load_from(&bad_date).is_err());
}
