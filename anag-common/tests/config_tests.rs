//! Unit tests for configuration loading and root folder resolution
//!
//! Uses serial_test: tests touching ANAG_ROOT_FOLDER or ANAG_CONFIG are
//! marked #[serial] so they never run in parallel.

use anag_common::config::{
    default_root_folder, resolve_root_folder, ConfigSource, RootFolderInitializer, TomlConfig,
    CONFIG_FILE_ENV, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = resolve_root_folder(None, &TomlConfig::default());

    assert!(!root_folder.as_os_str().is_empty());
    assert_eq!(root_folder, default_root_folder());
}

#[test]
#[serial]
fn test_resolver_priority_order() {
    env::remove_var(ROOT_FOLDER_ENV);

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/anag-from-toml")),
        ..TomlConfig::default()
    };

    // TOML beats the compiled default
    assert_eq!(
        resolve_root_folder(None, &config),
        PathBuf::from("/tmp/anag-from-toml")
    );

    // Environment beats TOML
    env::set_var(ROOT_FOLDER_ENV, "/tmp/anag-from-env");
    assert_eq!(
        resolve_root_folder(None, &config),
        PathBuf::from("/tmp/anag-from-env")
    );

    // Command line beats everything
    let cli = PathBuf::from("/tmp/anag-from-cli");
    assert_eq!(resolve_root_folder(Some(cli.as_path()), &config), cli);

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_load_explicit_config_file() {
    env::remove_var(CONFIG_FILE_ENV);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        root_folder = "/srv/anagrafe"

        [logging]
        level = "debug"

        [gazetteer]
        file = "cities.csv"

        [gazetteer.columns]
        city = "name"

        [postcodes]
        compound_keys = true
        "#,
    )
    .unwrap();

    let (config, source) = TomlConfig::load_or_default(Some(path.as_path())).unwrap();

    assert_eq!(source, ConfigSource::File(path.clone()));

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/anagrafe")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.gazetteer.file, PathBuf::from("cities.csv"));
    assert_eq!(config.gazetteer.columns.city, "name");
    assert_eq!(config.gazetteer.columns.iso_code, "code");
    assert!(config.postcodes.compound_keys);
    assert_eq!(config.postcodes.file, PathBuf::from("zipcodes.it.csv"));
}

#[test]
#[serial]
fn test_config_file_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("env.toml");
    std::fs::write(&path, "data_dir = \"sources\"\n").unwrap();

    env::set_var(CONFIG_FILE_ENV, &path);
    let (config, source) = TomlConfig::load_or_default(None).unwrap();
    env::remove_var(CONFIG_FILE_ENV);

    assert_eq!(config.data_dir, Some(PathBuf::from("sources")));
    assert_eq!(source.to_string(), path.display().to_string());
}

#[test]
#[serial]
fn test_missing_explicit_config_is_error() {
    env::remove_var(CONFIG_FILE_ENV);

    let result = TomlConfig::load_or_default(Some(Path::new("/nonexistent/anag.toml")));
    assert!(result.is_err());
}

#[test]
fn test_invalid_toml_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "root_folder = [").unwrap();

    let err = TomlConfig::load(&path).unwrap_err();
    assert!(matches!(err, anag_common::Error::Config(_)));
}

#[test]
fn test_initializer_creates_root_folder() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("root");
    let initializer = RootFolderInitializer::new(root.clone());

    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(&TomlConfig::default()), root.join("anagrafe.db"));
}

#[test]
fn test_config_source_display() {
    assert_eq!(ConfigSource::Defaults.to_string(), "compiled defaults");
    assert_eq!(
        ConfigSource::File(PathBuf::from("anag.toml")).to_string(),
        "anag.toml"
    );
}
