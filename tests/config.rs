use std::io::Write;
use tempfile::NamedTempFile;

use taskline::config::Config;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.api.backend_type, "http");
    assert_eq!(config.api.api_token_env, "TASKLINE_API_TOKEN");
    assert_eq!(config.api.timeout_seconds, 30);
    assert!(config.sync.sync_on_reconnect);
    assert!(config.sync.refresh_after_drain);
    assert_eq!(config.sync.probe_interval_seconds, 30);
    assert!(!config.storage.in_memory);
    assert!(config.storage.database_path.is_none());
    assert!(!config.logging.enabled);
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.api.timeout_seconds = 0;
    assert!(config.validate().is_err());
    config.api.timeout_seconds = 301;
    assert!(config.validate().is_err());
    config.api.timeout_seconds = 30;

    config.api.base_url = "ftp://example.com".to_string();
    assert!(config.validate().is_err());
    config.api.base_url = "http://localhost:8080".to_string();
    assert!(config.validate().is_ok());

    config.sync.probe_interval_seconds = 7200;
    assert!(config.validate().is_err());
    config.sync.probe_interval_seconds = 30;

    config.logging.level = "chatty".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_probe_address_checked_only_when_polling() {
    let mut config = Config::default();
    config.sync.probe_address = "not an address".to_string();
    assert!(config.validate().is_err());

    config.sync.probe_interval_seconds = 0;
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    assert!(toml_str.contains("backend_type = \"http\""));
    assert!(toml_str.contains("sync_on_reconnect = true"));
    assert!(toml_str.contains("probe_interval_seconds = 30"));
}

#[test]
fn test_partial_config_deserialization() {
    let partial_toml = r#"
[storage]
in_memory = true

[logging]
enabled = true
level = "debug"
"#;

    let config: Config = toml::from_str(partial_toml).unwrap();
    assert!(config.storage.in_memory);
    assert!(config.logging.enabled);
    assert_eq!(config.logging.level_filter().unwrap(), log::LevelFilter::Debug);

    // Unspecified sections keep their defaults
    assert_eq!(config.api.timeout_seconds, 30);
    assert!(config.sync.sync_on_reconnect);
}

#[test]
fn test_load_from_file_validates() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[api]\ntimeout_seconds = 0").unwrap();
    assert!(Config::load_from_file(file.path()).is_err());

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[sync]\nsync_on_reconnect = false\nprobe_interval_seconds = 0").unwrap();
    let config = Config::load_from_file(file.path()).unwrap();
    assert!(!config.sync.sync_on_reconnect);
    assert_eq!(config.sync.probe_interval_seconds, 0);
}

#[test]
fn test_generate_default_config_round_trips() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("taskline").join("config.toml");

    Config::generate_default_config(&path).unwrap();
    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.api.base_url, Config::default().api.base_url);
}

#[test]
fn test_database_path_resolution() {
    let mut config = Config::default();
    config.storage.database_path = Some("/var/lib/taskline/cache.db".into());
    assert_eq!(
        config.storage.resolve_database_path().unwrap(),
        std::path::PathBuf::from("/var/lib/taskline/cache.db")
    );
}
