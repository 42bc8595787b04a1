//! Integration tests for configuration validation

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use tracing::Level;
use vault_protocol::config::{VaultConfig, MAX_PAYLOAD_SIZE};

#[test]
fn test_default_config_validates() {
    let config = VaultConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {errors:?}"
    );
    assert_eq!(config.transport.max_payload_size, MAX_PAYLOAD_SIZE);
}

#[test]
fn test_invalid_server_address() {
    let mut config = VaultConfig::default();
    config.server.address = "invalid_address".to_string();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Invalid server address")));
}

#[test]
fn test_empty_server_address() {
    let mut config = VaultConfig::default();
    config.server.address = String::new();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_zero_max_connections() {
    let mut config = VaultConfig::default();
    config.server.max_connections = 0;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Max connections must be greater than 0")));
}

#[test]
fn test_idle_timeout_bounds() {
    let mut config = VaultConfig::default();
    config.server.idle_timeout = Duration::from_millis(10);
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Idle timeout too short")));

    config.server.idle_timeout = Duration::from_secs(7200);
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Idle timeout too long")));
}

#[test]
fn test_short_write_timeout() {
    let mut config = VaultConfig::default();
    config.server.write_timeout = Duration::from_millis(50);

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Write timeout too short")));
}

#[test]
fn test_client_accepts_hostnames() {
    let mut config = VaultConfig::default();
    config.client.address = "vault.example.com:8080".to_string();
    assert!(config.validate().is_empty());

    config.client.address = "vault.example.com".to_string();
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Invalid client address")));
}

#[test]
fn test_payload_size_bounds() {
    let mut config = VaultConfig::default();

    config.transport.max_payload_size = 0;
    assert!(config.validate().iter().any(|e| e.contains("cannot be 0")));

    config.transport.max_payload_size = 512;
    assert!(config.validate().iter().any(|e| e.contains("too small")));

    config.transport.max_payload_size = MAX_PAYLOAD_SIZE + 1;
    assert!(config.validate().iter().any(|e| e.contains("too large")));
}

#[test]
fn test_log_to_file_without_path() {
    let mut config = VaultConfig::default();
    config.logging.log_to_file = true;
    config.logging.log_file_path = None;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("log_file_path must be specified")));
}

#[test]
fn test_no_logging_outputs() {
    let mut config = VaultConfig::default();
    config.logging.log_to_console = false;
    config.logging.log_to_file = false;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("At least one logging output")));
}

#[test]
fn test_validate_strict_lists_every_problem() {
    let mut config = VaultConfig::default();
    config.server.address = String::new();
    config.server.max_connections = 0;
    config.logging.app_name = String::new();

    let err = config.validate_strict().unwrap_err().to_string();
    assert!(err.contains("Server address cannot be empty"));
    assert!(err.contains("Max connections must be greater than 0"));
    assert!(err.contains("Application name cannot be empty"));
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config = VaultConfig::from_toml(
        r#"
        [server]
        address = "0.0.0.0:9443"
        max_connections = 50
        idle_timeout = 60000
        write_timeout = 2000
        shutdown_timeout = 5000

        [logging]
        app_name = "vault"
        log_level = "debug"
        log_to_console = true
        log_to_file = false
        json_format = true
        "#,
    )
    .expect("valid toml");

    assert_eq!(config.server.address, "0.0.0.0:9443");
    assert_eq!(config.server.idle_timeout, Duration::from_secs(60));
    assert_eq!(config.logging.log_level, Level::DEBUG);
    assert!(config.logging.json_format);
    assert_eq!(config.transport.max_payload_size, MAX_PAYLOAD_SIZE);
    assert!(config.validate().is_empty());
}

#[test]
fn test_invalid_log_level_rejected() {
    let result = VaultConfig::from_toml(
        r#"
        [logging]
        app_name = "vault"
        log_level = "loud"
        log_to_console = true
        log_to_file = false
        json_format = false
        "#,
    );
    assert!(result.is_err());
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.toml");

    let config = VaultConfig::default_with_overrides(|c| {
        c.server.address = "127.0.0.1:7000".to_string();
        c.server.max_connections = 12;
    });
    config.save_to_file(&path).unwrap();

    let loaded = VaultConfig::from_file(&path).unwrap();
    assert_eq!(loaded.server.address, "127.0.0.1:7000");
    assert_eq!(loaded.server.max_connections, 12);
}

#[test]
fn test_example_config_parses() {
    let example = VaultConfig::example_config();
    let parsed = VaultConfig::from_toml(&example).unwrap();
    assert!(parsed.validate().is_empty());
}

#[test]
fn test_env_overrides() {
    // Only this test touches VAULT_* variables
    std::env::set_var("VAULT_SERVER_ADDRESS", "127.0.0.1:6553");
    std::env::set_var("VAULT_IDLE_TIMEOUT_MS", "1500");
    std::env::set_var("VAULT_LOG_LEVEL", "warn");

    let config = VaultConfig::from_env().unwrap();
    assert_eq!(config.server.address, "127.0.0.1:6553");
    assert_eq!(config.server.idle_timeout, Duration::from_millis(1500));
    assert_eq!(config.logging.log_level, Level::WARN);

    std::env::set_var("VAULT_MAX_CONNECTIONS", "many");
    assert!(VaultConfig::from_env().is_err());

    for key in [
        "VAULT_SERVER_ADDRESS",
        "VAULT_IDLE_TIMEOUT_MS",
        "VAULT_LOG_LEVEL",
        "VAULT_MAX_CONNECTIONS",
    ] {
        std::env::remove_var(key);
    }
}
