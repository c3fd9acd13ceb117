//! Integration tests for configuration loading

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;

use doddns::config::{Config, ValueSource};
use doddns::constants::{ENV_TIMEOUT, ENV_VERBOSE};

/// Helper function to create a temporary config file with given content
fn create_temp_config(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, content).expect("Failed to write temp config");
    (dir, config_path)
}

/// Helper function to clear environment variables for testing
fn clear_env_vars() {
    std::env::remove_var(ENV_TIMEOUT);
    std::env::remove_var(ENV_VERBOSE);
}

#[test]
#[serial]
fn test_example_config_loads() {
    clear_env_vars();
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("etc/config.json");

    let config = Config::load(Some(path)).expect("example config");
    let domain = &config.domains["example.org"];
    assert!(domain.api_key().is_some());
    assert_eq!(domain.records.len(), 3);
    assert_eq!(domain.records[0].source, ValueSource::CurrentIpv4);
    assert_eq!(domain.records[1].source, ValueSource::CurrentIpv6);
}

#[test]
#[serial]
fn test_domain_order_follows_file() {
    clear_env_vars();
    let (_dir, path) = create_temp_config(
        r#"{ "domains": {
            "zeta.example": { "apiKey": "a" },
            "alpha.example": { "apiKey": "b" },
            "mid.example": { "apiKey": "c" }
        } }"#,
    );

    let config = Config::load(Some(path)).expect("config");
    let names: Vec<&str> = config.domains.keys().map(String::as_str).collect();
    assert_eq!(names, ["zeta.example", "alpha.example", "mid.example"]);
}

#[test]
#[serial]
fn test_zero_domains_is_not_a_load_error() {
    clear_env_vars();
    let (_dir, path) = create_temp_config(r#"{ "domains": {} }"#);

    let config = Config::load(Some(path)).expect("config");
    assert!(config.domains.is_empty());
}

#[test]
#[serial]
fn test_timeout_from_env() {
    clear_env_vars();
    let (_dir, path) = create_temp_config(r#"{ "timeout": 10 }"#);

    std::env::set_var(ENV_TIMEOUT, "90");
    let config = Config::load(Some(path)).expect("config");
    assert_eq!(config.timeout, Duration::from_secs(90));

    clear_env_vars();
}

#[test]
#[serial]
fn test_nonexistent_file() {
    clear_env_vars();
    let dir = TempDir::new().expect("temp dir");
    assert!(Config::load(Some(dir.path().join("missing.json"))).is_err());
}
