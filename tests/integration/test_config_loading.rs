use orchdoc::core::config::{ConfigLoader, ConfigValidator};
use orchdoc::core::types::ErrorCategory;
use serial_test::serial;
use std::env;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn clear_orchdoc_env() {
    for v in &[
        "ORCHDOC_REMOTE_URL",
        "ORCHDOC_REMOTE_USERNAME",
        "ORCHDOC_REMOTE_INSECURE",
    ] {
        env::remove_var(v);
    }
}

const FULL_CONFIG: &str = r#"
[docs]
include_scripts = false
timestamp = true
masked_types = ["SecureString", "EncryptedString"]
max_value_len = 40
index_title = "AVI Workflows"

[lint]
parameter_pattern = "^[a-z][A-Za-z]*$"
disabled_rules = ["ODL-003"]
forbidden_script_patterns = ['System\.sleep']

[remote]
base_url = "https://vro.lab.local"
username = "automation"
retry_attempts = 5
retry_delay = "500ms"
wait_timeout = "2m"
"#;

#[test]
#[serial]
fn test_missing_file_yields_defaults() {
    clear_orchdoc_env();
    let temp_dir = TempDir::new().unwrap();

    let config = ConfigLoader::load_from_dir(temp_dir.path()).unwrap();
    assert!(config.docs.include_scripts);
    assert!(config.docs.include_diagram);
    assert_eq!(config.docs.masked_types, vec!["SecureString".to_string()]);
    assert_eq!(config.remote.base_url, None);
    assert_eq!(config.remote.auth_path, "/csp/gateway/am/api/login");
    assert!(ConfigValidator::validate(&config).is_ok());
}

#[test]
#[serial]
fn test_config_file_values_are_loaded() {
    clear_orchdoc_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("orchdoc.toml"), FULL_CONFIG).unwrap();

    let config = ConfigLoader::load_from_dir(temp_dir.path()).unwrap();
    assert!(!config.docs.include_scripts);
    assert!(config.docs.include_diagram);
    assert!(config.docs.timestamp);
    assert_eq!(config.docs.max_value_len, 40);
    assert_eq!(config.docs.index_title, "AVI Workflows");
    assert_eq!(config.lint.disabled_rules, vec!["ODL-003".to_string()]);
    assert_eq!(
        config.lint.forbidden_script_patterns,
        vec![r"System\.sleep".to_string()]
    );
    assert_eq!(config.lint.attribute_pattern, "^[a-z][a-zA-Z0-9]*$");
    assert_eq!(config.remote.username.as_deref(), Some("automation"));
    assert_eq!(config.remote.retry_attempts, 5);
    assert_eq!(
        config.remote.retry_delay().unwrap(),
        Duration::from_millis(500)
    );
    assert_eq!(config.remote.wait_timeout().unwrap(), Duration::from_secs(120));
    assert!(ConfigValidator::validate(&config).is_ok());
}

#[test]
#[serial]
fn test_env_overrides_file_values() {
    clear_orchdoc_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("orchdoc.toml"), FULL_CONFIG).unwrap();

    env::set_var("ORCHDOC_REMOTE_URL", "https://vro.prod.local");
    env::set_var("ORCHDOC_REMOTE_USERNAME", "release-bot");
    env::set_var("ORCHDOC_REMOTE_INSECURE", "true");
    let config = ConfigLoader::load_from_dir(temp_dir.path());
    clear_orchdoc_env();

    let config = config.unwrap();
    assert_eq!(
        config.remote.base_url.as_deref(),
        Some("https://vro.prod.local")
    );
    assert_eq!(config.remote.username.as_deref(), Some("release-bot"));
    assert!(config.remote.insecure);
}

#[test]
#[serial]
fn test_blank_or_unparseable_env_values_are_ignored() {
    clear_orchdoc_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("orchdoc.toml"), FULL_CONFIG).unwrap();

    env::set_var("ORCHDOC_REMOTE_URL", "   ");
    env::set_var("ORCHDOC_REMOTE_INSECURE", "maybe");
    let config = ConfigLoader::load_from_dir(temp_dir.path());
    clear_orchdoc_env();

    let config = config.unwrap();
    assert_eq!(
        config.remote.base_url.as_deref(),
        Some("https://vro.lab.local")
    );
    assert!(!config.remote.insecure);
}

#[test]
#[serial]
fn test_explicit_path_must_exist() {
    clear_orchdoc_env();
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("custom.toml");

    let err = ConfigLoader::load_explicit(&missing).unwrap_err();
    assert_eq!(err.category, ErrorCategory::ConfigError);
    assert!(err.message.contains("does not exist"));

    fs::write(&missing, "[docs]\ninclude_diagram = false\n").unwrap();
    let config = ConfigLoader::load_explicit(&missing).unwrap();
    assert!(!config.docs.include_diagram);
}

#[test]
#[serial]
fn test_malformed_toml_is_a_config_error() {
    clear_orchdoc_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("orchdoc.toml"), "[docs\ninclude_scripts = ").unwrap();

    let err = ConfigLoader::load_from_dir(temp_dir.path()).unwrap_err();
    assert_eq!(err.category, ErrorCategory::ConfigError);
    assert!(err.message.contains("Failed to parse config file"));
}

#[test]
#[serial]
fn test_validation_reports_config_invalid() {
    clear_orchdoc_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("orchdoc.toml"),
        "[remote]\nauth_path = \"login\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_dir(temp_dir.path()).unwrap();
    let err = ConfigValidator::validate(&config).unwrap_err();
    assert_eq!(err.code, "CONFIG_INVALID");
    assert!(err.message.contains("remote.auth_path"));
}
