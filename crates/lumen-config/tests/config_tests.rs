// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Lumen configuration system.

use std::io::Write;

use lumen_config::diagnostic::ConfigError;
use lumen_config::model::{LumenConfig, RuntimeMode};
use lumen_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serial_test::serial;

/// Valid TOML covering every section deserializes.
#[test]
fn valid_toml_deserializes_into_lumen_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"

[provider]
api_key = "sk-test"
base_url = "http://localhost:9999/v1"
image_model = "dall-e-2"
text_model = "gpt-4o"
quality = "hd"
timeout_secs = 10
optimize_max_tokens = 120

[runtime]
mode = "development"
placeholder_fallback = true
placeholder_base_url = "http://placeholder.local"

[storage]
database_path = "/tmp/lumen-test.db"
max_images = 50

[gallery]
page_size = 12
refresh_interval_secs = 0

[lifecycle]
tick_interval_ms = 100
tick_increment = 5
progress_cap = 95
success_display_ms = 1000
max_retries = 2
optimize_debounce_ms = 250

[client]
gateway_url = "http://10.0.0.2:3000"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should load");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.provider.quality, "hd");
    assert_eq!(config.runtime.mode, RuntimeMode::Development);
    assert!(config.runtime.fallback_enabled());
    assert_eq!(config.storage.max_images, 50);
    assert_eq!(config.gallery.refresh_interval_secs, 0);
    assert_eq!(config.lifecycle.max_retries, 2);
    assert_eq!(config.client.gateway_url, "http://10.0.0.2:3000");
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
    assert!(config.provider.api_key.is_none());
    assert_eq!(config.provider.image_model, "dall-e-3");
    assert_eq!(config.provider.text_model, "gpt-4o-mini");
    assert_eq!(config.runtime.mode, RuntimeMode::Production);
    assert!(!config.runtime.placeholder_fallback);
    assert_eq!(config.gallery.page_size, 20);
    assert_eq!(config.lifecycle.tick_interval_ms, 500);
    assert_eq!(config.lifecycle.success_display_ms, 3000);
}

#[test]
fn unknown_key_suggests_correction() {
    let toml = r#"
[storage]
max_imgaes = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "max_imgaes"
                && suggestion.as_deref() == Some("max_images")
                && valid_keys.contains("database_path")
        })
    });
    assert!(found, "expected UnknownKey with suggestion, got: {errors:?}");
}

#[test]
fn unknown_top_level_section_rejected() {
    let errors = load_and_validate_str("[telemetry]\nenabled = true\n").unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::UnknownKey { key, .. } if key == "telemetry")),
        "got: {errors:?}"
    );
}

#[test]
fn invalid_type_reported() {
    let err = load_config_from_str("[server]\nport = \"eighty\"\n").unwrap_err();
    let err_str = err.to_string();
    assert!(
        err_str.contains("invalid type") || err_str.contains("port"),
        "got: {err_str}"
    );
}

#[test]
fn invalid_mode_rejected() {
    assert!(load_config_from_str("[runtime]\nmode = \"staging\"\n").is_err());
}

#[test]
fn production_fallback_fails_validation() {
    let toml = "[runtime]\nplaceholder_fallback = true\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("production"))
    ));
}

#[test]
fn missing_config_file_yields_defaults() {
    let config = load_and_validate_path(std::path::Path::new("/nonexistent/lumen.toml"))
        .expect("missing file is skipped");
    assert_eq!(config.server.port, LumenConfig::default().server.port);
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "prot".to_string(),
        suggestion: Some("port".to_string()),
        valid_keys: "host, port, log_level".to_string(),
        span: None,
        src: None,
    };
    assert!(error.code().is_some());
    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `port`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("prot"));
}

#[test]
#[serial]
fn env_var_overrides_file_value() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nport = 4000\n\n[provider]\ntimeout_secs = 5").unwrap();

    // SAFETY: serialized with every other env-mutating test.
    unsafe {
        std::env::set_var("LUMEN_SERVER_PORT", "4100");
        std::env::set_var("LUMEN_PROVIDER_API_KEY", "sk-from-env");
    }
    let result = load_and_validate_path(file.path());
    unsafe {
        std::env::remove_var("LUMEN_SERVER_PORT");
        std::env::remove_var("LUMEN_PROVIDER_API_KEY");
    }

    let config = result.expect("should load");
    assert_eq!(config.server.port, 4100);
    assert_eq!(config.provider.api_key.as_deref(), Some("sk-from-env"));
    assert_eq!(config.provider.timeout_secs, 5);
}

#[test]
#[serial]
fn env_var_unknown_key_is_diagnosed() {
    let file = tempfile::NamedTempFile::new().unwrap();

    unsafe {
        std::env::set_var("LUMEN_GALLERY_PAGESIZE", "5");
    }
    let result = load_and_validate_path(file.path());
    unsafe {
        std::env::remove_var("LUMEN_GALLERY_PAGESIZE");
    }

    let errors = result.expect_err("unknown env key should be rejected");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion, .. }
            if key == "pagesize" && suggestion.as_deref() == Some("page_size")
    )));
}
