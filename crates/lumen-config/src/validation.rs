// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express, such as
//! non-zero limits and the production/fallback exclusion.

use crate::diagnostic::ConfigError;
use crate::model::{LumenConfig, RuntimeMode};

/// Validates a deserialized configuration.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &LumenConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::validation(format!(
            "server.host `{host}` is not a valid IP address or hostname"
        )));
    }

    if config.server.port == 0 {
        errors.push(ConfigError::validation("server.port must not be 0"));
    }

    if config.provider.base_url.trim().is_empty() {
        errors.push(ConfigError::validation("provider.base_url must not be empty"));
    }

    if config.provider.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "provider.timeout_secs must be greater than 0",
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.storage.max_images == 0 {
        errors.push(ConfigError::validation(
            "storage.max_images must be greater than 0",
        ));
    }

    if config.gallery.page_size == 0 {
        errors.push(ConfigError::validation(
            "gallery.page_size must be greater than 0",
        ));
    }

    let lifecycle = &config.lifecycle;
    if lifecycle.progress_cap > 100 {
        errors.push(ConfigError::validation(format!(
            "lifecycle.progress_cap must be at most 100, got {}",
            lifecycle.progress_cap
        )));
    }
    if lifecycle.tick_increment == 0 {
        errors.push(ConfigError::validation(
            "lifecycle.tick_increment must be greater than 0",
        ));
    }
    if lifecycle.tick_interval_ms == 0 {
        errors.push(ConfigError::validation(
            "lifecycle.tick_interval_ms must be greater than 0",
        ));
    }

    if config.runtime.placeholder_fallback && config.runtime.mode == RuntimeMode::Production {
        errors.push(ConfigError::validation(
            "runtime.placeholder_fallback cannot be enabled in production mode",
        ));
    }

    if config.client.gateway_url.trim().is_empty() {
        errors.push(ConfigError::validation("client.gateway_url must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&LumenConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = LumenConfig::default();
        config.storage.database_path = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn fallback_in_production_rejected() {
        let mut config = LumenConfig::default();
        config.runtime.placeholder_fallback = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "placeholder_fallback"));

        config.runtime.mode = RuntimeMode::Development;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = LumenConfig::default();
        config.server.port = 0;
        config.storage.max_images = 0;
        config.gallery.page_size = 0;
        config.lifecycle.progress_cap = 120;
        config.lifecycle.tick_increment = 0;
        config.provider.timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(has_error(&errors, "server.port"));
        assert!(has_error(&errors, "progress_cap"));
    }

    #[test]
    fn hostname_with_bad_characters_rejected() {
        let mut config = LumenConfig::default();
        config.server.host = "local host!".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "server.host"));

        config.server.host = "0.0.0.0".to_string();
        assert!(validate_config(&config).is_ok());
        config.server.host = "::1".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
