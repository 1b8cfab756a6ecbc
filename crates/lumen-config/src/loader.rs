// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order, later wins:
//! 1. compiled defaults
//! 2. `/etc/lumen/lumen.toml`
//! 3. `$XDG_CONFIG_HOME/lumen/lumen.toml`
//! 4. `./lumen.toml`
//! 5. `LUMEN_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LumenConfig;

pub const SYSTEM_CONFIG_PATH: &str = "/etc/lumen/lumen.toml";
pub const LOCAL_CONFIG_PATH: &str = "lumen.toml";

/// Config sections recognized in `LUMEN_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "server",
    "provider",
    "runtime",
    "storage",
    "gallery",
    "lifecycle",
    "client",
];

/// Path of the per-user config file, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lumen").join("lumen.toml"))
}

/// Loads configuration from the standard hierarchy with env overrides.
pub fn load_config() -> Result<LumenConfig, figment::Error> {
    build_figment().extract()
}

/// Loads configuration from a TOML string over the compiled defaults.
///
/// No files or env vars are consulted.
pub fn load_config_from_str(toml_content: &str) -> Result<LumenConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LumenConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Loads configuration from one explicit file, with env overrides.
pub fn load_config_from_path(path: &Path) -> Result<LumenConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LumenConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(LumenConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment.merge(Toml::file(LOCAL_CONFIG_PATH)).merge(env_provider())
}

/// Maps `LUMEN_PROVIDER_API_KEY` to `provider.api_key`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that themselves contain underscores survive intact.
fn env_provider() -> Env {
    Env::prefixed("LUMEN_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("provider_api_key"), "provider.api_key");
        assert_eq!(map_env_key("runtime_placeholder_fallback"), "runtime.placeholder_fallback");
        assert_eq!(map_env_key("lifecycle_tick_interval_ms"), "lifecycle.tick_interval_ms");
        assert_eq!(map_env_key("server_port"), "server.port");
    }

    #[test]
    fn unknown_section_left_alone() {
        assert_eq!(map_env_key("bogus_key"), "bogus_key");
        assert_eq!(map_env_key("serverport"), "serverport");
    }

    #[test]
    fn string_overrides_defaults() {
        let config = load_config_from_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
    }
}
