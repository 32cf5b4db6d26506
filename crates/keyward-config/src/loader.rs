// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order, later overriding earlier: compiled defaults,
//! `/etc/keyward/keyward.toml`, `~/.config/keyward/keyward.toml`,
//! `./keyward.toml`, then `KEYWARD_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KeywardConfig;

/// System-wide config file location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/keyward/keyward.toml";

/// Local config file name, resolved against the working directory.
pub const LOCAL_CONFIG_FILE: &str = "keyward.toml";

/// The per-user config file, if the platform has a config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("keyward").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<KeywardConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<KeywardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeywardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeywardConfig, figment::Error> {
    tracing::debug!(path = %path.display(), "loading config from explicit path");
    Figment::new()
        .merge(Serialized::defaults(KeywardConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KeywardConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping `KEYWARD_SECTION_FIELD` to `section.field`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `KEYWARD_VAULT_KDF_MEMORY_COST` maps to `vault.kdf_memory_cost`.
/// `KEYWARD_MASTER_PASSWORD` is read by the CLI, never by the config layer.
fn env_provider() -> Env {
    Env::prefixed("KEYWARD_")
        .ignore(&["MASTER_PASSWORD", "NEW_MASTER_PASSWORD"])
        .map(|key| {
            let key = key.as_str().to_ascii_lowercase();
            let mapped = ["vault", "storage", "snapshot", "log"]
                .iter()
                .find_map(|section| {
                    key.strip_prefix(&format!("{section}_"))
                        .map(|field| format!("{section}.{field}"))
                })
                .unwrap_or(key);
            mapped.into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_section_mapping_keeps_field_underscores() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("KEYWARD_VAULT_KDF_MEMORY_COST", "131072");
            jail.set_env("KEYWARD_SNAPSHOT_BEFORE_EVERY_WRITE", "true");
            jail.set_env("KEYWARD_MASTER_PASSWORD", "not-config");
            let config = load_config()?;
            assert_eq!(config.vault.kdf_memory_cost, 131072);
            assert!(config.snapshot.before_every_write);
            Ok(())
        });
    }

    #[test]
    fn local_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_CONFIG_FILE,
                r#"
[storage]
database_path = "local.db"
"#,
            )?;
            let config = load_config()?;
            assert_eq!(config.storage.database_path, "local.db");
            assert_eq!(config.vault.kdf_iterations, 6);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_local_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(LOCAL_CONFIG_FILE, "[log]\nlevel = \"warn\"\n")?;
            jail.set_env("KEYWARD_LOG_LEVEL", "debug");
            let config = load_config()?;
            assert_eq!(config.log.level, "debug");
            Ok(())
        });
    }
}
