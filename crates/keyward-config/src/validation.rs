// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::KeywardConfig;

/// Smallest accepted Argon2id memory cost (32 MiB).
pub const MIN_KDF_MEMORY_COST: u32 = 32768;

/// Smallest accepted Argon2id iteration count.
pub const MIN_KDF_ITERATIONS: u32 = 2;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &KeywardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.vault.kdf_memory_cost < MIN_KDF_MEMORY_COST {
        fail(format!(
            "vault.kdf_memory_cost must be at least {MIN_KDF_MEMORY_COST} (32 MiB), got {}",
            config.vault.kdf_memory_cost
        ));
    }

    if config.vault.kdf_iterations < MIN_KDF_ITERATIONS {
        fail(format!(
            "vault.kdf_iterations must be at least {MIN_KDF_ITERATIONS}, got {}",
            config.vault.kdf_iterations
        ));
    }

    if config.vault.kdf_parallelism < 1 {
        fail(format!(
            "vault.kdf_parallelism must be at least 1, got {}",
            config.vault.kdf_parallelism
        ));
    }

    // Argon2 requires at least 8 KiB of memory per lane.
    if config.vault.kdf_parallelism >= 1
        && config.vault.kdf_memory_cost < 8 * config.vault.kdf_parallelism
    {
        fail(format!(
            "vault.kdf_memory_cost must be at least 8 KiB per lane ({} lanes)",
            config.vault.kdf_parallelism
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.snapshot.directory.trim().is_empty() {
        fail("snapshot.directory must not be empty".to_string());
    }

    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        fail(format!(
            "log.level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.log.level
        ));
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

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&KeywardConfig::default()).is_ok());
    }

    #[test]
    fn weak_kdf_parameters_fail_validation() {
        let mut config = KeywardConfig::default();
        config.vault.kdf_memory_cost = 1024;
        config.vault.kdf_iterations = 1;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "kdf_memory_cost"));
        assert!(has_message(&errors, "kdf_iterations"));
    }

    #[test]
    fn zero_parallelism_fails_validation() {
        let mut config = KeywardConfig::default();
        config.vault.kdf_parallelism = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "kdf_parallelism"));
    }

    #[test]
    fn empty_paths_fail_validation() {
        let mut config = KeywardConfig::default();
        config.storage.database_path = "  ".to_string();
        config.snapshot.directory = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = KeywardConfig::default();
        config.log.level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "log.level"));
    }

    #[test]
    fn toml_sections_validate() {
        let toml_str = r#"
[vault]
kdf_memory_cost = 131072
kdf_iterations = 4
kdf_parallelism = 2

[snapshot]
before_every_write = true
"#;
        let config: KeywardConfig = toml::from_str(toml_str).unwrap();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.vault.kdf_params().memory_cost_kib, 131072);
        assert!(config.snapshot.before_every_write);
        assert!(config.storage.wal_mode);
    }

    #[test]
    fn toml_unknown_field_is_rejected() {
        let toml_str = r#"
[vault]
kdf_memroy_cost = 65536
"#;
        assert!(toml::from_str::<KeywardConfig>(toml_str).is_err());
    }
}
