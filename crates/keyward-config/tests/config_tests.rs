// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Keyward configuration system.

use keyward_config::diagnostic::ConfigError;
use keyward_config::model::KeywardConfig;
use keyward_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with every known field deserializes.
#[test]
fn valid_toml_deserializes_into_keyward_config() {
    let toml = r#"
[vault]
kdf_memory_cost = 131072
kdf_iterations = 4
kdf_parallelism = 2

[storage]
database_path = "/tmp/keyward-test.db"
wal_mode = false

[snapshot]
directory = "/tmp/keyward-snapshots"
before_every_write = true

[log]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.vault.kdf_memory_cost, 131072);
    assert_eq!(config.vault.kdf_iterations, 4);
    assert_eq!(config.vault.kdf_parallelism, 2);
    assert_eq!(config.storage.database_path, "/tmp/keyward-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.snapshot.directory, "/tmp/keyward-snapshots");
    assert!(config.snapshot.before_every_write);
    assert_eq!(config.log.level, "debug");
}

/// An empty document yields the compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.vault.kdf_memory_cost, 204800);
    assert_eq!(config.vault.kdf_iterations, 6);
    assert_eq!(config.vault.kdf_parallelism, 4);
    assert!(config.storage.database_path.ends_with("keyward.db"));
    assert!(config.storage.wal_mode);
    assert!(!config.snapshot.before_every_write);
    assert_eq!(config.log.level, "info");
}

#[test]
fn kdf_params_mirror_vault_section() {
    let config = KeywardConfig::default();
    let params = config.vault.kdf_params();
    assert_eq!(params.memory_cost_kib, 204800);
    assert_eq!(params.iterations, 6);
    assert_eq!(params.parallelism, 4);
}

/// A misspelled key is reported with a suggestion.
#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[vault]
kdf_iteratons = 3
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion: Some(s), .. }
            if key == "kdf_iteratons" && s == "kdf_iterations"
    )));
}

/// Unknown top-level sections are rejected too.
#[test]
fn unknown_section_is_rejected() {
    let err = load_config_from_str("[telemetry]\nenabled = true\n")
        .expect_err("unknown section should fail");
    assert!(err.to_string().contains("telemetry"), "{err}");
}

/// A wrong value type becomes an InvalidType diagnostic.
#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[storage]\nwal_mode = \"yes\"\n")
        .expect_err("string for bool should fail");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("wal_mode"))));
}

/// Semantic validation runs after a successful parse.
#[test]
fn weak_kdf_is_rejected_after_parse() {
    let errors = load_and_validate_str("[vault]\nkdf_memory_cost = 4096\n")
        .expect_err("weak KDF should fail validation");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("kdf_memory_cost"))));
}
