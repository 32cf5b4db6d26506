// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Keyward vault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! at startup instead of being silently ignored.

use keyward_core::KdfParams;
use serde::{Deserialize, Serialize};

/// Top-level Keyward configuration.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeywardConfig {
    /// Key derivation settings for new vaults and rotations.
    #[serde(default)]
    pub vault: VaultConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Pre-write snapshot settings.
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Argon2id parameters used when a vault is created or its password rotated.
///
/// The defaults cost roughly one second per derivation on current hardware.
///
/// Existing vaults keep the parameters they were created with; these values
/// only apply to newly derived key material.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Argon2id memory cost in KiB (default: 204800 = 200 MiB).
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id iteration count (default: 6).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id parallelism lanes (default: 4).
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl VaultConfig {
    /// The configured cost parameters in the form persisted with a vault.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            memory_cost_kib: self.kdf_memory_cost,
            iterations: self.kdf_iterations,
            parallelism: self.kdf_parallelism,
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

fn default_kdf_memory_cost() -> u32 {
    204800
}

fn default_kdf_iterations() -> u32 {
    6
}

fn default_kdf_parallelism() -> u32 {
    4
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    data_dir().join("keyward.db").to_string_lossy().into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Snapshot configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotConfig {
    /// Directory that receives timestamped copies of the database.
    #[serde(default = "default_snapshot_directory")]
    pub directory: String,

    /// Snapshot before every single-record write, not only before rotation.
    #[serde(default)]
    pub before_every_write: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            directory: default_snapshot_directory(),
            before_every_write: false,
        }
    }
}

fn default_snapshot_directory() -> String {
    data_dir().join("snapshots").to_string_lossy().into_owned()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Log level for keyward crates (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn data_dir() -> std::path::PathBuf {
    dirs::data_dir()
        .map(|p| p.join("keyward"))
        .unwrap_or_else(|| std::path::PathBuf::from("."))
}
