// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring from configuration to an opened vault.

use std::sync::Arc;

use keyward_config::KeywardConfig;
use keyward_core::KeywardError;
use keyward_storage::{Database, SqliteBackup, SqliteRecordStore};
use keyward_vault::{Vault, VaultOptions};
use tracing::debug;

/// Everything a command needs: the vault plus direct access to the
/// snapshot directory for pruning.
pub struct App {
    pub vault: Vault,
    pub backup: SqliteBackup,
}

impl App {
    pub async fn open(config: &KeywardConfig) -> Result<Self, KeywardError> {
        let db = Database::from_config(&config.storage).await?;
        let backup = SqliteBackup::new(db.clone(), &config.snapshot.directory);
        let vault = Vault::open(
            Arc::new(SqliteRecordStore::new(db)),
            Arc::new(backup.clone()),
            VaultOptions::from(config),
        )
        .await?;
        debug!(
            database = %config.storage.database_path,
            snapshots = %config.snapshot.directory,
            "vault opened"
        );
        Ok(Self { vault, backup })
    }

    /// Unlock with the master password from the environment or a prompt.
    pub async fn unlock(&self) -> Result<(), KeywardError> {
        let password = keyward_vault::get_master_password()?;
        self.vault.unlock(&password).await
    }
}
