// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault key metadata (single row).

use keyward_core::{KdfParams, KeywardError, Salt, VaultMeta, VerificationValue};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Raw `vault_meta` row, before validation.
pub(crate) struct MetaRow {
    pub salt: Vec<u8>,
    pub verification: Vec<u8>,
    pub memory_cost: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub generation: i64,
}

impl MetaRow {
    pub(crate) fn from_meta(meta: &VaultMeta) -> Result<Self, KeywardError> {
        Ok(Self {
            salt: meta.salt.as_bytes().to_vec(),
            verification: meta.verification.as_bytes().to_vec(),
            memory_cost: meta.kdf.memory_cost_kib,
            iterations: meta.kdf.iterations,
            parallelism: meta.kdf.parallelism,
            generation: i64::try_from(meta.generation).map_err(|_| {
                KeywardError::InvalidInput(format!("generation {} out of range", meta.generation))
            })?,
        })
    }

    fn into_meta(self) -> Result<VaultMeta, KeywardError> {
        let generation = u64::try_from(self.generation).map_err(|_| {
            KeywardError::storage(format!("corrupt vault_meta: generation {}", self.generation))
        })?;
        Ok(VaultMeta {
            salt: Salt::from_bytes(self.salt)?,
            verification: VerificationValue::from_slice(&self.verification)?,
            kdf: KdfParams {
                memory_cost_kib: self.memory_cost,
                iterations: self.iterations,
                parallelism: self.parallelism,
            },
            generation,
        })
    }
}

pub(crate) const SELECT_GENERATION: &str = "SELECT generation FROM vault_meta WHERE id = 1";

pub(crate) const UPDATE_META: &str =
    "UPDATE vault_meta SET salt = ?1, verification = ?2, kdf_memory_cost = ?3,
            kdf_iterations = ?4, kdf_parallelism = ?5, generation = ?6,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
     WHERE id = 1";

/// Load the metadata row, if the vault has been initialized.
pub async fn load_meta(db: &Database) -> Result<Option<VaultMeta>, KeywardError> {
    let row = db
        .connection()
        .call(|conn| -> Result<Option<MetaRow>, rusqlite::Error> {
            conn.query_row(
                "SELECT salt, verification, kdf_memory_cost, kdf_iterations, kdf_parallelism, generation
                 FROM vault_meta WHERE id = 1",
                [],
                |row| {
                    Ok(MetaRow {
                        salt: row.get(0)?,
                        verification: row.get(1)?,
                        memory_cost: row.get(2)?,
                        iterations: row.get(3)?,
                        parallelism: row.get(4)?,
                        generation: row.get(5)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    row.map(MetaRow::into_meta).transpose()
}

/// Insert the initial metadata row. Returns `false` if a row already exists.
pub async fn insert_meta(db: &Database, meta: &VaultMeta) -> Result<bool, KeywardError> {
    let row = MetaRow::from_meta(meta)?;
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO vault_meta
                    (id, salt, verification, kdf_memory_cost, kdf_iterations, kdf_parallelism, generation)
                 VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.salt,
                    row.verification,
                    row.memory_cost,
                    row.iterations,
                    row.parallelism,
                    row.generation,
                ],
            )?;
            Ok(inserted == 1)
        })
        .await
        .map_err(map_tr_err)
}
