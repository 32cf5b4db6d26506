// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the RecordStore trait.

use async_trait::async_trait;
use tracing::{debug, warn};

use keyward_core::{
    EncryptedRecord, KeywardError, RecordId, RecordStore, RotationCommit, VaultMeta,
};

use crate::database::Database;
use crate::queries;
use crate::queries::records::CommitOutcome;

/// SQLite-backed record store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    db: Database,
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn load_meta(&self) -> Result<Option<VaultMeta>, KeywardError> {
        queries::meta::load_meta(&self.db).await
    }

    async fn init_meta(&self, meta: &VaultMeta) -> Result<(), KeywardError> {
        if !queries::meta::insert_meta(&self.db, meta).await? {
            return Err(KeywardError::AlreadyInitialized);
        }
        debug!("vault metadata stored");
        Ok(())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<EncryptedRecord>, KeywardError> {
        queries::records::get_record(&self.db, id).await
    }

    async fn put(&self, record: &EncryptedRecord) -> Result<(), KeywardError> {
        queries::records::upsert_record(&self.db, record).await
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, KeywardError> {
        queries::records::delete_record(&self.db, id).await
    }

    async fn list(&self) -> Result<Vec<EncryptedRecord>, KeywardError> {
        queries::records::list_records(&self.db, None).await
    }

    async fn list_attachments(
        &self,
        entry_id: &RecordId,
    ) -> Result<Vec<EncryptedRecord>, KeywardError> {
        queries::records::list_records(&self.db, Some(entry_id)).await
    }

    async fn atomic_commit(&self, commit: &RotationCommit) -> Result<(), KeywardError> {
        match queries::records::commit_rotation(&self.db, commit).await? {
            CommitOutcome::Committed => {
                debug!(
                    generation = commit.meta.generation,
                    records = commit.records.len(),
                    "rotation committed"
                );
                // Already committed; a failed checkpoint is not a failed commit.
                if let Err(e) = self.db.checkpoint().await {
                    warn!(error = %e, "checkpoint after rotation commit failed");
                }
                Ok(())
            }
            CommitOutcome::NotInitialized => Err(KeywardError::NotInitialized),
            CommitOutcome::StaleGeneration { found } => {
                warn!(
                    found,
                    expected = commit.expected_generation,
                    "stale rotation commit rejected"
                );
                Err(KeywardError::storage(format!(
                    "stale rotation: store generation {found}, expected {}",
                    commit.expected_generation
                )))
            }
            CommitOutcome::IdSetMismatch => Err(KeywardError::storage(
                "rotation commit does not cover exactly the stored records",
            )),
            CommitOutcome::KindChanged { id } => Err(KeywardError::storage(format!(
                "rotation commit changes the kind of record {id}"
            ))),
        }
    }
}
