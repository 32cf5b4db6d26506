// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent keyed store for vault metadata and encrypted records.

use async_trait::async_trait;

use crate::error::KeywardError;
use crate::types::{EncryptedRecord, RecordId, RotationCommit, VaultMeta};

/// Keyed persistence for encrypted records plus the vault key metadata.
///
/// Implementations only ever see ciphertext. Every method maps backend
/// failures to [`KeywardError::Storage`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns the stored key metadata, or `None` for an uninitialized vault.
    async fn load_meta(&self) -> Result<Option<VaultMeta>, KeywardError>;

    /// Persists the initial key metadata.
    ///
    /// Fails with [`KeywardError::AlreadyInitialized`] if metadata already exists.
    async fn init_meta(&self, meta: &VaultMeta) -> Result<(), KeywardError>;

    /// Fetches one record by id.
    async fn get(&self, id: &RecordId) -> Result<Option<EncryptedRecord>, KeywardError>;

    /// Inserts or replaces a record.
    async fn put(&self, record: &EncryptedRecord) -> Result<(), KeywardError>;

    /// Deletes a record and, for entries, every attachment linked to it.
    ///
    /// Returns `false` if no record had this id.
    async fn delete(&self, id: &RecordId) -> Result<bool, KeywardError>;

    /// Lists every record (entries and attachments).
    async fn list(&self) -> Result<Vec<EncryptedRecord>, KeywardError>;

    /// Lists the attachments linked to one entry.
    async fn list_attachments(
        &self,
        entry_id: &RecordId,
    ) -> Result<Vec<EncryptedRecord>, KeywardError>;

    /// Applies a rotation as one indivisible write.
    ///
    /// The commit must carry exactly the set of record ids currently stored,
    /// each record must keep its stored kind and owning entry,
    /// and the stored generation must equal `commit.expected_generation`.
    /// Otherwise nothing is written and an error is returned. After a failure
    /// no part of the commit may be observable.
    async fn atomic_commit(&self, commit: &RotationCommit) -> Result<(), KeywardError>;
}
