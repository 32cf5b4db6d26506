// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller-facing vault: session control, payload encryption, entry and
//! attachment helpers, snapshots, and rotation.

use std::sync::Arc;

use keyward_config::KeywardConfig;
use keyward_core::{
    BackupMedium, EncryptedRecord, KdfParams, KeywardError, RecordId, RecordKind, RecordStore,
    SnapshotHandle, VaultStatus,
};
use secrecy::SecretString;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto::{self, SecretKey};
use crate::payload::{
    Attachment, AttachmentInfo, Entry, EntryPayload, decode_attachment, encode_attachment,
};
use crate::rotation::{RotationCoordinator, RotationReport};
use crate::session::VaultKeyManager;
use crate::snapshot::SnapshotManager;

/// Knobs taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultOptions {
    /// Argon2id cost for new salts (init and rotation).
    pub kdf: KdfParams,
    /// Snapshot before every single-record mutation.
    pub snapshot_before_every_write: bool,
}

impl From<&KeywardConfig> for VaultOptions {
    fn from(config: &KeywardConfig) -> Self {
        Self {
            kdf: config.vault.kdf_params(),
            snapshot_before_every_write: config.snapshot.before_every_write,
        }
    }
}

/// An encrypted credential vault over a [`RecordStore`] and [`BackupMedium`].
pub struct Vault {
    keys: Arc<VaultKeyManager>,
    store: Arc<dyn RecordStore>,
    snapshots: Arc<SnapshotManager>,
    rotation: RotationCoordinator,
    snapshot_every_write: bool,
}

impl Vault {
    pub async fn open(
        store: Arc<dyn RecordStore>,
        backup: Arc<dyn BackupMedium>,
        options: VaultOptions,
    ) -> Result<Self, KeywardError> {
        let keys = Arc::new(VaultKeyManager::open(store.clone(), options.kdf).await?);
        let snapshots = Arc::new(SnapshotManager::new(backup));
        let rotation = RotationCoordinator::new(keys.clone(), snapshots.clone());

        Ok(Self {
            keys,
            store,
            snapshots,
            rotation,
            snapshot_every_write: options.snapshot_before_every_write,
        })
    }

    pub async fn init(&self, password: &SecretString) -> Result<(), KeywardError> {
        self.keys.init(password).await
    }

    pub async fn unlock(&self, password: &SecretString) -> Result<(), KeywardError> {
        self.keys.unlock(password).await
    }

    pub async fn lock(&self) {
        self.keys.lock().await
    }

    pub async fn status(&self) -> VaultStatus {
        self.keys.status().await
    }

    /// Seal an arbitrary payload as a new entry record. Nothing is stored.
    pub async fn encrypt_payload(&self, plaintext: &[u8]) -> Result<EncryptedRecord, KeywardError> {
        let key = self.keys.session().await?;
        crypto::encrypt_record(&key, RecordId::generate(), RecordKind::Entry, plaintext)
    }

    pub async fn decrypt_payload(
        &self,
        record: &EncryptedRecord,
    ) -> Result<Zeroizing<Vec<u8>>, KeywardError> {
        let key = self.keys.session().await?;
        crypto::decrypt_record(&key, record)
    }

    /// Change the master password, re-encrypting every record atomically.
    pub async fn rotate(
        &self,
        old_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<RotationReport, KeywardError> {
        self.rotation.rotate(old_password, new_password).await
    }

    // --- entries ---

    pub async fn add_entry(&self, data: EntryPayload) -> Result<RecordId, KeywardError> {
        data.validate()?;
        let key = self.keys.session().await?;
        let record = crypto::encrypt_record(
            &key,
            RecordId::generate(),
            RecordKind::Entry,
            &data.encode()?,
        )?;
        self.before_write("add").await?;
        self.store.put(&record).await?;
        debug!(id = %record.id, "entry added");
        Ok(record.id)
    }

    pub async fn get_entry(&self, id: &RecordId) -> Result<Option<Entry>, KeywardError> {
        let key = self.keys.session().await?;
        match self.store.get(id).await? {
            Some(record) if record.kind == RecordKind::Entry => {
                Ok(Some(open_entry(&key, &record)?))
            }
            _ => Ok(None),
        }
    }

    /// Replace an entry's contents. Returns `false` if no such entry exists.
    pub async fn update_entry(
        &self,
        id: &RecordId,
        data: EntryPayload,
    ) -> Result<bool, KeywardError> {
        data.validate()?;
        let key = self.keys.session().await?;
        match self.store.get(id).await? {
            Some(existing) if existing.kind == RecordKind::Entry => {
                // Refuse to overwrite a record the current key cannot read.
                crypto::decrypt_record(&key, &existing)?;
                let record =
                    crypto::encrypt_record(&key, id.clone(), RecordKind::Entry, &data.encode()?)?;
                self.before_write("edit").await?;
                self.store.put(&record).await?;
                debug!(id = %id, "entry updated");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Every entry, decrypted. Fails on the first unreadable record.
    pub async fn list_entries(&self) -> Result<Vec<Entry>, KeywardError> {
        let key = self.keys.session().await?;
        self.store
            .list()
            .await?
            .iter()
            .filter(|record| record.kind == RecordKind::Entry)
            .map(|record| open_entry(&key, record))
            .collect()
    }

    /// Delete an entry and its attachments.
    pub async fn delete_entry(&self, id: &RecordId) -> Result<bool, KeywardError> {
        let _key = self.keys.session().await?;
        match self.store.get(id).await? {
            Some(record) if record.kind == RecordKind::Entry => {
                self.before_write("delete").await?;
                let deleted = self.store.delete(id).await?;
                debug!(id = %id, "entry deleted");
                Ok(deleted)
            }
            _ => Ok(false),
        }
    }

    // --- attachments ---

    pub async fn add_attachment(
        &self,
        entry_id: &RecordId,
        filename: &str,
        bytes: &[u8],
    ) -> Result<RecordId, KeywardError> {
        let framed = encode_attachment(filename, bytes)?;
        let key = self.keys.session().await?;
        match self.store.get(entry_id).await? {
            Some(record) if record.kind == RecordKind::Entry => {}
            _ => {
                return Err(KeywardError::InvalidInput(format!(
                    "no entry with id {entry_id}"
                )));
            }
        }

        let kind = RecordKind::Attachment {
            entry_id: entry_id.clone(),
        };
        let record = crypto::encrypt_record(&key, RecordId::generate(), kind, &framed)?;
        self.before_write("attach").await?;
        self.store.put(&record).await?;
        debug!(id = %record.id, entry_id = %entry_id, size = bytes.len(), "attachment added");
        Ok(record.id)
    }

    pub async fn get_attachment(&self, id: &RecordId) -> Result<Option<Attachment>, KeywardError> {
        let key = self.keys.session().await?;
        let Some(record) = self.store.get(id).await? else {
            return Ok(None);
        };
        let RecordKind::Attachment { entry_id } = &record.kind else {
            return Ok(None);
        };

        let plaintext = crypto::decrypt_record(&key, &record)?;
        let (filename, bytes) = decode_attachment(&plaintext)?;
        Ok(Some(Attachment {
            id: record.id.clone(),
            entry_id: entry_id.clone(),
            filename,
            bytes,
        }))
    }

    pub async fn list_attachments(
        &self,
        entry_id: &RecordId,
    ) -> Result<Vec<AttachmentInfo>, KeywardError> {
        let key = self.keys.session().await?;
        self.store
            .list_attachments(entry_id)
            .await?
            .iter()
            .map(|record| {
                let plaintext = crypto::decrypt_record(&key, record)?;
                let (filename, bytes) = decode_attachment(&plaintext)?;
                Ok(AttachmentInfo {
                    id: record.id.clone(),
                    entry_id: entry_id.clone(),
                    filename,
                    size: bytes.len(),
                })
            })
            .collect()
    }

    pub async fn delete_attachment(&self, id: &RecordId) -> Result<bool, KeywardError> {
        let _key = self.keys.session().await?;
        match self.store.get(id).await? {
            Some(record) if matches!(record.kind, RecordKind::Attachment { .. }) => {
                self.before_write("detach").await?;
                let deleted = self.store.delete(id).await?;
                debug!(id = %id, "attachment deleted");
                Ok(deleted)
            }
            _ => Ok(false),
        }
    }

    // --- snapshots ---

    pub async fn snapshot(&self, reason: &str) -> Result<SnapshotHandle, KeywardError> {
        self.snapshots.snapshot(reason).await
    }

    pub async fn list_snapshots(&self) -> Result<Vec<SnapshotHandle>, KeywardError> {
        self.snapshots.list().await
    }

    pub async fn find_snapshot(&self, id: &str) -> Result<Option<SnapshotHandle>, KeywardError> {
        self.snapshots.find(id).await
    }

    /// Copy a snapshot over the live store.
    ///
    /// The session is locked afterwards: the restored metadata may belong to
    /// a different master password.
    pub async fn restore_snapshot(&self, handle: &SnapshotHandle) -> Result<(), KeywardError> {
        let _meta_guard = self.keys.meta_guard().await;
        let mut session = self.keys.exclusive().await;

        let result = self.snapshots.restore(handle).await;
        VaultKeyManager::reload(&mut session, self.store.as_ref()).await?;
        result?;

        info!(id = %handle.id, "vault restored from snapshot, session locked");
        Ok(())
    }

    async fn before_write(&self, reason: &str) -> Result<(), KeywardError> {
        if self.snapshot_every_write {
            self.snapshots.snapshot(reason).await?;
        }
        Ok(())
    }
}

fn open_entry(key: &SecretKey, record: &EncryptedRecord) -> Result<Entry, KeywardError> {
    let plaintext = crypto::decrypt_record(key, record)?;
    Ok(Entry {
        id: record.id.clone(),
        data: EntryPayload::decode(&plaintext)?,
    })
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("keys", &self.keys)
            .field("snapshot_every_write", &self.snapshot_every_write)
            .finish_non_exhaustive()
    }
}
