// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master password rotation.
//!
//! Rotation verifies the old password, decrypts every record (entries and
//! attachments), derives a new key under a fresh salt, re-encrypts every
//! plaintext with fresh nonces, snapshots the store, and hands the whole
//! result to [`RecordStore::atomic_commit`](keyward_core::RecordStore::atomic_commit).
//! Nothing reaches the store before that commit, so any failure leaves the
//! vault readable with the old password.

use std::sync::Arc;

use keyward_core::{
    EncryptedRecord, KeywardError, RotationCommit, RotationStage, SnapshotHandle, VaultMeta,
};
use secrecy::SecretString;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::crypto::{self, SecretKey};
use crate::kdf;
use crate::session::{SessionState, VaultKeyManager};
use crate::snapshot::SnapshotManager;

/// Outcome of a committed rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationReport {
    /// Snapshot taken immediately before the commit.
    pub snapshot: SnapshotHandle,
    /// Number of records re-encrypted (entries plus attachments).
    pub records: usize,
    /// Metadata generation after the commit.
    pub generation: u64,
}

/// Drives one rotation end to end.
pub struct RotationCoordinator {
    keys: Arc<VaultKeyManager>,
    snapshots: Arc<SnapshotManager>,
}

impl RotationCoordinator {
    pub fn new(keys: Arc<VaultKeyManager>, snapshots: Arc<SnapshotManager>) -> Self {
        Self { keys, snapshots }
    }

    /// Replace the master password.
    ///
    /// Holds the session write guard throughout, so no record operation runs
    /// while records are read, re-encrypted, and committed. A Locked session
    /// stays Locked; an Unlocked one switches to the new key.
    pub async fn rotate(
        &self,
        old_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<RotationReport, KeywardError> {
        let _meta_guard = self.keys.meta_guard().await;
        let mut session = self.keys.exclusive().await;
        let store = self.keys.store().clone();

        let meta = store
            .load_meta()
            .await?
            .ok_or(KeywardError::NotInitialized)?;
        let old = self.keys.verify(&meta, old_password).await?;
        info!(generation = meta.generation, "rotation started");

        let records = store
            .list()
            .await
            .map_err(|e| e.abort_rotation(RotationStage::Decrypt))?;
        let plaintexts = decrypt_all(&old.key, &records)
            .map_err(|e| e.abort_rotation(RotationStage::Decrypt))?;
        debug!(records = plaintexts.len(), "records decrypted");

        let params = self.keys.kdf_params();
        let salt = kdf::generate_salt().map_err(|e| e.abort_rotation(RotationStage::Derive))?;
        let new = kdf::derive_blocking(new_password.clone(), salt.clone(), params)
            .await
            .map_err(|e| e.abort_rotation(RotationStage::Derive))?;

        let reencrypted = encrypt_all(&new.key, &records, &plaintexts)
            .map_err(|e| e.abort_rotation(RotationStage::Encrypt))?;
        drop(plaintexts);

        let snapshot = self
            .snapshots
            .snapshot("pre-rotate")
            .await
            .map_err(|e| e.abort_rotation(RotationStage::Snapshot))?;

        let commit = RotationCommit {
            meta: VaultMeta {
                salt,
                verification: new.verification,
                kdf: params,
                generation: meta.generation + 1,
            },
            expected_generation: meta.generation,
            records: reencrypted,
        };
        if let Err(e) = store.atomic_commit(&commit).await {
            warn!(error = %e, "rotation commit failed, vault unchanged");
            return Err(e.abort_rotation(RotationStage::Commit));
        }

        if matches!(*session, SessionState::Unlocked(_)) {
            *session = SessionState::Unlocked(new.key);
        }
        info!(
            generation = commit.meta.generation,
            records = commit.records.len(),
            snapshot = %snapshot.id,
            "rotation committed"
        );

        Ok(RotationReport {
            snapshot,
            records: commit.records.len(),
            generation: commit.meta.generation,
        })
    }
}

fn decrypt_all(
    key: &SecretKey,
    records: &[EncryptedRecord],
) -> Result<Vec<Zeroizing<Vec<u8>>>, KeywardError> {
    records
        .iter()
        .map(|record| {
            crypto::decrypt_record(key, record).inspect_err(|_| {
                warn!(id = %record.id, kind = record.kind.label(), "record failed to decrypt");
            })
        })
        .collect()
}

fn encrypt_all(
    key: &SecretKey,
    records: &[EncryptedRecord],
    plaintexts: &[Zeroizing<Vec<u8>>],
) -> Result<Vec<EncryptedRecord>, KeywardError> {
    records
        .iter()
        .zip(plaintexts)
        .map(|(record, plaintext)| {
            crypto::encrypt_record(key, record.id.clone(), record.kind.clone(), plaintext)
        })
        .collect()
}
