// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory `BackupMedium` over a [`MemoryStore`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use keyward_core::{BackupMedium, KeywardError, SnapshotHandle};

use crate::faults::Faults;
use crate::memory_store::{MemoryStore, StoreState};

/// Keeps full copies of a [`MemoryStore`] keyed by snapshot id.
#[derive(Debug)]
pub struct MemoryBackup {
    store: Arc<MemoryStore>,
    snapshots: Mutex<Vec<(SnapshotHandle, StoreState)>>,
    faults: Faults,
}

impl MemoryBackup {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            snapshots: Mutex::new(Vec::new()),
            faults: Faults::default(),
        }
    }

    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots().len()
    }

    fn snapshots(&self) -> MutexGuard<'_, Vec<(SnapshotHandle, StoreState)>> {
        self.snapshots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BackupMedium for MemoryBackup {
    async fn duplicate(&self, name: &str) -> Result<SnapshotHandle, KeywardError> {
        self.faults.check_duplicate()?;
        let handle = SnapshotHandle {
            id: name.to_string(),
            location: format!("memory://{name}"),
            created_at: Utc::now(),
        };
        self.snapshots().push((handle.clone(), self.store.dump()));
        Ok(handle)
    }

    async fn restore(&self, handle: &SnapshotHandle) -> Result<(), KeywardError> {
        let state = self
            .snapshots()
            .iter()
            .find(|(h, _)| h.id == handle.id)
            .map(|(_, state)| state.clone())
            .ok_or_else(|| KeywardError::storage(format!("unknown snapshot {}", handle.id)))?;
        self.store.replace(state);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SnapshotHandle>, KeywardError> {
        Ok(self.snapshots().iter().map(|(h, _)| h.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyward_core::{EncryptedRecord, RecordId, RecordKind, RecordStore};

    #[tokio::test]
    async fn restore_returns_store_to_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let backup = MemoryBackup::new(store.clone());
        let record = EncryptedRecord {
            id: RecordId::from("e1"),
            kind: RecordKind::Entry,
            nonce: [0u8; 12],
            ciphertext: vec![9],
            tag: [0u8; 16],
        };

        let handle = backup.duplicate("empty").await.unwrap();
        store.put(&record).await.unwrap();
        assert_eq!(store.record_count(), 1);

        backup.restore(&handle).await.unwrap();
        assert_eq!(store.record_count(), 0);
    }

    #[tokio::test]
    async fn failed_duplicate_is_not_listed() {
        let backup = MemoryBackup::new(Arc::new(MemoryStore::new()));
        backup.faults().fail_duplicate(true);
        assert!(backup.duplicate("x").await.is_err());
        assert!(backup.list().await.unwrap().is_empty());
    }
}
