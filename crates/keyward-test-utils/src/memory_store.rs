// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory `RecordStore`.
//!
//! Mirrors the SQLite store's contract: attachment cascade on entry delete,
//! and an `atomic_commit` that validates generation and id-set completeness
//! before swapping state in one step.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use keyward_core::{
    EncryptedRecord, KeywardError, RecordId, RecordKind, RecordStore, RotationCommit, VaultMeta,
};

use crate::faults::Faults;

/// Full store contents, cloneable for snapshots.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub meta: Option<VaultMeta>,
    pub records: BTreeMap<RecordId, EncryptedRecord>,
}

/// A `RecordStore` backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    faults: Faults,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    /// Copy of the current contents.
    pub fn dump(&self) -> StoreState {
        self.state().clone()
    }

    /// Replace the contents wholesale.
    pub fn replace(&self, state: StoreState) {
        *self.state() = state;
    }

    /// Flip one ciphertext bit of a stored record, bypassing the vault.
    ///
    /// Returns `false` if the record does not exist or has an empty ciphertext.
    pub fn corrupt(&self, id: &RecordId) -> bool {
        let mut state = self.state();
        match state.records.get_mut(id) {
            Some(record) if !record.ciphertext.is_empty() => {
                record.ciphertext[0] ^= 0x01;
                true
            }
            _ => false,
        }
    }

    pub fn record_count(&self) -> usize {
        self.state().records.len()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load_meta(&self) -> Result<Option<VaultMeta>, KeywardError> {
        Ok(self.state().meta.clone())
    }

    async fn init_meta(&self, meta: &VaultMeta) -> Result<(), KeywardError> {
        let mut state = self.state();
        if state.meta.is_some() {
            return Err(KeywardError::AlreadyInitialized);
        }
        state.meta = Some(meta.clone());
        Ok(())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<EncryptedRecord>, KeywardError> {
        Ok(self.state().records.get(id).cloned())
    }

    async fn put(&self, record: &EncryptedRecord) -> Result<(), KeywardError> {
        self.faults.check_put()?;
        let mut state = self.state();
        if let RecordKind::Attachment { entry_id } = &record.kind
            && !state.records.contains_key(entry_id)
        {
            return Err(KeywardError::storage(format!(
                "attachment references missing entry {entry_id}"
            )));
        }
        state.records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, KeywardError> {
        let mut state = self.state();
        if state.records.remove(id).is_none() {
            return Ok(false);
        }
        state
            .records
            .retain(|_, record| record.kind.entry_id() != Some(id));
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<EncryptedRecord>, KeywardError> {
        Ok(self.state().records.values().cloned().collect())
    }

    async fn list_attachments(
        &self,
        entry_id: &RecordId,
    ) -> Result<Vec<EncryptedRecord>, KeywardError> {
        Ok(self
            .state()
            .records
            .values()
            .filter(|record| record.kind.entry_id() == Some(entry_id))
            .cloned()
            .collect())
    }

    async fn atomic_commit(&self, commit: &RotationCommit) -> Result<(), KeywardError> {
        let mut state = self.state();

        let current = state
            .meta
            .as_ref()
            .map(|meta| meta.generation)
            .ok_or(KeywardError::NotInitialized)?;
        if current != commit.expected_generation {
            return Err(KeywardError::storage(format!(
                "stale rotation: store generation {current}, expected {}",
                commit.expected_generation
            )));
        }

        let live: BTreeSet<&RecordId> = state.records.keys().collect();
        let staged: BTreeSet<&RecordId> = commit.records.iter().map(|r| &r.id).collect();
        if live != staged || staged.len() != commit.records.len() {
            return Err(KeywardError::storage(
                "rotation commit does not cover exactly the stored records",
            ));
        }

        if let Some(changed) = commit
            .records
            .iter()
            .find(|r| state.records.get(&r.id).is_some_and(|live| live.kind != r.kind))
        {
            return Err(KeywardError::storage(format!(
                "rotation commit changes the kind of record {}",
                changed.id
            )));
        }

        self.faults.check_commit()?;

        state.meta = Some(commit.meta.clone());
        state.records = commit
            .records
            .iter()
            .map(|record| (record.id.clone(), record.clone()))
            .collect();
        Ok(())
    }
}
