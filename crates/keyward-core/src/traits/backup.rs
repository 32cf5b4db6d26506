// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backup medium used to take point-in-time snapshots of the store.

use async_trait::async_trait;

use crate::error::KeywardError;
use crate::types::SnapshotHandle;

/// Duplicates the store's persisted bytes to named locations and back.
#[async_trait]
pub trait BackupMedium: Send + Sync {
    /// Copies the current persisted state to a new location called `name`.
    ///
    /// Must not return until the copy is complete and durable.
    async fn duplicate(&self, name: &str) -> Result<SnapshotHandle, KeywardError>;

    /// Overwrites the live store with the copy identified by `handle`.
    async fn restore(&self, handle: &SnapshotHandle) -> Result<(), KeywardError>;

    /// Lists known snapshots, oldest first.
    async fn list(&self) -> Result<Vec<SnapshotHandle>, KeywardError>;
}
