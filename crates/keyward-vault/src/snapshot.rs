// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Point-in-time snapshots of the persistent store.

use std::sync::Arc;

use chrono::Utc;
use keyward_core::{BackupMedium, KeywardError, SnapshotHandle};
use tracing::{info, warn};

/// Takes, lists, and restores snapshots through a [`BackupMedium`].
pub struct SnapshotManager {
    medium: Arc<dyn BackupMedium>,
}

impl SnapshotManager {
    pub fn new(medium: Arc<dyn BackupMedium>) -> Self {
        Self { medium }
    }

    /// Duplicate the store under a new timestamped name.
    ///
    /// `reason` is folded into the name (`vault_<utc>_<reason>_<suffix>`).
    /// Returns only once the medium reports the copy durable.
    pub async fn snapshot(&self, reason: &str) -> Result<SnapshotHandle, KeywardError> {
        let name = snapshot_name(reason);
        match self.medium.duplicate(&name).await {
            Ok(handle) => {
                info!(id = %handle.id, reason, "snapshot taken");
                Ok(handle)
            }
            Err(e) => {
                warn!(reason, error = %e, "snapshot failed");
                Err(e)
            }
        }
    }

    /// Copy a snapshot back over the live store.
    pub async fn restore(&self, handle: &SnapshotHandle) -> Result<(), KeywardError> {
        self.medium.restore(handle).await?;
        info!(id = %handle.id, "snapshot restored");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<SnapshotHandle>, KeywardError> {
        self.medium.list().await
    }

    /// Look up a snapshot by id.
    pub async fn find(&self, id: &str) -> Result<Option<SnapshotHandle>, KeywardError> {
        Ok(self.list().await?.into_iter().find(|h| h.id == id))
    }
}

fn snapshot_name(reason: &str) -> String {
    let reason: String = reason
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "vault_{}_{reason}_{}",
        Utc::now().format("%Y%m%dT%H%M%S%3fZ"),
        &suffix[..8]
    )
}
