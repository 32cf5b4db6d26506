// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot backend using SQLite's online backup API.
//!
//! Copies run on the database's own connection thread, so a snapshot is a
//! consistent image of every committed write and never interleaves with one.
//! Snapshots are SQLite files named `<id>.db` in the snapshot directory,
//! made read-only once written.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info, warn};

use keyward_core::{BackupMedium, KeywardError, SnapshotHandle};

use crate::database::{Database, map_tr_err};

const SNAPSHOT_EXT: &str = "db";

/// Copies the live database into a snapshot directory and back.
#[derive(Debug, Clone)]
pub struct SqliteBackup {
    db: Database,
    directory: PathBuf,
}

impl SqliteBackup {
    pub fn new(db: Database, directory: impl Into<PathBuf>) -> Self {
        Self {
            db,
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Delete all but the newest `keep` snapshots. Returns the removed handles.
    pub async fn prune(&self, keep: usize) -> Result<Vec<SnapshotHandle>, KeywardError> {
        let snapshots = self.list().await?;
        let excess = snapshots.len().saturating_sub(keep);
        let removed: Vec<SnapshotHandle> = snapshots.into_iter().take(excess).collect();

        for handle in &removed {
            tokio::fs::remove_file(&handle.location)
                .await
                .map_err(KeywardError::storage)?;
            debug!(id = %handle.id, "snapshot pruned");
        }
        if !removed.is_empty() {
            info!(removed = removed.len(), kept = keep, "snapshots pruned");
        }
        Ok(removed)
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.{SNAPSHOT_EXT}"))
    }
}

#[async_trait]
impl BackupMedium for SqliteBackup {
    async fn duplicate(&self, name: &str) -> Result<SnapshotHandle, KeywardError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(KeywardError::InvalidInput(format!(
                "invalid snapshot name '{name}'"
            )));
        }
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(KeywardError::storage)?;

        let path = self.snapshot_path(name);
        if tokio::fs::try_exists(&path)
            .await
            .map_err(KeywardError::storage)?
        {
            return Err(KeywardError::storage(format!(
                "snapshot already exists: {}",
                path.display()
            )));
        }

        let target = path.clone();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let mut dst = Connection::open(&target)?;
                let backup = rusqlite::backup::Backup::new(conn, &mut dst)?;
                backup.run_to_completion(100, Duration::from_millis(10), None)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        // Snapshots are immutable once written.
        let mut permissions = tokio::fs::metadata(&path)
            .await
            .map_err(KeywardError::storage)?
            .permissions();
        permissions.set_readonly(true);
        tokio::fs::set_permissions(&path, permissions)
            .await
            .map_err(KeywardError::storage)?;

        let handle = SnapshotHandle {
            id: name.to_string(),
            location: path.display().to_string(),
            created_at: Utc::now(),
        };
        debug!(id = %handle.id, location = %handle.location, "snapshot written");
        Ok(handle)
    }

    async fn restore(&self, handle: &SnapshotHandle) -> Result<(), KeywardError> {
        let source = PathBuf::from(&handle.location);
        if !tokio::fs::try_exists(&source)
            .await
            .map_err(KeywardError::storage)?
        {
            return Err(KeywardError::storage(format!(
                "snapshot not found: {}",
                source.display()
            )));
        }

        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let src = Connection::open_with_flags(&source, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
                // Reject files that are not SQLite databases before touching the live store.
                let _tables: i64 =
                    src.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get(0))?;
                let backup = rusqlite::backup::Backup::new(&src, conn)?;
                backup.run_to_completion(100, Duration::from_millis(10), None)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        if let Err(e) = self.db.checkpoint().await {
            warn!(error = %e, "checkpoint after restore failed");
        }
        info!(id = %handle.id, "database restored from snapshot");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SnapshotHandle>, KeywardError> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(KeywardError::storage(e)),
        };

        let mut handles = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(KeywardError::storage)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXT) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let modified = entry
                .metadata()
                .await
                .and_then(|m| m.modified())
                .map_err(KeywardError::storage)?;

            handles.push(SnapshotHandle {
                id: id.to_string(),
                location: path.display().to_string(),
                created_at: DateTime::<Utc>::from(modified),
            });
        }

        // Names start with a UTC timestamp, so id order is creation order.
        handles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyward_core::{EncryptedRecord, RecordId, RecordKind, RecordStore};

    use crate::SqliteRecordStore;

    fn record(id: &str) -> EncryptedRecord {
        EncryptedRecord {
            id: RecordId::from(id),
            kind: RecordKind::Entry,
            nonce: [1u8; 12],
            ciphertext: vec![1, 2, 3],
            tag: [2u8; 16],
        }
    }

    async fn setup(dir: &Path) -> (SqliteRecordStore, SqliteBackup) {
        let db = Database::open(dir.join("vault.db"), true).await.unwrap();
        let backup = SqliteBackup::new(db.clone(), dir.join("snapshots"));
        (SqliteRecordStore::new(db), backup)
    }

    #[tokio::test]
    async fn duplicate_then_restore_rolls_back_changes() {
        let dir = tempfile::tempdir().unwrap();
        let (store, backup) = setup(dir.path()).await;
        store.put(&record("keep")).await.unwrap();

        let handle = backup.duplicate("vault_20260101T000000000Z_test").await.unwrap();
        let permissions = std::fs::metadata(&handle.location).unwrap().permissions();
        assert!(permissions.readonly());

        store.put(&record("later")).await.unwrap();
        store.delete(&RecordId::from("keep")).await.unwrap();

        backup.restore(&handle).await.unwrap();
        let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec!["keep"]);

        let wal = dir.path().join("vault.db-wal");
        assert_eq!(std::fs::metadata(&wal).map(|m| m.len()).unwrap_or(0), 0);
    }

    #[tokio::test]
    async fn duplicate_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let (_, backup) = setup(dir.path()).await;
        backup.duplicate("snap").await.unwrap();
        assert!(backup.duplicate("snap").await.is_err());
    }

    #[tokio::test]
    async fn path_like_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (_, backup) = setup(dir.path()).await;
        assert!(matches!(
            backup.duplicate("../escape").await.unwrap_err(),
            KeywardError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn list_is_sorted_and_prune_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let (_, backup) = setup(dir.path()).await;
        assert!(backup.list().await.unwrap().is_empty());

        for name in ["vault_3", "vault_1", "vault_2"] {
            backup.duplicate(name).await.unwrap();
        }
        let ids: Vec<String> = backup.list().await.unwrap().into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["vault_1", "vault_2", "vault_3"]);

        let removed = backup.prune(1).await.unwrap();
        assert_eq!(removed.len(), 2);
        let ids: Vec<String> = backup.list().await.unwrap().into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["vault_3"]);

        assert!(backup.prune(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn restore_of_missing_snapshot_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (_, backup) = setup(dir.path()).await;
        let handle = SnapshotHandle {
            id: "ghost".into(),
            location: dir.path().join("ghost.db").display().to_string(),
            created_at: Utc::now(),
        };
        assert!(matches!(
            backup.restore(&handle).await.unwrap_err(),
            KeywardError::Storage { .. }
        ));
    }
}
