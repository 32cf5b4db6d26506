// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault over the real SQLite store and snapshot backend.

use std::sync::Arc;

use keyward_storage::{Database, SqliteBackup, SqliteRecordStore};
use keyward_test_utils::test_kdf_params;
use keyward_vault::{EntryPayload, Vault, VaultOptions};
use secrecy::SecretString;
use tempfile::TempDir;

async fn open_vault(dir: &TempDir) -> Vault {
    let db = Database::open(dir.path().join("keyward.db"), true)
        .await
        .unwrap();
    let backup = SqliteBackup::new(db.clone(), dir.path().join("snapshots"));
    Vault::open(
        Arc::new(SqliteRecordStore::new(db)),
        Arc::new(backup),
        VaultOptions {
            kdf: test_kdf_params(),
            snapshot_before_every_write: false,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn rotation_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let id = {
        let vault = open_vault(&dir).await;
        vault.init(&SecretString::from("m1")).await.unwrap();
        let id = vault
            .add_entry(EntryPayload::new("github", "alice", "p@ss"))
            .await
            .unwrap();
        vault
            .add_attachment(&id, "notes.txt", b"backup codes")
            .await
            .unwrap();

        let report = vault
            .rotate(&SecretString::from("m1"), &SecretString::from("m2"))
            .await
            .unwrap();
        assert_eq!(report.records, 2);
        assert!(std::path::Path::new(&report.snapshot.location).exists());
        id
    };

    let vault = open_vault(&dir).await;
    assert!(vault.status().await.initialized);
    assert!(!vault.status().await.unlocked);
    assert!(vault.unlock(&SecretString::from("m1")).await.is_err());
    vault.unlock(&SecretString::from("m2")).await.unwrap();

    let entry = vault.get_entry(&id).await.unwrap().unwrap();
    assert_eq!(entry.data.password, "p@ss");
    let attachments = vault.list_attachments(&id).await.unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].filename, "notes.txt");
}

#[tokio::test]
async fn restoring_pre_rotation_snapshot_brings_back_old_password() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(&dir).await;
    vault.init(&SecretString::from("m1")).await.unwrap();
    vault
        .add_entry(EntryPayload::new("github", "alice", "p@ss"))
        .await
        .unwrap();

    let report = vault
        .rotate(&SecretString::from("m1"), &SecretString::from("m2"))
        .await
        .unwrap();
    vault.restore_snapshot(&report.snapshot).await.unwrap();

    vault.unlock(&SecretString::from("m1")).await.unwrap();
    assert_eq!(vault.list_entries().await.unwrap().len(), 1);
}
