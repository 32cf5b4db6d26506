// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted record CRUD and the rotation commit.

use std::collections::{BTreeMap, BTreeSet};

use keyward_core::types::{NONCE_LEN, TAG_LEN};
use keyward_core::{EncryptedRecord, KeywardError, RecordId, RecordKind, RotationCommit};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::queries::meta::{MetaRow, SELECT_GENERATION, UPDATE_META};

const SELECT_RECORD: &str = "SELECT id, kind, entry_id, nonce, ciphertext, tag FROM records";

fn blob_array<const N: usize>(row: &Row<'_>, idx: usize) -> rusqlite::Result<[u8; N]> {
    let bytes: Vec<u8> = row.get(idx)?;
    bytes.as_slice().try_into().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Blob,
            format!("expected {N} bytes, found {}", bytes.len()).into(),
        )
    })
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<EncryptedRecord> {
    let kind_label: String = row.get(1)?;
    let entry_id: Option<String> = row.get(2)?;
    let kind = match (kind_label.as_str(), entry_id) {
        ("entry", None) => RecordKind::Entry,
        ("attachment", Some(entry_id)) => RecordKind::Attachment {
            entry_id: RecordId(entry_id),
        },
        (other, _) => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                1,
                Type::Text,
                format!("invalid record kind '{other}'").into(),
            ));
        }
    };

    Ok(EncryptedRecord {
        id: RecordId(row.get(0)?),
        kind,
        nonce: blob_array::<NONCE_LEN>(row, 3)?,
        ciphertext: row.get(4)?,
        tag: blob_array::<TAG_LEN>(row, 5)?,
    })
}

/// Get a record by id.
pub async fn get_record(
    db: &Database,
    id: &RecordId,
) -> Result<Option<EncryptedRecord>, KeywardError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<EncryptedRecord>, rusqlite::Error> {
            conn.query_row(
                &format!("{SELECT_RECORD} WHERE id = ?1"),
                params![id],
                row_to_record,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or update a record in place.
///
/// Uses an upsert rather than `INSERT OR REPLACE`: a replace deletes the old
/// row first, which would cascade to the entry's attachments.
pub async fn upsert_record(db: &Database, record: &EncryptedRecord) -> Result<(), KeywardError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO records (id, kind, entry_id, nonce, ciphertext, tag)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    kind = excluded.kind,
                    entry_id = excluded.entry_id,
                    nonce = excluded.nonce,
                    ciphertext = excluded.ciphertext,
                    tag = excluded.tag,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    record.id.0,
                    record.kind.label(),
                    record.kind.entry_id().map(RecordId::as_str),
                    &record.nonce[..],
                    record.ciphertext,
                    &record.tag[..],
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a record; foreign keys cascade to its attachments.
pub async fn delete_record(db: &Database, id: &RecordId) -> Result<bool, KeywardError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let deleted = conn.execute("DELETE FROM records WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// List records, optionally only the attachments of one entry.
pub async fn list_records(
    db: &Database,
    entry_id: Option<&RecordId>,
) -> Result<Vec<EncryptedRecord>, KeywardError> {
    let entry_id = entry_id.map(|id| id.0.clone());
    db.connection()
        .call(move |conn| -> Result<Vec<EncryptedRecord>, rusqlite::Error> {
            match &entry_id {
                Some(entry_id) => {
                    let mut stmt = conn.prepare(&format!(
                        "{SELECT_RECORD} WHERE entry_id = ?1 ORDER BY created_at, id"
                    ))?;
                    let rows = stmt.query_map(params![entry_id], row_to_record)?;
                    rows.collect()
                }
                None => {
                    let mut stmt =
                        conn.prepare(&format!("{SELECT_RECORD} ORDER BY created_at, id"))?;
                    let rows = stmt.query_map([], row_to_record)?;
                    rows.collect()
                }
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Result of a staged rotation commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    NotInitialized,
    StaleGeneration { found: i64 },
    IdSetMismatch,
    KindChanged { id: String },
}

/// Validate and apply a rotation in one transaction.
///
/// Anything other than [`CommitOutcome::Committed`] rolls back.
pub async fn commit_rotation(
    db: &Database,
    commit: &RotationCommit,
) -> Result<CommitOutcome, KeywardError> {
    let meta = MetaRow::from_meta(&commit.meta)?;
    let expected = i64::try_from(commit.expected_generation).map_err(|_| {
        KeywardError::InvalidInput(format!(
            "generation {} out of range",
            commit.expected_generation
        ))
    })?;
    let records = commit.records.clone();

    db.connection()
        .call(move |conn| -> Result<CommitOutcome, rusqlite::Error> {
            let tx = conn.transaction()?;

            let found: Option<i64> = tx
                .query_row(SELECT_GENERATION, [], |row| row.get(0))
                .optional()?;
            let Some(found) = found else {
                return Ok(CommitOutcome::NotInitialized);
            };
            if found != expected {
                return Ok(CommitOutcome::StaleGeneration { found });
            }

            let live: BTreeMap<String, (String, Option<String>)> = {
                let mut stmt = tx.prepare("SELECT id, kind, entry_id FROM records")?;
                let rows = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        (row.get::<_, String>(1)?, row.get::<_, Option<String>>(2)?),
                    ))
                })?;
                rows.collect::<Result<BTreeMap<_, _>, _>>()?
            };
            let staged: BTreeSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
            if staged.len() != records.len()
                || live.len() != staged.len()
                || !live.keys().all(|id| staged.contains(id.as_str()))
            {
                return Ok(CommitOutcome::IdSetMismatch);
            }
            // Rotation re-encrypts in place; kind and owning entry stay fixed.
            for record in &records {
                let Some((kind, entry_id)) = live.get(record.id.as_str()) else {
                    return Ok(CommitOutcome::IdSetMismatch);
                };
                if kind != record.kind.label()
                    || entry_id.as_deref() != record.kind.entry_id().map(RecordId::as_str)
                {
                    return Ok(CommitOutcome::KindChanged {
                        id: record.id.0.clone(),
                    });
                }
            }

            {
                let mut stmt = tx.prepare(
                    "UPDATE records SET nonce = ?2, ciphertext = ?3, tag = ?4,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1",
                )?;
                for record in &records {
                    stmt.execute(params![
                        record.id.0,
                        &record.nonce[..],
                        record.ciphertext,
                        &record.tag[..],
                    ])?;
                }
            }

            tx.execute(
                UPDATE_META,
                params![
                    meta.salt,
                    meta.verification,
                    meta.memory_cost,
                    meta.iterations,
                    meta.parallelism,
                    meta.generation,
                ],
            )?;
            tx.commit()?;
            Ok(CommitOutcome::Committed)
        })
        .await
        .map_err(map_tr_err)
}
