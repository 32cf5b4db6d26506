// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the vault engine and its storage backends.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::KeywardError;

/// Minimum salt length accepted by key derivation.
pub const SALT_LEN: usize = 16;

/// AES-256-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// AES-256-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// Symmetric key length (256 bits).
pub const KEY_LEN: usize = 32;

/// Length of the stored password verification value.
pub const VERIFICATION_LEN: usize = 32;

/// Stable identifier of an encrypted record.
///
/// Generated before encryption so it can be bound into the AEAD associated data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Generate a fresh random (UUID v4) record id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What an encrypted record holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordKind {
    /// A password entry (service, username, password bundle).
    Entry,
    /// A binary attachment belonging to a password entry.
    Attachment { entry_id: RecordId },
}

impl RecordKind {
    /// The owning entry for attachments, `None` for entries.
    pub fn entry_id(&self) -> Option<&RecordId> {
        match self {
            Self::Entry => None,
            Self::Attachment { entry_id } => Some(entry_id),
        }
    }

    /// Short label used in storage rows and associated data.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Attachment { .. } => "attachment",
        }
    }
}

/// An AES-256-GCM encrypted payload as persisted by a [`RecordStore`](crate::RecordStore).
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedRecord {
    pub id: RecordId,
    pub kind: RecordKind,
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

impl fmt::Debug for EncryptedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedRecord")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("ciphertext_len", &self.ciphertext.len())
            .finish()
    }
}

/// Argon2id cost parameters, persisted next to the salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// Random salt mixed into key derivation.
#[derive(Clone, PartialEq, Eq)]
pub struct Salt(Vec<u8>);

impl Salt {
    /// Wrap stored salt bytes, rejecting anything shorter than [`SALT_LEN`].
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, KeywardError> {
        if bytes.len() < SALT_LEN {
            return Err(KeywardError::InvalidInput(format!(
                "salt must be at least {SALT_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({} bytes)", self.0.len())
    }
}

/// Value derived from the master password that lets a candidate password be
/// checked without storing the password.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationValue(pub [u8; VERIFICATION_LEN]);

impl VerificationValue {
    /// Wrap stored verification bytes, rejecting a wrong length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeywardError> {
        let arr: [u8; VERIFICATION_LEN] = bytes.try_into().map_err(|_| {
            KeywardError::InvalidInput(format!(
                "verification value must be {VERIFICATION_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for VerificationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerificationValue([REDACTED])")
    }
}

/// Key metadata persisted with the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultMeta {
    pub salt: Salt,
    pub verification: VerificationValue,
    pub kdf: KdfParams,
    /// Incremented by every committed rotation.
    pub generation: u64,
}

/// Everything a rotation writes, applied by [`RecordStore::atomic_commit`](crate::RecordStore::atomic_commit)
/// as a single indivisible unit.
#[derive(Debug, Clone)]
pub struct RotationCommit {
    /// Replacement key metadata. `meta.generation` is `expected_generation + 1`.
    pub meta: VaultMeta,
    /// Generation the store must currently hold for the commit to apply.
    pub expected_generation: u64,
    /// One re-encrypted record for every record currently in the store.
    pub records: Vec<EncryptedRecord>,
}

/// Locates one point-in-time copy of the persistent store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHandle {
    pub id: String,
    /// Backend-specific location (a file path for SQLite backups).
    pub location: String,
    pub created_at: DateTime<Utc>,
}

/// Vault state as reported by `status()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultStatus {
    pub initialized: bool,
    pub unlocked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_salt_is_rejected() {
        let err = Salt::from_bytes(vec![0u8; 8]).unwrap_err();
        assert!(matches!(err, KeywardError::InvalidInput(_)));
        assert!(Salt::from_bytes(vec![0u8; 32]).is_ok());
    }

    #[test]
    fn verification_value_requires_exact_length() {
        assert!(VerificationValue::from_slice(&[1u8; 31]).is_err());
        assert!(VerificationValue::from_slice(&[1u8; 32]).is_ok());
    }

    #[test]
    fn record_kind_serializes_with_entry_link() {
        let kind = RecordKind::Attachment {
            entry_id: RecordId::from("entry-1"),
        };
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#"{"type":"attachment","entry_id":"entry-1"}"#);
        let back: RecordKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entry_id().map(RecordId::as_str), Some("entry-1"));
    }

    #[test]
    fn generated_record_ids_are_unique() {
        assert_ne!(RecordId::generate(), RecordId::generate());
    }

    #[test]
    fn debug_output_hides_secret_material() {
        let record = EncryptedRecord {
            id: RecordId::from("r1"),
            kind: RecordKind::Entry,
            nonce: [7u8; NONCE_LEN],
            ciphertext: vec![1, 2, 3],
            tag: [9u8; TAG_LEN],
        };
        let dbg = format!("{record:?}");
        assert!(dbg.contains("ciphertext_len: 3"));
        assert!(!dbg.contains("[1, 2, 3]"));
        assert_eq!(
            format!("{:?}", VerificationValue([0u8; 32])),
            "VerificationValue([REDACTED])"
        );
    }
}
