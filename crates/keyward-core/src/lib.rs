// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keyward credential vault.
//!
//! Holds the error type, the domain types that cross crate boundaries, and
//! the collaborator traits ([`RecordStore`], [`BackupMedium`]) the vault
//! engine is written against.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{KeywardError, RotationStage};
pub use traits::{BackupMedium, RecordStore};
pub use types::{
    EncryptedRecord, KdfParams, RecordId, RecordKind, RotationCommit, Salt, SnapshotHandle,
    VaultMeta, VaultStatus, VerificationValue,
};
