// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted credential vault engine.
//!
//! A master password is stretched with Argon2id into a record key and a
//! verification value. Every record is sealed with AES-256-GCM under that key.
//! Changing the master password re-encrypts every record and swaps the key
//! metadata in one atomic store commit, after a snapshot of the store.

pub mod crypto;
pub mod kdf;
pub mod payload;
pub mod prompt;
pub mod rotation;
pub mod session;
pub mod snapshot;
pub mod vault;

pub use crypto::SecretKey;
pub use payload::{Attachment, AttachmentInfo, Entry, EntryPayload};
pub use prompt::{get_master_password, get_master_password_with_confirm, get_new_master_password};
pub use rotation::{RotationCoordinator, RotationReport};
pub use session::VaultKeyManager;
pub use snapshot::SnapshotManager;
pub use vault::{Vault, VaultOptions};
