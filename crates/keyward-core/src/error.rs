// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keyward vault engine.

use thiserror::Error;

/// The step of a master-password rotation that failed.
///
/// Carried by [`KeywardError::RotationAborted`] so callers can tell a corrupt
/// record apart from a backup or commit failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RotationStage {
    /// Decrypting existing records with the old key.
    Decrypt,
    /// Deriving the new key material.
    Derive,
    /// Re-encrypting plaintexts under the new key.
    Encrypt,
    /// Taking the pre-commit snapshot.
    Snapshot,
    /// Writing the staged records and metadata to the store.
    Commit,
}

/// The primary error type used across the vault engine, its stores, and the CLI.
#[derive(Debug, Error)]
pub enum KeywardError {
    /// `init` was called on a vault that already has key metadata.
    #[error("vault is already initialized")]
    AlreadyInitialized,

    /// A vault operation was attempted before `init`.
    #[error("vault is not initialized")]
    NotInitialized,

    /// The supplied master password did not match. Carries no further detail.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// A key-requiring operation was attempted while the vault is locked.
    #[error("vault is locked")]
    Locked,

    /// Authentication tag mismatch: the record is unreadable under the current key.
    #[error("integrity check failed: record cannot be decrypted with the current key")]
    Integrity,

    /// Persistence or backup layer failure.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Master-password rotation stopped before committing. The vault is unchanged.
    #[error("rotation aborted during {stage}: {source}")]
    RotationAborted {
        stage: RotationStage,
        source: Box<KeywardError>,
    },

    /// Invalid password, salt, KDF parameters, or payload framing.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors (RNG failure, blocking task panicked).
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeywardError {
    /// Wrap any error as a [`KeywardError::Storage`].
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }

    /// Wrap `self` as the cause of an aborted rotation at `stage`.
    pub fn abort_rotation(self, stage: RotationStage) -> Self {
        Self::RotationAborted {
            stage,
            source: Box::new(self),
        }
    }

    /// Returns `true` for [`KeywardError::Integrity`], including when it is the
    /// cause of an aborted rotation.
    pub fn is_integrity(&self) -> bool {
        match self {
            Self::Integrity => true,
            Self::RotationAborted { source, .. } => source.is_integrity(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_stage_displays_snake_case() {
        assert_eq!(RotationStage::Snapshot.to_string(), "snapshot");
        assert_eq!(RotationStage::Commit.to_string(), "commit");
    }

    #[test]
    fn aborted_rotation_message_names_stage_and_cause() {
        let err = KeywardError::storage("disk full").abort_rotation(RotationStage::Commit);
        let msg = err.to_string();
        assert!(msg.contains("commit"), "{msg}");
        assert!(msg.contains("disk full"), "{msg}");
    }

    #[test]
    fn is_integrity_looks_through_rotation_abort() {
        assert!(KeywardError::Integrity.is_integrity());
        assert!(KeywardError::Integrity
            .abort_rotation(RotationStage::Decrypt)
            .is_integrity());
        assert!(!KeywardError::Locked.is_integrity());
    }

    #[test]
    fn authentication_failure_message_is_opaque() {
        assert_eq!(KeywardError::AuthenticationFailed.to_string(), "authentication failed");
    }
}
