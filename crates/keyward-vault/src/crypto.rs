// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-256-GCM seal/open operations.
//!
//! Every call to [`seal`] generates a fresh random 96-bit nonce via the system
//! CSPRNG. Nonce reuse would be catastrophic for GCM security.
//!
//! Record encryption binds the record id and kind into the associated data, so
//! a ciphertext copied onto another record id fails authentication.

use keyward_core::types::{KEY_LEN, NONCE_LEN, TAG_LEN};
use keyward_core::{EncryptedRecord, KeywardError, RecordId, RecordKind};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// A 256-bit AES-GCM key, wiped from memory on drop.
pub struct SecretKey(Zeroizing<[u8; KEY_LEN]>);

impl SecretKey {
    pub fn from_bytes(bytes: Zeroizing<[u8; KEY_LEN]>) -> Self {
        Self(bytes)
    }

    /// Generate a random key from the system CSPRNG.
    pub fn generate() -> Result<Self, KeywardError> {
        let rng = SystemRandom::new();
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        rng.fill(&mut key[..])
            .map_err(|_| KeywardError::Internal("failed to generate random key".to_string()))?;
        Ok(Self(key))
    }

    pub fn expose(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    fn aead_key(&self) -> Result<LessSafeKey, KeywardError> {
        let unbound = UnboundKey::new(&AES_256_GCM, &self.0[..])
            .map_err(|_| KeywardError::Internal("failed to create AES-256-GCM key".to_string()))?;
        Ok(LessSafeKey::new(unbound))
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

/// Output of [`seal`]: nonce, ciphertext, and detached tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

/// Encrypt `plaintext` with AES-256-GCM under a random 96-bit nonce.
pub fn seal(key: &SecretKey, aad: &[u8], plaintext: &[u8]) -> Result<Sealed, KeywardError> {
    let less_safe = key.aead_key()?;

    let rng = SystemRandom::new();
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| KeywardError::Internal("failed to generate random nonce".to_string()))?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    // Holds plaintext until sealed in place.
    let mut in_out = Zeroizing::new(plaintext.to_vec());
    let tag = less_safe
        .seal_in_place_separate_tag(nonce, Aad::from(aad), &mut in_out[..])
        .map_err(|_| KeywardError::Internal("AES-256-GCM encryption failed".to_string()))?;

    let tag: [u8; TAG_LEN] = tag
        .as_ref()
        .try_into()
        .map_err(|_| KeywardError::Internal("unexpected AES-256-GCM tag length".to_string()))?;

    Ok(Sealed {
        nonce: nonce_bytes,
        ciphertext: std::mem::take(&mut *in_out),
        tag,
    })
}

/// Decrypt and authenticate. Any mismatch (key, nonce, aad, ciphertext, or
/// tag) is reported as [`KeywardError::Integrity`] with no partial output.
pub fn open(
    key: &SecretKey,
    aad: &[u8],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> Result<Zeroizing<Vec<u8>>, KeywardError> {
    let less_safe = key.aead_key()?;
    let nonce = Nonce::assume_unique_for_key(*nonce);

    let mut in_out = Zeroizing::new(Vec::with_capacity(ciphertext.len() + TAG_LEN));
    in_out.extend_from_slice(ciphertext);
    in_out.extend_from_slice(tag);

    let len = less_safe
        .open_in_place(nonce, Aad::from(aad), &mut in_out[..])
        .map_err(|_| KeywardError::Integrity)?
        .len();
    in_out.truncate(len);

    Ok(in_out)
}

/// Associated data binding a ciphertext to its record id and kind.
pub fn record_aad(id: &RecordId, kind: &RecordKind) -> Vec<u8> {
    let owner = kind.entry_id().map(RecordId::as_str).unwrap_or("");
    format!("keyward/v1|{}|{owner}|{id}", kind.label()).into_bytes()
}

/// Seal `plaintext` as record `id` of the given kind.
pub fn encrypt_record(
    key: &SecretKey,
    id: RecordId,
    kind: RecordKind,
    plaintext: &[u8],
) -> Result<EncryptedRecord, KeywardError> {
    let sealed = seal(key, &record_aad(&id, &kind), plaintext)?;
    Ok(EncryptedRecord {
        id,
        kind,
        nonce: sealed.nonce,
        ciphertext: sealed.ciphertext,
        tag: sealed.tag,
    })
}

/// Open a stored record.
pub fn decrypt_record(
    key: &SecretKey,
    record: &EncryptedRecord,
) -> Result<Zeroizing<Vec<u8>>, KeywardError> {
    open(
        key,
        &record_aad(&record.id, &record.kind),
        &record.nonce,
        &record.ciphertext,
        &record.tag,
    )
}
