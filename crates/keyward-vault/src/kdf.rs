// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id key derivation from the master password.
//!
//! Argon2id (v0x13) stretches the password into 32 bytes of master material.
//! HKDF-SHA256 then expands that material under two labels: one output is the
//! record encryption key, the other the stored verification value. Knowing the
//! verification value does not reveal the key, and neither reveals the password
//! without a full Argon2id evaluation per guess.

use keyward_core::types::{KEY_LEN, SALT_LEN, VERIFICATION_LEN};
use keyward_core::{KdfParams, KeywardError, Salt, VerificationValue};
use ring::hkdf;
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::crypto::SecretKey;

const ENCRYPTION_INFO: &[u8] = b"keyward/v1/record-encryption";
const VERIFICATION_INFO: &[u8] = b"keyward/v1/password-verification";

/// Key material derived from one (password, salt, params) triple.
pub struct DerivedKeys {
    pub key: SecretKey,
    pub verification: VerificationValue,
}

impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeys").finish_non_exhaustive()
    }
}

/// Run Argon2id over `password` and `salt`.
///
/// Deterministic: identical inputs always produce identical output. The
/// output is wrapped in [`Zeroizing`] so it is wiped on drop.
pub fn derive_master(
    password: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, KeywardError> {
    if password.is_empty() {
        return Err(KeywardError::InvalidInput(
            "master password must not be empty".to_string(),
        ));
    }
    if salt.len() < SALT_LEN {
        return Err(KeywardError::InvalidInput(format!(
            "salt must be at least {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let argon_params = argon2::Params::new(
        params.memory_cost_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| KeywardError::InvalidInput(format!("invalid Argon2id parameters: {e}")))?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon_params,
    );

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password, salt, &mut output[..])
        .map_err(|e| KeywardError::InvalidInput(format!("Argon2id key derivation failed: {e}")))?;

    Ok(output)
}

/// Derive the record key and verification value for a password.
pub fn derive(
    password: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<DerivedKeys, KeywardError> {
    let master = derive_master(password, salt, params)?;
    let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, &[]).extract(&master[..]);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    expand(&prk, ENCRYPTION_INFO, &mut key[..])?;

    let mut verification = [0u8; VERIFICATION_LEN];
    expand(&prk, VERIFICATION_INFO, &mut verification)?;

    Ok(DerivedKeys {
        key: SecretKey::from_bytes(key),
        verification: VerificationValue(verification),
    })
}

fn expand(prk: &hkdf::Prk, info: &[u8], out: &mut [u8]) -> Result<(), KeywardError> {
    let info = [info];
    prk.expand(&info, hkdf::HKDF_SHA256)
        .and_then(|okm| okm.fill(out))
        .map_err(|_| KeywardError::Internal("HKDF expansion failed".to_string()))
}

/// [`derive`] on tokio's blocking pool.
///
/// Derivation is deliberately slow and must not stall async workers.
pub async fn derive_blocking(
    password: SecretString,
    salt: Salt,
    params: KdfParams,
) -> Result<DerivedKeys, KeywardError> {
    tokio::task::spawn_blocking(move || {
        derive(password.expose_secret().as_bytes(), salt.as_bytes(), &params)
    })
    .await
    .map_err(|e| KeywardError::Internal(format!("key derivation task failed: {e}")))?
}

/// Generate a random salt of [`SALT_LEN`] bytes.
pub fn generate_salt() -> Result<Salt, KeywardError> {
    let rng = SystemRandom::new();
    let mut salt = vec![0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| KeywardError::Internal("failed to generate random salt".to_string()))?;
    Salt::from_bytes(salt)
}
