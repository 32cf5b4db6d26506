// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault key manager: owns the session key and the vault state machine.
//!
//! States are `Uninitialized -> Locked <-> Unlocked`. The session key lives
//! only in [`SessionState::Unlocked`] and is zeroized when dropped.
//!
//! Concurrency:
//! - record operations hold a read guard on the session for their whole
//!   duration, so they run concurrently with each other;
//! - `lock` and rotation take the write guard, which waits for in-flight
//!   record operations and holds back new ones (tokio's `RwLock` is fair);
//! - `init`, `unlock`, rotation, and restore also serialize on a separate
//!   mutex so key metadata cannot change under a running derivation.

use std::sync::Arc;

use keyward_core::{KdfParams, KeywardError, RecordStore, VaultMeta, VaultStatus};
use secrecy::SecretString;
use subtle::ConstantTimeEq;
use tokio::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use crate::crypto::SecretKey;
use crate::kdf::{self, DerivedKeys};

/// Where the vault is in its lifecycle.
#[derive(Debug)]
pub enum SessionState {
    Uninitialized,
    Locked,
    Unlocked(SecretKey),
}

impl SessionState {
    fn status(&self) -> VaultStatus {
        match self {
            Self::Uninitialized => VaultStatus {
                initialized: false,
                unlocked: false,
            },
            Self::Locked => VaultStatus {
                initialized: true,
                unlocked: false,
            },
            Self::Unlocked(_) => VaultStatus {
                initialized: true,
                unlocked: true,
            },
        }
    }
}

/// Read access to the live session key.
pub type SessionKeyGuard<'a> = RwLockReadGuard<'a, SecretKey>;

/// Owns the session and the key metadata lifecycle.
pub struct VaultKeyManager {
    store: Arc<dyn RecordStore>,
    kdf: KdfParams,
    state: RwLock<SessionState>,
    meta_lock: Mutex<()>,
}

impl VaultKeyManager {
    /// Build a manager whose initial state reflects the store contents.
    ///
    /// `kdf` is the cost used for new salts (`init` and rotation). Unlock
    /// always uses the parameters stored with the vault.
    pub async fn open(store: Arc<dyn RecordStore>, kdf: KdfParams) -> Result<Self, KeywardError> {
        let state = match store.load_meta().await? {
            Some(_) => SessionState::Locked,
            None => SessionState::Uninitialized,
        };
        let initialized = !matches!(state, SessionState::Uninitialized);
        debug!(initialized, "vault key manager opened");

        Ok(Self {
            store,
            kdf,
            state: RwLock::new(state),
            meta_lock: Mutex::new(()),
        })
    }

    pub fn kdf_params(&self) -> KdfParams {
        self.kdf
    }

    /// Create the vault: new salt, derived key, persisted metadata, Unlocked.
    pub async fn init(&self, password: &SecretString) -> Result<(), KeywardError> {
        let _meta = self.meta_lock.lock().await;

        if !matches!(*self.state.read().await, SessionState::Uninitialized) {
            return Err(KeywardError::AlreadyInitialized);
        }

        let salt = kdf::generate_salt()?;
        let derived = kdf::derive_blocking(password.clone(), salt.clone(), self.kdf).await?;

        let meta = VaultMeta {
            salt,
            verification: derived.verification,
            kdf: self.kdf,
            generation: 0,
        };
        if let Err(e) = self.store.init_meta(&meta).await {
            if matches!(e, KeywardError::AlreadyInitialized) {
                // Another handle initialized the store first.
                Self::reload(&mut *self.state.write().await, self.store.as_ref()).await?;
            }
            return Err(e);
        }

        *self.state.write().await = SessionState::Unlocked(derived.key);
        info!("vault initialized");
        Ok(())
    }

    /// Verify `password` against the stored metadata and open the session.
    ///
    /// On an already unlocked vault the password is still checked and the
    /// session is left as it was.
    pub async fn unlock(&self, password: &SecretString) -> Result<(), KeywardError> {
        let _meta = self.meta_lock.lock().await;

        let meta = self
            .store
            .load_meta()
            .await?
            .ok_or(KeywardError::NotInitialized)?;
        let derived = self.verify(&meta, password).await?;

        let mut state = self.state.write().await;
        if !matches!(*state, SessionState::Unlocked(_)) {
            *state = SessionState::Unlocked(derived.key);
            info!("vault unlocked");
        } else {
            debug!("unlock on unlocked vault, password verified");
        }
        Ok(())
    }

    /// Drop the session key. No-op unless Unlocked.
    pub async fn lock(&self) {
        let mut state = self.state.write().await;
        if matches!(*state, SessionState::Unlocked(_)) {
            *state = SessionState::Locked;
            info!("vault locked");
        }
    }

    pub async fn status(&self) -> VaultStatus {
        self.state.read().await.status()
    }

    /// Shared access to the session key for one record operation.
    ///
    /// Fails with `Locked` or `NotInitialized` before any storage access.
    pub async fn session(&self) -> Result<SessionKeyGuard<'_>, KeywardError> {
        let guard = self.state.read().await;
        RwLockReadGuard::try_map(guard, |state| match state {
            SessionState::Unlocked(key) => Some(key),
            _ => None,
        })
        .map_err(|guard| match *guard {
            SessionState::Uninitialized => KeywardError::NotInitialized,
            _ => KeywardError::Locked,
        })
    }

    /// Derive from `password` with the stored salt and parameters and compare
    /// the verification value in constant time.
    pub async fn verify(
        &self,
        meta: &VaultMeta,
        password: &SecretString,
    ) -> Result<DerivedKeys, KeywardError> {
        let derived =
            kdf::derive_blocking(password.clone(), meta.salt.clone(), meta.kdf).await?;

        let matches: bool = derived
            .verification
            .as_bytes()
            .ct_eq(meta.verification.as_bytes())
            .into();
        if !matches {
            warn!("master password verification failed");
            return Err(KeywardError::AuthenticationFailed);
        }
        Ok(derived)
    }

    pub(crate) fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Serializes metadata-changing operations.
    pub(crate) async fn meta_guard(&self) -> MutexGuard<'_, ()> {
        self.meta_lock.lock().await
    }

    /// Exclusive access to the session: waits for in-flight record operations
    /// and blocks new ones until dropped.
    pub(crate) async fn exclusive(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().await
    }

    /// Re-read the store and reset the session to Locked or Uninitialized.
    pub(crate) async fn reload(
        state: &mut SessionState,
        store: &dyn RecordStore,
    ) -> Result<(), KeywardError> {
        *state = match store.load_meta().await? {
            Some(_) => SessionState::Locked,
            None => SessionState::Uninitialized,
        };
        Ok(())
    }
}

impl std::fmt::Debug for VaultKeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKeyManager")
            .field("kdf", &self.kdf)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyward_test_utils::{MemoryStore, test_kdf_params};

    async fn manager() -> (Arc<MemoryStore>, VaultKeyManager) {
        let store = Arc::new(MemoryStore::new());
        let manager = VaultKeyManager::open(store.clone(), test_kdf_params())
            .await
            .unwrap();
        (store, manager)
    }

    fn pw(s: &str) -> SecretString {
        SecretString::from(s)
    }

    #[tokio::test]
    async fn fresh_store_is_uninitialized() {
        let (_, manager) = manager().await;
        let status = manager.status().await;
        assert!(!status.initialized);
        assert!(!status.unlocked);
    }

    #[tokio::test]
    async fn init_unlocks_and_persists_meta() {
        let (store, manager) = manager().await;
        manager.init(&pw("m1")).await.unwrap();

        assert_eq!(
            manager.status().await,
            VaultStatus {
                initialized: true,
                unlocked: true
            }
        );
        let meta = store.load_meta().await.unwrap().unwrap();
        assert_eq!(meta.generation, 0);
        assert_eq!(meta.kdf, test_kdf_params());
    }

    #[tokio::test]
    async fn second_init_is_rejected() {
        let (_, manager) = manager().await;
        manager.init(&pw("m1")).await.unwrap();
        let err = manager.init(&pw("m2")).await.unwrap_err();
        assert!(matches!(err, KeywardError::AlreadyInitialized));
    }

    #[tokio::test]
    async fn init_on_store_with_meta_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let first = VaultKeyManager::open(store.clone(), test_kdf_params())
            .await
            .unwrap();
        let second = VaultKeyManager::open(store.clone(), test_kdf_params())
            .await
            .unwrap();

        first.init(&pw("m1")).await.unwrap();
        let err = second.init(&pw("m2")).await.unwrap_err();
        assert!(matches!(err, KeywardError::AlreadyInitialized));
        assert_eq!(
            second.status().await,
            VaultStatus {
                initialized: true,
                unlocked: false
            }
        );
        second.unlock(&pw("m1")).await.unwrap();
    }

    #[tokio::test]
    async fn unlock_checks_password() {
        let (_, manager) = manager().await;
        manager.init(&pw("m1")).await.unwrap();
        manager.lock().await;

        let err = manager.unlock(&pw("wrong")).await.unwrap_err();
        assert!(matches!(err, KeywardError::AuthenticationFailed));
        assert!(!manager.status().await.unlocked);

        manager.unlock(&pw("m1")).await.unwrap();
        assert!(manager.status().await.unlocked);
    }

    #[tokio::test]
    async fn unlock_while_unlocked_still_verifies() {
        let (_, manager) = manager().await;
        manager.init(&pw("m1")).await.unwrap();

        let err = manager.unlock(&pw("wrong")).await.unwrap_err();
        assert!(matches!(err, KeywardError::AuthenticationFailed));
        assert!(manager.status().await.unlocked);

        manager.unlock(&pw("m1")).await.unwrap();
        assert!(manager.status().await.unlocked);
    }

    #[tokio::test]
    async fn unlock_before_init_is_not_initialized() {
        let (_, manager) = manager().await;
        let err = manager.unlock(&pw("m1")).await.unwrap_err();
        assert!(matches!(err, KeywardError::NotInitialized));
    }

    #[tokio::test]
    async fn lock_is_idempotent() {
        let (_, manager) = manager().await;
        manager.lock().await;
        assert!(!manager.status().await.initialized);

        manager.init(&pw("m1")).await.unwrap();
        manager.lock().await;
        manager.lock().await;
        assert_eq!(
            manager.status().await,
            VaultStatus {
                initialized: true,
                unlocked: false
            }
        );
    }

    #[tokio::test]
    async fn session_reports_state_specific_errors() {
        let (_, manager) = manager().await;
        assert!(matches!(
            manager.session().await.unwrap_err(),
            KeywardError::NotInitialized
        ));

        manager.init(&pw("m1")).await.unwrap();
        assert!(manager.session().await.is_ok());

        manager.lock().await;
        assert!(matches!(
            manager.session().await.unwrap_err(),
            KeywardError::Locked
        ));
    }

    #[tokio::test]
    async fn reopened_manager_starts_locked() {
        let store = Arc::new(MemoryStore::new());
        let first = VaultKeyManager::open(store.clone(), test_kdf_params())
            .await
            .unwrap();
        first.init(&pw("m1")).await.unwrap();
        let key = *first.session().await.unwrap().expose();

        let second = VaultKeyManager::open(store, test_kdf_params())
            .await
            .unwrap();
        assert!(!second.status().await.unlocked);
        second.unlock(&pw("m1")).await.unwrap();
        assert_eq!(*second.session().await.unwrap().expose(), key);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn failed_unlock_never_logs_the_password() {
        let (_, manager) = manager().await;
        manager.init(&pw("m1")).await.unwrap();
        manager.lock().await;

        let _ = manager.unlock(&pw("hunter2-wrong")).await;
        assert!(logs_contain("master password verification failed"));
        assert!(!logs_contain("hunter2-wrong"));
    }
}
