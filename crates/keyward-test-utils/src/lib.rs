// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Keyward.
//!
//! Provides in-memory collaborators for fast, deterministic tests without a
//! database file.
//!
//! # Components
//!
//! - [`MemoryStore`] - `RecordStore` held in a map, with commit/put failure injection
//! - [`MemoryBackup`] - `BackupMedium` that snapshots a [`MemoryStore`]
//! - [`Faults`] - switches shared by both doubles

pub mod faults;
pub mod memory_backup;
pub mod memory_store;

pub use faults::Faults;
pub use memory_backup::MemoryBackup;
pub use memory_store::MemoryStore;

use keyward_core::KdfParams;

/// Cheapest Argon2id parameters, for tests only.
pub fn test_kdf_params() -> KdfParams {
    KdfParams {
        memory_cost_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}
