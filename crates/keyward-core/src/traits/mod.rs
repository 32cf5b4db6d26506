// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the vault engine depends on.
//!
//! The engine never talks to a storage engine directly. Backends implement
//! these traits with `#[async_trait]` so they can be used as trait objects.

pub mod backup;
pub mod store;

pub use backup::BackupMedium;
pub use store::RecordStore;
