// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failure switches for the in-memory doubles.

use std::sync::atomic::{AtomicBool, Ordering};

use keyward_core::KeywardError;

/// Independently toggled injected failures. All off by default.
#[derive(Debug, Default)]
pub struct Faults {
    commit: AtomicBool,
    put: AtomicBool,
    duplicate: AtomicBool,
}

impl Faults {
    /// Make `atomic_commit` fail after its validation, writing nothing.
    pub fn fail_commit(&self, on: bool) {
        self.commit.store(on, Ordering::SeqCst);
    }

    /// Make `put` fail without writing.
    pub fn fail_put(&self, on: bool) {
        self.put.store(on, Ordering::SeqCst);
    }

    /// Make `duplicate` fail without recording a snapshot.
    pub fn fail_duplicate(&self, on: bool) {
        self.duplicate.store(on, Ordering::SeqCst);
    }

    pub(crate) fn check_commit(&self) -> Result<(), KeywardError> {
        check(&self.commit, "injected commit failure")
    }

    pub(crate) fn check_put(&self) -> Result<(), KeywardError> {
        check(&self.put, "injected put failure")
    }

    pub(crate) fn check_duplicate(&self) -> Result<(), KeywardError> {
        check(&self.duplicate, "injected snapshot failure")
    }
}

fn check(flag: &AtomicBool, message: &'static str) -> Result<(), KeywardError> {
    if flag.load(Ordering::SeqCst) {
        return Err(KeywardError::storage(message));
    }
    Ok(())
}
