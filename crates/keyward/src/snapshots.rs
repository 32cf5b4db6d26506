// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyward snapshot create|list|restore|prune`.

use keyward_core::KeywardError;

use crate::app::App;

pub async fn run_create(app: &App) -> Result<(), KeywardError> {
    let handle = app.vault.snapshot("manual").await?;
    println!("{}", handle.id);
    Ok(())
}

pub async fn run_list(app: &App) -> Result<(), KeywardError> {
    let snapshots = app.vault.list_snapshots().await?;
    if snapshots.is_empty() {
        eprintln!("No snapshots in {}.", app.backup.directory().display());
    }
    for handle in snapshots {
        println!(
            "{}  {}",
            handle.id,
            handle.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}

/// Restore a snapshot over the live database.
///
/// The current state is snapshotted first so the restore can itself be undone.
pub async fn run_restore(app: &App, id: &str) -> Result<(), KeywardError> {
    let handle = app
        .vault
        .find_snapshot(id)
        .await?
        .ok_or_else(|| KeywardError::InvalidInput(format!("no snapshot with id {id}")))?;

    let safety = app.vault.snapshot("pre-restore").await?;
    app.vault.restore_snapshot(&handle).await?;
    eprintln!(
        "Restored {}. Previous state saved as {}.",
        handle.id, safety.id
    );
    Ok(())
}

pub async fn run_prune(app: &App, keep: usize) -> Result<(), KeywardError> {
    let removed = app.backup.prune(keep).await?;
    eprintln!("Removed {} snapshot(s), kept at most {keep}.", removed.len());
    Ok(())
}
