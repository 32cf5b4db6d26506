// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyward init`, `keyward status`, and `keyward rotate`.

use keyward_core::KeywardError;
use serde::Serialize;

use crate::app::App;

/// Create a new vault.
pub async fn run_init(app: &App) -> Result<(), KeywardError> {
    let password = keyward_vault::get_master_password_with_confirm()?;
    app.vault.init(&password).await?;
    eprintln!("Vault created.");
    Ok(())
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub initialized: bool,
    pub snapshots: usize,
    pub snapshot_directory: String,
}

/// Report whether the vault exists and how many snapshots it has.
pub async fn run_status(app: &App, json: bool) -> Result<(), KeywardError> {
    let status = app.vault.status().await;
    let snapshots = app.vault.list_snapshots().await?;
    let response = StatusResponse {
        initialized: status.initialized,
        snapshots: snapshots.len(),
        snapshot_directory: app.backup.directory().display().to_string(),
    };

    if json {
        let out = serde_json::to_string_pretty(&response)
            .map_err(|e| KeywardError::Internal(format!("failed to encode status: {e}")))?;
        println!("{out}");
    } else {
        println!(
            "initialized: {}",
            if response.initialized { "yes" } else { "no" }
        );
        println!(
            "snapshots:   {} in {}",
            response.snapshots, response.snapshot_directory
        );
    }
    Ok(())
}

/// Change the master password.
///
/// The current password comes from `KEYWARD_MASTER_PASSWORD` or a prompt, the
/// new one from `KEYWARD_NEW_MASTER_PASSWORD` or a confirmed prompt.
pub async fn run_rotate(app: &App) -> Result<(), KeywardError> {
    let old = keyward_vault::get_master_password()?;
    let new = keyward_vault::get_new_master_password()?;
    let report = app.vault.rotate(&old, &new).await?;
    eprintln!(
        "Master password changed. {} record(s) re-encrypted; pre-rotation snapshot: {}",
        report.records, report.snapshot.id
    );
    Ok(())
}
