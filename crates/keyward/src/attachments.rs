// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyward attach` and `keyward export-attachment`.

use std::path::Path;

use keyward_core::{KeywardError, RecordId};

use crate::app::App;

pub async fn run_attach(app: &App, entry_id: &str, file: &Path) -> Result<(), KeywardError> {
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            KeywardError::InvalidInput(format!("not a file path: {}", file.display()))
        })?
        .to_string();
    let bytes = zeroize::Zeroizing::new(
        tokio::fs::read(file)
            .await
            .map_err(|e| KeywardError::InvalidInput(format!("cannot read {}: {e}", file.display())))?,
    );

    app.unlock().await?;
    let id = app
        .vault
        .add_attachment(&RecordId::from(entry_id), &filename, &bytes)
        .await?;
    println!("{id}");
    Ok(())
}

/// Decrypt an attachment to `out`, or to its original filename in the
/// working directory.
pub async fn run_export(app: &App, id: &str, out: Option<&Path>) -> Result<(), KeywardError> {
    app.unlock().await?;
    let attachment = app
        .vault
        .get_attachment(&RecordId::from(id))
        .await?
        .ok_or_else(|| KeywardError::InvalidInput(format!("no attachment with id {id}")))?;

    let target = match out {
        Some(path) => path.to_path_buf(),
        None => Path::new(&attachment.filename)
            .file_name()
            .map(Path::new)
            .ok_or_else(|| {
                KeywardError::InvalidInput(format!(
                    "unsafe attachment filename '{}'",
                    attachment.filename
                ))
            })?
            .to_path_buf(),
    };
    if tokio::fs::try_exists(&target).await.unwrap_or(false) {
        return Err(KeywardError::InvalidInput(format!(
            "refusing to overwrite {}",
            target.display()
        )));
    }

    tokio::fs::write(&target, &attachment.bytes[..])
        .await
        .map_err(KeywardError::storage)?;
    eprintln!("Wrote {} ({} bytes).", target.display(), attachment.bytes.len());
    Ok(())
}
