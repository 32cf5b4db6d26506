// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyward add|get|list|edit|delete`.

use std::io::{BufRead, IsTerminal};

use keyward_core::{KeywardError, RecordId};
use keyward_vault::{Entry, EntryPayload};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::app::App;

/// Fields accepted by `add` and `edit`.
#[derive(Debug, Default, Clone)]
pub struct EntryFields {
    pub service: Option<String>,
    pub username: Option<String>,
    pub notes: Option<String>,
}

pub async fn run_add(app: &App, fields: EntryFields) -> Result<(), KeywardError> {
    app.unlock().await?;
    let password = read_entry_password()?;
    let mut data = EntryPayload::new(
        fields.service.unwrap_or_default(),
        fields.username.unwrap_or_default(),
        password.as_str(),
    );
    data.notes = fields.notes;

    let id = app.vault.add_entry(data).await?;
    println!("{id}");
    Ok(())
}

pub async fn run_get(app: &App, id: &str, show: bool) -> Result<(), KeywardError> {
    app.unlock().await?;
    let id = RecordId::from(id);
    let entry = app
        .vault
        .get_entry(&id)
        .await?
        .ok_or_else(|| KeywardError::InvalidInput(format!("no entry with id {id}")))?;

    println!("service:  {}", entry.data.service);
    println!("username: {}", entry.data.username);
    if show {
        println!("password: {}", entry.data.password);
    } else {
        println!("password: ******** (use --show to reveal)");
    }
    if let Some(notes) = &entry.data.notes {
        println!("notes:    {notes}");
    }

    let attachments = app.vault.list_attachments(&id).await?;
    for attachment in attachments {
        println!(
            "attachment: {}  {} ({} bytes)",
            attachment.id, attachment.filename, attachment.size
        );
    }
    Ok(())
}

/// One row of `list --json`. Never includes the password.
#[derive(Debug, Serialize)]
struct EntrySummary<'a> {
    id: &'a str,
    service: &'a str,
    username: &'a str,
}

impl<'a> From<&'a Entry> for EntrySummary<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            id: entry.id.as_str(),
            service: &entry.data.service,
            username: &entry.data.username,
        }
    }
}

pub async fn run_list(app: &App, json: bool) -> Result<(), KeywardError> {
    app.unlock().await?;
    let mut entries = app.vault.list_entries().await?;
    entries.sort_by(|a, b| {
        (a.data.service.as_str(), a.data.username.as_str())
            .cmp(&(b.data.service.as_str(), b.data.username.as_str()))
    });

    if json {
        let rows: Vec<EntrySummary<'_>> = entries.iter().map(EntrySummary::from).collect();
        let out = serde_json::to_string_pretty(&rows)
            .map_err(|e| KeywardError::Internal(format!("failed to encode entries: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("No entries.");
    }
    for entry in &entries {
        println!(
            "{}  {}  {}",
            entry.id, entry.data.service, entry.data.username
        );
    }
    Ok(())
}

/// Update selected fields; `new_password` re-reads the entry password.
pub async fn run_edit(
    app: &App,
    id: &str,
    fields: EntryFields,
    new_password: bool,
) -> Result<(), KeywardError> {
    app.unlock().await?;
    let id = RecordId::from(id);
    let current = app
        .vault
        .get_entry(&id)
        .await?
        .ok_or_else(|| KeywardError::InvalidInput(format!("no entry with id {id}")))?;

    let mut data = current.data.clone();
    if let Some(service) = fields.service {
        data.service = service;
    }
    if let Some(username) = fields.username {
        data.username = username;
    }
    if fields.notes.is_some() {
        data.notes = fields.notes;
    }
    if new_password {
        data.password = read_entry_password()?.as_str().to_string();
    }

    app.vault.update_entry(&id, data).await?;
    eprintln!("Entry {id} updated.");
    Ok(())
}

pub async fn run_delete(app: &App, id: &str) -> Result<(), KeywardError> {
    app.unlock().await?;
    let id = RecordId::from(id);
    if !app.vault.delete_entry(&id).await? {
        return Err(KeywardError::InvalidInput(format!("no entry with id {id}")));
    }
    eprintln!("Entry {id} deleted.");
    Ok(())
}

/// Entry password from a TTY prompt, or the first line of piped stdin.
fn read_entry_password() -> Result<Zeroizing<String>, KeywardError> {
    let stdin = std::io::stdin();
    let password = if stdin.is_terminal() {
        Zeroizing::new(
            rpassword::prompt_password("Entry password: ")
                .map_err(|e| KeywardError::InvalidInput(format!("failed to read password: {e}")))?,
        )
    } else {
        let mut line = Zeroizing::new(String::new());
        stdin
            .lock()
            .read_line(&mut line)
            .map_err(|e| KeywardError::InvalidInput(format!("failed to read password: {e}")))?;
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        line
    };

    if password.is_empty() {
        return Err(KeywardError::InvalidInput(
            "entry password must not be empty".to_string(),
        ));
    }
    Ok(password)
}
