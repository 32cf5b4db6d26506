// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyward - an encrypted local credential vault.
//!
//! This is the binary entry point.

mod app;
mod attachments;
mod entries;
mod lifecycle;
mod snapshots;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use keyward_config::KeywardConfig;
use keyward_core::KeywardError;

use crate::app::App;
use crate::entries::EntryFields;

/// Keyward - an encrypted local credential vault.
#[derive(Parser, Debug)]
#[command(name = "keyward", version, about, long_about = None)]
struct Cli {
    /// Use this config file instead of the standard lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new vault protected by a master password.
    Init,
    /// Show whether a vault exists and how many snapshots it has.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Add a password entry. The password is prompted for, or read from stdin.
    Add(EntryArgs),
    /// Show one entry and its attachments.
    Get {
        id: String,
        /// Print the password instead of masking it.
        #[arg(long)]
        show: bool,
    },
    /// List entries (service and username only).
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Change fields of an entry.
    Edit {
        id: String,
        #[command(flatten)]
        fields: EntryArgs,
        /// Prompt for a new entry password.
        #[arg(long)]
        password: bool,
    },
    /// Delete an entry and its attachments.
    Delete { id: String },
    /// Attach a file to an entry.
    Attach { entry_id: String, file: PathBuf },
    /// Decrypt an attachment to a file.
    ExportAttachment {
        id: String,
        /// Output path (defaults to the attachment's filename).
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Change the master password and re-encrypt every record.
    Rotate,
    /// Manage database snapshots.
    Snapshot {
        #[command(subcommand)]
        action: SnapshotCommands,
    },
}

#[derive(Args, Debug)]
struct EntryArgs {
    #[arg(long)]
    service: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

impl From<EntryArgs> for EntryFields {
    fn from(args: EntryArgs) -> Self {
        Self {
            service: args.service,
            username: args.username,
            notes: args.notes,
        }
    }
}

#[derive(Subcommand, Debug)]
enum SnapshotCommands {
    /// Take a snapshot now.
    Create,
    /// List snapshots, oldest first.
    List,
    /// Replace the live database with a snapshot.
    Restore { id: String },
    /// Delete all but the newest snapshots.
    Prune {
        #[arg(long, default_value_t = 10)]
        keep: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => keyward_config::load_and_validate_path(path),
        None => keyward_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            keyward_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    if let Err(e) = run(cli.command, &config).await {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &KeywardConfig) -> Result<(), KeywardError> {
    let app = App::open(config).await?;

    match command {
        Commands::Init => lifecycle::run_init(&app).await,
        Commands::Status { json } => lifecycle::run_status(&app, json).await,
        Commands::Add(args) => entries::run_add(&app, args.into()).await,
        Commands::Get { id, show } => entries::run_get(&app, &id, show).await,
        Commands::List { json } => entries::run_list(&app, json).await,
        Commands::Edit {
            id,
            fields,
            password,
        } => entries::run_edit(&app, &id, fields.into(), password).await,
        Commands::Delete { id } => entries::run_delete(&app, &id).await,
        Commands::Attach { entry_id, file } => {
            attachments::run_attach(&app, &entry_id, &file).await
        }
        Commands::ExportAttachment { id, out } => {
            attachments::run_export(&app, &id, out.as_deref()).await
        }
        Commands::Rotate => lifecycle::run_rotate(&app).await,
        Commands::Snapshot { action } => match action {
            SnapshotCommands::Create => snapshots::run_create(&app).await,
            SnapshotCommands::List => snapshots::run_list(&app).await,
            SnapshotCommands::Restore { id } => snapshots::run_restore(&app, &id).await,
            SnapshotCommands::Prune { keep } => snapshots::run_prune(&app, keep).await,
        },
    }
}

/// Install the fmt subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keyward={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
