//! `tandem workspace list|show|create|rename|delete|edit|diff`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use tandem_core::{TandemConfig, WorkspaceDocument, WorkspaceId};
use tandem_sync::{
    EditOutcome, EntryTable, FsDocumentStore, PersistOutcome, WorkspaceSynchronizer,
};

use super::with_session;

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommand {
    /// List every workspace the remote store knows about.
    List,

    /// Print a workspace document as JSON.
    Show { id: String },

    /// Create a workspace, optionally seeded from a JSON document.
    Create(CreateArgs),

    /// Rename a workspace. Fails if the name is taken.
    Rename { id: String, name: String },

    /// Delete a workspace.
    Delete { id: String },

    /// Replace a workspace document with the contents of a file and save it.
    Edit(FileArgs),

    /// Show what saving a file would change.
    Diff(FileArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    pub id: String,
    pub name: String,

    /// JSON document to start from instead of a blank workspace.
    #[arg(long)]
    pub content: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FileArgs {
    pub id: String,

    /// JSON workspace document.
    pub file: PathBuf,
}

#[derive(Tabled)]
struct WorkspaceRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "name")]
    name: String,
}

pub fn run(cmd: WorkspaceCommand) -> Result<()> {
    with_session(|config| async move {
        let sync = synchronizer(&config);
        match cmd {
            WorkspaceCommand::List => list(&sync).await,
            WorkspaceCommand::Show { id } => show(&sync, WorkspaceId::from(id)).await,
            WorkspaceCommand::Create(args) => create(&sync, args).await,
            WorkspaceCommand::Rename { id, name } => {
                rename(&sync, WorkspaceId::from(id), &name).await
            }
            WorkspaceCommand::Delete { id } => delete(&sync, WorkspaceId::from(id)).await,
            WorkspaceCommand::Edit(args) => edit(&sync, args).await,
            WorkspaceCommand::Diff(args) => diff(&sync, args).await,
        }
    })
}

fn synchronizer(config: &TandemConfig) -> WorkspaceSynchronizer {
    let store = FsDocumentStore::new(&config.remote_root, config.request_timeout());
    WorkspaceSynchronizer::new(Arc::new(store), EntryTable::new())
}

fn read_document(path: &Path) -> Result<WorkspaceDocument> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a workspace document", path.display()))
}

async fn list(sync: &WorkspaceSynchronizer) -> Result<()> {
    let listed = sync.load_list().await.context("failed to list workspaces")?;
    if listed.is_empty() {
        println!("No workspaces.");
        println!("Run: tandem workspace create <id> <name>");
        return Ok(());
    }

    let rows: Vec<WorkspaceRow> = listed
        .into_iter()
        .map(|s| WorkspaceRow {
            id: s.id.0,
            name: s.name,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

async fn show(sync: &WorkspaceSynchronizer, id: WorkspaceId) -> Result<()> {
    let switched = sync
        .switch_to(&id)
        .await
        .with_context(|| format!("failed to load workspace '{id}'"))?;
    if !switched.from_cache && sync.entry(&id).map_or(true, |e| !e.pulled_from_remote) {
        eprintln!(
            "{} '{id}' has no stored content; showing the starter workflow",
            "note:".yellow().bold()
        );
    }
    println!("{}", serde_json::to_string_pretty(&switched.content)?);
    Ok(())
}

async fn create(sync: &WorkspaceSynchronizer, args: CreateArgs) -> Result<()> {
    let initial = args.content.as_deref().map(read_document).transpose()?;
    let pending = sync.create_optimistic(WorkspaceId::from(args.id), args.name, initial);
    let entry = pending
        .confirmed()
        .await
        .context("failed to create workspace")?;
    println!("✓ Created workspace '{}' ({})", entry.name, entry.id);
    Ok(())
}

async fn rename(sync: &WorkspaceSynchronizer, id: WorkspaceId, name: &str) -> Result<()> {
    let summary = sync
        .rename(&id, name)
        .await
        .with_context(|| format!("failed to rename workspace '{id}'"))?;
    println!("✓ Renamed '{}' to '{}'", summary.id, summary.name);
    Ok(())
}

async fn delete(sync: &WorkspaceSynchronizer, id: WorkspaceId) -> Result<()> {
    sync.remove(&id)
        .await
        .with_context(|| format!("failed to delete workspace '{id}'"))?;
    println!("✓ Deleted workspace '{id}'");
    Ok(())
}

async fn edit(sync: &WorkspaceSynchronizer, args: FileArgs) -> Result<()> {
    let id = WorkspaceId::from(args.id);
    let doc = read_document(&args.file)?;
    load_known(sync, &id).await?;
    sync.switch_to(&id)
        .await
        .with_context(|| format!("failed to load workspace '{id}'"))?;

    if sync.apply_edit(&id, doc)? == EditOutcome::Unchanged {
        println!("No changes for '{id}'.");
        return Ok(());
    }
    match sync
        .persist(&id)
        .await
        .with_context(|| format!("failed to save workspace '{id}'"))?
    {
        PersistOutcome::Saved | PersistOutcome::Unchanged => println!("✓ Saved '{id}'"),
        PersistOutcome::SupersededWhileSaving => {
            println!("{} '{id}' changed while saving", "!".yellow().bold())
        }
    }
    Ok(())
}

async fn diff(sync: &WorkspaceSynchronizer, args: FileArgs) -> Result<()> {
    let id = WorkspaceId::from(args.id);
    let doc = read_document(&args.file)?;
    load_known(sync, &id).await?;
    sync.mark_mutated(&id, doc)?;

    let Some(diff) = sync
        .diff(&id)
        .await
        .with_context(|| format!("diff failed for '{id}'"))?
    else {
        println!("No differences for '{id}'.");
        return Ok(());
    };
    print!("{}", diff.unified_diff);
    if !diff.unified_diff.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Populate the table from the remote list and require `id` to be in it.
async fn load_known(sync: &WorkspaceSynchronizer, id: &WorkspaceId) -> Result<()> {
    sync.load_list().await.context("failed to list workspaces")?;
    if sync.entry(id).is_none() {
        anyhow::bail!("unknown workspace '{id}'");
    }
    Ok(())
}
