//! `tandem manifest show <resource> <version> [--json]`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use tandem_core::{ResourceKey, VersionId};
use tandem_upload::{FsManifestStore, RemoteManifestStore};

use super::with_session;

#[derive(Subcommand, Debug)]
pub enum ManifestCommand {
    /// Print the chunks and status of one manifest version.
    Show(ShowArgs),
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub resource: String,
    pub version: String,

    /// Emit the raw manifest as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct ChunkRow {
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "bytes")]
    bytes: u64,
    #[tabled(rename = "object")]
    object: String,
}

pub fn run(cmd: ManifestCommand) -> Result<()> {
    match cmd {
        ManifestCommand::Show(args) => show(args),
    }
}

fn show(args: ShowArgs) -> Result<()> {
    let resource = ResourceKey::from(args.resource);
    let version = VersionId::from(args.version);

    with_session(|config| async move {
        let store = FsManifestStore::new(&config.remote_root, config.request_timeout());
        let state = store
            .load(&resource, &version)
            .await
            .context("failed to load manifest")?
            .with_context(|| format!("no manifest for {resource}/{version}"))?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&state)?);
            return Ok(());
        }

        println!("{resource}/{version}: {}", state.status);
        if let Some(etag) = &state.etag {
            println!("etag: {etag}");
        }
        let rows: Vec<ChunkRow> = state
            .chunks
            .into_iter()
            .map(|c| ChunkRow {
                file: c.display_name,
                kind: c.kind.to_string(),
                bytes: c.size_bytes,
                object: c.object_name,
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    })
}
