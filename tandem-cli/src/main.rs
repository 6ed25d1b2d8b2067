//! Tandem: workspace sync and chunked upload CLI.
//!
//! # Usage
//!
//! ```text
//! tandem init --remote <dir> [--timeout-ms N] [--log-level LEVEL]
//! tandem workspace list|show|create|rename|delete|edit|diff
//! tandem upload <resource> <files...> [--version <id>] [--etag <etag>]
//! tandem manifest show <resource> <version> [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    init::InitArgs, manifest::ManifestCommand, upload::UploadArgs, workspace::WorkspaceCommand,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "tandem",
    version,
    about = "Keep workspace documents in sync and upload chunked resources",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Point tandem at a remote store directory.
    Init(InitArgs),

    /// List, inspect and edit workspace documents.
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommand,
    },

    /// Upload files as chunks of one resource version.
    Upload(UploadArgs),

    /// Inspect upload manifests.
    Manifest {
        #[command(subcommand)]
        command: ManifestCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Workspace { command } => commands::workspace::run(command),
        Commands::Upload(args) => args.run(),
        Commands::Manifest { command } => commands::manifest::run(command),
    }
}
