//! `tandem upload <resource> <files...> [--version <id>] [--etag <etag>]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use tandem_core::{Etag, ResourceKey, VersionId};
use tandem_upload::{
    FsManifestStore, FsObjectStore, UploadBaseline, UploadFile, UploadOrchestrator,
};

use super::with_session;

/// Upload files, in order, as chunks of one resource version.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Resource the manifest belongs to.
    pub resource: String,

    /// Files to upload. The last one completes the manifest.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Continue an existing version instead of starting a new one.
    #[arg(long)]
    pub version: Option<String>,

    /// Last manifest etag seen for `--version`.
    #[arg(long, requires = "version")]
    pub etag: Option<String>,
}

impl UploadArgs {
    pub fn run(self) -> Result<()> {
        let files = self
            .files
            .iter()
            .map(|path| -> Result<UploadFile> {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("cannot read '{}'", path.display()))?;
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .with_context(|| format!("'{}' has no file name", path.display()))?;
                Ok(UploadFile::new(name, bytes))
            })
            .collect::<Result<Vec<_>>>()?;

        let resource = ResourceKey::from(self.resource);
        let baseline = UploadBaseline {
            version_id: self.version.map(VersionId::from),
            etag: self.etag.map(Etag::from),
        };

        with_session(|config| async move {
            let timeout = config.request_timeout();
            let orchestrator = UploadOrchestrator::new(
                Arc::new(FsObjectStore::new(&config.remote_root, timeout)),
                Arc::new(FsManifestStore::new(&config.remote_root, timeout)),
            );
            tracing::debug!(resource = %resource, files = files.len(), "starting upload batch");
            let report = orchestrator.upload_batch(&resource, files, baseline).await;

            for result in &report.results {
                match &result.outcome {
                    Ok(chunk) => println!(
                        "{} {} → {} [{}]",
                        "✓".green().bold(),
                        result.file_name,
                        chunk.object_name,
                        chunk.kind
                    ),
                    Err(err) => println!("{} {}: {err}", "✗".red().bold(), result.file_name),
                }
            }
            if let Some(version) = &report.baseline.version_id {
                println!("  version: {version}");
            }
            if let Some(etag) = &report.baseline.etag {
                println!("  etag:    {etag}");
            }

            let failed = report.failed();
            if failed > 0 {
                anyhow::bail!("{failed} of {} files failed to upload", report.results.len());
            }
            Ok(())
        })
    }
}
