//! `tandem init --remote <dir> [--timeout-ms N] [--log-level LEVEL]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use tandem_core::{config, TandemConfig};

/// Write `~/.tandem/config.yaml`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory acting as the remote store. Created if missing.
    #[arg(long)]
    pub remote: PathBuf,

    /// Upper bound for every remote call, in milliseconds.
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = config::DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        std::fs::create_dir_all(&self.remote)
            .with_context(|| format!("cannot create '{}'", self.remote.display()))?;
        let remote_root = self
            .remote
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", self.remote.display()))?;

        let mut cfg = TandemConfig::new(remote_root.clone());
        cfg.request_timeout_ms = self.timeout_ms;
        cfg.log_level = self.log_level;
        config::save(&cfg).context("failed to write tandem config")?;

        println!("✓ Remote store: {}", remote_root.display());
        println!("  Saved to: ~/.tandem/config.yaml");
        Ok(())
    }
}
