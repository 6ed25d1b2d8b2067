//! Subcommands plus the session setup they share.

pub mod init;
pub mod manifest;
pub mod upload;
pub mod workspace;

use std::future::Future;

use anyhow::{Context, Result};

use tandem_core::{config, TandemConfig};

/// Load `~/.tandem/config.yaml`, install logging and run `task` on a
/// single-threaded runtime.
pub fn with_session<F, Fut, T>(task: F) -> Result<T>
where
    F: FnOnce(TandemConfig) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let config = config::load().context("failed to load tandem config")?;
    init_tracing(&config.log_level);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    runtime.block_on(task(config))
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(default_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_LEVEL));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
