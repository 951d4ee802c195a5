//! Download command implementation.

use std::sync::Arc;

use anyhow::Result;

use sfget_core::config::DownloadConfig;
use sfget_core::connection::SftpConnector;
use sfget_core::transfer::TransferEngine;

use crate::ui::ConsoleSink;

use super::Cli;

/// Run a download to completion.
pub async fn run(cli: Cli) -> Result<()> {
    let defaults = super::load_config(cli.config.as_deref())?;
    let config = DownloadConfig::resolve(cli.request(), &defaults)?;

    if !cli.quiet {
        println!("{config}");
    }
    tracing::debug!(config = ?config, "Resolved configuration");

    let remote = SftpConnector::new(&config).connect().await?;

    let sink = Arc::new(ConsoleSink::new(config.local_path.clone(), cli.quiet));
    TransferEngine::from_config(&config).run(remote, sink).await?;

    Ok(())
}
