//! # ZipDeploy Deploy Command
//!
//! File: cli/src/commands/deploy.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `zipdeploy deploy` performs a drag-and-drop style deploy from the terminal:
//! the local ZIP archive is converted to `.tar.gz`, uploaded to the platform's
//! deploy endpoint, and the platform's output is printed line by line as it
//! arrives.
//!
//! ## Examples
//!
//! ```bash
//! export ZIPDEPLOY_PLATFORM_HOST=https://paas.example.com
//! export ZIPDEPLOY_TOKEN="bearer 0123456789abcdef"
//! zipdeploy deploy site.zip --app my-site
//! ```
//!
use crate::common::archive::{self, TimeShift};
use crate::common::deploy::{
    client::validate_app_name, relay_lines, DeployClient, LineTerminator,
};
use crate::core::config;
use crate::core::error::{Result, ZipDeployError};
use anyhow::{bail, Context};
use clap::Parser;
use futures_util::StreamExt;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// # Deploy Command Arguments (`DeployArgs`)
#[derive(Parser, Debug)]
pub struct DeployArgs {
    /// ZIP archive to deploy.
    pub archive: PathBuf,

    /// Name of the application on the platform.
    #[arg(long, short)]
    pub app: String,

    /// Base URL of the platform API. Overrides the configuration files.
    #[arg(long, env = "ZIPDEPLOY_PLATFORM_HOST")]
    pub platform_host: Option<String>,

    /// Value sent as the `Authorization` header (e.g. "bearer <token>").
    #[arg(long, env = "ZIPDEPLOY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Value of the `origin` query parameter. Overrides the configuration files.
    #[arg(long)]
    pub origin: Option<String>,

    /// Local-minus-UTC offset in seconds applied to ZIP timestamps.
    /// Defaults to the host's current offset.
    #[arg(long, allow_hyphen_values = true)]
    pub time_shift: Option<i64>,
}

/// # Handle Deploy Command (`handle_deploy`)
///
/// Converts, uploads and streams the platform output to stdout. Fails if the
/// platform answers with a non-success status (after printing its output).
pub async fn handle_deploy(args: DeployArgs) -> Result<()> {
    info!("Handling deploy command for app '{}'", args.app);
    validate_app_name(&args.app)?;

    let file_config = config::load_config()?;
    let platform_host = file_config.platform.resolve_host(args.platform_host.clone())?;
    let origin = args
        .origin
        .clone()
        .unwrap_or_else(|| file_config.platform.origin.clone());
    let client = DeployClient::new(platform_host, origin)?;

    let zip_bytes = tokio::fs::read(&args.archive)
        .await
        .with_context(|| format!("Failed to read ZIP archive '{}'", args.archive.display()))?;

    let shift = args
        .time_shift
        .map(TimeShift::from_seconds)
        .unwrap_or_else(TimeShift::from_host);
    let tar_gz = tokio::task::spawn_blocking(move || archive::convert(&zip_bytes, shift))
        .await
        .context("Archive conversion task failed")?
        .map_err(ZipDeployError::from)
        .with_context(|| format!("Failed to convert '{}'", args.archive.display()))?;

    let response = client
        .upload(&args.app, args.token.as_deref(), tar_gz.into_inner())
        .await?;
    let status = response.status();

    let mut lines = Box::pin(relay_lines(
        response.bytes_stream(),
        LineTerminator::Newline,
    ));
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next().await {
        let line = line.context("Connection to the platform was interrupted")?;
        stdout.write_all(&line).await?;
        stdout.flush().await?;
    }

    if !status.is_success() {
        bail!("Deploy of '{}' failed with status {}", args.app, status);
    }
    Ok(())
}
