//! # ZipDeploy Convert Command
//!
//! File: cli/src/commands/convert.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `zipdeploy convert` runs the archive transcoder on a local file: it reads a
//! ZIP archive and writes the gzipped tarball that a deploy would upload.
//! Useful for checking what the platform will receive.
//!
//! ## Examples
//!
//! ```bash
//! # Writes site.tar.gz next to site.zip
//! zipdeploy convert site.zip
//!
//! # Explicit output, treat ZIP timestamps as UTC
//! zipdeploy convert site.zip -o /tmp/site.tgz --time-shift 0
//! ```
//!
use crate::common::archive::{self, TimeShift, TranscodeSummary};
use crate::common::ui::human_readable_size;
use crate::core::error::{Result, ZipDeployError};
use anyhow::{bail, Context};
use clap::Parser;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::info;

/// # Convert Command Arguments (`ConvertArgs`)
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// ZIP archive to convert.
    pub input: PathBuf,

    /// Output path. Defaults to the input path with a `.tar.gz` extension.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Local-minus-UTC offset in seconds applied to ZIP timestamps.
    /// Defaults to the host's current offset.
    #[arg(long, allow_hyphen_values = true)]
    pub time_shift: Option<i64>,

    /// Overwrite the output file if it already exists.
    #[arg(long, short)]
    pub force: bool,
}

/// # Handle Convert Command (`handle_convert`)
///
/// Reads the ZIP file, converts it on the blocking pool and writes the
/// result. Nothing is written if the conversion fails.
pub async fn handle_convert(args: ConvertArgs) -> Result<()> {
    info!("Handling convert command with args: {:?}", args);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    if output.exists() && !args.force {
        bail!(
            "Output file '{}' already exists. Use --force to overwrite it.",
            output.display()
        );
    }

    let zip_bytes = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Failed to read ZIP archive '{}'", args.input.display()))?;

    let shift = args
        .time_shift
        .map(TimeShift::from_seconds)
        .unwrap_or_else(TimeShift::from_host);

    let (tar_gz, summary) = tokio::task::spawn_blocking(move || {
        archive::transcode(Cursor::new(zip_bytes), Vec::new(), shift)
    })
    .await
    .context("Archive conversion task failed")?
    .map_err(ZipDeployError::from)
    .with_context(|| format!("Failed to convert '{}'", args.input.display()))?;

    tokio::fs::write(&output, &tar_gz)
        .await
        .with_context(|| format!("Failed to write '{}'", output.display()))?;

    print_summary(&output, tar_gz.len() as u64, &summary);
    Ok(())
}

fn print_summary(output: &Path, archive_size: u64, summary: &TranscodeSummary) {
    println!(
        "✅ Wrote {} ({}): {} files, {} directories, {} of content",
        output.display(),
        human_readable_size(archive_size),
        summary.files,
        summary.directories,
        human_readable_size(summary.content_bytes)
    );
}

/// `site.zip` -> `site.tar.gz`; paths without an extension get `.tar.gz` appended.
fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("tar.gz")
}
