//! # ZipDeploy Main Entry Point
//!
//! File: cli/src/main.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Main entry point of the ZipDeploy CLI. ZipDeploy turns ZIP archives into
//! gzipped tarballs and ships them to a PaaS deploy endpoint, either from the
//! terminal or as the relay server behind a dashboard's drag-and-drop upload.
//!
//! This file handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the command handlers
//!
//! ## Examples
//!
//! ```bash
//! # Convert locally
//! zipdeploy convert site.zip
//!
//! # Deploy with debug logging
//! zipdeploy -vv deploy site.zip --app my-site
//!
//! # Run the relay server
//! zipdeploy srv --platform-host https://paas.example.com
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // Command handlers (convert, deploy, srv)
mod common; // Archive transcoding, deploy client, UI helpers
mod core; // Errors and configuration

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "zipdeploy",
    about = "📦 ZipDeploy: ZIP to tar.gz deploys for PaaS platforms",
    long_about = "Convert ZIP archives to .tar.gz and upload them to a platform deploy endpoint.\n\
                  Runs locally or as the HTTP relay behind a drag-and-drop dashboard upload.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// All available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    /// Convert a ZIP archive into a .tar.gz file.
    #[command(alias = "c")]
    Convert(commands::convert::ConvertArgs),
    /// Convert a ZIP archive and deploy it to an application.
    #[command(alias = "d")]
    Deploy(commands::deploy::DeployArgs),
    /// Run the drag-and-drop deploy relay server.
    Srv(commands::srv::SrvArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Convert(args) => commands::convert::handle_convert(args).await,
        Commands::Deploy(args) => commands::deploy::handle_deploy(args).await,
        Commands::Srv(args) => commands::srv::handle_srv(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
