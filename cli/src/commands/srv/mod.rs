//! # ZipDeploy Relay Server
//!
//! File: cli/src/commands/srv/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module provides the HTTP relay behind the dashboard's drag-and-drop
//! deploys. The browser posts a base64 ZIP archive; the server converts it to
//! `.tar.gz`, uploads it to the platform API and streams the platform's
//! output back to the browser.
//!
//! ## Architecture
//!
//! - `config.rs`: Resolution of flags and configuration files into `ServerConfig`
//! - `handlers.rs`: The deploy and health handlers
//! - `server_logic.rs`: Router, middleware, port selection and shutdown
//!
//! ## Examples
//!
//! ```bash
//! # Relay to the platform configured in .zipdeploy.toml
//! zipdeploy srv
//!
//! # Explicit platform, all interfaces, custom port
//! zipdeploy srv --platform-host https://paas.example.com --host 0.0.0.0 --port 9000
//! ```
//!
use crate::core::config as core_config;
use crate::core::error::Result;
use tracing::info;

pub use config::SrvArgs;

/// Resolves the effective relay server configuration.
pub mod config;

/// Request handlers for the deploy relay.
pub mod handlers;

/// Contains the core Axum-based HTTP server implementation.
pub mod server_logic;

/// # Handle Server Command (`handle_srv`)
///
/// Entry point of `zipdeploy srv`: loads the configuration files, applies the
/// command-line overrides and runs the server until shutdown.
pub async fn handle_srv(args: SrvArgs) -> Result<()> {
    info!("Handling srv command with args: {:?}", args);

    let file_config = core_config::load_config()?;
    let server_config = config::resolve_config(args, &file_config)?;
    info!("Effective server config: {:?}", server_config);

    server_logic::run_server(server_config).await?;
    Ok(())
}
