//! # ZipDeploy Relay Server Configuration
//!
//! File: cli/src/commands/srv/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module resolves the effective settings of the relay server by
//! combining, in order of precedence:
//! 1. Command-line arguments (and their environment variables)
//! 2. The merged `[platform]` / `[server]` sections of the configuration files
//! 3. Default values
//!
//! ## Examples
//!
//! ```rust
//! let file_config = core::config::load_config()?;
//! let config = resolve_config(args, &file_config)?;
//! println!("Relaying deploys to {}", config.platform_host);
//! ```
//!
use crate::core::config::Config;
use crate::core::error::{Result, ZipDeployError};
use clap::Parser;
use std::net::IpAddr;
use tracing::debug;

/// # Server Command Arguments (`SrvArgs`)
///
/// Every flag is optional so that an unset flag falls through to the
/// configuration files instead of overriding them with a default.
#[derive(Parser, Debug, Default)]
pub struct SrvArgs {
    /// Network port to listen on (default 8000). If it is taken, the next
    /// free port is used.
    #[arg(long, short)]
    pub port: Option<u16>,

    /// IP address to bind to (default 127.0.0.1; use 0.0.0.0 for all interfaces).
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Base URL of the platform API that receives the deploys.
    #[arg(long, env = "ZIPDEPLOY_PLATFORM_HOST")]
    pub platform_host: Option<String>,

    /// Value of the `origin` query parameter sent with each deploy.
    #[arg(long)]
    pub origin: Option<String>,

    /// Disables Cross-Origin Resource Sharing (CORS) headers.
    #[arg(long)]
    pub no_cors: bool,

    /// Largest accepted request body in bytes.
    #[arg(long)]
    pub max_body_bytes: Option<usize>,
}

/// # Effective Server Configuration (`ServerConfig`)
///
/// The validated settings the server runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub host: IpAddr,
    pub platform_host: String,
    pub origin: String,
    pub enable_cors: bool,
    pub max_body_bytes: usize,
}

/// # Resolve Server Configuration (`resolve_config`)
///
/// Applies command-line overrides on top of the file configuration.
///
/// ## Errors
///
/// Returns `ZipDeployError::Config` if no platform host is configured
/// anywhere, or if an override is invalid (empty origin, zero body limit).
pub fn resolve_config(args: SrvArgs, file: &Config) -> Result<ServerConfig> {
    let platform_host = file.platform.resolve_host(args.platform_host)?;

    let origin = args.origin.unwrap_or_else(|| file.platform.origin.clone());
    if origin.trim().is_empty() {
        return Err(ZipDeployError::Config("--origin cannot be empty.".to_string()).into());
    }

    let max_body_bytes = args.max_body_bytes.unwrap_or(file.server.max_body_bytes);
    if max_body_bytes == 0 {
        return Err(
            ZipDeployError::Config("--max-body-bytes must be greater than zero.".to_string())
                .into(),
        );
    }

    let config = ServerConfig {
        port: args.port.unwrap_or(file.server.port),
        host: args.host.unwrap_or(file.server.host),
        platform_host,
        origin,
        enable_cors: file.server.enable_cors && !args.no_cors,
        max_body_bytes,
    };
    debug!("Resolved server configuration: {:?}", config);
    Ok(config)
}
