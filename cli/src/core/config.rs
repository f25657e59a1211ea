//! # ZipDeploy Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module implements the configuration system for ZipDeploy, handling
//! loading, merging and validation of configuration data. It supports a
//! multi-level approach that combines defaults, user settings and
//! project-specific overrides.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Command-line flags and environment variables (applied by each command)
//! 2. Project-specific `.zipdeploy.toml` in the current directory or ancestors
//! 3. User-specific `config.toml` in the platform config directory
//!    (e.g. `~/.config/zipdeploy/config.toml`)
//! 4. Default values defined in the code
//!
//! ## Examples
//!
//! Configuration file format:
//!
//! ```toml
//! [platform]
//! host = "https://paas.example.com"
//! origin = "drag-and-drop"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//! max_body_bytes = 67108864
//! enable_cors = true
//! ```
//!
//! Loading and using configuration:
//!
//! ```rust
//! let cfg = config::load_config()?;
//! let platform = cfg.platform.host.as_deref();
//! let port = cfg.server.port;
//! ```
//!
use crate::common::deploy::DEFAULT_ORIGIN;
use crate::core::error::{Result, ZipDeployError};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub server: ServerSection,
}

/// Where converted archives are deployed.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Base URL of the platform API (scheme + host, optional base path).
    pub host: Option<String>,
    /// Value of the `origin` query parameter sent with each deploy.
    #[serde(default = "default_origin")]
    pub origin: String,
}

/// Settings for the relay server (`zipdeploy srv`).
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_server_host")]
    pub host: IpAddr,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Largest accepted request body, in bytes (the base64 form payload).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            host: None,
            origin: default_origin(),
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            max_body_bytes: default_max_body_bytes(),
            enable_cors: default_enable_cors(),
        }
    }
}

impl PlatformConfig {
    /// # Resolve Platform Host (`resolve_host`)
    ///
    /// Returns the command-line value if given, otherwise the configured host.
    ///
    /// ## Errors
    ///
    /// `ZipDeployError::Config` when neither is set.
    pub fn resolve_host(&self, flag: Option<String>) -> std::result::Result<String, ZipDeployError> {
        flag.or_else(|| self.host.clone()).ok_or_else(|| {
            ZipDeployError::Config(
                "No platform host configured. Pass --platform-host, set ZIPDEPLOY_PLATFORM_HOST \
                 or add `host` to the [platform] section of .zipdeploy.toml."
                    .to_string(),
            )
        })
    }
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}
fn default_server_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}
fn default_server_port() -> u16 {
    8000
}
fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}
fn default_enable_cors() -> bool {
    true
}

const PROJECT_CONFIG_FILENAME: &str = ".zipdeploy.toml";

/// # Load Configuration (`load_config`)
///
/// Loads the user and project configuration files, merges them (project wins)
/// and validates the result. Missing files are not an error.
pub fn load_config() -> Result<Config> {
    let user_config = load_user_config()?;
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let project_config = match find_project_config_path(&current_dir) {
        Some(path) => {
            info!("Loading project configuration from: {}", path.display());
            Some(load_config_from_path(&path)?)
        }
        None => {
            debug!(
                "No project configuration file ({}) found in current directory or ancestors.",
                PROJECT_CONFIG_FILENAME
            );
            None
        }
    };
    let merged_config = merge_configs(user_config.unwrap_or_default(), project_config);
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "ZipDeploy", "zipdeploy") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

/// Walks up from `start` looking for `.zipdeploy.toml`, stopping at the first
/// directory that contains `.git`.
fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Project values win wherever they differ from the defaults.
fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project = match project {
        Some(p) => p,
        None => return user,
    };
    let defaults = Config::default();

    Config {
        platform: PlatformConfig {
            host: project.platform.host.or(user.platform.host),
            origin: if project.platform.origin != defaults.platform.origin {
                project.platform.origin
            } else {
                user.platform.origin
            },
        },
        server: ServerSection {
            host: if project.server.host != defaults.server.host {
                project.server.host
            } else {
                user.server.host
            },
            port: if project.server.port != defaults.server.port {
                project.server.port
            } else {
                user.server.port
            },
            max_body_bytes: if project.server.max_body_bytes != defaults.server.max_body_bytes {
                project.server.max_body_bytes
            } else {
                user.server.max_body_bytes
            },
            enable_cors: if project.server.enable_cors != defaults.server.enable_cors {
                project.server.enable_cors
            } else {
                user.server.enable_cors
            },
        },
    }
}

/// Checks the values that cannot be verified by deserialization alone.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(host) = &config.platform.host {
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(anyhow!(ZipDeployError::Config(format!(
                "Platform host '{}' must start with http:// or https://",
                host
            ))));
        }
    }
    if config.platform.origin.trim().is_empty() {
        return Err(anyhow!(ZipDeployError::Config(
            "Platform origin cannot be empty.".to_string()
        )));
    }
    if config.server.max_body_bytes == 0 {
        return Err(anyhow!(ZipDeployError::Config(
            "server.max_body_bytes must be greater than zero.".to_string()
        )));
    }
    Ok(())
}
