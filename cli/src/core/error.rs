//! # ZipDeploy Error Types
//!
//! File: cli/src/core/error.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module defines the application-level error types used throughout
//! ZipDeploy. Component errors with a narrow, well-known set of failure modes
//! (the archive transcoder, the payload decoder) carry their own `thiserror`
//! enums next to the code that raises them; this module collects the errors
//! that surface at command and request boundaries.
//!
//! ## Architecture
//!
//! The error system consists of two main components:
//! - `ZipDeployError`: A custom error enum using `thiserror` for specific error types
//! - `Result<T>`: A type alias for `anyhow::Result<T>` for flexible error handling
//!
//! The error types cover:
//! - Configuration errors
//! - Archive transcoding errors (wrapping `TranscodeError`)
//! - Deploy payload errors (wrapping `PayloadError`)
//! - Upload errors against the platform API
//!
//! ## Examples
//!
//! ```rust
//! // Return a specific error type
//! if cfg.platform.host.is_none() {
//!     return Err(ZipDeployError::Config("platform host is not set".into()))?;
//! }
//!
//! // Pattern matching on error types
//! match result {
//!     Err(e) if e.downcast_ref::<ZipDeployError>().map_or(false, |de| matches!(de, ZipDeployError::Transcode(_))) => {
//!         println!("The uploaded file is not a usable ZIP archive");
//!     }
//!     other => other?,
//! }
//! ```
//!
use crate::common::archive::TranscodeError;
use crate::common::deploy::PayloadError;
use thiserror::Error;

/// Custom error type for the ZipDeploy application.
#[derive(Error, Debug)]
pub enum ZipDeployError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Archive conversion failed: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Invalid deploy payload: {0}")]
    Payload(#[from] PayloadError),

    #[error("Upload to '{url}' failed: {source}")]
    Upload {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Argument parsing error: {0}")]
    ArgumentParsing(String),
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;
