//! # ZipDeploy Common Utilities
//!
//! File: cli/src/common/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared building blocks used by the command modules. Command handlers
//! (`commands::*`) parse arguments and orchestrate; the work itself lives here.
//!
//! ## Submodules
//!
//! - `archive`: ZIP to `.tar.gz` transcoding.
//! - `deploy`: payload decoding, platform upload and output relay.
//! - `ui`: formatting helpers for terminal output.
//!

/// ZIP to gzipped tar conversion.
pub mod archive;
/// Upload of converted archives to the platform and relaying of its output.
pub mod deploy;
/// Formatting helpers for terminal output.
pub mod ui;
