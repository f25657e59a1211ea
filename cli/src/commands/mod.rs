//! # ZipDeploy Command Modules
//!
//! File: cli/src/commands/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Aggregates the top-level commands of the ZipDeploy CLI. Each command
//! defines its own Clap arguments structure and an async handler called
//! from `main.rs`.
//!
//! ## Commands
//!
//! - `convert`: Local ZIP to `.tar.gz` conversion
//! - `deploy`: Conversion plus upload to the platform, output streamed to the terminal
//! - `srv`: HTTP relay server for dashboard drag-and-drop deploys
//!

/// Converts a local ZIP archive into a `.tar.gz` file.
pub mod convert;
/// Converts a ZIP archive and deploys it to a platform application.
pub mod deploy;
/// Command group for the deploy relay server. Includes configuration, handlers and server logic.
pub mod srv;
