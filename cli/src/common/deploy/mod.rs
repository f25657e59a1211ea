//! # ZipDeploy Deploy Utilities Module (`common::deploy`)
//!
//! File: cli/src/common/deploy/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Everything around the archive transcoder that a drag-and-drop deploy
//! needs: decoding the uploaded payload, sending the converted archive to the
//! platform API, and relaying the platform's progress output.
//!
//! ## Architecture
//!
//! - **`payload`**: base64 `filecontent` field to raw ZIP bytes.
//! - **`client`**: multipart upload to `/apps/{app}/deploy`.
//! - **`relay`**: line splitting and termination of the streamed response.
//!

pub mod client;
pub mod payload;
pub mod relay;

pub use client::{DeployClient, DEFAULT_ORIGIN};
pub use payload::{decode_filecontent, PayloadError};
pub use relay::{relay_lines, LineTerminator};
