//! # ZipDeploy Archive Utilities Module (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module holds the archive transcoder that turns an uploaded ZIP
//! archive into the gzipped tarball the platform's deploy endpoint expects.
//!
//! ## Architecture
//!
//! - **`zip`**: Reads the ZIP central directory and exposes entries as
//!   `SourceEntry` records with lazily decompressed content.
//! - **`tar`**: Writes `TargetEntry` records into a gzipped tar stream.
//! - **`timestamp`**: `TimeShift`, the local-minus-UTC correction applied to
//!   ZIP wall-clock timestamps.
//! - **`transcode`**: Drives the conversion entry by entry (`transcode`,
//!   `convert`) and defines `TranscodeError`.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive::{self, TimeShift};
//!
//! let shift = TimeShift::from_host(); // captured once per conversion
//! let tar_gz = archive::convert(&zip_bytes, shift)?; // Cursor<Vec<u8>> at offset 0
//! ```
//!

pub mod tar;
pub mod timestamp;
pub mod transcode;
pub mod zip;

pub use timestamp::TimeShift;
pub use transcode::{convert, transcode, TranscodeError, TranscodeSummary};
