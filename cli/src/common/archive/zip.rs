//! # ZipDeploy ZIP Source Reader (`common::archive::zip`)
//!
//! File: cli/src/common/archive/zip.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Thin wrapper over the `zip` crate that exposes an uploaded archive as a
//! sequence of `SourceEntry` records in central-directory order. Opening the
//! archive only parses the central directory; entry contents are decompressed
//! lazily as each entry's reader is consumed.
//!
//! Entry metadata is reduced to what the tar side needs: the raw name, the
//! declared uncompressed size and the local wall-clock modification time.
//! Whether an entry is a directory is decided by its name alone (a trailing
//! `/`), never by the ZIP external attribute bits.
//!
use super::timestamp;
use super::transcode::TranscodeError;
use chrono::NaiveDateTime;
use std::io::{Read, Seek};
use tracing::debug;
use zip::read::ZipFile;
use zip::ZipArchive;

/// Metadata of a single entry read from the ZIP central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Entry path as stored in the archive.
    pub name: String,
    /// Declared uncompressed size in bytes.
    pub size: u64,
    /// Local wall-clock modification time (no timezone).
    pub modified: NaiveDateTime,
}

impl SourceEntry {
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// An entry's metadata together with a reader over its decompressed content.
pub struct OpenEntry<'a> {
    pub meta: SourceEntry,
    pub content: ZipFile<'a>,
}

/// A parsed ZIP archive whose entries can be visited in central-directory order.
pub struct ZipSource<R> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> ZipSource<R> {
    /// Parses the central directory of `reader`.
    ///
    /// ## Errors
    ///
    /// `TranscodeError::MalformedArchive` when no valid end-of-central-directory
    /// record or central directory can be read (truncated or non-ZIP input).
    pub fn open(reader: R) -> Result<Self, TranscodeError> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| TranscodeError::MalformedArchive(e.to_string()))?;
        debug!("Parsed ZIP central directory with {} entries", archive.len());
        Ok(Self { archive })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// # Open Entry (`entry`)
    ///
    /// Reads the record at `index` and returns its metadata plus a reader over
    /// the decompressed content.
    ///
    /// ## Errors
    ///
    /// `TranscodeError::MalformedArchive` if the entry's local header cannot be
    /// located or read, if its compression method is unsupported, or if its
    /// timestamp fields are out of range.
    pub fn entry(&mut self, index: usize) -> Result<OpenEntry<'_>, TranscodeError> {
        let content = self.archive.by_index(index).map_err(|e| {
            TranscodeError::MalformedArchive(format!("entry #{}: {}", index, e))
        })?;

        let stamp = content.last_modified();
        let modified = timestamp::wall_clock(
            stamp.year(),
            stamp.month(),
            stamp.day(),
            stamp.hour(),
            stamp.minute(),
            stamp.second(),
        )
        .ok_or_else(|| {
            TranscodeError::MalformedArchive(format!(
                "entry '{}' has an invalid modification time",
                content.name()
            ))
        })?;

        let meta = SourceEntry {
            name: content.name().to_string(),
            size: content.size(),
            modified,
        };
        Ok(OpenEntry { meta, content })
    }
}
