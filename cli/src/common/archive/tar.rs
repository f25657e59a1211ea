//! # ZipDeploy TAR Archive Writer (`common::archive::tar`)
//!
//! File: cli/src/common/archive/tar.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module provides the output side of the archive transcoder: it writes
//! gzipped tarballs (`.tar.gz`) entry by entry, the format expected by the
//! platform's deploy endpoint.
//!
//! ## Architecture
//!
//! The module leverages the `tar` crate for building the archive structure and
//! the `flate2` crate for Gzip compression.
//!
//! - `TargetEntry` describes one tar record: name, type, size, mode and UTC
//!   modification time. It is derived from a ZIP `SourceEntry` with fixed
//!   permission bits (`0644` for files, `0755` for directories).
//! - `TarGzWriter` wraps `tar::Builder<GzEncoder<W>>`, so the tar stream is
//!   compressed as it is produced and never held uncompressed in memory.
//! - Entry names are written into the header as raw bytes, without the path
//!   normalization `tar::Builder::append_data` performs. Names that fit the
//!   ustar `name`/`prefix` fields go there; longer ones are preceded by a GNU
//!   long-name record.
//! - `finish` writes the end-of-archive blocks, closes the gzip stream and
//!   hands the underlying writer back.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive::tar::{TarGzWriter, TargetEntry};
//!
//! let mut writer = TarGzWriter::new(Vec::new());
//! writer.append(&TargetEntry::directory("app/", 1_705_312_800), std::io::empty())?;
//! writer.append(&TargetEntry::file("app/main.go", 12, 1_705_312_800), &b"package main"[..])?;
//! let tar_gz_bytes: Vec<u8> = writer.finish()?;
//! ```
//!
use super::timestamp::TimeShift;
use super::zip::SourceEntry;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};
use tar::{EntryType, Header};

/// Permission bits given to every regular file.
pub const FILE_MODE: u32 = 0o644;
/// Permission bits given to every directory.
pub const DIR_MODE: u32 = 0o755;

/// Size of the ustar `name` field.
const NAME_LEN: usize = 100;
/// Size of the ustar `prefix` field.
const PREFIX_LEN: usize = 155;
/// Placeholder name of a GNU long-name record.
const LONG_LINK_NAME: &[u8] = b"././@LongLink";

/// The two kinds of tar records the transcoder emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    RegularFile,
    Directory,
}

/// # Tar Record Description (`TargetEntry`)
///
/// Header fields of one record in the output archive. Directories always
/// carry a size of `0` and no content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub mode: u32,
    /// Modification time as UTC epoch seconds.
    pub mtime: u64,
}

impl TargetEntry {
    pub fn file(name: impl Into<String>, size: u64, mtime: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::RegularFile,
            size,
            mode: FILE_MODE,
            mtime,
        }
    }

    pub fn directory(name: impl Into<String>, mtime: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            size: 0,
            mode: DIR_MODE,
            mtime,
        }
    }

    /// # Map a ZIP Entry (`from_source`)
    ///
    /// Applies the metadata remapping rules to a ZIP entry:
    /// - the name is copied verbatim;
    /// - a trailing `/` makes it a directory with size `0`, regardless of the
    ///   size recorded in the ZIP;
    /// - otherwise it is a regular file with the declared uncompressed size;
    /// - the local wall-clock timestamp is corrected by `shift` into UTC.
    pub fn from_source(source: &SourceEntry, shift: TimeShift) -> Self {
        let mtime = shift.to_utc_epoch(source.modified);
        if source.is_dir() {
            Self::directory(source.name.clone(), mtime)
        } else {
            Self::file(source.name.clone(), source.size, mtime)
        }
    }

    fn header(&self) -> Header {
        let mut header = Header::new_ustar();
        header.set_size(self.size);
        header.set_mode(self.mode);
        header.set_mtime(self.mtime);
        header.set_entry_type(match self.kind {
            EntryKind::RegularFile => EntryType::Regular,
            EntryKind::Directory => EntryType::Directory,
        });
        header
    }
}

/// # Gzipped Tar Writer (`TarGzWriter`)
///
/// Streams tar records through a Gzip encoder into `W`.
pub struct TarGzWriter<W: Write> {
    builder: tar::Builder<GzEncoder<W>>,
}

impl<W: Write> TarGzWriter<W> {
    /// Creates a writer using the default Gzip compression level.
    pub fn new(inner: W) -> Self {
        let encoder = GzEncoder::new(inner, Compression::default());
        Self {
            builder: tar::Builder::new(encoder),
        }
    }

    /// # Append a Record (`append`)
    ///
    /// Writes the header for `entry` followed by its content. The name is
    /// stored byte for byte (`./`, `//` and `..` components are kept). For
    /// directories the `content` reader is ignored. For files exactly
    /// `entry.size` bytes are expected; a reader that is shorter or longer
    /// fails the append.
    pub fn append<R: Read>(&mut self, entry: &TargetEntry, content: R) -> io::Result<()> {
        let mut header = entry.header();
        let name = entry.name.as_bytes();
        if !set_ustar_name(&mut header, name) {
            self.append_long_name(name)?;
            set_truncated_name(&mut header, name);
        }
        header.set_cksum();

        match entry.kind {
            EntryKind::Directory => self.builder.append(&header, io::empty()),
            EntryKind::RegularFile => {
                let body = ExactReader::new(content, entry.size);
                self.builder.append(&header, body)
            }
        }
    }

    /// Writes a GNU `L` record carrying the full (NUL-terminated) name of the
    /// record that follows it.
    fn append_long_name(&mut self, name: &[u8]) -> io::Result<()> {
        let mut header = Header::new_gnu();
        set_truncated_name(&mut header, LONG_LINK_NAME);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_entry_type(EntryType::GNULongName);
        header.set_size(name.len() as u64 + 1);
        header.set_cksum();

        let mut data = Vec::with_capacity(name.len() + 1);
        data.extend_from_slice(name);
        data.push(0);
        self.builder.append(&header, data.as_slice())
    }

    /// Writes the end-of-archive blocks, finishes the Gzip stream and returns
    /// the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        let encoder = self.builder.into_inner()?;
        encoder.finish()
    }
}

/// Stores `name` in the ustar `name` field, or split over `prefix` and `name`
/// at a `/`. Returns `false` when the name fits neither way.
fn set_ustar_name(header: &mut Header, name: &[u8]) -> bool {
    let (prefix, rest) = match split_ustar_name(name) {
        Some(split) => split,
        None => return false,
    };
    match header.as_ustar_mut() {
        Some(ustar) => {
            ustar.name = [0; NAME_LEN];
            ustar.name[..rest.len()].copy_from_slice(rest);
            ustar.prefix = [0; PREFIX_LEN];
            ustar.prefix[..prefix.len()].copy_from_slice(prefix);
            true
        }
        None => false,
    }
}

/// Finds a `(prefix, name)` pair that readers join back as `prefix/name`.
fn split_ustar_name(name: &[u8]) -> Option<(&[u8], &[u8])> {
    if name.len() <= NAME_LEN {
        return Some((&[], name));
    }
    name.iter()
        .enumerate()
        .filter(|&(_, &byte)| byte == b'/')
        .map(|(pos, _)| (&name[..pos], &name[pos + 1..]))
        .find(|(prefix, rest)| {
            !prefix.is_empty()
                && prefix.len() <= PREFIX_LEN
                && !rest.is_empty()
                && rest.len() <= NAME_LEN
        })
}

/// Fills the classic `name` field with as much of `name` as fits.
fn set_truncated_name(header: &mut Header, name: &[u8]) {
    let field = &mut header.as_old_mut().name;
    *field = [0; NAME_LEN];
    let len = name.len().min(NAME_LEN);
    field[..len].copy_from_slice(&name[..len]);
}

/// Reader that yields exactly `remaining` bytes of `inner`.
///
/// After the declared size is reached, one more read is issued so the source
/// sees its end of stream; the ZIP decompressor verifies the entry's CRC at
/// that point. A source that ends early or keeps producing data past the
/// declared size is an error.
struct ExactReader<R> {
    inner: R,
    remaining: u64,
    drained: bool,
}

impl<R: Read> ExactReader<R> {
    fn new(inner: R, size: u64) -> Self {
        Self {
            inner,
            remaining: size,
            drained: false,
        }
    }

    fn drain(&mut self) -> io::Result<()> {
        if self.drained {
            return Ok(());
        }
        self.drained = true;
        let mut probe = [0u8; 1];
        if self.inner.read(&mut probe)? != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "entry content is longer than its declared size",
            ));
        }
        Ok(())
    }
}

impl<R: Read> Read for ExactReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.remaining == 0 {
            self.drain()?;
            return Ok(0);
        }
        let limit = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let read = self.inner.read(&mut buf[..limit])?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("entry content ended {} bytes early", self.remaining),
            ));
        }
        self.remaining -= read as u64;
        Ok(read)
    }
}
