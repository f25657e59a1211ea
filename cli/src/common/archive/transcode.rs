//! # ZipDeploy Archive Transcoder (`common::archive::transcode`)
//!
//! File: cli/src/common/archive/transcode.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Converts a ZIP archive into a gzip-compressed POSIX tar archive, remapping
//! per-entry metadata on the way. This is what turns a drag-and-dropped ZIP
//! into something the platform's deploy endpoint accepts.
//!
//! ## Architecture
//!
//! 1. The caller captures a `TimeShift` (local minus UTC) once, before the
//!    conversion starts.
//! 2. `ZipSource` parses the central directory; entries are not decompressed
//!    up front.
//! 3. Each entry, in central-directory order, is mapped to a `TargetEntry`
//!    and written to a `TarGzWriter`. File contents are streamed from the ZIP
//!    decompressor straight into the gzip encoder.
//! 4. The tar and gzip streams are finalized and the writer is returned.
//!
//! Any failure aborts the whole conversion. There is no partial output and
//! no per-entry error list.
//!
//! The conversion is synchronous and holds no shared state, so independent
//! conversions can run concurrently (the relay server runs them on tokio's
//! blocking pool).
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive::{convert, TimeShift};
//! use std::io::Read;
//!
//! let zip_bytes: Vec<u8> = std::fs::read("site.zip")?;
//! let mut tar_gz = convert(&zip_bytes, TimeShift::from_host())?;
//! let mut out = Vec::new();
//! tar_gz.read_to_end(&mut out)?; // buffer is positioned at offset 0
//! ```
//!
use super::tar::{TarGzWriter, TargetEntry};
use super::timestamp::TimeShift;
use super::zip::ZipSource;
use std::io::{self, Cursor, Read, Seek, Write};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while converting a ZIP archive.
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// The input is not a readable ZIP archive (bad central directory,
    /// unreadable entry record, unsupported method or invalid timestamp).
    #[error("malformed zip archive: {0}")]
    MalformedArchive(String),

    /// Reading an entry's content or writing the output failed.
    #[error("I/O failure while {stage}: {source}")]
    IoFailure {
        stage: String,
        #[source]
        source: io::Error,
    },
}

/// Counters reported after a successful conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeSummary {
    pub files: usize,
    pub directories: usize,
    /// Total uncompressed bytes of file content copied.
    pub content_bytes: u64,
}

/// # Transcode ZIP to tar.gz (`transcode`)
///
/// Reads the ZIP archive from `input` and writes the gzipped tar archive to
/// `output`, returning the output writer together with a summary.
///
/// ## Arguments
///
/// * `input` - Seekable reader over the complete ZIP archive.
/// * `output` - Destination for the `.tar.gz` stream.
/// * `shift` - Local-minus-UTC offset applied to every entry's timestamp.
///
/// ## Errors
///
/// * `TranscodeError::MalformedArchive` - the central directory or an entry
///   record cannot be parsed.
/// * `TranscodeError::IoFailure` - an entry's content cannot be fully read
///   (including checksum mismatches), or writing to `output` fails.
pub fn transcode<R, W>(
    input: R,
    output: W,
    shift: TimeShift,
) -> Result<(W, TranscodeSummary), TranscodeError>
where
    R: Read + Seek,
    W: Write,
{
    let mut source = ZipSource::open(input)?;
    let mut writer = TarGzWriter::new(output);
    let mut summary = TranscodeSummary::default();
    debug!(
        "Transcoding {} ZIP entries with a time shift of {} seconds",
        source.len(),
        shift.seconds()
    );

    for index in 0..source.len() {
        let entry = source.entry(index)?;

        let target = TargetEntry::from_source(&entry.meta, shift);
        debug!(
            "Entry #{}: '{}' ({:?}, {} bytes, mtime {})",
            index, target.name, target.kind, target.size, target.mtime
        );

        writer
            .append(&target, entry.content)
            .map_err(|source| TranscodeError::IoFailure {
                stage: format!("copying entry '{}'", target.name),
                source,
            })?;

        if entry.meta.is_dir() {
            summary.directories += 1;
        } else {
            summary.files += 1;
            summary.content_bytes += target.size;
        }
    }

    let output = writer.finish().map_err(|source| TranscodeError::IoFailure {
        stage: "finishing the tar.gz stream".to_string(),
        source,
    })?;

    info!(
        "Converted ZIP archive: {} files, {} directories, {} content bytes (time shift {})",
        summary.files, summary.directories, summary.content_bytes, shift
    );
    Ok((output, summary))
}

/// # Convert In-Memory ZIP (`convert`)
///
/// Converts a complete ZIP archive held in memory and returns the `.tar.gz`
/// bytes as an owned buffer positioned at offset `0`, ready to be read or
/// uploaded from the start.
pub fn convert(zip_bytes: &[u8], shift: TimeShift) -> Result<Cursor<Vec<u8>>, TranscodeError> {
    let (buffer, _) = transcode(Cursor::new(zip_bytes), Vec::new(), shift)?;
    Ok(Cursor::new(buffer))
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::archive::timestamp;
    use flate2::read::GzDecoder;
    use tar::{Archive, EntryType};
    use zip::write::FileOptions;
    use zip::{CompressionMethod, DateTime, ZipWriter};

    /// One entry as observed in the produced tar archive.
    #[derive(Debug, PartialEq, Eq)]
    struct TarRecord {
        name: String,
        kind: EntryType,
        mode: u32,
        size: u64,
        mtime: u64,
        content: Vec<u8>,
    }

    fn read_tar_gz(bytes: &[u8]) -> Vec<TarRecord> {
        let mut archive = Archive::new(GzDecoder::new(bytes));
        let mut records = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let header = entry.header().clone();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            records.push(TarRecord {
                name: String::from_utf8_lossy(&entry.path_bytes()).to_string(),
                kind: header.entry_type(),
                mode: header.mode().unwrap(),
                size: header.size().unwrap(),
                mtime: header.mtime().unwrap(),
                content,
            });
        }
        records
    }

    fn stamp() -> DateTime {
        DateTime::from_date_and_time(2024, 1, 15, 10, 0, 0).unwrap()
    }

    /// In-memory ZIP builder; every entry gets the same timestamp.
    struct ZipFixture {
        writer: ZipWriter<Cursor<Vec<u8>>>,
    }

    impl ZipFixture {
        fn new() -> Self {
            Self {
                writer: ZipWriter::new(Cursor::new(Vec::new())),
            }
        }

        fn options() -> FileOptions {
            FileOptions::default().last_modified_time(stamp())
        }

        fn dir(mut self, name: &str) -> Self {
            self.writer.add_directory(name, Self::options()).unwrap();
            self
        }

        fn file(mut self, name: &str, content: &[u8]) -> Self {
            self.writer.start_file(name, Self::options()).unwrap();
            self.writer.write_all(content).unwrap();
            self
        }

        fn stored(mut self, name: &str, content: &[u8]) -> Self {
            let options = Self::options().compression_method(CompressionMethod::Stored);
            self.writer.start_file(name, options).unwrap();
            self.writer.write_all(content).unwrap();
            self
        }

        fn finish(mut self) -> Vec<u8> {
            self.writer.finish().unwrap().into_inner()
        }
    }

    #[test]
    fn test_app_scenario() {
        let main_go = vec![b'x'; 120];
        let zip_bytes = ZipFixture::new()
            .dir("app/")
            .file("app/main.go", &main_go)
            .finish();
        let shift = TimeShift::from_seconds(-3 * 3600);

        let mut tar_gz = convert(&zip_bytes, shift).unwrap();
        assert_eq!(tar_gz.position(), 0);
        let mut bytes = Vec::new();
        tar_gz.read_to_end(&mut bytes).unwrap();

        let expected_mtime =
            shift.to_utc_epoch(timestamp::wall_clock(2024, 1, 15, 10, 0, 0).unwrap());
        assert_eq!(expected_mtime, 1_705_312_800 + 3 * 3600);
        assert_eq!(
            read_tar_gz(&bytes),
            vec![
                TarRecord {
                    name: "app/".to_string(),
                    kind: EntryType::Directory,
                    mode: 0o755,
                    size: 0,
                    mtime: expected_mtime,
                    content: Vec::new(),
                },
                TarRecord {
                    name: "app/main.go".to_string(),
                    kind: EntryType::Regular,
                    mode: 0o644,
                    size: 120,
                    mtime: expected_mtime,
                    content: main_go,
                },
            ]
        );
    }

    #[test]
    fn test_order_and_contents_match_zip() {
        let big: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let zip_bytes = ZipFixture::new()
            .file("z-last-alphabetically.txt", b"first in the archive")
            .dir("docs/")
            .file("docs/readme.md", b"# Title\n")
            .file("a/b/c/deep.bin", &big)
            .file("empty.txt", b"")
            .finish();

        let (bytes, summary) =
            transcode(Cursor::new(zip_bytes.as_slice()), Vec::new(), TimeShift::UTC).unwrap();
        assert_eq!(
            summary,
            TranscodeSummary {
                files: 4,
                directories: 1,
                content_bytes: 20 + 8 + 200_000,
            }
        );

        let records = read_tar_gz(&bytes);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "z-last-alphabetically.txt",
                "docs/",
                "docs/readme.md",
                "a/b/c/deep.bin",
                "empty.txt"
            ]
        );
        assert_eq!(records[0].content, b"first in the archive");
        assert_eq!(records[2].content, b"# Title\n");
        assert_eq!(records[3].content, big);
        assert_eq!(records[3].size, 200_000);
        assert!(records[4].content.is_empty());
        assert_eq!(records[4].kind, EntryType::Regular);
    }

    #[test]
    fn test_stored_entries_are_copied() {
        let zip_bytes = ZipFixture::new().stored("raw.dat", b"0123456789").finish();
        let mut out = Vec::new();
        convert(&zip_bytes, TimeShift::UTC)
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();
        let records = read_tar_gz(&out);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, b"0123456789");
        assert_eq!(records[0].mode, 0o644);
    }

    #[test]
    fn test_same_shift_is_deterministic() {
        let zip_bytes = ZipFixture::new()
            .dir("lib/")
            .file("lib/a.py", b"print('a')\n")
            .finish();
        let shift = TimeShift::from_seconds(5400);
        let first = read_tar_gz(&convert(&zip_bytes, shift).unwrap().into_inner());
        let second = read_tar_gz(&convert(&zip_bytes, shift).unwrap().into_inner());
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_archive_produces_empty_tar() {
        let zip_bytes = ZipFixture::new().finish();
        let out = convert(&zip_bytes, TimeShift::UTC).unwrap().into_inner();
        assert!(!out.is_empty());
        assert!(read_tar_gz(&out).is_empty());
    }

    #[test]
    fn test_garbage_is_malformed() {
        let result = convert(b"PK\x03\x04 this is not really a zip", TimeShift::UTC);
        assert!(matches!(result, Err(TranscodeError::MalformedArchive(_))));
    }

    #[test]
    fn test_truncated_zip_is_malformed() {
        let zip_bytes = ZipFixture::new()
            .dir("app/")
            .file("app/main.go", b"package main\n")
            .finish();
        let truncated = &zip_bytes[..zip_bytes.len() / 2];
        let result = convert(truncated, TimeShift::UTC);
        assert!(matches!(result, Err(TranscodeError::MalformedArchive(_))));
    }

    #[test]
    fn test_corrupt_entry_data_is_io_failure() {
        let payload = b"AAAAAAAAAAAAAAAA";
        let mut zip_bytes = ZipFixture::new().stored("data.txt", payload).finish();
        // Flip one stored content byte so the CRC check fails while the
        // central directory stays intact.
        let offset = zip_bytes
            .windows(payload.len())
            .position(|window| window == payload)
            .unwrap();
        zip_bytes[offset] = b'B';

        match convert(&zip_bytes, TimeShift::UTC) {
            Err(TranscodeError::IoFailure { stage, .. }) => {
                assert!(stage.contains("data.txt"));
            }
            Err(other) => panic!("expected IoFailure, got {}", other),
            Ok(_) => panic!("expected IoFailure, got a converted archive"),
        }
    }

    #[test]
    fn test_entry_names_are_copied_verbatim() {
        let zip_bytes = ZipFixture::new()
            .file("./app/x", b"dot")
            .file("app//x", b"double")
            .file("../up.txt", b"up")
            .file("/abs.txt", b"abs")
            .finish();

        let out = convert(&zip_bytes, TimeShift::UTC).unwrap().into_inner();
        let records = read_tar_gz(&out);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["./app/x", "app//x", "../up.txt", "/abs.txt"]);
        assert_eq!(records[1].content, b"double");
        assert_eq!(records[2].kind, EntryType::Regular);
    }
}
