//! # ZipDeploy CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Each `.rs` file
//! in that directory is compiled as a separate test crate and runs the
//! compiled `zipdeploy` binary.
//!

// Not every test file uses every helper.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::io::{Cursor, Write};
use std::path::Path;

/// # Get ZipDeploy Command (`zipdeploy_cmd`)
///
/// Creates an `assert_cmd::Command` for the compiled `zipdeploy` binary.
///
/// ## Panics
/// Panics if the binary cannot be found via `Command::cargo_bin`.
pub fn zipdeploy_cmd() -> Command {
    Command::cargo_bin("zipdeploy").expect("Failed to find zipdeploy binary for testing")
}

/// # Isolated ZipDeploy Command (`isolated_cmd`)
///
/// Like `zipdeploy_cmd`, but runs inside `dir` with the home and config
/// directories pointed at it and the platform environment variables cleared,
/// so the developer's own configuration never leaks into a test.
pub fn isolated_cmd(dir: &Path) -> Command {
    let mut cmd = zipdeploy_cmd();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("ZIPDEPLOY_PLATFORM_HOST")
        .env_remove("ZIPDEPLOY_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Writes a small ZIP archive with a directory and two files to `path`.
pub fn write_sample_zip(path: &Path) {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    writer.add_directory("site/", options).unwrap();
    writer.start_file("site/index.html", options).unwrap();
    writer.write_all(b"<h1>hello</h1>\n").unwrap();
    writer.start_file("site/app.js", options).unwrap();
    writer.write_all(b"console.log('hi');\n").unwrap();
    let bytes = writer.finish().unwrap().into_inner();
    std::fs::write(path, bytes).unwrap();
}
