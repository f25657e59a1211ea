//! # ZipDeploy CLI Convert Integration Tests
//!
//! File: cli/tests/convert.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Runs `zipdeploy convert` on real files in a temporary directory and
//! inspects the produced tarball with the `tar` and `flate2` crates.
//!

mod common;
use common::*;
use flate2::read::GzDecoder;
use predicates::prelude::*;
use std::io::Read;
use std::path::Path;
use tempfile::tempdir;

/// Reads back `(path, size, content)` for every entry of a `.tar.gz` file.
fn read_tar_gz(path: &Path) -> Vec<(String, u64, Vec<u8>)> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let name = String::from_utf8_lossy(&entry.path_bytes()).to_string();
            let size = entry.header().size().unwrap();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            (name, size, content)
        })
        .collect()
}

#[test]
fn test_convert_writes_default_output() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("site.zip");
    write_sample_zip(&zip_path);

    isolated_cmd(dir.path())
        .args(["convert", "site.zip", "--time-shift", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("site.tar.gz"))
        .stdout(predicate::str::contains("2 files, 1 directories"));

    let entries = read_tar_gz(&dir.path().join("site.tar.gz"));
    let names: Vec<&str> = entries.iter().map(|(n, _, _)| n.as_str()).collect();
    assert_eq!(names, ["site/", "site/index.html", "site/app.js"]);
    assert_eq!(entries[0].1, 0);
    assert_eq!(entries[1].2, b"<h1>hello</h1>\n");
    assert_eq!(entries[2].1, b"console.log('hi');\n".len() as u64);
}

#[test]
fn test_convert_explicit_output_and_force() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("site.zip");
    write_sample_zip(&zip_path);
    let out = dir.path().join("out.tgz");
    std::fs::write(&out, b"stale").unwrap();

    isolated_cmd(dir.path())
        .args(["convert", "site.zip", "-o", "out.tgz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(std::fs::read(&out).unwrap(), b"stale");

    isolated_cmd(dir.path())
        .args(["convert", "site.zip", "-o", "out.tgz", "--force"])
        .assert()
        .success();
    assert_eq!(read_tar_gz(&out).len(), 3);
}

#[test]
fn test_convert_negative_time_shift_is_accepted() {
    let dir = tempdir().unwrap();
    write_sample_zip(&dir.path().join("site.zip"));

    isolated_cmd(dir.path())
        .args(["convert", "site.zip", "--time-shift", "-10800"])
        .assert()
        .success();
}

#[test]
fn test_convert_rejects_non_zip_input() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("notes.zip"), b"this is not a zip archive").unwrap();

    isolated_cmd(dir.path())
        .args(["convert", "notes.zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed zip archive"));
    assert!(!dir.path().join("notes.tar.gz").exists());
}

#[test]
fn test_convert_missing_input() {
    let dir = tempdir().unwrap();

    isolated_cmd(dir.path())
        .args(["convert", "missing.zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read ZIP archive"));
}
