//! # ZipDeploy Terminal Output Helpers (`common::ui`)
//!
//! File: cli/src/common/ui/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Small formatting helpers for human-facing output (command summaries and
//! log lines).
//!

/// # Human Readable Size (`human_readable_size`)
///
/// Formats a byte count using binary units: `0 B`, `123 B`, `1.2 KB`, `3.4 MB`.
pub fn human_readable_size(size: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if size == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let exponent = ((size as f64).ln() / base.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let scaled = size as f64 / base.powi(exponent as i32);

    if exponent == 0 {
        format!("{} {}", size, UNITS[0])
    } else {
        format!("{:.1} {}", scaled, UNITS[exponent])
    }
}
