//! # ZipDeploy Archive Timestamps (`common::archive::timestamp`)
//!
//! File: cli/src/common/archive/timestamp.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! ZIP archives record entry modification times as local wall-clock values
//! (year, month, day, hour, minute, second) without any timezone tag, while
//! tar headers carry UTC epoch seconds. Converting between the two requires
//! knowing the offset between local time and UTC on the host.
//!
//! `TimeShift` is that offset, captured **once** per conversion and passed
//! explicitly into the transcoder. Keeping it a plain value (instead of
//! reading the host clock per entry) makes conversions deterministic: the same
//! archive converted twice with the same `TimeShift` yields identical tar
//! timestamps.
//!
//! The correction is a single fixed offset. An archive whose entries were
//! written on the other side of a daylight-saving transition is shifted by the
//! current offset all the same.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive::TimeShift;
//!
//! let shift = TimeShift::from_host(); // local - UTC, in seconds
//! let fixed = TimeShift::from_seconds(3600); // injected, e.g. in tests
//! ```
//!
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::fmt;

/// Offset between local wall-clock time and UTC, in seconds (`local - utc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeShift(i64);

impl Default for TimeShift {
    fn default() -> Self {
        Self::UTC
    }
}

impl TimeShift {
    /// No correction; ZIP timestamps are treated as UTC.
    pub const UTC: TimeShift = TimeShift(0);

    /// Wraps an explicit offset in seconds.
    pub fn from_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    /// Reads the host's current local-minus-UTC offset.
    pub fn from_host() -> Self {
        let offset = Local::now().offset().local_minus_utc();
        Self(i64::from(offset))
    }

    pub fn seconds(self) -> i64 {
        self.0
    }

    /// # Convert Local Wall-Clock Time to UTC Epoch (`to_utc_epoch`)
    ///
    /// Interprets `local` as a UTC calendar value, takes its epoch seconds and
    /// subtracts the shift. Results before the Unix epoch clamp to `0`, since
    /// tar headers cannot represent negative times.
    pub fn to_utc_epoch(self, local: NaiveDateTime) -> u64 {
        let epoch = local.and_utc().timestamp() - self.0;
        u64::try_from(epoch).unwrap_or(0)
    }
}

impl fmt::Display for TimeShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { '-' } else { '+' };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
    }
}

/// Builds a calendar value from the raw fields of a ZIP (MS-DOS) timestamp.
///
/// Returns `None` for out-of-range fields (month 0, hour 25, ...), which only
/// occur in corrupt archives.
pub fn wall_clock(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))?.and_hms_opt(
        u32::from(hour),
        u32::from(minute),
        u32::from(second),
    )
}
