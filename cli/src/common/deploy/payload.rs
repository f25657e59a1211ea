//! # ZipDeploy Deploy Payload Decoding (`common::deploy::payload`)
//!
//! File: cli/src/common/deploy/payload.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The dashboard's drag-and-drop widget posts the dropped ZIP file as a
//! base64 string in the `filecontent` form field. This module turns that field
//! back into raw archive bytes before it reaches the transcoder.
//!
//! Accepted input:
//! - plain standard-alphabet base64 (with `=` padding);
//! - the same text wrapped over several lines (whitespace is ignored);
//! - a `data:<mime>;base64,` URL prefix, as produced by a browser `FileReader`.
//!
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Errors raised while decoding the `filecontent` field.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PayloadError {
    #[error("the 'filecontent' field is empty")]
    Empty,

    #[error("the 'filecontent' field is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// # Decode `filecontent` (`decode_filecontent`)
///
/// Decodes the base64 text of the `filecontent` field into raw bytes.
///
/// ## Errors
///
/// * `PayloadError::Empty` - nothing but whitespace (or a bare data-URL
///   prefix) was supplied.
/// * `PayloadError::InvalidBase64` - the text is not valid base64.
pub fn decode_filecontent(field: &str) -> Result<Vec<u8>, PayloadError> {
    let encoded = strip_data_url(field.trim_start());
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err(PayloadError::Empty);
    }
    Ok(STANDARD.decode(compact)?)
}

fn strip_data_url(field: &str) -> &str {
    if !field.starts_with("data:") {
        return field;
    }
    match field.find(";base64,") {
        Some(pos) => &field[pos + ";base64,".len()..],
        None => field,
    }
}
