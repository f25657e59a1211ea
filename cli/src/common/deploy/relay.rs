//! # ZipDeploy Deploy Output Relay (`common::deploy::relay`)
//!
//! File: cli/src/common/deploy/relay.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The platform's deploy endpoint answers with a long-running, line-oriented
//! text stream (build and rollout progress). This module re-chunks that byte
//! stream into whole lines and terminates each one for display:
//! - `LineTerminator::HtmlBreak` appends `<br>` (browser relay);
//! - `LineTerminator::Newline` appends `\n` (terminal output).
//!
//! A line ends at `\n`, `\r\n` or a lone `\r` (progress output that redraws
//! itself), even when the `\r\n` pair straddles two chunks. Empty lines are
//! kept, and a final line without a terminator is emitted when the stream ends.
//!
//! ## Usage
//!
//! ```rust
//! let upstream = response.bytes_stream();
//! let body = axum::body::Body::from_stream(relay_lines(upstream, LineTerminator::HtmlBreak));
//! ```
//!
use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

/// How each relayed line is terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    HtmlBreak,
    Newline,
}

impl LineTerminator {
    pub fn as_str(self) -> &'static str {
        match self {
            LineTerminator::HtmlBreak => "<br>",
            LineTerminator::Newline => "\n",
        }
    }
}

/// Incremental line splitter that buffers a partial line between chunks.
#[derive(Debug)]
pub struct LineRelay {
    partial: Vec<u8>,
    terminator: LineTerminator,
    /// The previous byte was `\r`, so an immediate `\n` belongs to it.
    after_cr: bool,
}

impl LineRelay {
    pub fn new(terminator: LineTerminator) -> Self {
        Self {
            partial: Vec::new(),
            terminator,
            after_cr: false,
        }
    }

    /// Feeds one chunk and returns every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            let after_cr = std::mem::replace(&mut self.after_cr, false);
            match byte {
                b'\n' if after_cr => {}
                b'\n' => lines.push(self.take_line()),
                b'\r' => {
                    lines.push(self.take_line());
                    self.after_cr = true;
                }
                _ => self.partial.push(byte),
            }
        }
        lines
    }

    /// Flushes the unterminated tail, if any, at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            None
        } else {
            Some(self.take_line())
        }
    }

    fn take_line(&mut self) -> String {
        let raw = std::mem::take(&mut self.partial);
        format!("{}{}", String::from_utf8_lossy(&raw), self.terminator.as_str())
    }
}

struct RelayState<S> {
    upstream: Pin<Box<S>>,
    relay: LineRelay,
    ready: VecDeque<String>,
    exhausted: bool,
}

/// # Relay Upstream Lines (`relay_lines`)
///
/// Wraps a byte stream (e.g. `reqwest::Response::bytes_stream`) into a stream
/// of terminated lines. An upstream error is forwarded once and ends the relay.
pub fn relay_lines<S, E>(
    upstream: S,
    terminator: LineTerminator,
) -> impl Stream<Item = Result<Bytes, E>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
{
    let state = RelayState {
        upstream: Box::pin(upstream),
        relay: LineRelay::new(terminator),
        ready: VecDeque::new(),
        exhausted: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.ready.pop_front() {
                return Some((Ok(Bytes::from(line)), state));
            }
            if state.exhausted {
                return None;
            }
            match state.upstream.next().await {
                Some(Ok(chunk)) => {
                    let lines = state.relay.push(&chunk);
                    state.ready.extend(lines);
                }
                Some(Err(err)) => {
                    state.exhausted = true;
                    return Some((Err(err), state));
                }
                None => {
                    state.exhausted = true;
                    let tail = state.relay.finish();
                    state.ready.extend(tail);
                }
            }
        }
    })
}
