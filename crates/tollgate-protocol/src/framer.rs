//! Line framer for the host serial link.
//!
//! The host link delivers bytes one at a time from a device buffer of bounded
//! depth. The framer accumulates them across as many loop iterations as it
//! takes and emits a [`Line`] each time a line feed arrives.
//!
//! # Framing
//!
//! ```text
//! ┌───────────┐ byte != LF  ┌───────────┐
//! │ buffering │────────────>│ buffering │
//! └───────────┘             └───────────┘
//!       │ LF
//!       v
//!  emit Line(buffer), clear buffer
//! ```
//!
//! A carriage return directly before the line feed is dropped so hosts using
//! `\r\n` endings produce the same lines as hosts using `\n`. There is no
//! length limit other than available memory, and a line is never handed out
//! before its terminator has been seen.
//!
//! # Usage
//!
//! ```
//! use tollgate_protocol::LineFramer;
//!
//! let mut framer = LineFramer::new();
//!
//! framer.feed_slice(b"ACCESS_GRA");
//! assert!(framer.next_line().is_none());
//!
//! framer.feed_slice(b"NTED\n");
//! let line = framer.next_line().unwrap();
//! assert_eq!(line.as_str(), "ACCESS_GRANTED");
//! ```

use bytes::BytesMut;
use std::collections::VecDeque;
use std::fmt;
use tollgate_core::constants::{CARRIAGE_RETURN, LINE_TERMINATOR};

/// Initial buffer capacity; the longest legitimate host line is 14 bytes.
const INITIAL_BUFFER_CAPACITY: usize = 64;

/// A complete line received from the host, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Line(String);

impl Line {
    /// Build a line from raw bytes, replacing invalid UTF-8 sequences.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let bytes = bytes.strip_suffix(&[CARRIAGE_RETURN]).unwrap_or(bytes);
        Line(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Get the line content.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the line, returning its content.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Line {
    fn from(text: &str) -> Self {
        Line::from_bytes(text.as_bytes())
    }
}

/// Accumulates host-link bytes into newline-delimited lines.
#[derive(Debug)]
pub struct LineFramer {
    /// Bytes of the line currently being assembled.
    buffer: BytesMut,

    /// Lines completed by [`feed_slice`](Self::feed_slice) and not yet taken.
    lines: VecDeque<Line>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            lines: VecDeque::new(),
        }
    }

    /// Feed a single byte.
    ///
    /// Returns the completed line when `byte` is a line feed; the internal
    /// buffer is cleared in that case. Any other byte is appended and `None`
    /// is returned.
    ///
    /// ```
    /// use tollgate_protocol::LineFramer;
    ///
    /// let mut framer = LineFramer::new();
    /// assert!(framer.feed(b'O').is_none());
    /// assert!(framer.feed(b'K').is_none());
    /// assert_eq!(framer.feed(b'\n').unwrap().as_str(), "OK");
    /// ```
    pub fn feed(&mut self, byte: u8) -> Option<Line> {
        if byte == LINE_TERMINATOR {
            let line = Line::from_bytes(&self.buffer);
            self.buffer.clear();
            Some(line)
        } else {
            self.buffer.extend_from_slice(&[byte]);
            None
        }
    }

    /// Feed a run of bytes, queueing every line they complete.
    pub fn feed_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if let Some(line) = self.feed(byte) {
                self.lines.push_back(line);
            }
        }
    }

    /// Take the oldest queued line, if any.
    pub fn next_line(&mut self) -> Option<Line> {
        self.lines.pop_front()
    }

    /// Number of bytes of the partial line held in the buffer.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` when no partial line and no queued line are held.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.lines.is_empty()
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}
