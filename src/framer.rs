//! Line framing for engine output.
//!
//! Bytes read from the engine are appended to a [`ReceiveBuffer`]; complete
//! `\n`-terminated lines are then popped off the front one at a time. A
//! trailing partial line stays buffered until its terminator arrives.

use std::fmt;

use crate::error::{EngineError, Result};

const LINE_TERMINATOR: u8 = b'\n';

/// One protocol line with its terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message(String);

impl Message {
    /// Wrap text that is already a single line.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Message(text.into())
    }

    fn from_line(mut line: &[u8]) -> Self {
        if let Some((b'\r', rest)) = line.split_last() {
            line = rest;
        }
        Message(String::from_utf8_lossy(line).into_owned())
    }

    /// The line without its terminator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Byte-exact, case-sensitive prefix match against the whole line.
    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.as_bytes().starts_with(prefix.as_bytes())
    }

    /// Take the line text by value.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Message {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Bytes received from the engine that have not been framed yet.
///
/// The limit bounds the unterminated tail, the bytes after the last `\n`.
/// Complete lines waiting to be popped do not count against it.
#[derive(Debug, Clone)]
pub struct ReceiveBuffer {
    bytes: Vec<u8>,
    tail: usize,
    limit: usize,
}

impl ReceiveBuffer {
    /// Empty buffer holding at most `limit` bytes of an unterminated line.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        ReceiveBuffer {
            bytes: Vec::new(),
            tail: 0,
            limit,
        }
    }

    /// Append bytes to the tail of the buffer.
    ///
    /// Fails without modifying the buffer if the partial line after the last
    /// terminator would grow past the configured limit.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let tail = match bytes.iter().rposition(|&b| b == LINE_TERMINATOR) {
            Some(last) => bytes.len() - last - 1,
            None => self.tail + bytes.len(),
        };
        if tail > self.limit {
            return Err(EngineError::BufferOverflow { limit: self.limit });
        }
        self.bytes.extend_from_slice(bytes);
        self.tail = tail;
        Ok(())
    }

    /// Remove and return the first complete line, if there is one.
    pub fn pop_message(&mut self) -> Option<Message> {
        let end = self.bytes.iter().position(|&b| b == LINE_TERMINATOR)?;
        let message = Message::from_line(&self.bytes[..end]);
        self.bytes.drain(..=end);
        Some(message)
    }

    /// Total bytes held, complete lines included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Maximum length of the unterminated tail.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Unframed bytes currently held.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.bytes
    }

    /// Discard everything, partial line included.
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.tail = 0;
    }
}

impl Default for ReceiveBuffer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_BUFFER)
    }
}
