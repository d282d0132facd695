//! In-memory transport for deterministic tests.

use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::Duration;

use super::{Chunk, Transport};

/// A transport that replays scripted engine output and records writes.
///
/// Each queued chunk is delivered by its own read (split further if the
/// reader's buffer is smaller), so tests control fragmentation exactly.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    incoming: VecDeque<Vec<u8>>,
    replies: Vec<(String, Vec<Vec<u8>>)>,
    written: Vec<u8>,
    scanned: usize,
    max_write: Option<usize>,
    write_error: Option<io::ErrorKind>,
    closed: bool,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a chunk of engine output.
    #[must_use]
    pub fn with_incoming(mut self, chunk: impl Into<Vec<u8>>) -> Self {
        self.push_incoming(chunk);
        self
    }

    /// Queue `chunks` each time the interface writes the line `command`.
    #[must_use]
    pub fn with_reply<C: Into<Vec<u8>>>(
        mut self,
        command: &str,
        chunks: impl IntoIterator<Item = C>,
    ) -> Self {
        self.replies.push((
            command.to_string(),
            chunks.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Accept at most `bytes` per write call.
    #[must_use]
    pub fn with_max_write(mut self, bytes: usize) -> Self {
        self.max_write = Some(bytes);
        self
    }

    /// Fail every write with `kind`.
    #[must_use]
    pub fn with_write_error(mut self, kind: io::ErrorKind) -> Self {
        self.write_error = Some(kind);
        self
    }

    /// Report end-of-stream once the queued output is drained.
    #[must_use]
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    pub fn push_incoming(&mut self, chunk: impl Into<Vec<u8>>) {
        let chunk = chunk.into();
        if !chunk.is_empty() {
            self.incoming.push_back(chunk);
        }
    }

    /// Everything written so far.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Complete lines written so far, terminators stripped.
    #[must_use]
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written)
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn queue_replies(&mut self) {
        while let Some(offset) = self.written[self.scanned..].iter().position(|&b| b == b'\n') {
            let end = self.scanned + offset;
            let line = String::from_utf8_lossy(&self.written[self.scanned..end]).into_owned();
            self.scanned = end + 1;

            let replies: Vec<Vec<u8>> = self
                .replies
                .iter()
                .filter(|(command, _)| *command == line)
                .flat_map(|(_, chunks)| chunks.iter().cloned())
                .collect();
            for chunk in replies {
                self.push_incoming(chunk);
            }
        }
    }
}

impl Transport for ScriptedTransport {
    fn write_some(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.write_error {
            return Err(io::Error::from(kind));
        }
        let n = self.max_write.map_or(bytes.len(), |max| max.min(bytes.len()));
        self.written.extend_from_slice(&bytes[..n]);
        self.queue_replies();
        Ok(n)
    }

    fn read_some(&mut self, buf: &mut [u8], wait: Option<Duration>) -> io::Result<Chunk> {
        let Some(front) = self.incoming.front_mut() else {
            if self.closed {
                return Ok(Chunk::EndOfStream);
            }
            if let Some(wait) = wait {
                thread::sleep(wait);
            }
            return Ok(Chunk::Pending);
        };

        let n = front.len().min(buf.len());
        buf[..n].copy_from_slice(&front[..n]);
        if n == front.len() {
            self.incoming.pop_front();
        } else {
            front.drain(..n);
        }
        Ok(Chunk::Data(n))
    }
}
