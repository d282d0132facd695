//! Byte transport between the interface and an engine.
//!
//! [`Transport`] exposes the two raw primitives (one write, one read) and the
//! free functions [`send`] and [`receive_chunk`] build the protocol-level
//! guarantees on top of them.

mod pipe;
mod scripted;

use std::io;
use std::time::Duration;

pub use pipe::PipeTransport;
pub use scripted::ScriptedTransport;

/// Outcome of a single receive attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk {
    /// This many bytes were read into the caller's buffer
    Data(usize),
    /// Nothing became readable before the wait expired
    Pending,
    /// The engine closed its output
    EndOfStream,
}

/// A bidirectional byte channel to an engine.
pub trait Transport {
    /// Write some prefix of `bytes`, returning how many were accepted.
    fn write_some(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Wait up to `wait` for input (forever when `None`), then read at most
    /// `buf.len()` bytes.
    fn read_some(&mut self, buf: &mut [u8], wait: Option<Duration>) -> io::Result<Chunk>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_some(&mut self, bytes: &[u8]) -> io::Result<usize> {
        (**self).write_some(bytes)
    }

    fn read_some(&mut self, buf: &mut [u8], wait: Option<Duration>) -> io::Result<Chunk> {
        (**self).read_some(buf, wait)
    }
}

/// Send one protocol line, appending `\n` if missing.
///
/// Short writes are continued until every byte is written.
pub fn send<T: Transport + ?Sized>(transport: &mut T, text: &str) -> io::Result<()> {
    let mut line = Vec::with_capacity(text.len() + 1);
    line.extend_from_slice(text.as_bytes());
    if line.last() != Some(&b'\n') {
        line.push(b'\n');
    }

    let mut remaining = line.as_slice();
    while !remaining.is_empty() {
        match transport.write_some(remaining) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "engine accepted no bytes",
                ))
            }
            Ok(n) => remaining = &remaining[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    engine_trace!(">> {}", text.trim_end_matches('\n'));
    Ok(())
}

/// Perform one receive of up to `buf.len()` bytes.
///
/// An interrupted wait is reported as [`Chunk::Pending`].
pub fn receive_chunk<T: Transport + ?Sized>(
    transport: &mut T,
    buf: &mut [u8],
    wait: Option<Duration>,
) -> io::Result<Chunk> {
    match transport.read_some(buf, wait) {
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Chunk::Pending),
        other => other,
    }
}
