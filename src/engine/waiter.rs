//! Deadline-bounded waiting for a tagged response.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::{EngineError, Result};
use crate::framer::Message;
use crate::transport::{Chunk, Transport};

use super::EngineHandle;

impl<T: Transport> EngineHandle<T> {
    /// Wait for the first line starting with `prefix`.
    ///
    /// Lines that do not match are handed to subscribers and dropped. Reads
    /// block on the transport's readiness wait, bounded by the time left. If
    /// the deadline passes first the engine is killed and `Timeout` is
    /// returned. End-of-stream alone does not end the wait.
    pub fn wait_for(&mut self, prefix: &str, timeout: Duration) -> Result<Message> {
        self.ensure_running()?;

        let start = Instant::now();
        let deadline = start.checked_add(timeout);
        let mut scratch = vec![0u8; self.config.read_chunk.max(1)];
        let mut exit_noticed = false;

        loop {
            while let Some(message) = self.buffer.pop_message() {
                if message.starts_with(prefix) {
                    engine_trace!("<< {message}");
                    return Ok(message);
                }
                self.publish(message);
            }

            let now = Instant::now();
            let remaining = match deadline {
                Some(deadline) if now >= deadline => {
                    engine_warn!(
                        "No '{prefix}' from '{}' within {} ms",
                        self.program(),
                        timeout.as_millis()
                    );
                    self.kill();
                    return Err(EngineError::Timeout {
                        expected: prefix.to_string(),
                        after: timeout,
                    });
                }
                Some(deadline) => Some(deadline - now),
                None => None,
            };

            if !exit_noticed && self.status.is_terminated() {
                exit_noticed = true;
                engine_debug!(
                    "Engine '{}' exited while waiting for '{prefix}'; draining output",
                    self.program()
                );
            }

            if self.fill(&mut scratch, remaining)? == Chunk::EndOfStream {
                let pause = remaining.map_or(self.config.eof_backoff, |r| {
                    r.min(self.config.eof_backoff)
                });
                thread::sleep(pause);
            }
        }
    }

    /// Send `command` and wait for a line starting with `prefix`.
    pub fn request(&mut self, command: &str, prefix: &str, timeout: Duration) -> Result<Message> {
        self.send(command)?;
        self.wait_for(prefix, timeout)
    }
}
