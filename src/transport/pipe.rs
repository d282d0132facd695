//! Transport over the engine's stdin/stdout pipes.

use std::io::{self, Read, Write};
use std::process::{ChildStdin, ChildStdout};
use std::time::Duration;

use super::{Chunk, Transport};

/// Parent-side ends of the engine's standard streams.
///
/// Dropping it closes both pipes.
#[derive(Debug)]
pub struct PipeTransport {
    stdin: ChildStdin,
    stdout: ChildStdout,
}

impl PipeTransport {
    #[must_use]
    pub fn new(stdin: ChildStdin, stdout: ChildStdout) -> Self {
        PipeTransport { stdin, stdout }
    }
}

impl Transport for PipeTransport {
    fn write_some(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.stdin.write(bytes)
    }

    fn read_some(&mut self, buf: &mut [u8], wait: Option<Duration>) -> io::Result<Chunk> {
        if !readable(&self.stdout, wait)? {
            return Ok(Chunk::Pending);
        }
        match self.stdout.read(buf)? {
            0 => Ok(Chunk::EndOfStream),
            n => Ok(Chunk::Data(n)),
        }
    }
}

/// Block until the pipe is readable (data or hang-up) or `wait` elapses.
#[cfg(unix)]
fn readable(stdout: &ChildStdout, wait: Option<Duration>) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;

    let timeout_ms = match wait {
        None => -1,
        // Round up so a sub-millisecond remainder still sleeps.
        Some(d) => d
            .as_micros()
            .div_ceil(1000)
            .min(libc::c_int::MAX as u128) as libc::c_int,
    };

    let mut fds = libc::pollfd {
        fd: stdout.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    let rc = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(rc > 0)
}

/// Without a portable readiness primitive the read itself blocks.
#[cfg(not(unix))]
fn readable(_stdout: &ChildStdout, _wait: Option<Duration>) -> io::Result<bool> {
    Ok(true)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::{Command, Stdio};
    use std::time::Instant;

    fn cat() -> (std::process::Child, PipeTransport) {
        let mut child = Command::new("cat")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let transport = PipeTransport::new(child.stdin.take().unwrap(), child.stdout.take().unwrap());
        (child, transport)
    }

    #[test]
    fn test_echo_round_trip() {
        let (mut child, mut transport) = cat();
        crate::transport::send(&mut transport, "isready").unwrap();

        let mut buf = [0u8; 64];
        let chunk = transport
            .read_some(&mut buf, Some(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(chunk, Chunk::Data(8));
        assert_eq!(&buf[..8], b"isready\n");

        drop(transport);
        child.wait().unwrap();
    }

    #[test]
    fn test_silent_pipe_is_pending_after_wait() {
        let (mut child, mut transport) = cat();
        let mut buf = [0u8; 16];

        let start = Instant::now();
        let chunk = transport
            .read_some(&mut buf, Some(Duration::from_millis(50)))
            .unwrap();
        assert_eq!(chunk, Chunk::Pending);
        assert!(start.elapsed() >= Duration::from_millis(40));

        drop(transport);
        child.wait().unwrap();
    }

    #[test]
    fn test_closed_pipe_is_end_of_stream() {
        let mut child = Command::new("true")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let mut transport =
            PipeTransport::new(child.stdin.take().unwrap(), child.stdout.take().unwrap());
        child.wait().unwrap();

        let mut buf = [0u8; 16];
        let chunk = transport
            .read_some(&mut buf, Some(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(chunk, Chunk::EndOfStream);
    }
}
