//! Launch and protocol configuration.

use std::time::Duration;

/// Default time allowed for the engine to answer `uci` with `uciok`
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Bytes requested per read from the engine
pub const DEFAULT_READ_CHUNK: usize = 1024;

/// Upper bound on buffered, not-yet-terminated engine output (1 MiB)
pub const DEFAULT_MAX_BUFFER: usize = 1024 * 1024;

/// Sleep between polls once the engine's output has reached end-of-stream
pub const DEFAULT_EOF_BACKOFF: Duration = Duration::from_millis(10);

/// How often the termination watcher checks the child's exit status
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_millis(5);

/// Time `quit` gives the engine to exit on its own before killing it
pub const DEFAULT_QUIT_GRACE: Duration = Duration::from_millis(500);

/// What to do with the engine's standard error stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StderrMode {
    /// Share the parent's stderr
    #[default]
    Inherit,
    /// Discard engine diagnostics
    Null,
}

/// Configuration for launching and talking to an engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long `launch` waits for `uciok`
    pub handshake_timeout: Duration,
    /// Bytes requested per read; zero is treated as one
    pub read_chunk: usize,
    /// Longest unterminated line accepted before the engine is killed
    pub max_buffer: usize,
    /// Pause after end-of-stream before reading again
    pub eof_backoff: Duration,
    /// Watcher poll period
    pub watch_interval: Duration,
    /// Time allowed for a clean exit after `quit`
    pub quit_grace: Duration,
    /// Where the engine's stderr goes
    pub stderr: StderrMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            read_chunk: DEFAULT_READ_CHUNK,
            max_buffer: DEFAULT_MAX_BUFFER,
            eof_backoff: DEFAULT_EOF_BACKOFF,
            watch_interval: DEFAULT_WATCH_INTERVAL,
            quit_grace: DEFAULT_QUIT_GRACE,
            stderr: StderrMode::default(),
        }
    }
}

impl EngineConfig {
    /// Set how long the handshake may take.
    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the read size; zero is bumped to one byte.
    #[must_use]
    pub fn with_read_chunk(mut self, bytes: usize) -> Self {
        self.read_chunk = bytes.max(1);
        self
    }

    /// Cap the length of a line still waiting for its terminator.
    #[must_use]
    pub fn with_max_buffer(mut self, bytes: usize) -> Self {
        self.max_buffer = bytes;
        self
    }

    /// Set the pause taken after end-of-stream during a wait.
    #[must_use]
    pub fn with_eof_backoff(mut self, backoff: Duration) -> Self {
        self.eof_backoff = backoff;
        self
    }

    /// Set how often the watcher polls for exit.
    #[must_use]
    pub fn with_watch_interval(mut self, interval: Duration) -> Self {
        self.watch_interval = interval;
        self
    }

    /// Set how long `quit` waits before killing.
    #[must_use]
    pub fn with_quit_grace(mut self, grace: Duration) -> Self {
        self.quit_grace = grace;
        self
    }

    /// Route the engine's stderr.
    #[must_use]
    pub fn with_stderr(mut self, mode: StderrMode) -> Self {
        self.stderr = mode;
        self
    }
}
