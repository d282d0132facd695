//! The per-engine handle.

use std::ffi::OsStr;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::framer::{Message, ReceiveBuffer};
use crate::process::{EngineProcess, EngineState, ExitNotifier, StatusCell, Termination};
use crate::transport::{self, Chunk, PipeTransport, Transport};
use crate::uci::{self, EngineIdentity};

const ATTACHED_LABEL: &str = "<attached>";

/// One engine instance and everything needed to talk to it.
///
/// The handle exclusively owns the pipes and the receive buffer. Once the
/// engine is observed to be terminated the pipes are dropped and every
/// further `send`/`wait_for` fails with [`EngineError::EngineTerminated`].
pub struct EngineHandle<T: Transport = PipeTransport> {
    pub(super) process: Option<EngineProcess>,
    pub(super) transport: Option<T>,
    pub(super) buffer: ReceiveBuffer,
    pub(super) status: StatusCell,
    pub(super) notifier: ExitNotifier,
    pub(super) subscribers: Vec<Sender<Message>>,
    pub(super) config: EngineConfig,
    label: String,
    identity: EngineIdentity,
    advertised: Vec<Message>,
}

impl EngineHandle<PipeTransport> {
    /// Launch an engine and complete the `uci`/`uciok` handshake using the
    /// default configuration.
    pub fn launch<S: AsRef<OsStr>>(program: impl AsRef<OsStr>, args: &[S]) -> Result<Self> {
        Self::launch_with(program, args, EngineConfig::default())
    }

    /// Launch an engine and complete the handshake.
    ///
    /// Any failure kills the partially started engine.
    pub fn launch_with<S: AsRef<OsStr>>(
        program: impl AsRef<OsStr>,
        args: &[S],
        config: EngineConfig,
    ) -> Result<Self> {
        let mut handle = Self::spawn(program, args, config)?;
        handle.handshake()?;
        Ok(handle)
    }

    /// Start the engine process without performing the handshake.
    pub fn spawn<S: AsRef<OsStr>>(
        program: impl AsRef<OsStr>,
        args: &[S],
        config: EngineConfig,
    ) -> Result<Self> {
        let (process, pipes) = EngineProcess::spawn(program, args, &config)?;
        let status = process.status().clone();
        let notifier = process.notifier().clone();
        let label = process.program().to_string();
        Ok(Self::assemble(Some(process), pipes, status, notifier, label, config))
    }
}

impl<T: Transport> EngineHandle<T> {
    /// Wrap an already connected transport that has no process behind it.
    ///
    /// `kill` on such a handle just marks it terminated and drops the
    /// transport.
    pub fn attach(transport: T, config: EngineConfig) -> Self {
        Self::assemble(
            None,
            transport,
            StatusCell::running(),
            ExitNotifier::new(),
            ATTACHED_LABEL.to_string(),
            config,
        )
    }

    fn assemble(
        process: Option<EngineProcess>,
        transport: T,
        status: StatusCell,
        notifier: ExitNotifier,
        label: String,
        config: EngineConfig,
    ) -> Self {
        EngineHandle {
            process,
            transport: Some(transport),
            buffer: ReceiveBuffer::new(config.max_buffer),
            status,
            notifier,
            subscribers: Vec::new(),
            config,
            label,
            identity: EngineIdentity::default(),
            advertised: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        self.status.get()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    /// OS process id, `None` for attached transports.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(EngineProcess::pid)
    }

    /// Program path for launched engines.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// `id name`/`id author` seen during the handshake.
    #[must_use]
    pub fn identity(&self) -> &EngineIdentity {
        &self.identity
    }

    /// Raw `option ...` lines seen during the handshake, in order.
    #[must_use]
    pub fn advertised_options(&self) -> &[Message] {
        &self.advertised
    }

    /// The transport, while the channels are still open.
    #[must_use]
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    /// Bytes received but not yet framed.
    #[must_use]
    pub fn buffer(&self) -> &ReceiveBuffer {
        &self.buffer
    }

    /// Receive every line that `wait_for` passes over without matching.
    pub fn subscribe(&mut self) -> Receiver<Message> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Be told when the engine terminates, however that happens.
    #[must_use]
    pub fn subscribe_termination(&self) -> Receiver<Termination> {
        self.notifier.subscribe()
    }

    /// Send one line to the engine, appending `\n` if missing.
    pub fn send(&mut self, text: &str) -> Result<()> {
        self.ensure_running()?;
        let channel = self
            .transport
            .as_mut()
            .ok_or(EngineError::EngineTerminated)?;
        transport::send(channel, text)?;
        Ok(())
    }

    /// Perform one read of up to `max_bytes`, waiting at most `wait` for
    /// input, and buffer whatever arrives.
    pub fn receive_chunk(&mut self, max_bytes: usize, wait: Option<Duration>) -> Result<Chunk> {
        self.ensure_running()?;
        let mut scratch = vec![0u8; max_bytes.max(1)];
        self.fill(&mut scratch, wait)
    }

    /// Pop the next complete line from the receive buffer.
    pub fn pop_message(&mut self) -> Option<Message> {
        self.buffer.pop_message()
    }

    /// Forcibly terminate the engine and close the channels.
    ///
    /// Killing a terminated handle does nothing.
    pub fn kill(&mut self) {
        match &self.process {
            Some(process) => process.kill(),
            None => {
                if self.status.terminate() {
                    self.notifier.publish(Termination {
                        pid: 0,
                        status: None,
                    });
                }
            }
        }
        self.close_channels();
    }

    /// Send `uci` and wait for `uciok`.
    ///
    /// Lines passed over on the way are inspected for the engine's identity
    /// and option advertisements. On failure the engine is killed; write
    /// failures are reported as [`EngineError::LaunchFailed`].
    pub fn handshake(&mut self) -> Result<()> {
        let lines = self.subscribe();
        let timeout = self.config.handshake_timeout;
        let outcome = self
            .send(uci::UCI)
            .and_then(|()| self.wait_for(uci::UCIOK, timeout));

        for message in lines.try_iter() {
            if !self.identity.observe(&message) && uci::is_option_advertisement(&message) {
                self.advertised.push(message);
            }
        }
        drop(lines);

        match outcome {
            Ok(_) => {
                engine_info!(
                    "Engine '{}' ready ({})",
                    self.label,
                    self.identity.name.as_deref().unwrap_or("unnamed")
                );
                Ok(())
            }
            Err(e) => {
                self.kill();
                Err(self.handshake_error(e))
            }
        }
    }

    fn handshake_error(&self, error: EngineError) -> EngineError {
        let source = match error {
            EngineError::Io(source) => source,
            EngineError::EngineTerminated => io::Error::new(
                io::ErrorKind::BrokenPipe,
                "engine exited during handshake",
            ),
            other => return other,
        };
        EngineError::LaunchFailed {
            program: self.label.clone(),
            source,
        }
    }

    /// Send `isready` and wait for `readyok`.
    pub fn is_ready(&mut self, timeout: Duration) -> Result<()> {
        self.request(uci::ISREADY, uci::READYOK, timeout).map(|_| ())
    }

    /// Ask the engine to exit, killing it if it has not within the
    /// configured grace period. Returns true if it exited on its own.
    pub fn quit(&mut self) -> bool {
        if self.status.is_terminated() {
            self.close_channels();
            return true;
        }
        if let Err(e) = self.send(uci::QUIT) {
            engine_debug!("Could not send quit to '{}': {e}", self.label);
        }
        self.close_channels();

        let graceful = match &self.process {
            Some(process) => process.wait_for_exit(self.config.quit_grace),
            None => false,
        };
        self.kill();
        graceful
    }

    /// Fail with `EngineTerminated` if the watcher has seen the engine exit,
    /// closing the channels the first time that is noticed.
    pub(super) fn ensure_running(&mut self) -> Result<()> {
        if self.status.is_terminated() || self.transport.is_none() {
            self.close_channels();
            return Err(EngineError::EngineTerminated);
        }
        Ok(())
    }

    /// Read once into `scratch` and append the bytes to the buffer.
    pub(super) fn fill(&mut self, scratch: &mut [u8], wait: Option<Duration>) -> Result<Chunk> {
        let channel = self
            .transport
            .as_mut()
            .ok_or(EngineError::EngineTerminated)?;
        let chunk = transport::receive_chunk(channel, scratch, wait)?;
        if let Chunk::Data(n) = chunk {
            if let Err(e) = self.buffer.append(&scratch[..n]) {
                engine_warn!("Engine '{}' overflowed the receive buffer", self.label);
                self.kill();
                return Err(e);
            }
        }
        Ok(chunk)
    }

    /// Hand an unmatched line to subscribers, pruning dropped receivers.
    pub(super) fn publish(&mut self, message: Message) {
        if self.subscribers.is_empty() {
            engine_trace!("<< {message} (unclaimed)");
            return;
        }
        engine_trace!("<< {message}");
        self.subscribers.retain(|tx| tx.send(message.clone()).is_ok());
    }

    fn close_channels(&mut self) {
        if self.transport.take().is_some() {
            engine_debug!("Closed channels to '{}'", self.label);
        }
    }
}

impl<T: Transport> std::fmt::Debug for EngineHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("program", &self.label)
            .field("pid", &self.pid())
            .field("state", &self.state())
            .field("buffered", &self.buffer.len())
            .finish()
    }
}
