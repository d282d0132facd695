//! Stateful owner with an explicit init step.

use std::ffi::OsStr;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::framer::Message;
use crate::process::{EngineState, Termination};

use super::EngineHandle;

/// Owns at most one engine and enforces init-before-use.
///
/// Calling [`UciInterface::init`] while a running engine is owned is a
/// programming error (`AlreadyInitialized`); every other operation before
/// `init` fails with `NotInitialized`. A terminated engine may be replaced
/// by calling `init` again.
#[derive(Debug, Default)]
pub struct UciInterface {
    config: EngineConfig,
    engine: Option<EngineHandle>,
}

impl UciInterface {
    /// Interface with no engine yet; `config` applies to every `init`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        UciInterface {
            config,
            engine: None,
        }
    }

    /// Launch the engine and complete the handshake.
    pub fn init<S: AsRef<OsStr>>(&mut self, program: impl AsRef<OsStr>, args: &[S]) -> Result<()> {
        if self.engine.as_ref().is_some_and(EngineHandle::is_running) {
            return Err(EngineError::AlreadyInitialized);
        }
        self.engine = None;
        self.engine = Some(EngineHandle::launch_with(program, args, self.config.clone())?);
        Ok(())
    }

    /// `NotStarted` until `init` has produced an engine.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.engine
            .as_ref()
            .map_or(EngineState::NotStarted, EngineHandle::state)
    }

    /// The owned engine, if any.
    #[must_use]
    pub fn engine(&self) -> Option<&EngineHandle> {
        self.engine.as_ref()
    }

    fn engine_mut(&mut self) -> Result<&mut EngineHandle> {
        self.engine.as_mut().ok_or(EngineError::NotInitialized)
    }

    /// Send one line to the engine.
    pub fn send(&mut self, command: &str) -> Result<()> {
        self.engine_mut()?.send(command)
    }

    /// Wait for a line starting with `prefix`; see [`EngineHandle::wait_for`].
    pub fn wait_for(&mut self, prefix: &str, timeout: Duration) -> Result<Message> {
        self.engine_mut()?.wait_for(prefix, timeout)
    }

    /// Send `command`, then wait for `prefix`.
    pub fn request(&mut self, command: &str, prefix: &str, timeout: Duration) -> Result<Message> {
        self.engine_mut()?.request(command, prefix, timeout)
    }

    /// Round-trip `isready`/`readyok`.
    pub fn is_ready(&mut self, timeout: Duration) -> Result<()> {
        self.engine_mut()?.is_ready(timeout)
    }

    /// Receive lines that waits pass over.
    pub fn subscribe(&mut self) -> Result<Receiver<Message>> {
        Ok(self.engine_mut()?.subscribe())
    }

    /// Be told when the engine exits.
    pub fn subscribe_termination(&self) -> Result<Receiver<Termination>> {
        self.engine
            .as_ref()
            .map(EngineHandle::subscribe_termination)
            .ok_or(EngineError::NotInitialized)
    }

    /// Forcibly terminate the engine.
    pub fn kill(&mut self) -> Result<()> {
        self.engine_mut()?.kill();
        Ok(())
    }

    /// Ask the engine to quit; see [`EngineHandle::quit`].
    pub fn quit(&mut self) -> Result<bool> {
        Ok(self.engine_mut()?.quit())
    }

    /// Give up ownership of the engine, returning to `NotStarted`.
    pub fn take(&mut self) -> Option<EngineHandle> {
        self.engine.take()
    }
}
