//! Drive an external UCI engine over its standard input and output.
//!
//! ```no_run
//! use std::time::Duration;
//! use uci_interface::EngineHandle;
//!
//! # fn main() -> uci_interface::Result<()> {
//! let mut engine = EngineHandle::launch("/usr/bin/stockfish", &[] as &[&str])?;
//! engine.is_ready(Duration::from_secs(1))?;
//! let best = engine.request("go depth 10", "bestmove", Duration::from_secs(10))?;
//! println!("{best}");
//! engine.quit();
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod macros;

pub mod config;
pub mod engine;
pub mod error;
pub mod framer;
pub mod process;
pub mod transport;
pub mod uci;

pub use config::{EngineConfig, StderrMode};
pub use engine::{EngineHandle, UciInterface};
pub use error::{EngineError, OptionError, Result};
pub use framer::{Message, ReceiveBuffer};
pub use process::{EngineProcess, EngineState, Termination};
pub use transport::{Chunk, PipeTransport, ScriptedTransport, Transport};
pub use uci::{EngineIdentity, EngineOption, OptionKind};
