//! Engine handles and the protocol operations on them.
//!
//! [`EngineHandle`] composes a launched process (or any [`Transport`]) with
//! a receive buffer; `wait_for` and the handshake are built from its
//! `send`/`receive_chunk`/`pop_message` primitives. [`UciInterface`] wraps a
//! single handle behind an explicit init step.
//!
//! [`Transport`]: crate::transport::Transport

mod handle;
mod interface;
mod waiter;

pub use handle::EngineHandle;
pub use interface::UciInterface;
