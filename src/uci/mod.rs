//! Universal Chess Interface (UCI) protocol vocabulary.
//!
//! Only the pieces of the protocol the interface itself needs: the handshake
//! and readiness tokens, engine identification, and the option descriptor
//! shape.

pub mod options;

use crate::framer::Message;

pub use options::{EngineOption, OptionKind};

/// Sent to start the handshake
pub const UCI: &str = "uci";
/// Engine's acknowledgement of `uci`
pub const UCIOK: &str = "uciok";
/// Synchronisation ping
pub const ISREADY: &str = "isready";
/// Answer to `isready`
pub const READYOK: &str = "readyok";
/// Asks the engine to exit
pub const QUIT: &str = "quit";

const ID_NAME: &str = "id name ";
const ID_AUTHOR: &str = "id author ";
const OPTION: &str = "option ";

/// What the engine reported about itself during the handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineIdentity {
    pub name: Option<String>,
    pub author: Option<String>,
}

impl EngineIdentity {
    /// Record an `id name`/`id author` line. Returns false for other lines.
    pub fn observe(&mut self, message: &Message) -> bool {
        let line = message.as_str();
        if let Some(name) = line.strip_prefix(ID_NAME) {
            self.name = Some(name.trim().to_string());
            true
        } else if let Some(author) = line.strip_prefix(ID_AUTHOR) {
            self.author = Some(author.trim().to_string());
            true
        } else {
            false
        }
    }
}

/// Whether a line is an `option name ...` advertisement.
#[must_use]
pub fn is_option_advertisement(message: &Message) -> bool {
    message.starts_with(OPTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_captures_name_and_author() {
        let mut identity = EngineIdentity::default();
        assert!(identity.observe(&Message::new("id name Stockfish 16")));
        assert!(identity.observe(&Message::new("id author the Stockfish developers")));
        assert!(!identity.observe(&Message::new("option name Hash type spin")));

        assert_eq!(identity.name.as_deref(), Some("Stockfish 16"));
        assert_eq!(identity.author.as_deref(), Some("the Stockfish developers"));
    }

    #[test]
    fn test_option_lines_are_recognised() {
        assert!(is_option_advertisement(&Message::new(
            "option name Ponder type check default false"
        )));
        assert!(!is_option_advertisement(&Message::new("optional")));
        assert!(!is_option_advertisement(&Message::new("info string option")));
    }
}
