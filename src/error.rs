//! Error types for engine process and protocol operations.

use std::fmt;
use std::io;
use std::time::Duration;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error type for everything that can go wrong while driving an engine.
#[derive(Debug)]
pub enum EngineError {
    /// Pipe creation, process creation or program replacement failed
    LaunchFailed { program: String, source: io::Error },
    /// `init` called on an interface that already owns a running engine
    AlreadyInitialized,
    /// Operation attempted before `init`
    NotInitialized,
    /// Read or write on the engine channels failed
    Io(io::Error),
    /// Expected line not seen before the deadline; the engine was killed
    Timeout { expected: String, after: Duration },
    /// The engine process has exited
    EngineTerminated,
    /// The engine sent more unterminated data than the receive buffer allows
    BufferOverflow { limit: usize },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::LaunchFailed { program, source } => {
                write!(f, "Failed to launch engine '{program}': {source}")
            }
            EngineError::AlreadyInitialized => write!(f, "UCI interface already initialized"),
            EngineError::NotInitialized => write!(f, "UCI interface not initialized"),
            EngineError::Io(e) => write!(f, "Engine I/O error: {e}"),
            EngineError::Timeout { expected, after } => {
                write!(
                    f,
                    "Timed out after {} ms waiting for '{expected}'",
                    after.as_millis()
                )
            }
            EngineError::EngineTerminated => write!(f, "Engine process has terminated"),
            EngineError::BufferOverflow { limit } => {
                write!(f, "Receive buffer exceeded {limit} bytes without a line terminator")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::LaunchFailed { source, .. } => Some(source),
            EngineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EngineError {
    fn from(e: io::Error) -> Self {
        EngineError::Io(e)
    }
}

impl EngineError {
    /// Whether the caller can recover by discarding the handle and launching
    /// a fresh engine. Misuse errors are not recoverable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            EngineError::AlreadyInitialized | EngineError::NotInitialized
        )
    }

    /// The OS error code carried by I/O and launch failures, if any.
    #[must_use]
    pub fn os_error(&self) -> Option<i32> {
        match self {
            EngineError::LaunchFailed { source, .. } | EngineError::Io(source) => {
                source.raw_os_error()
            }
            _ => None,
        }
    }
}

/// Error type for option descriptor construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    /// Spin option whose minimum exceeds its maximum
    InvalidRange { name: String, min: i64, max: i64 },
}

impl fmt::Display for OptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionError::InvalidRange { name, min, max } => {
                write!(f, "Option '{name}' has min {min} greater than max {max}")
            }
        }
    }
}

impl std::error::Error for OptionError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_launch_failed_mentions_program() {
        let err = EngineError::LaunchFailed {
            program: "/no/such/engine".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/no/such/engine"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_timeout_mentions_prefix_and_duration() {
        let err = EngineError::Timeout {
            expected: "uciok".to_string(),
            after: Duration::from_millis(200),
        };
        let text = err.to_string();
        assert!(text.contains("uciok"));
        assert!(text.contains("200"));
    }

    #[test]
    fn test_io_error_keeps_os_code() {
        let err = EngineError::from(io::Error::from_raw_os_error(32));
        assert_eq!(err.os_error(), Some(32));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_misuse_errors_not_recoverable() {
        assert!(!EngineError::AlreadyInitialized.is_recoverable());
        assert!(!EngineError::NotInitialized.is_recoverable());
        assert!(EngineError::EngineTerminated.is_recoverable());
        assert_eq!(EngineError::NotInitialized.os_error(), None);
    }

    #[test]
    fn test_option_error_display() {
        let err = OptionError::InvalidRange {
            name: "Hash".to_string(),
            min: 10,
            max: 1,
        };
        let text = err.to_string();
        assert!(text.contains("Hash"));
        assert!(text.contains("10"));
        assert!(text.contains('1'));
    }
}
