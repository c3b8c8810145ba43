//! Error types for the whport-core library.

use thiserror::Error;

use crate::process::KillSignal;

/// Result type alias for whport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No listener or process at the requested key.
    NotFound,
    /// Refusal to act on a protected PID.
    Protected,
    /// The PID no longer belongs to the process observed at scan time.
    Stale,
    /// An external utility or signal delivery failed, or its output was unusable.
    ExternalTool,
    /// The history or config file could not be read, parsed or written.
    Persistence,
}

/// Errors that can occur while scanning ports, controlling processes and
/// persisting history.
#[derive(Error, Debug)]
pub enum Error {
    /// Nothing exists at the requested key.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The PID is on the protected list.
    #[error("Refusing to act on protected PID {pid}")]
    Protected { pid: u32 },

    /// The PID was reused since it was observed.
    #[error("PID {pid} is no longer {expected:?} (now {actual:?}); it may have been reused")]
    Stale {
        pid: u32,
        expected: String,
        actual: String,
    },

    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to interpret command output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// Signal delivery failed.
    #[error("Failed to send {signal} to PID {pid}: {source}")]
    Signal {
        pid: u32,
        signal: KillSignal,
        #[source]
        source: std::io::Error,
    },

    /// A persisted file is present but unusable, or could not be written.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Classify this error into its failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Protected { .. } => ErrorKind::Protected,
            Error::Stale { .. } => ErrorKind::Stale,
            Error::CommandFailed(_) | Error::ParseError(_) | Error::Signal { .. } => {
                ErrorKind::ExternalTool
            }
            Error::Persistence(_) | Error::Io(_) | Error::Json(_) => ErrorKind::Persistence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Protected { pid: 1 };
        assert!(err.to_string().contains("PID 1"));

        let err = Error::Stale {
            pid: 4242,
            expected: "nginx".to_string(),
            actual: "bash".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("4242"));
        assert!(msg.contains("nginx"));
        assert!(msg.contains("bash"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::Protected { pid: 0 }.kind(), ErrorKind::Protected);
        assert_eq!(
            Error::CommandFailed("lsof".into()).kind(),
            ErrorKind::ExternalTool
        );
        assert_eq!(
            Error::ParseError("ps".into()).kind(),
            ErrorKind::ExternalTool
        );
        assert_eq!(
            Error::Persistence("corrupt".into()).kind(),
            ErrorKind::Persistence
        );
    }
}
