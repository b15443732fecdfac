//! Error types and handling for mirrorcp
//!
//! This module provides the error handling system for mirroring operations.
//! Errors are classified by severity so the driver can tell which failures
//! stop a single entry, which abort the running pass, and which must
//! terminate the process.

use std::path::PathBuf;

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// Entry-level failure - the pass continues with the remaining entries
    Entry,
    /// Pass-level failure - the current pass is aborted, later passes may run
    Pass,
    /// Fatal setup failure - the process should exit non-zero
    Fatal,
}

/// Main error type for mirroring operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Source root does not exist or is not a directory
    #[error("Source folder does not exist: {path}")]
    SourceMissing {
        /// Path to the missing source root
        path: PathBuf,
    },

    /// Source root became inaccessible while a pass was running
    #[error("Source folder became inaccessible during the pass: {path}")]
    SourceLost {
        /// Path to the lost source root
        path: PathBuf,
    },

    /// Replica root could not be created or scanned
    #[error("Replica folder unavailable at '{path}': {message}")]
    ReplicaUnavailable {
        /// Path to the replica root
        path: PathBuf,
        /// Underlying cause
        message: String,
    },

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// Permission denied
    #[error("Permission denied: {path}")]
    PermissionDenied {
        /// Path to the entry with permission issues
        path: PathBuf,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Operation cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source tree errors
    Source,
    /// Replica tree errors
    Replica,
    /// I/O related errors
    Io,
    /// Configuration errors
    Config,
    /// Cancellation
    Cancelled,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceMissing { .. } | Self::SourceLost { .. } => ErrorKind::Source,
            Self::ReplicaUnavailable { .. } => ErrorKind::Replica,
            Self::Io { .. } | Self::PermissionDenied { .. } => ErrorKind::Io,
            Self::Config { .. } => ErrorKind::Config,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Io { .. } | Self::PermissionDenied { .. } | Self::Other { .. } => {
                ErrorSeverity::Entry
            }
            Self::SourceLost { .. } | Self::Cancelled => ErrorSeverity::Pass,
            Self::SourceMissing { .. } | Self::ReplicaUnavailable { .. } | Self::Config { .. } => {
                ErrorSeverity::Fatal
            }
        }
    }

    /// Check if the pass can continue with the next entry after this error
    pub fn is_recoverable(&self) -> bool {
        self.severity() == ErrorSeverity::Entry
    }

    /// Check if this error must terminate the process
    pub fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new replica-unavailable error
    pub fn replica_unavailable<S: Into<String>>(path: impl Into<PathBuf>, message: S) -> Self {
        Self::ReplicaUnavailable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}
