//! Error types for run configuration

use mirrorcp_types::Error as MirrorcpError;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Source folder does not exist
    #[error("Source folder does not exist: {path}")]
    SourceMissing {
        /// Path to the missing source folder
        path: PathBuf,
    },

    /// A path that must be a directory is something else
    #[error("Not a directory: {path}")]
    NotADirectory {
        /// Path that failed the directory check
        path: PathBuf,
    },

    /// Log file is nested inside the source or replica tree
    #[error("Log file '{log_file}' cannot be placed inside '{tree}'")]
    LogInsideTree {
        /// Configured log file path
        log_file: PathBuf,
        /// The tree the log file was found inside
        tree: PathBuf,
    },

    /// Log file could not be opened for writing
    #[error("Could not open log file '{path}' for writing: {message}")]
    LogUnwritable {
        /// Configured log file path
        path: PathBuf,
        /// Underlying cause
        message: String,
    },

    /// Invalid configuration value
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// I/O error while validating a path
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Path being validated
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create a new invalid value error
    pub fn invalid_value<S: Into<String>>(key: S, message: S) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl From<ConfigError> for MirrorcpError {
    fn from(error: ConfigError) -> Self {
        MirrorcpError::config(error.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
