//! Core type system and error handling for mirrorcp
//!
//! This crate provides the foundational types shared by the mirrorcp crates:
//!
//! - **Error handling**: Structured error types classified by severity, so
//!   callers can tell a recoverable per-entry failure from a fatal setup error
//! - **Pass statistics**: Counters describing what a synchronization pass did
//!
//! # Examples
//!
//! ```rust
//! use mirrorcp_types::{Result, SyncStats};
//!
//! fn example_pass() -> Result<SyncStats> {
//!     let mut stats = SyncStats::new();
//!     stats.files_created = 3;
//!     stats.dirs_created = 1;
//!     Ok(stats)
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod result;
pub mod types;

// Re-export commonly used types
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use result::Result;
pub use types::{PassId, SyncStats};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_stats_creation() {
        let stats = SyncStats::new();
        assert_eq!(stats.files_created, 0);
        assert_eq!(stats.bytes_copied, 0);
        assert!(stats.is_noop());
    }

    #[test]
    fn test_sync_stats_merge() {
        let mut stats1 = SyncStats::new();
        stats1.files_created = 5;
        stats1.bytes_copied = 1000;

        let mut stats2 = SyncStats::new();
        stats2.files_created = 3;
        stats2.files_deleted = 2;
        stats2.bytes_copied = 500;

        stats1.merge(&stats2);
        assert_eq!(stats1.files_created, 8);
        assert_eq!(stats1.files_deleted, 2);
        assert_eq!(stats1.bytes_copied, 1500);
    }

    #[test]
    fn test_error_severity() {
        let io_error = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "test"));
        assert_eq!(io_error.severity(), ErrorSeverity::Entry);

        let config_error = Error::config("log file inside replica");
        assert_eq!(config_error.severity(), ErrorSeverity::Fatal);
        assert!(!config_error.is_recoverable());
    }
}
