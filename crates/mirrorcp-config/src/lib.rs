//! Run configuration for mirrorcp
//!
//! This crate provides the typed configuration for a mirroring run and the
//! fatal setup validation that must pass before any synchronization starts:
//!
//! - **Source check**: the source root must exist and be a directory
//! - **Log placement**: the log file must live outside the source and replica
//!   trees, otherwise the log itself would become a sync target
//! - **Log preflight**: the log file must be creatable and appendable
//!
//! # Examples
//!
//! ```rust,no_run
//! use mirrorcp_config::MirrorConfig;
//!
//! let config = MirrorConfig::new("data", "backup", "mirror.log", "60".parse().unwrap());
//! config.validate().expect("invalid configuration");
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Component, Path, PathBuf};

pub mod error;
pub mod interval;

pub use error::{ConfigError, ConfigResult};
pub use interval::Interval;

/// Configuration for one mirroring run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Source root being mirrored from
    pub source: PathBuf,
    /// Replica root being mirrored to
    pub replica: PathBuf,
    /// Log file receiving one line per action
    pub log_file: PathBuf,
    /// Interval between passes
    pub interval: Interval,
    /// Perform exactly one pass regardless of the interval
    pub run_once: bool,
}

impl MirrorConfig {
    /// Create a new configuration
    pub fn new(
        source: impl Into<PathBuf>,
        replica: impl Into<PathBuf>,
        log_file: impl Into<PathBuf>,
        interval: Interval,
    ) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
            log_file: log_file.into(),
            interval,
            run_once: false,
        }
    }

    /// Request a single pass instead of the repeat loop
    pub fn with_run_once(mut self, run_once: bool) -> Self {
        self.run_once = run_once;
        self
    }

    /// Whether the driver should perform exactly one pass
    pub fn runs_once(&self) -> bool {
        self.run_once || self.interval.is_zero()
    }

    /// Perform the fatal setup checks
    ///
    /// Validation never mutates the source or replica trees. Creating a
    /// missing replica root is the engine's job, not the validator's.
    pub fn validate(&self) -> ConfigResult<()> {
        match std::fs::metadata(&self.source) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(ConfigError::NotADirectory {
                    path: self.source.clone(),
                })
            }
            Err(_) => {
                return Err(ConfigError::SourceMissing {
                    path: self.source.clone(),
                })
            }
        }

        let log_file = absolutize(&self.log_file);
        for tree in [&self.source, &self.replica] {
            let tree = absolutize(tree);
            if log_file.starts_with(&tree) {
                return Err(ConfigError::LogInsideTree {
                    log_file: self.log_file.clone(),
                    tree: tree.clone(),
                });
            }
        }

        self.preflight_log_file()?;
        Ok(())
    }

    /// Ensure the log file can be created and appended to
    fn preflight_log_file(&self) -> ConfigResult<()> {
        if let Some(parent) = self.log_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| ConfigError::LogUnwritable {
                    path: self.log_file.clone(),
                    message: e.to_string(),
                })?;
            }
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .map_err(|e| ConfigError::LogUnwritable {
                path: self.log_file.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}

/// Resolve a path against the current directory and fold out `.` and `..`
///
/// Lexical on purpose: the log file may not exist yet, so `canonicalize`
/// is not an option here.
fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn interval(s: &str) -> Interval {
        s.parse().unwrap()
    }

    #[test]
    fn test_valid_configuration() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        std::fs::create_dir(&source).unwrap();

        let config = MirrorConfig::new(
            &source,
            dir.path().join("replica"),
            dir.path().join("mirror.log"),
            interval("30"),
        );
        assert!(config.validate().is_ok());
        // The preflight leaves the log file in place
        assert!(dir.path().join("mirror.log").exists());
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = MirrorConfig::new(
            dir.path().join("no-such-dir"),
            dir.path().join("replica"),
            dir.path().join("mirror.log"),
            interval("30"),
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SourceMissing { .. })
        ));
    }

    #[test]
    fn test_source_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("source-file");
        std::fs::write(&file, b"x").unwrap();

        let config = MirrorConfig::new(
            &file,
            dir.path().join("replica"),
            dir.path().join("mirror.log"),
            interval("30"),
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_log_file_inside_source_is_rejected() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        std::fs::create_dir(&source).unwrap();

        let config = MirrorConfig::new(
            &source,
            dir.path().join("replica"),
            source.join("mirror.log"),
            interval("30"),
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LogInsideTree { .. })
        ));
    }

    #[test]
    fn test_log_file_inside_replica_is_rejected() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        std::fs::create_dir(&source).unwrap();
        let replica = dir.path().join("replica");

        // The replica does not need to exist for the placement check
        let config = MirrorConfig::new(
            &source,
            &replica,
            replica.join("nested").join("mirror.log"),
            interval("30"),
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LogInsideTree { .. })
        ));
    }

    #[test]
    fn test_dotted_log_path_cannot_escape_the_check() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        std::fs::create_dir_all(source.join("sub")).unwrap();

        let config = MirrorConfig::new(
            &source,
            dir.path().join("replica"),
            source.join("sub").join("..").join("mirror.log"),
            interval("30"),
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LogInsideTree { .. })
        ));
    }

    #[test]
    fn test_runs_once() {
        let config = MirrorConfig::new("a", "b", "c.log", interval("0"));
        assert!(config.runs_once());

        let config = MirrorConfig::new("a", "b", "c.log", interval("5"));
        assert!(!config.runs_once());
        assert!(config.with_run_once(true).runs_once());
    }

    #[test]
    fn test_absolutize_folds_components() {
        let path = absolutize(Path::new("/a/b/./c/../d"));
        assert_eq!(path, PathBuf::from("/a/b/d"));
    }
}
