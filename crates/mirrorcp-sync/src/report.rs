//! Pass events, reporting sinks and per-pass reports

use crate::plan::CopyReason;
use mirrorcp_types::{PassId, SyncStats};
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info, warn};

/// Why an entry was skipped instead of synchronized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Symbolic link
    Symlink,
    /// Socket, device or FIFO
    SpecialFile,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symlink => write!(f, "symbolic link"),
            Self::SpecialFile => write!(f, "special file"),
        }
    }
}

/// One observable occurrence inside a synchronization pass
///
/// Paths are relative to the tree roots so source and replica log lines read
/// the same.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A pass started
    PassStarted {
        /// Pass identifier
        pass_id: PassId,
        /// Source root
        source: PathBuf,
        /// Replica root
        replica: PathBuf,
    },
    /// A directory was created in the replica
    DirCreated {
        /// Relative path of the directory
        path: PathBuf,
    },
    /// A file was copied into the replica
    FileCopied {
        /// Relative path of the file
        path: PathBuf,
        /// Whether the file was new or overwritten
        reason: CopyReason,
        /// Bytes copied
        bytes: u64,
    },
    /// A file was removed from the replica
    FileDeleted {
        /// Relative path of the file
        path: PathBuf,
    },
    /// A directory was removed from the replica
    DirDeleted {
        /// Relative path of the directory
        path: PathBuf,
    },
    /// An entry was skipped
    EntrySkipped {
        /// Relative path of the entry
        path: PathBuf,
        /// Why it was skipped
        reason: SkipReason,
    },
    /// An entry failed and was isolated from the rest of the pass
    EntryFailed {
        /// Relative path of the entry
        path: PathBuf,
        /// Underlying cause
        message: String,
    },
    /// A pass ran to completion
    PassCompleted {
        /// What the pass did
        stats: SyncStats,
    },
}

/// Sink receiving every event a pass emits
///
/// The engine never talks to a logger directly; it reports through an
/// injected sink so tests can observe passes in memory.
pub trait EventSink: Send + Sync {
    /// Deliver one event
    fn emit(&self, event: &SyncEvent);
}

/// Production sink forwarding events to `tracing`
///
/// One line per action with the verb first, so the log file doubles as an
/// audit trail of every replica mutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &SyncEvent) {
        match event {
            SyncEvent::PassStarted {
                pass_id,
                source,
                replica,
            } => {
                info!(
                    "Starting synchronization pass {}: '{}' -> '{}'",
                    pass_id,
                    source.display(),
                    replica.display()
                );
            }
            SyncEvent::DirCreated { path } => info!("created: {}", path.display()),
            SyncEvent::FileCopied { path, reason, .. } => match reason {
                CopyReason::Created => info!("created: {}", path.display()),
                CopyReason::Updated => info!("updated: {}", path.display()),
            },
            SyncEvent::FileDeleted { path } | SyncEvent::DirDeleted { path } => {
                info!("deleted: {}", path.display());
            }
            SyncEvent::EntrySkipped { path, reason } => {
                warn!("skipped: {} ({})", path.display(), reason);
            }
            SyncEvent::EntryFailed { path, message } => {
                error!("error: {}: {}", path.display(), message);
            }
            SyncEvent::PassCompleted { stats } => {
                info!(
                    "Pass completed: {} created, {} updated, {} deleted, {} failed in {:.2?}",
                    stats.dirs_created + stats.files_created,
                    stats.files_updated,
                    stats.files_deleted + stats.dirs_deleted,
                    stats.entries_failed,
                    stats.duration
                );
            }
        }
    }
}

/// In-memory sink recording every event, for tests
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SyncEvent>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().expect("event sink poisoned").clone()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &SyncEvent) {
        self.events
            .lock()
            .expect("event sink poisoned")
            .push(event.clone());
    }
}
