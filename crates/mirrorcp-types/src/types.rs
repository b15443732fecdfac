//! Core data types for mirrorcp
//!
//! This module provides the fundamental data types shared across the
//! mirrorcp crates, primarily the per-pass statistics record.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Unique identifier for a synchronization pass
pub type PassId = uuid::Uuid;

/// Statistics for one synchronization pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStats {
    /// Number of directories created in the replica
    pub dirs_created: u64,
    /// Number of files copied because they were absent from the replica
    pub files_created: u64,
    /// Number of files overwritten because their content differed
    pub files_updated: u64,
    /// Number of files removed from the replica
    pub files_deleted: u64,
    /// Number of directories removed from the replica
    pub dirs_deleted: u64,
    /// Number of files left untouched because their content matched
    pub files_unchanged: u64,
    /// Number of entries skipped (symlinks and special files)
    pub entries_skipped: u64,
    /// Number of entries that failed and were isolated
    pub entries_failed: u64,
    /// Total bytes copied into the replica
    pub bytes_copied: u64,
    /// Total duration of the pass
    pub duration: Duration,
}

impl SyncStats {
    /// Create a new empty statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of replica mutations performed by the pass
    pub fn changes(&self) -> u64 {
        self.dirs_created
            + self.files_created
            + self.files_updated
            + self.files_deleted
            + self.dirs_deleted
    }

    /// Check whether the pass mutated the replica at all
    pub fn is_noop(&self) -> bool {
        self.changes() == 0
    }

    /// Check whether every entry was processed without failure
    pub fn is_clean(&self) -> bool {
        self.entries_failed == 0
    }

    /// Merge statistics from another instance
    pub fn merge(&mut self, other: &SyncStats) {
        self.dirs_created += other.dirs_created;
        self.files_created += other.files_created;
        self.files_updated += other.files_updated;
        self.files_deleted += other.files_deleted;
        self.dirs_deleted += other.dirs_deleted;
        self.files_unchanged += other.files_unchanged;
        self.entries_skipped += other.entries_skipped;
        self.entries_failed += other.entries_failed;
        self.bytes_copied += other.bytes_copied;
        self.duration += other.duration;
    }
}
