//! Main synchronization engine

use crate::plan::{plan_changes, CopyReason, SyncAction};
use crate::report::{EventSink, SyncEvent};
use crate::snapshot::TreeSnapshot;
use mirrorcp_types::{Error, PassId, Result, SyncStats};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::debug;

/// Synchronization request
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Source root path
    pub source: PathBuf,
    /// Replica root path
    pub replica: PathBuf,
    /// Request ID for tracking
    pub request_id: PassId,
}

impl SyncRequest {
    /// Create a new sync request
    pub fn new<P: AsRef<Path>>(source: P, replica: P) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            replica: replica.as_ref().to_path_buf(),
            request_id: uuid::Uuid::new_v4(),
        }
    }
}

/// Result of one synchronization pass
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Request ID
    pub request_id: PassId,
    /// What the pass did
    pub stats: SyncStats,
}

/// One-way mirroring engine
///
/// Stateless by design: every pass walks both trees fresh and trusts nothing
/// from earlier passes, so a pass interrupted at any point is repaired by
/// simply running the next one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Synchronizer;

impl Synchronizer {
    /// Create a new engine
    pub fn new() -> Self {
        Self
    }

    /// Perform one synchronization pass
    ///
    /// On success the replica's entry set and per-file content equal the
    /// source's as observed at snapshot time. Per-entry failures are
    /// reported through the sink and counted; only the source root becoming
    /// unreachable or the replica root being unusable fails the pass itself.
    pub async fn sync(&self, request: &SyncRequest, sink: &dyn EventSink) -> Result<SyncReport> {
        let start_time = Instant::now();
        debug!(
            "Starting sync: {} -> {}",
            request.source.display(),
            request.replica.display()
        );
        sink.emit(&SyncEvent::PassStarted {
            pass_id: request.request_id,
            source: request.source.clone(),
            replica: request.replica.clone(),
        });

        self.validate_roots(&request.source, &request.replica)
            .await?;

        // The source existed a moment ago, so a failed root listing here
        // means it went away mid-pass
        let source_snapshot = TreeSnapshot::scan(&request.source, sink)
            .await
            .map_err(|e| {
                debug!("Source scan failed: {}", e);
                Error::SourceLost {
                    path: request.source.clone(),
                }
            })?;
        debug!("Found {} entries in source", source_snapshot.len());

        let replica_snapshot = TreeSnapshot::scan(&request.replica, sink)
            .await
            .map_err(|e| Error::replica_unavailable(request.replica.clone(), e.to_string()))?;
        debug!("Found {} entries in replica", replica_snapshot.len());

        let mut stats = SyncStats::new();
        stats.entries_skipped = source_snapshot.skipped() + replica_snapshot.skipped();
        stats.entries_failed = source_snapshot.failed() + replica_snapshot.failed();

        let plan = plan_changes(&source_snapshot, &replica_snapshot, sink).await;
        stats.files_unchanged = plan.files_unchanged;
        stats.entries_failed += plan.failed;

        for action in &plan.actions {
            match self.apply(action, request).await {
                Ok(event) => {
                    match &event {
                        SyncEvent::DirCreated { .. } => stats.dirs_created += 1,
                        SyncEvent::FileCopied {
                            reason: CopyReason::Created,
                            bytes,
                            ..
                        } => {
                            stats.files_created += 1;
                            stats.bytes_copied += bytes;
                        }
                        SyncEvent::FileCopied {
                            reason: CopyReason::Updated,
                            bytes,
                            ..
                        } => {
                            stats.files_updated += 1;
                            stats.bytes_copied += bytes;
                        }
                        SyncEvent::FileDeleted { .. } => stats.files_deleted += 1,
                        SyncEvent::DirDeleted { .. } => stats.dirs_deleted += 1,
                        _ => {}
                    }
                    sink.emit(&event);
                }
                Err(e) => {
                    // One bad entry must not abort the pass
                    sink.emit(&SyncEvent::EntryFailed {
                        path: action.path().to_path_buf(),
                        message: e.to_string(),
                    });
                    stats.entries_failed += 1;
                }
            }
        }

        stats.duration = start_time.elapsed();
        sink.emit(&SyncEvent::PassCompleted {
            stats: stats.clone(),
        });
        debug!(
            "Sync completed: {} changes, {} failures in {:?}",
            stats.changes(),
            stats.entries_failed,
            stats.duration
        );

        Ok(SyncReport {
            request_id: request.request_id,
            stats,
        })
    }

    /// Validate the source root and create the replica root if needed
    async fn validate_roots(&self, source: &Path, replica: &Path) -> Result<()> {
        match fs::metadata(source).await {
            Ok(metadata) if metadata.is_dir() => {}
            _ => {
                return Err(Error::SourceMissing {
                    path: source.to_path_buf(),
                })
            }
        }

        match fs::metadata(replica).await {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(Error::replica_unavailable(
                replica,
                "exists but is not a directory",
            )),
            Err(_) => fs::create_dir_all(replica)
                .await
                .map_err(|e| Error::replica_unavailable(replica, e.to_string())),
        }
    }

    /// Apply one planned action, returning the event to report
    async fn apply(&self, action: &SyncAction, request: &SyncRequest) -> Result<SyncEvent> {
        match action {
            SyncAction::CreateDir { path } => {
                let target = request.replica.join(path);
                fs::create_dir_all(&target)
                    .await
                    .map_err(|e| classify_io(e, &target, "Failed to create directory"))?;
                Ok(SyncEvent::DirCreated { path: path.clone() })
            }
            SyncAction::CopyFile { path, reason, .. } => {
                let source = request.source.join(path);
                let target = request.replica.join(path);
                let bytes = self.copy_file(&source, &target).await?;
                Ok(SyncEvent::FileCopied {
                    path: path.clone(),
                    reason: *reason,
                    bytes,
                })
            }
            SyncAction::DeleteFile { path } => {
                let target = request.replica.join(path);
                fs::remove_file(&target)
                    .await
                    .map_err(|e| classify_io(e, &target, "Failed to delete file"))?;
                Ok(SyncEvent::FileDeleted { path: path.clone() })
            }
            SyncAction::DeleteDir { path } => {
                let target = request.replica.join(path);
                fs::remove_dir_all(&target)
                    .await
                    .map_err(|e| classify_io(e, &target, "Failed to delete directory"))?;
                Ok(SyncEvent::DirDeleted { path: path.clone() })
            }
        }
    }

    /// Copy a single file, preserving its modification time
    async fn copy_file(&self, source: &Path, target: &Path) -> Result<u64> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Error::Io {
                message: format!("Failed to create directory '{}': {}", parent.display(), e),
            })?;
        }

        let bytes = fs::copy(source, target)
            .await
            .map_err(|e| classify_io(e, target, "Failed to copy to"))?;

        let metadata = fs::metadata(source).await.map_err(|e| Error::Io {
            message: format!("Failed to get metadata for '{}': {}", source.display(), e),
        })?;
        if let Ok(modified) = metadata.modified() {
            filetime::set_file_mtime(target, filetime::FileTime::from_system_time(modified))
                .map_err(|e| Error::Io {
                    message: format!(
                        "Failed to set modification time for '{}': {}",
                        target.display(),
                        e
                    ),
                })?;
        }

        debug!("Copied: {} -> {}", source.display(), target.display());
        Ok(bytes)
    }
}

/// Map an I/O error onto the entry-level error taxonomy
fn classify_io(error: std::io::Error, path: &Path, context: &str) -> Error {
    if error.kind() == std::io::ErrorKind::PermissionDenied {
        Error::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        Error::Io {
            message: format!("{} '{}': {}", context, path.display(), error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemorySink;
    use tempfile::TempDir;

    #[test]
    fn test_sync_request_creation() {
        let request = SyncRequest::new("source", "replica");

        assert_eq!(request.source, PathBuf::from("source"));
        assert_eq!(request.replica, PathBuf::from("replica"));
    }

    #[tokio::test]
    async fn test_missing_source_fails_without_touching_replica() {
        let temp_dir = TempDir::new().unwrap();
        let replica = temp_dir.path().join("replica");
        let request = SyncRequest::new(temp_dir.path().join("absent"), replica.clone());

        let sink = MemorySink::new();
        let result = Synchronizer::new().sync(&request, &sink).await;

        assert!(matches!(result, Err(Error::SourceMissing { .. })));
        assert!(!replica.exists());
    }

    #[tokio::test]
    async fn test_replica_root_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source");
        fs::create_dir(&source).await.unwrap();
        let replica = temp_dir.path().join("nested").join("replica");

        let request = SyncRequest::new(source, replica.clone());
        let sink = MemorySink::new();
        let report = Synchronizer::new().sync(&request, &sink).await.unwrap();

        assert!(replica.is_dir());
        assert!(report.stats.is_noop());
    }

    #[tokio::test]
    async fn test_replica_root_blocked_by_file_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source");
        fs::create_dir(&source).await.unwrap();
        let replica = temp_dir.path().join("replica");
        fs::write(&replica, b"in the way").await.unwrap();

        let request = SyncRequest::new(source, replica);
        let sink = MemorySink::new();
        let result = Synchronizer::new().sync(&request, &sink).await;

        assert!(matches!(result, Err(Error::ReplicaUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_copy_preserves_modification_time() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source");
        let replica = temp_dir.path().join("replica");
        fs::create_dir(&source).await.unwrap();
        fs::write(source.join("a.txt"), b"data").await.unwrap();

        let old = filetime::FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(source.join("a.txt"), old).unwrap();

        let request = SyncRequest::new(source, replica.clone());
        let sink = MemorySink::new();
        Synchronizer::new().sync(&request, &sink).await.unwrap();

        let copied = std::fs::metadata(replica.join("a.txt")).unwrap();
        let mtime = filetime::FileTime::from_last_modification_time(&copied);
        assert_eq!(mtime.unix_seconds(), 1_600_000_000);
    }
}
