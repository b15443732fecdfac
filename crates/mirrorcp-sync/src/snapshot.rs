//! Tree snapshots built fresh for every pass

use crate::report::{EventSink, SkipReason, SyncEvent};
use mirrorcp_types::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Kind of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// One entry of a tree snapshot
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Path relative to the snapshot root
    pub path: PathBuf,
    /// Entry kind
    pub kind: EntryKind,
    /// File size in bytes (zero for directories)
    pub size: u64,
}

/// Recursive listing of a root at one moment in time
///
/// Snapshots are ephemeral: built at the start of a pass, discarded at the
/// end. Entries are keyed by their relative path so the same key addresses
/// the corresponding entry in both trees.
#[derive(Debug)]
pub struct TreeSnapshot {
    root: PathBuf,
    entries: HashMap<PathBuf, EntryInfo>,
    unreadable_dirs: Vec<PathBuf>,
    skipped: u64,
    failed: u64,
}

impl TreeSnapshot {
    /// Recursively list `root`, skipping symlinks and special files
    ///
    /// A subdirectory that cannot be listed is reported through the sink and
    /// recorded as unreadable; the scan continues with the remaining entries.
    /// Only a failure to read `root` itself fails the scan.
    pub async fn scan(root: &Path, sink: &dyn EventSink) -> Result<Self> {
        let mut snapshot = Self {
            root: root.to_path_buf(),
            entries: HashMap::new(),
            unreadable_dirs: Vec::new(),
            skipped: 0,
            failed: 0,
        };

        scan_recursive(root, root, &mut snapshot, sink, true).await?;
        debug!(
            "Scanned {} entries in '{}' ({} skipped, {} failed)",
            snapshot.entries.len(),
            root.display(),
            snapshot.skipped,
            snapshot.failed
        );
        Ok(snapshot)
    }

    /// Root this snapshot was taken from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All entries, keyed by relative path
    pub fn entries(&self) -> &HashMap<PathBuf, EntryInfo> {
        &self.entries
    }

    /// Look up an entry by relative path
    pub fn get(&self, path: &Path) -> Option<&EntryInfo> {
        self.entries.get(path)
    }

    /// Whether an entry of any kind exists at the relative path
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of entries in the snapshot
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Absolute path of a relative entry path
    pub fn absolute(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Number of entries skipped during the scan
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Number of entries that failed during the scan
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Whether a relative path lies under a directory that failed to list
    ///
    /// An unobserved subtree must never trigger replica deletions, so the
    /// planner exempts everything under these paths from removal.
    pub fn is_under_unreadable(&self, path: &Path) -> bool {
        self.unreadable_dirs.iter().any(|dir| path.starts_with(dir))
    }
}

/// Recursively scan one directory level
fn scan_recursive<'a>(
    base_path: &'a Path,
    current_path: &'a Path,
    snapshot: &'a mut TreeSnapshot,
    sink: &'a dyn EventSink,
    is_root: bool,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + 'a>> {
    Box::pin(async move {
        let mut entries = match fs::read_dir(current_path).await {
            Ok(entries) => entries,
            Err(e) if is_root => {
                return Err(Error::Io {
                    message: format!(
                        "Failed to read directory '{}': {}",
                        current_path.display(),
                        e
                    ),
                });
            }
            Err(e) => {
                let relative = relative_of(base_path, current_path);
                sink.emit(&SyncEvent::EntryFailed {
                    path: relative.clone(),
                    message: format!("Failed to read directory: {}", e),
                });
                snapshot.failed += 1;
                snapshot.unreadable_dirs.push(relative);
                return Ok(());
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    sink.emit(&SyncEvent::EntryFailed {
                        path: relative_of(base_path, current_path),
                        message: format!("Failed to read directory entry: {}", e),
                    });
                    snapshot.failed += 1;
                    break;
                }
            };

            let entry_path = entry.path();
            let relative = relative_of(base_path, &entry_path);

            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(e) => {
                    sink.emit(&SyncEvent::EntryFailed {
                        path: relative,
                        message: format!("Failed to get metadata: {}", e),
                    });
                    snapshot.failed += 1;
                    continue;
                }
            };

            if file_type.is_symlink() {
                sink.emit(&SyncEvent::EntrySkipped {
                    path: relative,
                    reason: SkipReason::Symlink,
                });
                snapshot.skipped += 1;
                continue;
            }

            if file_type.is_dir() {
                snapshot.entries.insert(
                    relative.clone(),
                    EntryInfo {
                        path: relative,
                        kind: EntryKind::Directory,
                        size: 0,
                    },
                );
                scan_recursive(base_path, &entry_path, snapshot, sink, false).await?;
            } else if file_type.is_file() {
                let size = match entry.metadata().await {
                    Ok(metadata) => metadata.len(),
                    Err(e) => {
                        sink.emit(&SyncEvent::EntryFailed {
                            path: relative,
                            message: format!("Failed to get metadata: {}", e),
                        });
                        snapshot.failed += 1;
                        continue;
                    }
                };
                snapshot.entries.insert(
                    relative.clone(),
                    EntryInfo {
                        path: relative,
                        kind: EntryKind::File,
                        size,
                    },
                );
            } else {
                // Sockets, devices, FIFOs
                sink.emit(&SyncEvent::EntrySkipped {
                    path: relative,
                    reason: SkipReason::SpecialFile,
                });
                snapshot.skipped += 1;
            }
        }

        Ok(())
    })
}

/// Path of `entry` relative to `base`
fn relative_of(base: &Path, entry: &Path) -> PathBuf {
    entry.strip_prefix(base).unwrap_or(entry).to_path_buf()
}
