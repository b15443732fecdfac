//! Diffing two tree snapshots into an ordered action list

use crate::digest::ContentDigest;
use crate::report::{EventSink, SyncEvent};
use crate::snapshot::{EntryKind, TreeSnapshot};
use mirrorcp_types::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Why a file copy is planned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyReason {
    /// The file is absent from the replica
    Created,
    /// The replica file exists with different content
    Updated,
}

/// One planned replica mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncAction {
    /// Create a directory in the replica
    CreateDir {
        /// Relative path of the directory
        path: PathBuf,
    },
    /// Copy a source file over the corresponding replica path
    CopyFile {
        /// Relative path of the file
        path: PathBuf,
        /// Whether the copy creates or updates the replica file
        reason: CopyReason,
        /// Source file size at snapshot time
        size: u64,
    },
    /// Remove a file from the replica
    DeleteFile {
        /// Relative path of the file
        path: PathBuf,
    },
    /// Remove a directory (and anything left inside it) from the replica
    DeleteDir {
        /// Relative path of the directory
        path: PathBuf,
    },
}

impl SyncAction {
    /// Relative path this action touches
    pub fn path(&self) -> &Path {
        match self {
            Self::CreateDir { path }
            | Self::CopyFile { path, .. }
            | Self::DeleteFile { path }
            | Self::DeleteDir { path } => path,
        }
    }
}

/// Ordered set of actions for one pass
///
/// Actions are ordered so that execution can apply them front to back:
/// directory creations come first (parents before children), then file
/// copies, then removals (children before parents).
#[derive(Debug, Default)]
pub struct SyncPlan {
    /// Planned actions in execution order
    pub actions: Vec<SyncAction>,
    /// Files whose content already matched and need no action
    pub files_unchanged: u64,
    /// Entries whose comparison failed (they are re-copied defensively)
    pub failed: u64,
}

impl SyncPlan {
    /// Number of planned actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the pass has nothing to do
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Diff two snapshots into an ordered plan
///
/// Content equality is decided by SHA-256 digest only; sizes are used as a
/// pre-filter before hashing, never as the equality decision itself. An
/// entry whose type differs between the trees is replaced, not merged: the
/// mismatched replica entry is deleted first, then the correct type is
/// created from source.
pub async fn plan_changes(
    source: &TreeSnapshot,
    replica: &TreeSnapshot,
    sink: &dyn EventSink,
) -> SyncPlan {
    let mut plan = SyncPlan::default();

    let mut source_paths: Vec<&PathBuf> = source.entries().keys().collect();
    source_paths.sort();

    // Directory propagation, parents before children. A replica file in the
    // way of a source directory is deleted before the directory is created.
    for path in &source_paths {
        let info = &source.entries()[*path];
        if info.kind != EntryKind::Directory {
            continue;
        }
        match replica.get(path) {
            None => plan.actions.push(SyncAction::CreateDir {
                path: (*path).clone(),
            }),
            Some(existing) if existing.kind == EntryKind::File => {
                plan.actions.push(SyncAction::DeleteFile {
                    path: (*path).clone(),
                });
                plan.actions.push(SyncAction::CreateDir {
                    path: (*path).clone(),
                });
            }
            Some(_) => {}
        }
    }

    // File propagation. Directories replaced by files are deleted whole, so
    // the removal phase must not see their children again.
    let mut replaced_dirs: Vec<PathBuf> = Vec::new();
    for path in &source_paths {
        let info = &source.entries()[*path];
        if info.kind != EntryKind::File {
            continue;
        }
        match replica.get(path) {
            None => plan.actions.push(SyncAction::CopyFile {
                path: (*path).clone(),
                reason: CopyReason::Created,
                size: info.size,
            }),
            Some(existing) if existing.kind == EntryKind::Directory => {
                plan.actions.push(SyncAction::DeleteDir {
                    path: (*path).clone(),
                });
                replaced_dirs.push((*path).clone());
                plan.actions.push(SyncAction::CopyFile {
                    path: (*path).clone(),
                    reason: CopyReason::Created,
                    size: info.size,
                });
            }
            Some(existing) => {
                if existing.size != info.size {
                    plan.actions.push(SyncAction::CopyFile {
                        path: (*path).clone(),
                        reason: CopyReason::Updated,
                        size: info.size,
                    });
                    continue;
                }
                match content_matches(&source.absolute(path), &replica.absolute(path)).await {
                    Ok(true) => plan.files_unchanged += 1,
                    Ok(false) => plan.actions.push(SyncAction::CopyFile {
                        path: (*path).clone(),
                        reason: CopyReason::Updated,
                        size: info.size,
                    }),
                    Err(e) => {
                        // Comparison failed; re-copying converges either way
                        sink.emit(&SyncEvent::EntryFailed {
                            path: (*path).clone(),
                            message: e.to_string(),
                        });
                        plan.failed += 1;
                        plan.actions.push(SyncAction::CopyFile {
                            path: (*path).clone(),
                            reason: CopyReason::Updated,
                            size: info.size,
                        });
                    }
                }
            }
        }
    }

    // Obsolete-entry removal, children strictly before parents. Entries
    // whose path exists in source with either kind are handled above, and
    // subtrees under an unlisted source directory are left alone because
    // this pass never observed them.
    let mut replica_paths: Vec<&PathBuf> = replica.entries().keys().collect();
    replica_paths.sort();
    for path in replica_paths.iter().rev() {
        if source.contains(path) || source.is_under_unreadable(path) {
            continue;
        }
        if replaced_dirs.iter().any(|dir| path.starts_with(dir)) {
            continue;
        }
        let info = &replica.entries()[*path];
        match info.kind {
            EntryKind::File => plan.actions.push(SyncAction::DeleteFile {
                path: (*path).clone(),
            }),
            EntryKind::Directory => plan.actions.push(SyncAction::DeleteDir {
                path: (*path).clone(),
            }),
        }
    }

    debug!(
        "Planned {} actions ({} unchanged, {} comparison failures)",
        plan.len(),
        plan.files_unchanged,
        plan.failed
    );
    plan
}

/// Compare two files by content digest
async fn content_matches(source_file: &Path, replica_file: &Path) -> Result<bool> {
    let source_digest = ContentDigest::of_file(source_file).await?;
    let replica_digest = ContentDigest::of_file(replica_file).await?;
    Ok(source_digest == replica_digest)
}
