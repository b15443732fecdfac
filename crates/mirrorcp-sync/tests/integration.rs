//! Whole-pass tests driving the engine through an in-memory event sink

use mirrorcp_sync::{CopyReason, MemorySink, SyncEvent, SyncRequest, Synchronizer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

/// Recursive (relative path -> content) map of a tree; directories map to None
fn tree_contents(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    fn walk(base: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Option<Vec<u8>>>) {
        for entry in std::fs::read_dir(dir).expect("read_dir") {
            let entry = entry.expect("dir entry");
            let path = entry.path();
            let relative = path.strip_prefix(base).unwrap().to_path_buf();
            if path.is_dir() {
                out.insert(relative, None);
                walk(base, &path, out);
            } else {
                out.insert(relative, Some(std::fs::read(&path).expect("read file")));
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

async fn run_pass(source: &Path, replica: &Path) -> (mirrorcp_sync::SyncReport, MemorySink) {
    let request = SyncRequest::new(source, replica);
    let sink = MemorySink::new();
    let report = Synchronizer::new()
        .sync(&request, &sink)
        .await
        .expect("pass failed");
    (report, sink)
}

#[tokio::test]
async fn converges_from_an_empty_replica() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let replica = temp.path().join("replica");
    fs::create_dir_all(source.join("a")).await.unwrap();
    fs::write(source.join("a/b.txt"), b"hello").await.unwrap();

    let (report, sink) = run_pass(&source, &replica).await;

    assert_eq!(tree_contents(&source), tree_contents(&replica));
    assert_eq!(report.stats.dirs_created, 1);
    assert_eq!(report.stats.files_created, 1);
    assert_eq!(report.stats.entries_failed, 0);

    let events = sink.events();
    assert!(events.iter().any(
        |e| matches!(e, SyncEvent::DirCreated { path } if path == Path::new("a"))
    ));
    assert!(events.iter().any(|e| matches!(
        e,
        SyncEvent::FileCopied { path, reason: CopyReason::Created, .. }
            if path == Path::new("a/b.txt")
    )));
}

#[tokio::test]
async fn converges_from_an_arbitrary_replica() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let replica = temp.path().join("replica");

    fs::create_dir_all(source.join("keep/nested")).await.unwrap();
    fs::write(source.join("keep/nested/same.txt"), b"unchanged")
        .await
        .unwrap();
    fs::write(source.join("keep/changed.txt"), b"new content")
        .await
        .unwrap();
    fs::create_dir_all(source.join("fresh")).await.unwrap();
    fs::write(source.join("fresh/added.txt"), b"added").await.unwrap();

    fs::create_dir_all(replica.join("keep/nested")).await.unwrap();
    fs::write(replica.join("keep/nested/same.txt"), b"unchanged")
        .await
        .unwrap();
    fs::write(replica.join("keep/changed.txt"), b"old content")
        .await
        .unwrap();
    fs::create_dir_all(replica.join("stale/deep")).await.unwrap();
    fs::write(replica.join("stale/deep/gone.txt"), b"obsolete")
        .await
        .unwrap();
    fs::write(replica.join("extra.txt"), b"extraneous").await.unwrap();

    let (report, _) = run_pass(&source, &replica).await;

    assert_eq!(tree_contents(&source), tree_contents(&replica));
    assert_eq!(report.stats.files_updated, 1);
    assert_eq!(report.stats.files_created, 1);
    assert_eq!(report.stats.dirs_created, 1);
    assert_eq!(report.stats.files_deleted, 2);
    assert_eq!(report.stats.dirs_deleted, 2);
    assert_eq!(report.stats.files_unchanged, 1);
}

#[tokio::test]
async fn second_pass_is_a_noop() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let replica = temp.path().join("replica");
    fs::create_dir_all(source.join("a/b")).await.unwrap();
    fs::write(source.join("a/file.txt"), b"content").await.unwrap();
    fs::write(source.join("a/b/other.txt"), b"more").await.unwrap();

    let (first, _) = run_pass(&source, &replica).await;
    assert!(!first.stats.is_noop());

    let (second, sink) = run_pass(&source, &replica).await;
    assert!(second.stats.is_noop());
    assert_eq!(second.stats.files_unchanged, 2);

    // Nothing but the start and summary events
    let mutations = sink
        .events()
        .iter()
        .filter(|e| {
            !matches!(
                e,
                SyncEvent::PassStarted { .. } | SyncEvent::PassCompleted { .. }
            )
        })
        .count();
    assert_eq!(mutations, 0);
}

#[tokio::test]
async fn same_size_content_change_is_detected() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let replica = temp.path().join("replica");
    fs::create_dir(&source).await.unwrap();
    fs::create_dir(&replica).await.unwrap();
    // Identical size, different bytes
    fs::write(source.join("b.txt"), b"world").await.unwrap();
    fs::write(replica.join("b.txt"), b"hello").await.unwrap();

    let (report, sink) = run_pass(&source, &replica).await;

    assert_eq!(
        std::fs::read(replica.join("b.txt")).unwrap(),
        b"world".to_vec()
    );
    assert_eq!(report.stats.files_updated, 1);
    assert!(sink.events().iter().any(|e| matches!(
        e,
        SyncEvent::FileCopied { reason: CopyReason::Updated, .. }
    )));
}

#[tokio::test]
async fn obsolete_entries_are_removed_children_first() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let replica = temp.path().join("replica");
    fs::create_dir(&source).await.unwrap();
    fs::create_dir_all(replica.join("old/deep")).await.unwrap();
    fs::write(replica.join("old/deep/file.txt"), b"bye")
        .await
        .unwrap();
    fs::write(replica.join("old/top.txt"), b"bye").await.unwrap();

    let (report, sink) = run_pass(&source, &replica).await;

    assert!(tree_contents(&replica).is_empty());
    assert_eq!(report.stats.files_deleted, 2);
    assert_eq!(report.stats.dirs_deleted, 2);

    // Every deletion of a directory comes after the deletions inside it
    let deletions: Vec<PathBuf> = sink
        .events()
        .iter()
        .filter_map(|e| match e {
            SyncEvent::FileDeleted { path } | SyncEvent::DirDeleted { path } => {
                Some(path.clone())
            }
            _ => None,
        })
        .collect();
    for (i, deleted) in deletions.iter().enumerate() {
        for later in &deletions[i + 1..] {
            assert!(
                !(later.starts_with(deleted) && later != deleted),
                "{} was deleted before its child {}",
                deleted.display(),
                later.display()
            );
        }
    }
    assert_eq!(deletions.last().unwrap(), &PathBuf::from("old"));
}

#[tokio::test]
async fn file_replacing_a_directory_is_not_merged() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let replica = temp.path().join("replica");
    fs::create_dir(&source).await.unwrap();
    fs::write(source.join("entry"), b"now a file").await.unwrap();
    fs::create_dir_all(replica.join("entry/leftover")).await.unwrap();
    fs::write(replica.join("entry/leftover/junk.txt"), b"junk")
        .await
        .unwrap();

    let (_, _) = run_pass(&source, &replica).await;

    assert_eq!(tree_contents(&source), tree_contents(&replica));
    assert_eq!(
        std::fs::read(replica.join("entry")).unwrap(),
        b"now a file".to_vec()
    );
}

#[tokio::test]
async fn directory_replacing_a_file_is_not_merged() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let replica = temp.path().join("replica");
    fs::create_dir_all(source.join("entry")).await.unwrap();
    fs::write(source.join("entry/inner.txt"), b"inside").await.unwrap();
    fs::create_dir(&replica).await.unwrap();
    fs::write(replica.join("entry"), b"was a file").await.unwrap();

    let (_, _) = run_pass(&source, &replica).await;

    assert_eq!(tree_contents(&source), tree_contents(&replica));
    assert!(replica.join("entry").is_dir());
}

#[tokio::test]
async fn empty_directories_are_mirrored() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let replica = temp.path().join("replica");
    fs::create_dir_all(source.join("empty/also-empty")).await.unwrap();

    let (report, _) = run_pass(&source, &replica).await;

    assert!(replica.join("empty/also-empty").is_dir());
    assert_eq!(report.stats.dirs_created, 2);
}

#[tokio::test]
async fn fingerprinting_does_not_mutate_the_source() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let replica = temp.path().join("replica");
    fs::create_dir(&source).await.unwrap();
    fs::write(source.join("a.txt"), b"payload").await.unwrap();

    let before = tree_contents(&source);
    let mtime_before = std::fs::metadata(source.join("a.txt"))
        .unwrap()
        .modified()
        .unwrap();

    run_pass(&source, &replica).await;
    run_pass(&source, &replica).await;

    assert_eq!(before, tree_contents(&source));
    let mtime_after = std::fs::metadata(source.join("a.txt"))
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(mtime_before, mtime_after);
}

#[cfg(unix)]
#[tokio::test]
async fn unreadable_source_subtree_does_not_trigger_replica_deletions() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let replica = temp.path().join("replica");
    fs::create_dir_all(source.join("locked")).await.unwrap();
    fs::write(source.join("locked/secret.txt"), b"secret")
        .await
        .unwrap();
    fs::write(source.join("open.txt"), b"open").await.unwrap();

    fs::create_dir_all(replica.join("locked")).await.unwrap();
    fs::write(replica.join("locked/secret.txt"), b"secret")
        .await
        .unwrap();
    fs::write(replica.join("stale.txt"), b"stale").await.unwrap();

    let locked = source.join("locked");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
    if std::fs::read_dir(&locked).is_ok() {
        // Privileged environment, permissions are not enforced
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let request = SyncRequest::new(&source, &replica);
    let sink = MemorySink::new();
    let report = Synchronizer::new().sync(&request, &sink).await;

    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

    let report = report.expect("pass should survive an unreadable subdirectory");
    // The unobserved subtree stays; everything else still syncs
    assert!(replica.join("locked/secret.txt").exists());
    assert!(!replica.join("stale.txt").exists());
    assert!(replica.join("open.txt").exists());
    assert!(report.stats.entries_failed > 0);
}
