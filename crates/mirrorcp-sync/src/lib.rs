//! One-way directory mirroring engine for mirrorcp
//!
//! This crate turns a replica directory tree into an exact copy of a source
//! tree, one pass at a time:
//!
//! - **Tree snapshots**: Both roots are listed fresh on every pass; nothing
//!   is trusted or persisted between passes
//! - **Content fingerprints**: Files are compared by SHA-256 digest of their
//!   full content, never by timestamps
//! - **Ordered actions**: Directories are created top-down, files copied,
//!   and obsolete replica entries removed bottom-up
//! - **Failure isolation**: One bad entry is logged and counted without
//!   aborting the rest of the pass
//! - **Injected reporting**: Every action flows through an [`EventSink`],
//!   so tests can observe a pass with an in-memory sink
//!
//! # Examples
//!
//! ```rust,no_run
//! use mirrorcp_sync::{SyncRequest, Synchronizer, TracingSink};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Synchronizer::new();
//! let request = SyncRequest::new("source_dir", "replica_dir");
//! let report = engine.sync(&request, &TracingSink).await?;
//! println!("{} changes, {} failures", report.stats.changes(), report.stats.entries_failed);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod digest;
pub mod engine;
pub mod plan;
pub mod report;
pub mod snapshot;

pub use digest::ContentDigest;
pub use engine::{SyncReport, SyncRequest, Synchronizer};
pub use plan::{plan_changes, CopyReason, SyncAction, SyncPlan};
pub use report::{EventSink, MemorySink, SkipReason, SyncEvent, TracingSink};
pub use snapshot::{EntryInfo, EntryKind, TreeSnapshot};
