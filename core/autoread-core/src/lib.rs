//! # autoread-core
//!
//! Discovers context files (AGENTS.md and friends) relevant to a directory and
//! makes sure each is surfaced to a session only once, across independent
//! hook processes.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. Every invocation is a short-lived
//!   process doing a handful of filesystem operations.
//! - **Filesystem is the only shared state**: Sibling invocations coordinate
//!   through a per-session lock file, never through memory.
//! - **Graceful degradation**: Missing or unreadable files are treated as
//!   absent, corrupt state as empty. Only lock timeouts surface as errors.
//! - **Injectable environment**: Paths come from [`StorageConfig`], filesystem
//!   reads from a [`FileSystem`], so discovery is testable in memory.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use autoread_core::{claim_unseen, locate_entries, SeenStore, StorageConfig};
//!
//! let storage = StorageConfig::from_env();
//! let entries = locate_entries(Path::new("/proj/src"), &storage);
//! let store = SeenStore::new(storage);
//! let fresh = claim_unseen(&store, Some("session-id"), entries);
//! ```

pub mod entry;
pub mod error;
pub mod locate;
pub mod paths;
pub mod patterns;
pub mod seen;
pub mod storage;
pub mod surface;
pub mod vfs;

pub use entry::Entry;
pub use error::{AutoreadError, Result};
pub use locate::{locate_entries, resolve_patterns, EntryLocator};
pub use patterns::{parse_pattern_file, PatternResolver, DEFAULT_PATTERNS};
pub use seen::{LockPolicy, SeenStore};
pub use storage::StorageConfig;
pub use surface::claim_unseen;
pub use vfs::{FileSystem, NodeKind, RealFs};
