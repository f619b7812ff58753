//! Per-session "already surfaced" tracking.
//!
//! Every hook invocation is a fresh process, so the record of what a session
//! has already been shown lives on disk and is shared between racing
//! invocations through a lock file.
//!
//! # Module Structure
//!
//! - [`lock`]: the lock file protocol (acquire, staleness, release)
//! - [`store`]: the seen set itself, read freely, written under the lock

pub mod lock;
mod store;

pub use lock::{is_pid_alive, LockPolicy, LockRecord, LockState, SessionLock};
pub use store::SeenStore;
