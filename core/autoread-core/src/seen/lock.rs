//! Per-session lock file guarding the seen set.
//!
//! Hook invocations are independent short-lived processes, so the only shared
//! mutex is a file next to the state file:
//!
//! ```text
//! $TMPDIR/autoread-plugin/
//! ├── seen-{session}.json   # the seen set
//! └── seen-{session}.lock   # {"pid": 123, "timestamp": 1700000000000, "token": "01H..."}
//! ```
//!
//! # Acquisition
//!
//! 1. A stale lock (older than [`LockPolicy::stale_after`], holder PID gone, or
//!    unreadable content) is deleted, best-effort.
//! 2. With no lock present, the record is written to a uniquely named temp
//!    file in the state directory and renamed into place. The rename refuses to
//!    replace an existing lock, so two racing writers cannot both land.
//! 3. The lock file is re-read and must carry our PID and token before we
//!    consider it held.
//! 4. Otherwise wait [`LockPolicy::retry`] and try again until
//!    [`LockPolicy::timeout`] elapses.
//!
//! # PID Reuse
//!
//! A recycled PID can make a dead holder look alive. The age threshold bounds
//! how long such a lock can block others.
//!
//! # Release
//!
//! Only a lock still carrying our token is deleted. If ours went stale and was
//! reclaimed mid-critical-section, the new holder's lock is left alone.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use tempfile::Builder;

use crate::error::{AutoreadError, Result};
use crate::storage::StorageConfig;

pub const LOCK_TIMEOUT_MS: u64 = 5_000;
pub const LOCK_RETRY_MS: u64 = 10;
pub const LOCK_STALE_MS: u64 = 30_000;

/// Timing knobs for lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// Total time to keep retrying before giving up.
    pub timeout: Duration,
    /// Pause between attempts.
    pub retry: Duration,
    /// Locks older than this are reclaimed regardless of holder liveness.
    pub stale_after: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(LOCK_TIMEOUT_MS),
            retry: Duration::from_millis(LOCK_RETRY_MS),
            stale_after: Duration::from_millis(LOCK_STALE_MS),
        }
    }
}

/// Serialized lock file content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub pid: u32,
    /// Acquisition time, Unix milliseconds.
    pub timestamp: i64,
    /// Unique per acquisition attempt. Distinguishes holders sharing a PID.
    #[serde(default)]
    pub token: Option<String>,
}

impl LockRecord {
    fn for_current_process() -> Self {
        Self {
            pid: std::process::id(),
            timestamp: Utc::now().timestamp_millis(),
            token: Some(ulid::Ulid::new().to_string()),
        }
    }

    fn same_holder(&self, other: &LockRecord) -> bool {
        self.pid == other.pid && self.token == other.token
    }

    pub fn is_stale(&self, policy: &LockPolicy) -> bool {
        let age_ms = Utc::now().timestamp_millis().saturating_sub(self.timestamp);
        if age_ms > policy.stale_after.as_millis() as i64 {
            return true;
        }
        !is_pid_alive(self.pid)
    }
}

/// What the lock file says relative to a would-be holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    HeldByOther,
    HeldByOtherStale,
    HeldBySelf,
}

enum LockFile {
    Absent,
    Corrupt,
    Present(LockRecord),
}

fn read_lock(path: &Path) -> LockFile {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LockFile::Absent,
        Err(e) => {
            tracing::debug!(lock = %path.display(), error = %e, "Unreadable lock file");
            return LockFile::Corrupt;
        }
    };
    match serde_json::from_str::<LockRecord>(&content) {
        Ok(record) => LockFile::Present(record),
        Err(e) => {
            tracing::debug!(lock = %path.display(), error = %e, "Malformed lock file");
            LockFile::Corrupt
        }
    }
}

/// Classifies the lock at `path` from the point of view of `me`.
pub fn inspect(path: &Path, me: &LockRecord, policy: &LockPolicy) -> LockState {
    match read_lock(path) {
        LockFile::Absent => LockState::Unlocked,
        LockFile::Corrupt => LockState::HeldByOtherStale,
        LockFile::Present(record) if record.same_holder(me) => LockState::HeldBySelf,
        LockFile::Present(record) if record.is_stale(policy) => LockState::HeldByOtherStale,
        LockFile::Present(_) => LockState::HeldByOther,
    }
}

pub fn is_pid_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        if pid == 0 || pid > i32::MAX as u32 {
            return false;
        }
        // SAFETY: kill with signal 0 performs only the existence/permission check
        // and delivers nothing.
        #[allow(unsafe_code)]
        let rc = unsafe { libc::kill(pid as i32, 0) };
        if rc == 0 {
            return true;
        }
        // EPERM: the process exists but belongs to someone else
        std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }
    #[cfg(not(unix))]
    {
        // No cheap liveness probe; rely on the age threshold
        let _ = pid;
        true
    }
}

/// A held session lock. Released on drop.
#[derive(Debug)]
pub struct SessionLock {
    path: PathBuf,
    record: LockRecord,
    session: String,
    released: bool,
}

impl SessionLock {
    /// Acquires the lock for `session_id`, waiting up to `policy.timeout`.
    pub fn acquire(
        storage: &StorageConfig,
        session_id: &str,
        policy: &LockPolicy,
    ) -> Result<SessionLock> {
        Self::acquire_as(storage, session_id, policy, LockRecord::for_current_process())
    }

    /// Acquires on behalf of `me`. The record is fixed for every attempt, so a
    /// lock file that already names `me` counts as held.
    fn acquire_as(
        storage: &StorageConfig,
        session_id: &str,
        policy: &LockPolicy,
        me: LockRecord,
    ) -> Result<SessionLock> {
        storage
            .ensure_state_dir()
            .map_err(|e| AutoreadError::io("creating state directory", e))?;

        let path = storage.lock_file(session_id);
        let dir = storage.state_dir();
        let start = Instant::now();

        loop {
            match inspect(&path, &me, policy) {
                LockState::HeldByOtherStale => {
                    reclaim_stale(&path, &me, policy);
                }
                LockState::HeldBySelf => {
                    return Ok(SessionLock::held(path, me, session_id));
                }
                LockState::HeldByOther | LockState::Unlocked => {}
            }

            if !path.exists() && try_create(dir, &path, &me) {
                tracing::debug!(
                    session = %session_id,
                    waited_ms = start.elapsed().as_millis() as u64,
                    "Acquired seen-state lock"
                );
                return Ok(SessionLock::held(path, me, session_id));
            }

            if start.elapsed() >= policy.timeout {
                return Err(AutoreadError::LockTimeout {
                    session: session_id.to_string(),
                    waited_ms: start.elapsed().as_millis() as u64,
                });
            }
            thread::sleep(policy.retry);
        }
    }

    fn held(path: PathBuf, record: LockRecord, session_id: &str) -> Self {
        SessionLock {
            path,
            record,
            session: session_id.to_string(),
            released: false,
        }
    }

    pub fn record(&self) -> &LockRecord {
        &self.record
    }

    /// True if the lock file still names this holder.
    pub fn still_held(&self) -> bool {
        matches!(read_lock(&self.path), LockFile::Present(ref r) if r.same_holder(&self.record))
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.still_held() {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::debug!(session = %self.session, error = %e, "Lock already gone on release");
            }
        } else {
            tracing::warn!(
                session = %self.session,
                "Seen-state lock was reclaimed by another process before release"
            );
        }
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// Deletes a stale lock if it is still stale on a second look.
fn reclaim_stale(path: &Path, me: &LockRecord, policy: &LockPolicy) {
    if inspect(path, me, policy) != LockState::HeldByOtherStale {
        return;
    }
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!(lock = %path.display(), "Removed stale lock"),
        // A racing process got there first
        Err(e) => tracing::debug!(lock = %path.display(), error = %e, "Stale lock removal failed"),
    }
}

/// Writes `me` to a temp file and renames it onto `path` without clobbering.
/// The temp file is deleted on every failure path when it drops.
fn try_create(dir: &Path, path: &Path, me: &LockRecord) -> bool {
    let payload = match serde_json::to_vec(me) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize lock record");
            return false;
        }
    };

    let mut temp = match Builder::new().prefix(".seen-lock-").tempfile_in(dir) {
        Ok(temp) => temp,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Failed to create lock temp file");
            return false;
        }
    };
    if let Err(e) = temp.write_all(&payload).and_then(|_| temp.flush()) {
        tracing::debug!(error = %e, "Failed to write lock temp file");
        return false;
    }
    if temp.persist_noclobber(path).is_err() {
        return false;
    }

    matches!(read_lock(path), LockFile::Present(ref r) if r.same_holder(me))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DEAD_PID: u32 = 99_999_999;

    fn short_policy() -> LockPolicy {
        LockPolicy {
            timeout: Duration::from_millis(200),
            retry: Duration::from_millis(5),
            stale_after: Duration::from_millis(LOCK_STALE_MS),
        }
    }

    fn write_record(path: &Path, record: &LockRecord) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string(record).unwrap()).unwrap();
    }

    #[test]
    fn test_current_process_is_alive() {
        assert!(is_pid_alive(std::process::id()));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonexistent_pid_is_dead() {
        assert!(!is_pid_alive(DEAD_PID));
        assert!(!is_pid_alive(0));
    }

    #[test]
    fn test_acquire_and_release_removes_lock_file() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());

        let lock = SessionLock::acquire(&storage, "s1", &short_policy()).unwrap();
        let lock_path = storage.lock_file("s1");
        assert!(lock_path.exists());
        assert!(lock.still_held());
        assert_eq!(lock.record().pid, std::process::id());

        lock.release();
        assert!(!lock_path.exists());
    }

    #[test]
    fn test_drop_releases_lock() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());

        {
            let _lock = SessionLock::acquire(&storage, "s1", &short_policy()).unwrap();
        }
        assert!(!storage.lock_file("s1").exists());
    }

    #[test]
    fn test_live_lock_times_out() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());

        let _held = SessionLock::acquire(&storage, "s1", &short_policy()).unwrap();
        let err = SessionLock::acquire(&storage, "s1", &short_policy()).unwrap_err();
        assert!(err.is_lock_timeout());
    }

    #[test]
    fn test_locks_are_per_session() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());

        let _a = SessionLock::acquire(&storage, "a", &short_policy()).unwrap();
        let _b = SessionLock::acquire(&storage, "b", &short_policy()).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_dead_holder_is_reclaimed_immediately() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        let path = storage.lock_file("s1");
        write_record(
            &path,
            &LockRecord {
                pid: DEAD_PID,
                timestamp: Utc::now().timestamp_millis(),
                token: None,
            },
        );

        let lock = SessionLock::acquire(&storage, "s1", &short_policy()).unwrap();
        assert_eq!(lock.record().pid, std::process::id());
    }

    #[test]
    fn test_old_lock_is_reclaimed_even_if_holder_alive() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        let path = storage.lock_file("s1");
        write_record(
            &path,
            &LockRecord {
                pid: std::process::id(),
                timestamp: Utc::now().timestamp_millis() - (LOCK_STALE_MS as i64 + 1_000),
                token: Some("someone-else".to_string()),
            },
        );

        assert!(SessionLock::acquire(&storage, "s1", &short_policy()).is_ok());
    }

    #[test]
    fn test_corrupt_lock_is_reclaimed() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        let path = storage.lock_file("s1");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        assert!(SessionLock::acquire(&storage, "s1", &short_policy()).is_ok());
    }

    #[test]
    fn test_release_leaves_foreign_lock_alone() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());

        let lock = SessionLock::acquire(&storage, "s1", &short_policy()).unwrap();
        let path = storage.lock_file("s1");
        let foreign = LockRecord {
            pid: std::process::id(),
            timestamp: Utc::now().timestamp_millis(),
            token: Some("new-holder".to_string()),
        };
        write_record(&path, &foreign);

        assert!(!lock.still_held());
        lock.release();
        assert!(path.exists());
    }

    #[test]
    fn test_inspect_states() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("seen-x.lock");
        let policy = LockPolicy::default();
        let me = LockRecord::for_current_process();

        assert_eq!(inspect(&path, &me, &policy), LockState::Unlocked);

        write_record(&path, &me);
        assert_eq!(inspect(&path, &me, &policy), LockState::HeldBySelf);

        let other = LockRecord::for_current_process();
        assert_eq!(inspect(&path, &other, &policy), LockState::HeldByOther);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());

        let held = SessionLock::acquire(&storage, "s1", &short_policy()).unwrap();
        let _ = SessionLock::acquire(&storage, "s1", &short_policy());
        held.release();

        let leftovers: Vec<_> = std::fs::read_dir(storage.state_dir())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with(".seen-lock-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_lock_already_naming_holder_is_taken_without_waiting() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        let me = LockRecord::for_current_process();
        write_record(&storage.lock_file("s1"), &me);

        let policy = LockPolicy {
            timeout: Duration::ZERO,
            ..short_policy()
        };
        let lock = SessionLock::acquire_as(&storage, "s1", &policy, me.clone()).unwrap();
        assert_eq!(lock.record(), &me);

        lock.release();
        assert!(!storage.lock_file("s1").exists());
    }

    #[test]
    fn test_lock_record_without_token_parses() {
        let record: LockRecord = serde_json::from_str(r#"{"pid": 42, "timestamp": 1}"#).unwrap();
        assert_eq!(record.pid, 42);
        assert!(record.token.is_none());
    }
}
