//! File-backed per-session seen sets.
//!
//! # File Format
//!
//! `seen-{session}.json` holds a JSON array of resolved path strings:
//!
//! ```json
//! ["/proj/AGENTS.md", "/proj/docs"]
//! ```
//!
//! # Defensive Design
//!
//! Readers never fail: a missing file is the empty set, and so is an
//! unreadable or corrupt one (logged). The next successful write replaces the
//! bad content.
//!
//! # Atomic Writes
//!
//! Writes happen under the session lock and go through temp file + rename, so
//! a reader without the lock sees either the old or the new set.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use fs_err as fs;
use tempfile::NamedTempFile;

use super::lock::{LockPolicy, SessionLock};
use crate::error::{AutoreadError, Result};
use crate::storage::StorageConfig;

/// Tracks which paths have been surfaced in which session.
#[derive(Debug, Clone)]
pub struct SeenStore {
    storage: StorageConfig,
    policy: LockPolicy,
}

impl SeenStore {
    pub fn new(storage: StorageConfig) -> Self {
        Self::with_policy(storage, LockPolicy::default())
    }

    pub fn with_policy(storage: StorageConfig, policy: LockPolicy) -> Self {
        Self { storage, policy }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// The session's seen set. Missing or unreadable state reads as empty.
    pub fn seen_paths(&self, session_id: &str) -> HashSet<String> {
        load_seen(&self.storage.seen_file(session_id))
    }

    pub fn is_seen(&self, session_id: &str, path: &str) -> bool {
        self.seen_paths(session_id).contains(path)
    }

    /// Records `path` as surfaced for `session_id`.
    ///
    /// Returns `Ok(true)` when this call added the path and `Ok(false)` when it
    /// was already recorded, possibly by a concurrent process. Exactly one
    /// caller per (session, path) ever sees `true`.
    pub fn mark_seen(&self, session_id: &str, path: &str) -> Result<bool> {
        let lock = SessionLock::acquire(&self.storage, session_id, &self.policy)?;

        let file = self.storage.seen_file(session_id);
        let mut seen = load_seen(&file);
        if !seen.insert(path.to_string()) {
            lock.release();
            return Ok(false);
        }

        // The lock may have gone stale and been reclaimed while we were reading
        if !lock.still_held() {
            return Err(AutoreadError::LockLost {
                session: session_id.to_string(),
            });
        }

        save_seen(&file, &seen)?;
        lock.release();

        tracing::debug!(session = %session_id, path = %path, "Marked path as seen");
        Ok(true)
    }
}

fn load_seen(file: &Path) -> HashSet<String> {
    let content = match fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashSet::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read seen state, treating as empty");
            return HashSet::new();
        }
    };

    if content.trim().is_empty() {
        return HashSet::new();
    }

    match serde_json::from_str::<Vec<String>>(&content) {
        Ok(paths) => paths.into_iter().collect(),
        Err(e) => {
            tracing::warn!(
                file = %file.display(),
                error = %e,
                "Corrupt seen state, treating as empty"
            );
            HashSet::new()
        }
    }
}

fn save_seen(file: &Path, seen: &HashSet<String>) -> Result<()> {
    let mut paths: Vec<&String> = seen.iter().collect();
    paths.sort();

    let content =
        serde_json::to_vec(&paths).map_err(|e| AutoreadError::json("serializing seen state", e))?;

    let parent_dir = file.parent().ok_or_else(|| {
        AutoreadError::io(
            "seen state path has no parent directory",
            std::io::Error::from(std::io::ErrorKind::InvalidInput),
        )
    })?;
    let mut temp_file = NamedTempFile::new_in(parent_dir)
        .map_err(|e| AutoreadError::io("creating seen state temp file", e))?;
    temp_file
        .write_all(&content)
        .map_err(|e| AutoreadError::io("writing seen state temp file", e))?;
    temp_file
        .flush()
        .map_err(|e| AutoreadError::io("flushing seen state temp file", e))?;
    temp_file
        .persist(file)
        .map_err(|e| AutoreadError::io("replacing seen state file", e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn store(temp: &TempDir) -> SeenStore {
        SeenStore::new(StorageConfig::with_root(temp.path().to_path_buf()))
    }

    #[test]
    fn test_missing_state_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        assert!(store.seen_paths("sess1").is_empty());
        assert!(!store.is_seen("sess1", "/proj/AGENTS.md"));
    }

    #[test]
    fn test_mark_then_is_seen() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        assert!(store.mark_seen("sess1", "/proj/AGENTS.md").unwrap());
        assert!(store.is_seen("sess1", "/proj/AGENTS.md"));
        assert!(!store.is_seen("sess2", "/proj/AGENTS.md"));
    }

    #[test]
    fn test_second_mark_is_noop() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        assert!(store.mark_seen("sess1", "/proj/AGENTS.md").unwrap());
        assert!(!store.mark_seen("sess1", "/proj/AGENTS.md").unwrap());

        let content = std::fs::read_to_string(store.storage().seen_file("sess1")).unwrap();
        let paths: Vec<String> = serde_json::from_str(&content).unwrap();
        assert_eq!(paths, vec!["/proj/AGENTS.md".to_string()]);
    }

    #[test]
    fn test_state_file_is_sorted_json_array() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.mark_seen("s", "/b").unwrap();
        store.mark_seen("s", "/a").unwrap();

        let content = std::fs::read_to_string(store.storage().seen_file("s")).unwrap();
        assert_eq!(content, r#"["/a","/b"]"#);
    }

    #[test]
    fn test_corrupt_state_reads_empty_and_heals() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let file = store.storage().seen_file("s");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "[\"/a\", oops").unwrap();

        assert!(store.seen_paths("s").is_empty());
        assert!(store.mark_seen("s", "/b").unwrap());
        assert_eq!(
            store.seen_paths("s"),
            HashSet::from(["/b".to_string()])
        );
    }

    #[test]
    fn test_empty_state_file_reads_empty() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let file = store.storage().seen_file("s");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "  \n").unwrap();

        assert!(store.seen_paths("s").is_empty());
    }

    #[test]
    fn test_lock_removed_after_mark() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.mark_seen("s", "/a").unwrap();
        assert!(!store.storage().lock_file("s").exists());
    }

    #[test]
    fn test_mark_reports_lock_timeout() {
        let temp = TempDir::new().unwrap();
        let policy = LockPolicy {
            timeout: Duration::from_millis(100),
            retry: Duration::from_millis(5),
            ..LockPolicy::default()
        };
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        let store = SeenStore::with_policy(storage.clone(), policy);

        let _held = SessionLock::acquire(&storage, "s", &policy).unwrap();
        let err = store.mark_seen("s", "/a").unwrap_err();
        assert!(err.is_lock_timeout());
        assert!(!store.is_seen("s", "/a"));
    }

    #[test]
    fn test_concurrent_threads_mark_once() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let winners: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| store.mark_seen("s", "/proj/AGENTS.md").unwrap()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|won| *won)
                .count()
        });

        assert_eq!(winners, 1);
        assert_eq!(store.seen_paths("s").len(), 1);
    }

    #[test]
    fn test_concurrent_threads_distinct_paths_all_recorded() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        std::thread::scope(|scope| {
            for i in 0..8 {
                let store = &store;
                scope.spawn(move || store.mark_seen("s", &format!("/p/{}", i)).unwrap());
            }
        });

        assert_eq!(store.seen_paths("s").len(), 8);
    }
}
