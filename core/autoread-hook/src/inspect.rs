//! Manual inspection commands: `patterns`, `locate` and `mark`.
//!
//! These print to stdout for humans and scripts; they are not hook handlers.

use std::env;
use std::path::{Path, PathBuf};

use autoread_core::{locate_entries, resolve_patterns, SeenStore, StorageConfig};

fn start_dir(dir: Option<PathBuf>) -> Result<PathBuf, String> {
    match dir {
        Some(dir) => Ok(dir),
        None => env::current_dir().map_err(|e| format!("Failed to read current dir: {}", e)),
    }
}

pub fn patterns(dir: Option<PathBuf>) -> Result<(), String> {
    let dir = start_dir(dir)?;
    for pattern in resolve_patterns(&dir, &StorageConfig::from_env()) {
        println!("{}", pattern);
    }
    Ok(())
}

pub fn locate(dir: Option<PathBuf>) -> Result<(), String> {
    let dir = start_dir(dir)?;
    let entries = locate_entries(&dir, &StorageConfig::from_env());
    let json = serde_json::to_string_pretty(&entries)
        .map_err(|e| format!("Failed to serialize entries: {}", e))?;
    println!("{}", json);
    Ok(())
}

/// Records `path` for `session` and prints `new` or `seen`.
pub fn mark(session: &str, path: &Path) -> Result<(), String> {
    let store = SeenStore::new(StorageConfig::from_env());
    let key = path.to_string_lossy();
    let added = store.mark_seen(session, &key)?;
    println!("{}", if added { "new" } else { "seen" });
    Ok(())
}
