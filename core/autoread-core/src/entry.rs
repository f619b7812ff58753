//! Discovered autoread entries.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An existing filesystem object matched by an autoread pattern.
///
/// The resolved `path` is the entry's only identity: two entries with the same
/// path are the same entry no matter which pattern produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    File {
        path: PathBuf,
    },
    Directory {
        path: PathBuf,
        /// Immediate child names, sorted. Not recursive.
        children: Vec<String>,
    },
}

impl Entry {
    pub fn path(&self) -> &Path {
        match self {
            Entry::File { path } | Entry::Directory { path, .. } => path,
        }
    }

    /// The identity key used by the seen-state store.
    pub fn key(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Directory { .. })
    }
}
