//! Read-only filesystem access for discovery.
//!
//! Pattern resolution and entry location only ever read. They go through
//! [`FileSystem`] so the walk can run against [`RealFs`] in production and
//! against an in-memory tree in tests.

use std::io;
use std::path::{Path, PathBuf};

/// What a path points at, after following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
}

pub trait FileSystem {
    /// Kind of the object at `path`, following symlinks.
    /// `None` for missing paths, broken links and anything that is neither a
    /// regular file nor a directory.
    fn kind(&self, path: &Path) -> Option<NodeKind>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Names of the immediate children of a directory, in any order.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Fully resolved form of an existing path.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// The host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn kind(&self, path: &Path) -> Option<NodeKind> {
        // std::fs::metadata follows symlinks, so a dangling link is an Err here
        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Cannot stat autoread candidate");
                return None;
            }
        };
        if meta.is_file() {
            Some(NodeKind::File)
        } else if meta.is_dir() {
            Some(NodeKind::Dir)
        } else {
            None
        }
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs_err::read_to_string(path)
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs_err::read_dir(path)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs_err::canonicalize(path)
    }
}

#[cfg(test)]
pub use memory::MemoryFs;
