//! Entry location: turns autoread patterns into existing filesystem entries.
//!
//! Absolute patterns (`/etc/...`, `~/...`) are resolved once. Relative
//! patterns are tried against the start directory and then every ancestor
//! below the filesystem root. Results keep first-discovery order and are
//! deduplicated by their fully resolved path, so a file reachable through
//! several patterns or through a symlink is reported once.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::entry::Entry;
use crate::paths::{absolutize, anchor, normalize_lexically, walk_up, Anchor};
use crate::patterns::PatternResolver;
use crate::storage::StorageConfig;
use crate::vfs::{FileSystem, NodeKind, RealFs};

pub struct EntryLocator<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    home: Option<PathBuf>,
    resolver: PatternResolver<'a, F>,
}

impl<'a, F: FileSystem + ?Sized> EntryLocator<'a, F> {
    pub fn new(fs: &'a F, home: Option<PathBuf>, global_config: Option<PathBuf>) -> Self {
        Self {
            fs,
            home,
            resolver: PatternResolver::new(fs, global_config),
        }
    }

    pub fn for_storage(fs: &'a F, storage: &StorageConfig) -> Self {
        Self::new(
            fs,
            storage.home().map(Path::to_path_buf),
            storage.global_config_file(),
        )
    }

    pub fn resolver(&self) -> &PatternResolver<'a, F> {
        &self.resolver
    }

    /// Locates every entry for `start_dir`, in discovery order.
    pub fn locate(&self, start_dir: &Path) -> Vec<Entry> {
        let start = absolutize(start_dir);
        let patterns = self.resolver.resolve(&start);

        let mut absolute = Vec::new();
        let mut relative = Vec::new();
        for pattern in &patterns {
            match anchor(pattern, self.home.as_deref()) {
                Anchor::Absolute(path) => absolute.push(path),
                Anchor::Relative(rel) => relative.push(rel),
                Anchor::Unresolvable => {
                    tracing::debug!(pattern = %pattern, "Skipping home-rooted pattern (no home dir)");
                }
            }
        }

        let mut found = Found::default();
        for path in &absolute {
            self.consider(path, &mut found);
        }
        for dir in walk_up(&start) {
            for rel in &relative {
                self.consider(&dir.join(rel), &mut found);
            }
        }
        found.entries
    }

    /// First located file entry, if any.
    pub fn first_file(&self, start_dir: &Path) -> Option<PathBuf> {
        self.locate(start_dir)
            .into_iter()
            .find(|e| !e.is_dir())
            .map(|e| e.path().to_path_buf())
    }

    fn consider(&self, candidate: &Path, found: &mut Found) {
        let Some(kind) = self.fs.kind(candidate) else {
            return;
        };

        let resolved = match self.fs.canonicalize(candidate) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(
                    path = %candidate.display(),
                    error = %e,
                    "Cannot canonicalize autoread entry, using lexical path"
                );
                normalize_lexically(candidate)
            }
        };
        if found.paths.contains(&resolved) {
            return;
        }

        let entry = match kind {
            NodeKind::File => Entry::File {
                path: resolved.clone(),
            },
            NodeKind::Dir => match self.fs.list_dir(candidate) {
                Ok(mut children) => {
                    children.sort();
                    Entry::Directory {
                        path: resolved.clone(),
                        children,
                    }
                }
                // Unlistable counts as absent; another form of the path may still list
                Err(e) => {
                    tracing::warn!(
                        path = %candidate.display(),
                        error = %e,
                        "Cannot list autoread directory, skipping"
                    );
                    return;
                }
            },
        };
        found.paths.insert(resolved);
        found.entries.push(entry);
    }
}

#[derive(Default)]
struct Found {
    entries: Vec<Entry>,
    paths: HashSet<PathBuf>,
}

/// Resolves patterns for `start_dir` against the real filesystem.
pub fn resolve_patterns(start_dir: &Path, storage: &StorageConfig) -> Vec<String> {
    PatternResolver::new(&RealFs, storage.global_config_file()).resolve(&absolutize(start_dir))
}

/// Locates entries for `start_dir` against the real filesystem.
pub fn locate_entries(start_dir: &Path, storage: &StorageConfig) -> Vec<Entry> {
    EntryLocator::for_storage(&RealFs, storage).locate(start_dir)
}
