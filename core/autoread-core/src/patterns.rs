//! Autoread pattern resolution.
//!
//! Decides which file/path patterns count as autoread candidates for a
//! directory. Precedence:
//!
//! 1. The nearest ancestor (starting at the directory itself) holding a local
//!    pattern file, `.autoread` or `autoread` in that order. Its list is used
//!    verbatim; it never merges with the global list.
//! 2. The global pattern file, `~/.config/autoread`.
//! 3. [`DEFAULT_PATTERNS`].
//!
//! Pattern files are plain text, one pattern per line. Lines are trimmed;
//! blank lines and lines starting with `#` are ignored.

use std::path::{Path, PathBuf};

use crate::paths::walk_up;
use crate::vfs::{FileSystem, NodeKind};

/// Patterns used when no local or global pattern file exists.
pub const DEFAULT_PATTERNS: [&str; 2] = ["AGENTS.md", "CONTRIBUTING.md"];

/// Local pattern file names, highest priority first.
pub const LOCAL_CONFIG_NAMES: [&str; 2] = [".autoread", "autoread"];

/// Parses pattern file content, keeping order.
pub fn parse_pattern_file(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn default_patterns() -> Vec<String> {
    DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
}

/// Resolves the pattern list for a start directory.
pub struct PatternResolver<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    global_config: Option<PathBuf>,
}

impl<'a, F: FileSystem + ?Sized> PatternResolver<'a, F> {
    pub fn new(fs: &'a F, global_config: Option<PathBuf>) -> Self {
        Self { fs, global_config }
    }

    pub fn resolve(&self, start_dir: &Path) -> Vec<String> {
        for dir in walk_up(start_dir) {
            if let Some(patterns) = self.local_patterns(&dir) {
                return patterns;
            }
        }
        self.global_patterns()
    }

    /// Patterns from the first readable local pattern file in `dir`.
    fn local_patterns(&self, dir: &Path) -> Option<Vec<String>> {
        for name in LOCAL_CONFIG_NAMES {
            let candidate = dir.join(name);
            if self.fs.kind(&candidate) != Some(NodeKind::File) {
                continue;
            }
            match self.fs.read_to_string(&candidate) {
                Ok(content) => {
                    tracing::debug!(config = %candidate.display(), "Using local autoread patterns");
                    return Some(parse_pattern_file(&content));
                }
                Err(e) => {
                    tracing::warn!(
                        config = %candidate.display(),
                        error = %e,
                        "Unreadable autoread pattern file, ignoring"
                    );
                }
            }
        }
        None
    }

    fn global_patterns(&self) -> Vec<String> {
        let Some(global) = self.global_config.as_deref() else {
            return default_patterns();
        };
        if self.fs.kind(global) != Some(NodeKind::File) {
            return default_patterns();
        }
        match self.fs.read_to_string(global) {
            Ok(content) => parse_pattern_file(&content),
            Err(e) => {
                tracing::warn!(
                    config = %global.display(),
                    error = %e,
                    "Unreadable global autoread pattern file, using defaults"
                );
                default_patterns()
            }
        }
    }
}
