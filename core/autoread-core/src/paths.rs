//! Path helpers shared by the pattern resolver and the entry locator.

use std::path::{Component, Path, PathBuf};

/// Iterates from `start` up through its ancestors, stopping short of the
/// filesystem root.
///
/// A directory with no parent, or whose parent equals itself, is the root
/// and is never yielded. No fixed root string is compared against.
pub fn walk_up(start: &Path) -> WalkUp {
    WalkUp {
        next: Some(start.to_path_buf()),
    }
}

pub struct WalkUp {
    next: Option<PathBuf>,
}

impl Iterator for WalkUp {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        let current = self.next.take()?;
        let parent = current.parent().filter(|parent| *parent != current.as_path())?;
        if !parent.as_os_str().is_empty() {
            self.next = Some(parent.to_path_buf());
        }
        Some(current)
    }
}

/// Makes `path` absolute against the current directory and removes `.`/`..`
/// components lexically. Falls back to the lexical form when the current
/// directory is unavailable.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(e) => {
                tracing::debug!(error = %e, path = %path.display(), "No current dir to absolutize against");
                path.to_path_buf()
            }
        }
    };
    normalize_lexically(&joined)
}

/// Removes `.` and resolves `..` without touching the filesystem.
/// `..` at the root stays at the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// How a pattern is anchored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor<'a> {
    /// Resolved once, independent of the walk.
    Absolute(PathBuf),
    /// Joined onto every directory visited by the walk.
    Relative(&'a str),
    /// Home-rooted but no home directory is known.
    Unresolvable,
}

/// Classifies a pattern: `~` and `~/...` are home-rooted, filesystem-absolute
/// paths are absolute, everything else is relative.
pub fn anchor<'a>(pattern: &'a str, home: Option<&Path>) -> Anchor<'a> {
    if pattern == "~" || pattern.starts_with("~/") {
        return match home {
            Some(home) => {
                let rest = pattern[1..].trim_start_matches('/');
                let path = if rest.is_empty() {
                    home.to_path_buf()
                } else {
                    home.join(rest)
                };
                Anchor::Absolute(normalize_lexically(&path))
            }
            None => Anchor::Unresolvable,
        };
    }
    if Path::new(pattern).is_absolute() {
        return Anchor::Absolute(normalize_lexically(Path::new(pattern)));
    }
    Anchor::Relative(pattern)
}
