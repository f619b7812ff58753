//! Storage configuration and path management for autoread.
//!
//! `StorageConfig` centralizes every path the subsystem touches:
//!
//! - the user's home directory (for `~/` patterns and the global pattern file)
//! - the global pattern file (`~/.config/autoread`)
//! - the state directory holding per-session seen sets and their lock files
//!   (default: `$TMPDIR/autoread-plugin`)
//!
//! Production code uses `StorageConfig::from_env()`. Tests use
//! `StorageConfig::with_root(temp_dir)` for isolation.

use std::env;
use std::path::{Path, PathBuf};

/// Overrides the state directory (seen sets + locks).
pub const STATE_DIR_ENV: &str = "AUTOREAD_STATE_DIR";

const STATE_DIR_NAME: &str = "autoread-plugin";
const GLOBAL_CONFIG_RELATIVE: [&str; 2] = [".config", "autoread"];

/// Central configuration for all autoread storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Home directory, if one could be determined.
    home: Option<PathBuf>,
    /// Directory for `seen-<session>.json` and `seen-<session>.lock`.
    state_dir: PathBuf,
}

impl StorageConfig {
    /// Resolves paths from the process environment.
    pub fn from_env() -> Self {
        let state_dir = env::var_os(STATE_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join(STATE_DIR_NAME));
        Self {
            home: dirs::home_dir(),
            state_dir,
        }
    }

    /// Creates a StorageConfig rooted entirely under `root`.
    /// Home is `root/home`, state is `root/state`. Used for testing.
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            home: Some(root.join("home")),
            state_dir: root.join("state"),
        }
    }

    /// Creates a StorageConfig with explicit home and state directories.
    pub fn with_dirs(home: Option<PathBuf>, state_dir: PathBuf) -> Self {
        Self { home, state_dir }
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Path to the global pattern file (`~/.config/autoread`).
    pub fn global_config_file(&self) -> Option<PathBuf> {
        self.home
            .as_ref()
            .map(|h| GLOBAL_CONFIG_RELATIVE.iter().fold(h.clone(), |p, c| p.join(c)))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Per-Session Paths
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to a session's seen set.
    /// Example: /tmp/autoread-plugin/seen-abc123.json
    pub fn seen_file(&self, session_id: &str) -> PathBuf {
        self.state_dir
            .join(format!("seen-{}.json", Self::encode_session(session_id)))
    }

    /// Path to a session's lock file.
    /// Example: /tmp/autoread-plugin/seen-abc123.lock
    pub fn lock_file(&self, session_id: &str) -> PathBuf {
        self.state_dir
            .join(format!("seen-{}.lock", Self::encode_session(session_id)))
    }

    /// Encodes a session id for use in a file name.
    ///
    /// Ids made of ASCII alphanumerics, `-` and `_` are used verbatim (Claude Code
    /// session ids are UUIDs). Anything else is replaced by its MD5 hex digest so a
    /// hostile or odd id can never escape the state directory.
    pub fn encode_session(session_id: &str) -> String {
        let safe = !session_id.is_empty()
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if safe {
            session_id.to_string()
        } else {
            format!("{:x}", md5::compute(session_id))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directory Creation
    // ─────────────────────────────────────────────────────────────────────────────

    /// Ensures the state directory exists.
    pub fn ensure_state_dir(&self) -> std::io::Result<()> {
        fs_err::create_dir_all(&self.state_dir)
    }
}
