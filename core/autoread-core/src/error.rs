//! Error types for autoread-core operations.
//!
//! Discovery never fails: unreadable candidates are treated as absent.
//! Only the seen-state store reports errors, and of those only lock
//! acquisition failures are expected in normal operation.

/// All errors that can occur in autoread-core operations.
#[derive(Debug, thiserror::Error)]
pub enum AutoreadError {
    // ─────────────────────────────────────────────────────────────────────
    // Lock Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Failed to acquire lock for session {session} after {waited_ms}ms")]
    LockTimeout { session: String, waited_ms: u64 },

    #[error("Lock for session {session} was reclaimed by another process")]
    LockLost { session: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AutoreadError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AutoreadError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        AutoreadError::Json {
            context: context.into(),
            source,
        }
    }

    /// True when the failure is the bounded lock wait running out.
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, AutoreadError::LockTimeout { .. })
    }
}

/// Convenience type alias for Results using AutoreadError.
pub type Result<T> = std::result::Result<T, AutoreadError>;

// Conversion for string error compatibility
impl From<AutoreadError> for String {
    fn from(err: AutoreadError) -> String {
        err.to_string()
    }
}
