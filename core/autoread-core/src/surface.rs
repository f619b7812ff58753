//! Composes discovery with seen-state: which entries should this invocation
//! surface?

use crate::entry::Entry;
use crate::seen::SeenStore;

/// Filters `entries` down to those this invocation is the first to surface,
/// recording each one as seen.
///
/// Entries are checked against the seen set first (no lock needed), then
/// claimed one by one through [`SeenStore::mark_seen`]. An entry a sibling
/// process claimed in between is dropped. When the seen state cannot be
/// updated (lock timeout, write failure) the entry is surfaced anyway.
///
/// Without a session id nothing can be recorded and every entry is returned.
pub fn claim_unseen(store: &SeenStore, session_id: Option<&str>, entries: Vec<Entry>) -> Vec<Entry> {
    let Some(session_id) = session_id else {
        if !entries.is_empty() {
            tracing::warn!(
                count = entries.len(),
                "No session id, surfacing entries without recording them"
            );
        }
        return entries;
    };

    let seen = store.seen_paths(session_id);
    let mut claimed = Vec::new();

    for entry in entries {
        let key = entry.key();
        if seen.contains(&key) {
            continue;
        }
        match store.mark_seen(session_id, &key) {
            Ok(true) => claimed.push(entry),
            Ok(false) => {
                tracing::debug!(session = %session_id, path = %key, "Entry claimed by another invocation");
            }
            Err(e) => {
                tracing::warn!(
                    session = %session_id,
                    path = %key,
                    error = %e,
                    "Could not record seen state, surfacing anyway"
                );
                claimed.push(entry);
            }
        }
    }

    claimed
}
