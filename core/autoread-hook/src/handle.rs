//! Event handler for Claude Code hooks.
//!
//! Reads one hook event as JSON from stdin, locates autoread entries for the
//! relevant directory and prints the ones this session has not seen yet as
//! additional context.
//!
//! ## Start Directory
//!
//! ```text
//! PreToolUse/PostToolUse  → parent of tool_input.file_path
//! SessionStart            → cwd
//! UserPromptSubmit        → cwd
//! anything else           → nothing to do
//! ```
//!
//! With nothing new to surface the output is `{}`, which lets the tool call
//! proceed untouched.

use std::collections::HashSet;
use std::env;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use autoread_core::{claim_unseen, locate_entries, Entry, SeenStore, StorageConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::render_entry;

/// Set to `1` to turn the hook into a no-op.
const DISABLE_ENV: &str = "AUTOREAD_DISABLE";

#[derive(Error, Debug)]
pub enum HookError {
    #[error("Failed to read stdin: {0}")]
    Stdin(#[source] io::Error),

    #[error("Failed to parse hook input: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Failed to write hook output: {0}")]
    Output(#[source] io::Error),
}

#[derive(Debug, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub hook_event_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<ToolInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ToolInput {
    #[serde(default)]
    pub file_path: Option<String>,
}

#[derive(Debug, PartialEq)]
enum HookEvent {
    SessionStart,
    UserPromptSubmit,
    PreToolUse,
    PostToolUse,
    Unknown { event_name: String },
}

impl HookInput {
    fn to_event(&self) -> Option<HookEvent> {
        let name = self.hook_event_name.as_deref()?;
        Some(match name {
            "SessionStart" => HookEvent::SessionStart,
            "UserPromptSubmit" => HookEvent::UserPromptSubmit,
            "PreToolUse" => HookEvent::PreToolUse,
            "PostToolUse" => HookEvent::PostToolUse,
            other => HookEvent::Unknown {
                event_name: other.to_string(),
            },
        })
    }

    /// Directory discovery should start from, if the event has one.
    fn start_dir(&self, event: &HookEvent) -> Option<PathBuf> {
        match event {
            HookEvent::PreToolUse | HookEvent::PostToolUse => {
                let file_path = self.tool_input.as_ref()?.file_path.as_deref()?;
                if file_path.trim().is_empty() {
                    return None;
                }
                let file_path = Path::new(file_path);
                let absolute = match (file_path.is_absolute(), self.cwd.as_deref()) {
                    (false, Some(cwd)) => Path::new(cwd).join(file_path),
                    _ => file_path.to_path_buf(),
                };
                absolute.parent().map(Path::to_path_buf)
            }
            HookEvent::SessionStart | HookEvent::UserPromptSubmit => self
                .cwd
                .as_deref()
                .filter(|cwd| !cwd.trim().is_empty())
                .map(PathBuf::from),
            HookEvent::Unknown { event_name } => {
                tracing::debug!(event_name = %event_name, "Unhandled event");
                None
            }
        }
    }
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct HookOutput {
    #[serde(rename = "hookSpecificOutput", skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub hook_event_name: String,
    pub additional_context: String,
}

pub fn run() -> Result<(), HookError> {
    // Disabled: drain stdin and approve silently
    if env::var(DISABLE_ENV).map(|v| v == "1").unwrap_or(false) {
        let _ = io::stdin().read_to_end(&mut Vec::new());
        return write_output(&HookOutput::default());
    }

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(HookError::Stdin)?;

    if input.trim().is_empty() {
        return write_output(&HookOutput::default());
    }

    let hook_input: HookInput = serde_json::from_str(&input).map_err(HookError::Parse)?;
    let output = handle_hook_input(&hook_input, &StorageConfig::from_env());
    write_output(&output)
}

fn write_output(output: &HookOutput) -> Result<(), HookError> {
    let payload = serde_json::to_string(output)
        .map_err(|e| HookError::Output(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", payload).map_err(HookError::Output)?;
    stdout.flush().map_err(HookError::Output)
}

pub fn handle_hook_input(hook_input: &HookInput, storage: &StorageConfig) -> HookOutput {
    let Some(event) = hook_input.to_event() else {
        return HookOutput::default();
    };
    let Some(start_dir) = hook_input.start_dir(&event) else {
        return HookOutput::default();
    };
    let event_name = hook_input.hook_event_name.clone().unwrap_or_default();
    let session_id = hook_input.session_id.as_deref();

    let entries = locate_entries(&start_dir, storage);
    tracing::debug!(
        event = %event_name,
        dir = %start_dir.display(),
        found = entries.len(),
        "Located autoread entries"
    );

    let store = SeenStore::new(storage.clone());
    let blocks = surface(&store, session_id, entries);
    if blocks.is_empty() {
        return HookOutput::default();
    }

    tracing::info!(
        event = %event_name,
        session = %session_id.unwrap_or("-"),
        count = blocks.len(),
        "Surfacing autoread context"
    );
    HookOutput {
        hook_specific_output: Some(HookSpecificOutput {
            hook_event_name: event_name,
            additional_context: blocks.join("\n\n"),
        }),
    }
}

/// Renders unseen entries and claims them. Entries that cannot be rendered
/// are never claimed, so an unreadable file does not get marked as shown.
fn surface(store: &SeenStore, session_id: Option<&str>, entries: Vec<Entry>) -> Vec<String> {
    let seen = session_id
        .map(|id| store.seen_paths(id))
        .unwrap_or_default();

    let rendered: Vec<(Entry, String)> = entries
        .into_iter()
        .filter(|e| !seen.contains(&e.key()))
        .filter_map(|e| render_entry(&e).map(|text| (e, text)))
        .collect();

    let candidates = rendered.iter().map(|(e, _)| e.clone()).collect();
    let claimed: HashSet<String> = claim_unseen(store, session_id, candidates)
        .iter()
        .map(Entry::key)
        .collect();

    rendered
        .into_iter()
        .filter(|(e, _)| claimed.contains(&e.key()))
        .map(|(_, text)| text)
        .collect()
}
