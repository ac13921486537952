//! Hook kinds, outcomes and faults.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Enumeration of every lifecycle hook an extension can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Fired once per enable transition, including at process start.
    Startup,
    /// Fired before a new note is written. Can replace the content.
    NoteCreate,
    /// Fired before an existing note is overwritten. Can replace the content.
    NoteSave,
    /// Fired after a note is read. Can replace the content returned.
    NoteLoad,
    /// Fired after a note is deleted.
    NoteDelete,
    /// Fired after a search completes.
    Search,
}

impl HookKind {
    /// Every hook kind, in declaration order.
    pub const ALL: [HookKind; 6] = [
        Self::Startup,
        Self::NoteCreate,
        Self::NoteSave,
        Self::NoteLoad,
        Self::NoteDelete,
        Self::Search,
    ];

    /// Wire name of the hook.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::NoteCreate => "note_create",
            Self::NoteSave => "note_save",
            Self::NoteLoad => "note_load",
            Self::NoteDelete => "note_delete",
            Self::Search => "search",
        }
    }

    /// Whether the hook carries a replaceable payload.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::NoteCreate | Self::NoteSave | Self::NoteLoad)
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The hooks whose note content flows through every enabled extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutatingHook {
    /// Content about to be written for a new note.
    NoteCreate,
    /// Content about to overwrite an existing note.
    NoteSave,
    /// Content just read from storage.
    NoteLoad,
}

impl MutatingHook {
    /// The matching [`HookKind`].
    pub fn kind(&self) -> HookKind {
        match self {
            Self::NoteCreate => HookKind::NoteCreate,
            Self::NoteSave => HookKind::NoteSave,
            Self::NoteLoad => HookKind::NoteLoad,
        }
    }
}

/// Read-only events delivered to extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservingEvent {
    /// The extension became active.
    Startup,
    /// A note was deleted.
    NoteDelete {
        /// Path of the deleted note.
        path: String,
    },
    /// A search returned results.
    Search {
        /// The query as typed.
        query: String,
        /// Paths of the matching notes, in result order.
        results: Vec<String>,
    },
}

impl ObservingEvent {
    /// The matching [`HookKind`].
    pub fn kind(&self) -> HookKind {
        match self {
            Self::Startup => HookKind::Startup,
            Self::NoteDelete { .. } => HookKind::NoteDelete,
            Self::Search { .. } => HookKind::Search,
        }
    }
}

/// Result of a mutating hook.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HookOutcome {
    /// Pass the incoming value on untouched.
    #[default]
    Unchanged,
    /// Replace the value for the rest of the pipeline.
    Replaced(String),
}

/// A failure inside one extension's hook. Never surfaces to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookFault {
    /// The hook returned an error.
    #[error("hook failed: {0}")]
    Failed(String),
    /// The hook exceeded its deadline.
    #[error("hook timed out after {0:?}")]
    TimedOut(Duration),
    /// The hook panicked.
    #[error("hook panicked: {0}")]
    Panicked(String),
}

impl HookFault {
    /// Creates a [`HookFault::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
