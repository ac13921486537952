//! Request DTOs.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/notes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    /// Path relative to the notes root.
    pub path: String,
    /// Initial content.
    #[serde(default)]
    pub content: String,
}

/// Body of `PUT /api/notes/{*path}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveNoteRequest {
    /// New content.
    pub content: String,
}

/// Body of `POST /api/plugins/{id}/toggle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleRequest {
    /// Desired state.
    pub enabled: bool,
}

/// Query of `GET /api/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Search text.
    #[serde(default)]
    pub q: String,
}
