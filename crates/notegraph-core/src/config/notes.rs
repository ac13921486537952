//! Note storage configuration.

use serde::{Deserialize, Serialize};

/// Where notes live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesConfig {
    /// Root directory of the note tree.
    #[serde(default = "default_notes_dir")]
    pub notes_dir: String,
    /// File extension of note files, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            notes_dir: default_notes_dir(),
            extension: default_extension(),
        }
    }
}

fn default_notes_dir() -> String {
    "./data/notes".to_string()
}

fn default_extension() -> String {
    "md".to_string()
}
