//! Note models and front-matter handling.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A full note as read from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Path relative to the notes root, including the extension.
    pub path: String,
    /// File stem.
    pub name: String,
    /// Containing folder, `""` for the root.
    pub folder: String,
    /// Parsed YAML front matter (empty when absent or malformed).
    pub front_matter: BTreeMap<String, serde_json::Value>,
    /// Raw file content, front matter included.
    pub content: String,
    /// Last modification time, when the filesystem reports one.
    pub modified: Option<DateTime<Utc>>,
}

impl Note {
    /// Display title: front-matter `title` when present, else the file stem.
    pub fn title(&self) -> &str {
        self.front_matter
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.name)
    }

    /// Note body without the front-matter block.
    pub fn body(&self) -> &str {
        split_front_matter(&self.content).1
    }
}

/// Listing entry for a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSummary {
    /// Path relative to the notes root.
    pub path: String,
    /// File stem.
    pub name: String,
    /// Containing folder.
    pub folder: String,
}

/// One search match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Matching note path.
    pub path: String,
    /// Matching note name.
    pub name: String,
    /// Text around the first match.
    pub snippet: String,
}

/// Splits `content` into its raw YAML front-matter block (without the
/// `---` fences) and the remaining body.
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, content)
}

/// Parses the front matter of `content` into a JSON-compatible map.
pub fn parse_front_matter(content: &str) -> BTreeMap<String, serde_json::Value> {
    let Some(yaml) = split_front_matter(content).0 else {
        return BTreeMap::new();
    };
    match serde_yaml::from_str::<BTreeMap<String, serde_json::Value>>(yaml) {
        Ok(map) => map,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed front matter");
            BTreeMap::new()
        }
    }
}
