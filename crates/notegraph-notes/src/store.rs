//! Filesystem note store.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

use notegraph_core::config::NotesConfig;
use notegraph_core::error::{AppError, ErrorKind};
use notegraph_core::graph::note_ref;
use notegraph_core::result::AppResult;

use crate::note::{Note, NoteSummary, SearchHit, parse_front_matter};

/// Characters of context kept on each side of a search match.
const SNIPPET_RADIUS: usize = 60;

/// Stores notes as plain-text files under a root directory.
#[derive(Debug, Clone)]
pub struct FsNoteStore {
    /// Root directory of the note tree.
    root: PathBuf,
    /// Note file extension, without the dot.
    extension: String,
}

impl FsNoteStore {
    /// Creates a store from configuration.
    pub fn new(config: &NotesConfig) -> Self {
        Self::with_root(&config.notes_dir, &config.extension)
    }

    /// Creates a store rooted at `root` for files ending in `.{extension}`.
    pub fn with_root(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Root directory of the note tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory if needed.
    pub async fn ensure_root(&self) -> AppResult<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create notes root: {}", self.root.display()),
                e,
            )
        })
    }

    /// Validates a caller-supplied note path and appends the extension when
    /// missing. Rejects empty, absolute and parent-escaping paths.
    pub fn normalize_path(&self, path: &str) -> AppResult<String> {
        let trimmed = path.trim().trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(AppError::validation("Note path must not be empty"));
        }
        if trimmed.contains('\\')
            || trimmed
                .split('/')
                .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(AppError::validation(format!("Invalid note path: {path}")));
        }

        let suffix = format!(".{}", self.extension);
        if trimmed.ends_with(&suffix) {
            Ok(trimmed.to_string())
        } else {
            Ok(format!("{trimmed}{suffix}"))
        }
    }

    /// Lists every note, sorted by path.
    pub async fn list(&self) -> AppResult<Vec<NoteSummary>> {
        let root = self.root.clone();
        let extension = self.extension.clone();

        let mut paths = tokio::task::spawn_blocking(move || collect_note_paths(&root, &extension))
            .await
            .map_err(|e| AppError::internal(format!("Note listing task failed: {e}")))?;
        paths.sort();

        Ok(paths
            .iter()
            .map(|path| {
                let r = note_ref(path);
                NoteSummary {
                    path: r.path,
                    name: r.label,
                    folder: r.folder,
                }
            })
            .collect())
    }

    /// Whether a note exists at `path`.
    pub async fn exists(&self, path: &str) -> AppResult<bool> {
        let path = self.normalize_path(path)?;
        Ok(fs::try_exists(self.resolve(&path)).await.unwrap_or(false))
    }

    /// Reads a note.
    pub async fn read(&self, path: &str) -> AppResult<Note> {
        let path = self.normalize_path(path)?;
        let full_path = self.resolve(&path);

        let content = fs::read_to_string(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Note not found: {path}"))
            } else {
                AppError::with_source(ErrorKind::Storage, format!("Failed to read note: {path}"), e)
            }
        })?;
        let modified = fs::metadata(&full_path)
            .await
            .ok()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Utc>::from);

        Ok(build_note(path, content, modified))
    }

    /// Writes (creates or replaces) a note and returns it as stored.
    pub async fn write(&self, path: &str, content: &str) -> AppResult<Note> {
        let path = self.normalize_path(path)?;
        let full_path = self.resolve(&path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        fs::write(&full_path, content).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to write note: {path}"), e)
        })?;

        debug!(path = %path, bytes = content.len(), "Note written");
        Ok(build_note(path, content.to_string(), Some(Utc::now())))
    }

    /// Deletes a note.
    pub async fn delete(&self, path: &str) -> AppResult<()> {
        let path = self.normalize_path(path)?;
        fs::remove_file(self.resolve(&path)).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Note not found: {path}"))
            } else {
                AppError::with_source(ErrorKind::Storage, format!("Failed to delete note: {path}"), e)
            }
        })?;
        debug!(path = %path, "Note deleted");
        Ok(())
    }

    /// Case-insensitive substring search over note names and content.
    pub async fn search(&self, query: &str) -> AppResult<Vec<SearchHit>> {
        let needle = query.trim();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let matcher = RegexBuilder::new(&regex::escape(needle))
            .case_insensitive(true)
            .build()
            .map_err(|e| AppError::validation(format!("Unusable search query: {e}")))?;

        let mut hits = Vec::new();
        for summary in self.list().await? {
            let note = match self.read(&summary.path).await {
                Ok(note) => note,
                Err(e) => {
                    debug!(path = %summary.path, error = %e, "Skipping unreadable note");
                    continue;
                }
            };
            if let Some(found) = matcher.find(&note.content) {
                hits.push(SearchHit {
                    path: note.path.clone(),
                    name: note.name.clone(),
                    snippet: snippet(&note.content, found.start(), found.end()),
                });
            } else if matcher.is_match(&note.name) {
                hits.push(SearchHit {
                    path: note.path.clone(),
                    name: note.name.clone(),
                    snippet: String::new(),
                });
            }
        }
        Ok(hits)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

fn build_note(path: String, content: String, modified: Option<DateTime<Utc>>) -> Note {
    let r = note_ref(&path);
    Note {
        front_matter: parse_front_matter(&content),
        path: r.path,
        name: r.label,
        folder: r.folder,
        content,
        modified,
    }
}

fn collect_note_paths(root: &Path, extension: &str) -> Vec<String> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == extension))
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            Some(parts.join("/"))
        })
        .collect()
}

/// Cuts a snippet around the match `start..end`, widened to char boundaries.
fn snippet(content: &str, start: usize, end: usize) -> String {
    let mut from = start.saturating_sub(SNIPPET_RADIUS);
    while !content.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + SNIPPET_RADIUS).min(content.len());
    while !content.is_char_boundary(to) {
        to += 1;
    }
    content[from..to].replace('\n', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> FsNoteStore {
        FsNoteStore::with_root(dir.path(), "md")
    }

    #[test]
    fn test_normalize_path() {
        let s = FsNoteStore::with_root("/tmp/notes", "md");
        assert_eq!(s.normalize_path("alpha").unwrap(), "alpha.md");
        assert_eq!(s.normalize_path("/dir/beta.md").unwrap(), "dir/beta.md");
        assert!(s.normalize_path("").is_err());
        assert!(s.normalize_path("../etc/passwd").is_err());
        assert!(s.normalize_path("a//b").is_err());
    }

    #[tokio::test]
    async fn test_write_read_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);

        s.write("projects/alpha", "---\ntitle: Alpha\n---\nLinks to [[beta]]")
            .await
            .unwrap();
        s.write("beta", "Beta body").await.unwrap();

        let note = s.read("projects/alpha.md").await.unwrap();
        assert_eq!(note.folder, "projects");
        assert_eq!(note.title(), "Alpha");
        assert_eq!(note.body(), "Links to [[beta]]");

        let listed: Vec<String> = s.list().await.unwrap().into_iter().map(|n| n.path).collect();
        assert_eq!(listed, vec!["beta.md", "projects/alpha.md"]);

        s.delete("beta").await.unwrap();
        assert!(!s.exists("beta").await.unwrap());
        assert!(s.read("beta").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_search_matches_content_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        s.write("one", "Nothing here").await.unwrap();
        s.write("two", "The Graph view is great").await.unwrap();

        let hits = s.search("graph").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "two.md");
        assert!(hits[0].snippet.contains("Graph"));
        assert!(s.search("   ").await.unwrap().is_empty());
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let text = "ééééé match ééééé";
        let pos = text.find("match").unwrap();
        assert!(snippet(text, pos, pos + 5).contains("match"));
    }

    #[tokio::test]
    async fn test_snippet_centred_when_case_folding_changes_length() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        let content = format!("{} needle {}", "İ".repeat(40), "x".repeat(200));
        s.write("folded", &content).await.unwrap();

        let hits = s.search("NEEDLE").await.unwrap();
        assert_eq!(hits.len(), 1);
        let snippet = &hits[0].snippet;
        let at = snippet.find("needle").unwrap();
        // The window ends exactly one radius past the match.
        assert_eq!(snippet.len() - at, "needle".len() + SNIPPET_RADIUS);
    }
}
