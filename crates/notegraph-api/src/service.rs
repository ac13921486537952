//! Note operations that drive the extension hooks.
//!
//! Mutating hooks run as a pipeline over the content before it is written
//! (create, save) or returned (load). Observing events fire after the fact
//! and their outcome never changes the response.

use std::sync::Arc;

use tracing::info;

use notegraph_core::error::AppError;
use notegraph_core::result::AppResult;
use notegraph_notes::note::parse_front_matter;
use notegraph_notes::{FsNoteStore, Note, NoteSummary, SearchHit};
use notegraph_plugin::{MutatingHook, ObservingEvent, PluginManager};

/// Note CRUD and search with hook dispatch.
#[derive(Debug)]
pub struct NoteService {
    store: Arc<FsNoteStore>,
    plugins: Arc<PluginManager>,
}

impl NoteService {
    /// Creates the service.
    pub fn new(store: Arc<FsNoteStore>, plugins: Arc<PluginManager>) -> Self {
        Self { store, plugins }
    }

    /// All notes, sorted by path.
    pub async fn list(&self) -> AppResult<Vec<NoteSummary>> {
        self.store.list().await
    }

    /// Reads a note and passes its content through the `note_load` pipeline.
    /// The transformed content is returned, not persisted.
    pub async fn load(&self, path: &str) -> AppResult<Note> {
        let mut note = self.store.read(path).await?;
        let content = self
            .plugins
            .pipe(MutatingHook::NoteLoad, &note.path, std::mem::take(&mut note.content))
            .await;
        note.front_matter = parse_front_matter(&content);
        note.content = content;
        Ok(note)
    }

    /// Creates a note. Fails with a conflict when one already exists.
    pub async fn create(&self, path: &str, content: String) -> AppResult<Note> {
        let path = self.store.normalize_path(path)?;
        if self.store.exists(&path).await? {
            return Err(AppError::conflict(format!("Note already exists: {path}")));
        }
        let content = self
            .plugins
            .pipe(MutatingHook::NoteCreate, &path, content)
            .await;
        let note = self.store.write(&path, &content).await?;
        info!(path = %note.path, "Note created");
        Ok(note)
    }

    /// Replaces an existing note's content.
    pub async fn save(&self, path: &str, content: String) -> AppResult<Note> {
        let path = self.store.normalize_path(path)?;
        if !self.store.exists(&path).await? {
            return Err(AppError::not_found(format!("Note not found: {path}")));
        }
        let content = self
            .plugins
            .pipe(MutatingHook::NoteSave, &path, content)
            .await;
        self.store.write(&path, &content).await
    }

    /// Deletes a note, then fires `note_delete`.
    pub async fn delete(&self, path: &str) -> AppResult<()> {
        let path = self.store.normalize_path(path)?;
        self.store.delete(&path).await?;
        self.plugins
            .notify(&ObservingEvent::NoteDelete { path: path.clone() })
            .await;
        info!(path = %path, "Note deleted");
        Ok(())
    }

    /// Searches notes, then fires `search` with the matching paths.
    pub async fn search(&self, query: &str) -> AppResult<Vec<SearchHit>> {
        let hits = self.store.search(query).await?;
        self.plugins
            .notify(&ObservingEvent::Search {
                query: query.to_string(),
                results: hits.iter().map(|h| h.path.clone()).collect(),
            })
            .await;
        Ok(hits)
    }
}
