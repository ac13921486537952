//! Link-graph construction from the note tree.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use notegraph_core::graph::{LinkGraph, NoteRef, note_ref};
use notegraph_core::result::AppResult;
use notegraph_core::traits::LinkGraphSource;

use crate::links::parse_wiki_links;
use crate::store::FsNoteStore;

/// Builds a [`LinkGraph`] from every note in an [`FsNoteStore`].
///
/// The graph is rebuilt on each call; callers that need a stable view hold
/// on to the returned snapshot.
#[derive(Debug, Clone)]
pub struct NoteLinkGraphSource {
    store: Arc<FsNoteStore>,
}

impl NoteLinkGraphSource {
    /// Creates a source over `store`.
    pub fn new(store: Arc<FsNoteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LinkGraphSource for NoteLinkGraphSource {
    async fn link_graph(&self) -> AppResult<Arc<LinkGraph>> {
        let summaries = self.store.list().await?;

        let mut notes = Vec::with_capacity(summaries.len());
        let mut raw_links = Vec::new();
        for summary in summaries {
            let note = match self.store.read(&summary.path).await {
                Ok(note) => note,
                Err(e) => {
                    debug!(path = %summary.path, error = %e, "Skipping unreadable note");
                    continue;
                }
            };
            let targets = parse_wiki_links(note.body());
            let mut node = note_ref(&note.path);
            node.label = note.title().to_string();
            raw_links.push((note.path.clone(), targets));
            notes.push(node);
        }

        let resolver = TargetResolver::new(&notes);
        let mut builder = LinkGraph::builder();
        for note in notes {
            builder.push_note(note);
        }
        let mut edge_count = 0usize;
        for (from, targets) in raw_links {
            for target in targets {
                if let Some(to) = resolver.resolve(&target) {
                    builder.push_link(from.clone(), to.to_string());
                    edge_count += 1;
                }
            }
        }

        let graph = builder.build();
        debug!(notes = graph.len(), links = edge_count, "Link graph built");
        Ok(Arc::new(graph))
    }
}

/// Maps wiki-link targets to note paths.
///
/// A target matches a note by its path without extension (`dir/topic`), by
/// its full path, or by file stem when exactly one note carries that stem.
struct TargetResolver {
    by_path: HashMap<String, String>,
    by_stem: HashMap<String, Option<String>>,
}

impl TargetResolver {
    fn new(notes: &[NoteRef]) -> Self {
        let mut by_path = HashMap::new();
        let mut by_stem: HashMap<String, Option<String>> = HashMap::new();
        for note in notes {
            let key = note
                .path
                .rsplit_once('.')
                .map_or(note.path.as_str(), |(stem, _)| stem)
                .to_lowercase();
            by_path.insert(key, note.path.clone());
            by_path.insert(note.path.to_lowercase(), note.path.clone());

            let stem = note_ref(&note.path).label.to_lowercase();
            by_stem
                .entry(stem)
                .and_modify(|slot| *slot = None)
                .or_insert_with(|| Some(note.path.clone()));
        }
        Self { by_path, by_stem }
    }

    fn resolve(&self, target: &str) -> Option<&str> {
        let key = target.trim().trim_start_matches('/').to_lowercase();
        if let Some(path) = self.by_path.get(&key) {
            return Some(path);
        }
        self.by_stem.get(&key).and_then(|p| p.as_deref())
    }
}
