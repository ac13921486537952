//! The note-link graph shared between the note collaborator and extensions.
//!
//! A [`LinkGraph`] is an immutable snapshot: notes in stable input order and
//! the directed wiki-link edges between them. Extensions never read it
//! directly; they go through [`LinkGraphView`] so that alternative sources
//! (and instrumented views in tests) can stand in for it.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Identity of one note inside the link graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRef {
    /// Note path relative to the notes root, e.g. `projects/alpha.md`.
    pub path: String,
    /// Display label (file stem or front-matter title).
    pub label: String,
    /// Containing folder, `""` for the root.
    pub folder: String,
}

/// Read access to a link graph.
pub trait LinkGraphView: Send + Sync {
    /// All notes in stable input order.
    fn notes(&self) -> Vec<NoteRef>;

    /// Looks up a note by path.
    fn note(&self, path: &str) -> Option<NoteRef>;

    /// Targets of the note's outbound links, in link order.
    fn outbound(&self, path: &str) -> Vec<String>;

    /// Sources of links pointing at the note, in input order.
    fn inbound(&self, path: &str) -> Vec<String>;
}

/// Immutable directed link graph over notes.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    notes: Vec<NoteRef>,
    index: HashMap<String, usize>,
    outbound: Vec<Vec<String>>,
    inbound: Vec<Vec<String>>,
}

impl LinkGraph {
    /// Starts building a graph.
    pub fn builder() -> LinkGraphBuilder {
        LinkGraphBuilder::default()
    }

    /// Number of notes.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Whether the graph has no notes.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// All edges as `(from, to)` pairs, grouped by source in note order.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.notes
            .iter()
            .zip(&self.outbound)
            .flat_map(|(note, targets)| {
                targets
                    .iter()
                    .map(move |target| (note.path.clone(), target.clone()))
            })
            .collect()
    }
}

impl LinkGraphView for LinkGraph {
    fn notes(&self) -> Vec<NoteRef> {
        self.notes.clone()
    }

    fn note(&self, path: &str) -> Option<NoteRef> {
        self.index.get(path).map(|&i| self.notes[i].clone())
    }

    fn outbound(&self, path: &str) -> Vec<String> {
        self.index
            .get(path)
            .map(|&i| self.outbound[i].clone())
            .unwrap_or_default()
    }

    fn inbound(&self, path: &str) -> Vec<String> {
        self.index
            .get(path)
            .map(|&i| self.inbound[i].clone())
            .unwrap_or_default()
    }
}

/// Accumulates notes and raw links, then resolves them into a [`LinkGraph`].
///
/// Links may be added before their target note; dangling links, self links
/// and duplicate links are dropped at [`LinkGraphBuilder::build`].
#[derive(Debug, Default)]
pub struct LinkGraphBuilder {
    notes: Vec<NoteRef>,
    links: Vec<(String, String)>,
}

impl LinkGraphBuilder {
    /// Adds a note. A second note with the same path is ignored.
    pub fn note(mut self, note: NoteRef) -> Self {
        self.push_note(note);
        self
    }

    /// Adds a directed link.
    pub fn link(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.push_link(from, to);
        self
    }

    /// Adds a note in place.
    pub fn push_note(&mut self, note: NoteRef) {
        self.notes.push(note);
    }

    /// Adds a directed link in place.
    pub fn push_link(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.links.push((from.into(), to.into()));
    }

    /// Resolves the accumulated notes and links.
    pub fn build(self) -> LinkGraph {
        let mut notes = Vec::with_capacity(self.notes.len());
        let mut index = HashMap::with_capacity(self.notes.len());
        for note in self.notes {
            if index.contains_key(&note.path) {
                continue;
            }
            index.insert(note.path.clone(), notes.len());
            notes.push(note);
        }

        let mut outbound = vec![Vec::new(); notes.len()];
        let mut inbound = vec![Vec::new(); notes.len()];
        let mut seen = HashSet::new();
        for (from, to) in self.links {
            if from == to {
                continue;
            }
            let (Some(&src), Some(&dst)) = (index.get(&from), index.get(&to)) else {
                continue;
            };
            if !seen.insert((src, dst)) {
                continue;
            }
            outbound[src].push(to);
            inbound[dst].push(from);
        }

        // Inbound lists follow note input order, not link discovery order.
        for sources in &mut inbound {
            sources.sort_by_key(|path| index[path]);
        }

        LinkGraph {
            notes,
            index,
            outbound,
            inbound,
        }
    }
}

/// Convenience constructor for a [`NoteRef`] whose label is its file stem.
pub fn note_ref(path: &str) -> NoteRef {
    let trimmed = path.trim_start_matches('/');
    let (folder, file) = match trimmed.rfind('/') {
        Some(i) => (&trimmed[..i], &trimmed[i + 1..]),
        None => ("", trimmed),
    };
    let label = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    NoteRef {
        path: trimmed.to_string(),
        label: label.to_string(),
        folder: folder.to_string(),
    }
}
