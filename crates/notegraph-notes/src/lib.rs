//! # notegraph-notes
//!
//! The note collaborator: plain-text notes with YAML front matter stored on
//! the filesystem, the wiki-link parser, and the [`NoteLinkGraphSource`]
//! that turns the note tree into a link graph for extensions.

pub mod links;
pub mod note;
pub mod source;
pub mod store;

pub use links::parse_wiki_links;
pub use note::{Note, NoteSummary, SearchHit};
pub use source::NoteLinkGraphSource;
pub use store::FsNoteStore;
