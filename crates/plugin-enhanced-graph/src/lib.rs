//! # Plugin Enhanced Graph
//!
//! A NoteGraph extension serving a hierarchical view of the note-link graph.
//! The view starts from top-level notes (roots and hubs) and reveals the
//! rest on demand: a hover previews a node's neighbors transiently, a click
//! pins them. Each open view is a session that computes a node's neighbor
//! set once and serves every later expansion of that node from the cache.
//!
//! Routes, mounted under `/api/plugins/{id}/`:
//!
//! - `GET graph/enhanced?depth=` opens a session and returns the top-level view
//! - `GET graph/node/{*path}?session=&kind=&depth=&chain=` expands one node
//! - `DELETE graph/session/{session}` closes a session

pub mod assets;
pub mod builder;
pub mod config;
pub mod error;
pub mod models;
pub mod plugin;
pub mod session;
pub mod tracker;

pub use builder::compute_top_level;
pub use config::{GraphSettings, HARD_DEPTH_CEILING};
pub use error::GraphError;
pub use models::{Expansion, ExpansionKind, GraphEdge, GraphNode, GraphView, HierarchyEntry};
pub use plugin::{EnhancedGraphPlugin, FACTORY_NAME, factory};
pub use session::{ExpandRequest, ExpansionEntry, GraphSession, GraphSessions, SessionPhase};
pub use tracker::{ExpansionState, ExpansionTracker};
