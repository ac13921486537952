//! Wire models of the graph service.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// A note as shown in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Note path.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Number of outbound links.
    pub link_count: usize,
    /// Whether the note is a root or hub.
    pub is_top_level: bool,
    /// Whether expanding the node would reveal anything new.
    pub has_children: bool,
    /// Distance from the level the request started at.
    pub level: u32,
}

/// A directed wiki-link between two shown notes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Linking note.
    pub from: String,
    /// Linked note.
    pub to: String,
}

/// Position of a node in the enhanced view's tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    /// Node that revealed this one, `None` at level 0.
    pub parent: Option<String>,
    /// Level in the view.
    pub level: u32,
    /// Nodes this one revealed.
    pub children: Vec<String>,
}

/// Lifetime the caller intends for an expansion. Does not change the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionKind {
    /// Hover preview, retracted by the caller after focus loss.
    #[default]
    Transient,
    /// Click expansion, kept until explicitly un-pinned.
    Pinned,
}

impl fmt::Display for ExpansionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => f.write_str("transient"),
            Self::Pinned => f.write_str("pinned"),
        }
    }
}

impl FromStr for ExpansionKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transient" => Ok(Self::Transient),
            "pinned" => Ok(Self::Pinned),
            _ => Err(GraphError::InvalidKind(s.to_string())),
        }
    }
}

/// Result of expanding one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expansion {
    /// Session the expansion ran in.
    pub session: String,
    /// Expanded node.
    pub node_id: String,
    /// Requested lifetime.
    pub kind: ExpansionKind,
    /// Depth used.
    pub depth: u32,
    /// Newly revealed nodes, level by level.
    pub nodes: Vec<GraphNode>,
    /// Edges touching the revealed nodes.
    pub edges: Vec<GraphEdge>,
}

/// Top-level view with descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphView {
    /// Session opened for this view.
    pub session: String,
    /// Depth used.
    pub depth: u32,
    /// Top-level nodes first, then descendants level by level.
    pub nodes: Vec<GraphNode>,
    /// Edges between included nodes.
    pub edges: Vec<GraphEdge>,
    /// Tree position of every included node.
    pub hierarchy: BTreeMap<String, HierarchyEntry>,
}
