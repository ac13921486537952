//! Graph sessions and the per-node expansion cache.
//!
//! A session is scoped to one open graph view. It holds a fixed link-graph
//! snapshot and memoizes each node's neighbor set the first time any request
//! needs it. Transient and pinned expansions read the same entries; the
//! expansion chain a caller passes in only filters what is returned.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use notegraph_core::graph::LinkGraphView;

use crate::builder::compute_top_level;
use crate::config::GraphSettings;
use crate::error::GraphError;
use crate::models::{
    Expansion, ExpansionKind, GraphEdge, GraphNode, GraphView, HierarchyEntry,
};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing computed yet.
    Idle,
    /// Top-level nodes are known.
    TopLevelComputed,
    /// At least one node has been expanded.
    Expanded,
}

/// Memoized neighbor set of one node. Immutable once created.
#[derive(Debug, Clone)]
pub struct ExpansionEntry {
    /// Node the entry belongs to.
    pub node_id: String,
    /// Link targets of the node.
    pub outbound: Vec<String>,
    /// Notes linking to the node.
    pub inbound: Vec<String>,
    /// Outbound then inbound, deduplicated, without the node itself.
    pub children: Vec<String>,
    /// When the entry was computed.
    pub fetched_at: DateTime<Utc>,
}

/// Parameters of a node expansion.
#[derive(Debug, Clone, Default)]
pub struct ExpandRequest {
    /// Node to expand.
    pub node_id: String,
    /// Caller-side lifetime of the expansion.
    pub kind: ExpansionKind,
    /// Levels to reveal; the configured default when absent.
    pub depth: Option<u32>,
    /// Nodes already shown at shallower levels of this chain.
    pub ancestors: Vec<String>,
}

struct TopLevel {
    order: Vec<String>,
    members: HashSet<String>,
}

/// One open graph view.
pub struct GraphSession {
    id: Uuid,
    graph: Arc<dyn LinkGraphView>,
    settings: GraphSettings,
    top_level: OnceLock<TopLevel>,
    cache: Cache<String, Arc<ExpansionEntry>>,
    phase: Mutex<SessionPhase>,
    opened_at: DateTime<Utc>,
}

impl std::fmt::Debug for GraphSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphSession")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .field("cached_nodes", &self.cache.entry_count())
            .field("opened_at", &self.opened_at)
            .finish()
    }
}

impl GraphSession {
    /// Opens a session over a graph snapshot.
    pub fn new(graph: Arc<dyn LinkGraphView>, settings: GraphSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            graph,
            settings,
            top_level: OnceLock::new(),
            cache: Cache::builder().build(),
            phase: Mutex::new(SessionPhase::Idle),
            opened_at: Utc::now(),
        }
    }

    /// Session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        *self.phase.lock()
    }

    /// Whether a node's neighbor set has been computed.
    pub fn is_cached(&self, node_id: &str) -> bool {
        self.cache.contains_key(node_id)
    }

    /// Top-level node ids in input order.
    pub fn top_level(&self) -> &[String] {
        &self.top_level_set().order
    }

    fn top_level_set(&self) -> &TopLevel {
        self.top_level.get_or_init(|| {
            let order = compute_top_level(self.graph.as_ref(), self.settings.hub_threshold);
            let members = order.iter().cloned().collect();
            self.advance(SessionPhase::TopLevelComputed);
            debug!(session = %self.id, top_level = order.len(), "Top-level nodes computed");
            TopLevel { order, members }
        })
    }

    fn advance(&self, to: SessionPhase) {
        let mut phase = self.phase.lock();
        let rank = |p: SessionPhase| match p {
            SessionPhase::Idle => 0,
            SessionPhase::TopLevelComputed => 1,
            SessionPhase::Expanded => 2,
        };
        if rank(to) > rank(*phase) {
            *phase = to;
        }
    }

    /// Validates a requested depth against the configured ceiling.
    pub fn resolve_depth(&self, depth: Option<u32>) -> Result<u32, GraphError> {
        self.settings.resolve_depth(depth)
    }

    /// The neighbor entry of a node, computed once per session. Concurrent
    /// callers for the same node wait on a single computation.
    async fn entry(&self, node_id: &str) -> Arc<ExpansionEntry> {
        self.cache
            .get_with_by_ref(node_id, async { Arc::new(self.compute_entry(node_id)) })
            .await
    }

    fn compute_entry(&self, node_id: &str) -> ExpansionEntry {
        let outbound = self.graph.outbound(node_id);
        let inbound = self.graph.inbound(node_id);

        let children = {
            let mut seen = HashSet::new();
            outbound
                .iter()
                .chain(inbound.iter())
                .filter(|n| n.as_str() != node_id && seen.insert(n.as_str()))
                .cloned()
                .collect()
        };

        ExpansionEntry {
            node_id: node_id.to_string(),
            outbound,
            inbound,
            children,
            fetched_at: Utc::now(),
        }
    }

    fn graph_node(
        &self,
        entry: &ExpansionEntry,
        level: u32,
        shallower: &HashSet<String>,
    ) -> GraphNode {
        let label = self
            .graph
            .note(&entry.node_id)
            .map(|n| n.label)
            .unwrap_or_else(|| entry.node_id.clone());
        GraphNode {
            id: entry.node_id.clone(),
            label,
            link_count: entry.outbound.len(),
            is_top_level: self.top_level_set().members.contains(&entry.node_id),
            has_children: entry.children.iter().any(|c| !shallower.contains(c)),
            level,
        }
    }

    /// Reveals the neighbors of a node, breadth first, up to `depth` levels.
    ///
    /// Nodes in `ancestors` and the node itself are never returned. Fails
    /// without touching the cache when the depth or node id is invalid.
    pub async fn expand(&self, request: ExpandRequest) -> Result<Expansion, GraphError> {
        let depth = self.resolve_depth(request.depth)?;
        let node_id = validate_node_id(&request.node_id)?;
        if self.graph.note(&node_id).is_none() {
            return Err(GraphError::UnknownNode(node_id));
        }

        let mut shown: HashSet<String> = request
            .ancestors
            .iter()
            .map(|a| a.trim().trim_start_matches('/').to_string())
            .filter(|a| !a.is_empty())
            .collect();
        shown.insert(node_id.clone());

        let mut nodes = Vec::new();
        let mut revealed = Vec::new();
        let mut frontier = vec![node_id.clone()];
        for level in 1..=depth {
            let shallower = shown.clone();
            let mut next = Vec::new();
            for parent in &frontier {
                for child in &self.entry(parent).await.children {
                    if shown.insert(child.clone()) {
                        next.push(child.clone());
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            for id in &next {
                let entry = self.entry(id).await;
                nodes.push(self.graph_node(&entry, level, &shallower));
                revealed.push(Arc::clone(&entry));
            }
            frontier = next;
        }

        let mut edges = EdgeSet::default();
        for entry in &revealed {
            for target in entry.outbound.iter().filter(|t| shown.contains(*t)) {
                edges.push(&entry.node_id, target);
            }
            for source in entry.inbound.iter().filter(|s| shown.contains(*s)) {
                edges.push(source, &entry.node_id);
            }
        }

        self.advance(SessionPhase::Expanded);
        debug!(
            session = %self.id,
            node = %node_id,
            kind = %request.kind,
            depth,
            revealed = nodes.len(),
            "Node expanded"
        );

        Ok(Expansion {
            session: self.id.to_string(),
            node_id,
            kind: request.kind,
            depth,
            nodes,
            edges: edges.into_vec(),
        })
    }

    /// The top-level nodes (level 0) and their descendants down to level
    /// `depth - 1`, with every edge between included nodes.
    pub async fn top_level_view(&self, depth: Option<u32>) -> Result<GraphView, GraphError> {
        let depth = self.resolve_depth(depth)?;
        let top = self.top_level().to_vec();

        let mut hierarchy: BTreeMap<String, HierarchyEntry> = BTreeMap::new();
        let mut nodes = Vec::new();
        let mut included = Vec::new();
        let mut shown: HashSet<String> = HashSet::new();

        let nothing_shallower = HashSet::new();
        for id in &top {
            let entry = self.entry(id).await;
            nodes.push(self.graph_node(&entry, 0, &nothing_shallower));
            hierarchy.insert(
                id.clone(),
                HierarchyEntry {
                    parent: None,
                    level: 0,
                    children: Vec::new(),
                },
            );
            shown.insert(id.clone());
            included.push(entry);
        }

        let mut frontier = top;
        for level in 1..depth {
            let shallower = shown.clone();
            let mut next = Vec::new();
            for parent in &frontier {
                for child in &self.entry(parent).await.children {
                    if shown.insert(child.clone()) {
                        next.push(child.clone());
                        hierarchy.insert(
                            child.clone(),
                            HierarchyEntry {
                                parent: Some(parent.clone()),
                                level,
                                children: Vec::new(),
                            },
                        );
                        if let Some(p) = hierarchy.get_mut(parent) {
                            p.children.push(child.clone());
                        }
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            for id in &next {
                let entry = self.entry(id).await;
                nodes.push(self.graph_node(&entry, level, &shallower));
                included.push(entry);
            }
            frontier = next;
        }

        let mut edges = EdgeSet::default();
        for entry in &included {
            for target in entry.outbound.iter().filter(|t| shown.contains(*t)) {
                edges.push(&entry.node_id, target);
            }
        }

        debug!(session = %self.id, depth, nodes = nodes.len(), "Top-level view built");
        Ok(GraphView {
            session: self.id.to_string(),
            depth,
            nodes,
            edges: edges.into_vec(),
            hierarchy,
        })
    }
}

#[derive(Default)]
struct EdgeSet {
    seen: HashSet<(String, String)>,
    edges: Vec<GraphEdge>,
}

impl EdgeSet {
    fn push(&mut self, from: &str, to: &str) {
        if self.seen.insert((from.to_string(), to.to_string())) {
            self.edges.push(GraphEdge {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
    }

    fn into_vec(self) -> Vec<GraphEdge> {
        self.edges
    }
}

/// Checks a node id from the wire and strips a leading slash.
pub fn validate_node_id(raw: &str) -> Result<String, GraphError> {
    let id = raw.trim().trim_start_matches('/');
    let malformed = id.is_empty()
        || id.contains('\\')
        || id.split('/').any(|segment| segment.is_empty() || segment == "..");
    if malformed {
        return Err(GraphError::InvalidNodeId(raw.to_string()));
    }
    Ok(id.to_string())
}

/// Live graph sessions, expired after an idle period.
#[derive(Debug, Clone)]
pub struct GraphSessions {
    sessions: Cache<Uuid, Arc<GraphSession>>,
    settings: GraphSettings,
}

impl GraphSessions {
    /// Creates an empty session table.
    pub fn new(settings: GraphSettings) -> Self {
        let sessions = Cache::builder()
            .max_capacity(settings.max_sessions)
            .time_to_idle(Duration::from_secs(settings.session_idle_seconds))
            .build();
        Self { sessions, settings }
    }

    /// Opens a session over a graph snapshot.
    pub async fn open(&self, graph: Arc<dyn LinkGraphView>) -> Arc<GraphSession> {
        let session = Arc::new(GraphSession::new(graph, self.settings.clone()));
        self.sessions.insert(session.id(), Arc::clone(&session)).await;
        debug!(session = %session.id(), "Graph session opened");
        session
    }

    /// Looks up a live session.
    pub async fn get(&self, id: &str) -> Result<Arc<GraphSession>, GraphError> {
        let uuid = parse_session_id(id)?;
        self.sessions
            .get(&uuid)
            .await
            .ok_or_else(|| GraphError::UnknownSession(id.to_string()))
    }

    /// Closes a session. Returns whether it was open.
    pub async fn close(&self, id: &str) -> Result<bool, GraphError> {
        let uuid = parse_session_id(id)?;
        let closed = self.sessions.remove(&uuid).await.is_some();
        if closed {
            debug!(session = %uuid, "Graph session closed");
        }
        Ok(closed)
    }

    /// Number of live sessions.
    pub async fn live_count(&self) -> u64 {
        self.sessions.run_pending_tasks().await;
        self.sessions.entry_count()
    }

    /// Settings applied to new sessions.
    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }
}

fn parse_session_id(id: &str) -> Result<Uuid, GraphError> {
    Uuid::parse_str(id.trim()).map_err(|_| GraphError::InvalidSession(id.to_string()))
}
