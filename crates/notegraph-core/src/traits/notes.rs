//! Note collaborator traits consumed by the extension runtime.

use std::sync::Arc;

use async_trait::async_trait;

use crate::graph::LinkGraph;
use crate::result::AppResult;

/// Produces a fresh link-graph snapshot of the note collection.
///
/// Implemented by the note storage layer; consumed by extensions that need
/// the link graph (the hierarchical graph view in particular).
#[async_trait]
pub trait LinkGraphSource: Send + Sync + std::fmt::Debug {
    /// Builds the current link graph.
    async fn link_graph(&self) -> AppResult<Arc<LinkGraph>>;
}

/// A fixed graph, useful for wiring and tests.
#[derive(Debug, Clone)]
pub struct StaticLinkGraph(pub Arc<LinkGraph>);

#[async_trait]
impl LinkGraphSource for StaticLinkGraph {
    async fn link_graph(&self) -> AppResult<Arc<LinkGraph>> {
        Ok(Arc::clone(&self.0))
    }
}
