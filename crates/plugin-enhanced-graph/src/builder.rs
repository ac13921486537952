//! Top-level node selection.

use notegraph_core::graph::LinkGraphView;

/// Selects the entry points of the hierarchical view, in input order.
///
/// A note is top-level when nothing links to it (a root) or when its
/// combined in+out degree reaches `hub_threshold` (a hub). A graph made only
/// of a short cycle therefore has no top-level nodes at all.
pub fn compute_top_level(graph: &dyn LinkGraphView, hub_threshold: usize) -> Vec<String> {
    graph
        .notes()
        .into_iter()
        .filter(|note| {
            let inbound = graph.inbound(&note.path).len();
            let outbound = graph.outbound(&note.path).len();
            inbound == 0 || inbound + outbound >= hub_threshold
        })
        .map(|note| note.path)
        .collect()
}
