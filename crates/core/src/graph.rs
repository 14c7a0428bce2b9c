//! Strongly-typed stage graph for one workflow version.
//!
//! Config payloads arrive as loosely-typed rows; they are parsed once into a
//! [`StageGraph`] which validates structure up front (edges must reference
//! known nodes) so evaluation never has to second-guess the shape.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::severity::Severity;

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// A stage in the graph, keyed by the event type that lands on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    pub node_key: String,
    pub event_type: String,
    pub is_start: bool,
    pub is_terminal: bool,
}

/// A transition between two stages with its timing constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDef {
    pub from_node: String,
    pub to_node: String,
    /// Relative deadline in seconds from the triggering event.
    pub max_latency_sec: Option<i32>,
    /// Time-of-day deadline, e.g. `"09:00"` or `"09:00Z"`. Takes precedence
    /// over `max_latency_sec`.
    pub absolute_deadline: Option<String>,
    /// Optional edges create no expectations and permit side arrivals.
    pub optional: bool,
    /// Number of occurrences expected at `to_node`, at least 1.
    pub expected_count: i32,
    pub severity: Severity,
}

// ---------------------------------------------------------------------------
// StageGraph
// ---------------------------------------------------------------------------

/// Validated stage graph for a single workflow version.
#[derive(Debug, Clone)]
pub struct StageGraph {
    nodes: Vec<NodeDef>,
    edges: Vec<EdgeDef>,
}

impl StageGraph {
    /// Build a graph, rejecting edges that reference unknown node keys.
    ///
    /// `expected_count` values below 1 are normalized to 1.
    pub fn new(nodes: Vec<NodeDef>, mut edges: Vec<EdgeDef>) -> Result<StageGraph, CoreError> {
        for edge in &edges {
            for key in [&edge.from_node, &edge.to_node] {
                if !nodes.iter().any(|n| &n.node_key == key) {
                    return Err(CoreError::Validation(format!(
                        "edge references unknown node '{key}'"
                    )));
                }
            }
        }
        for edge in &mut edges {
            if edge.expected_count < 1 {
                edge.expected_count = 1;
            }
        }
        Ok(StageGraph { nodes, edges })
    }

    /// The node whose event type matches, if any.
    pub fn node_for_event(&self, event_type: &str) -> Option<&NodeDef> {
        self.nodes.iter().find(|n| n.event_type == event_type)
    }

    /// All edges leaving the given node.
    pub fn outgoing_edges<'a>(&'a self, node_key: &'a str) -> impl Iterator<Item = &'a EdgeDef> + 'a {
        self.edges.iter().filter(move |e| e.from_node == node_key)
    }

    /// Whether any inbound edge of the node is optional.
    ///
    /// A node with an optional inbound edge always bypasses order-violation
    /// detection, regardless of which predecessor actually fired.
    pub fn has_optional_inbound(&self, node_key: &str) -> bool {
        self.edges
            .iter()
            .any(|e| e.to_node == node_key && e.optional)
    }

    pub fn nodes(&self) -> &[NodeDef] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeDef] {
        &self.edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn node(key: &str, event_type: &str, is_start: bool) -> NodeDef {
        NodeDef {
            node_key: key.into(),
            event_type: event_type.into(),
            is_start,
            is_terminal: false,
        }
    }

    fn edge(from: &str, to: &str, optional: bool) -> EdgeDef {
        EdgeDef {
            from_node: from.into(),
            to_node: to.into(),
            max_latency_sec: Some(60),
            absolute_deadline: None,
            optional,
            expected_count: 1,
            severity: Severity::Amber,
        }
    }

    #[test]
    fn rejects_edge_to_unknown_node() {
        let nodes = vec![node("ingest", "ORDER_INGEST", true)];
        let edges = vec![edge("ingest", "missing", false)];
        assert_matches!(StageGraph::new(nodes, edges), Err(CoreError::Validation(_)));
    }

    #[test]
    fn finds_node_by_event_type() {
        let graph = StageGraph::new(
            vec![node("ingest", "ORDER_INGEST", true), node("ship", "ORDER_SHIP", false)],
            vec![edge("ingest", "ship", false)],
        )
        .unwrap();
        assert_eq!(graph.node_for_event("ORDER_SHIP").unwrap().node_key, "ship");
        assert!(graph.node_for_event("UNKNOWN").is_none());
        assert_eq!(graph.nodes().len(), 2);
    }

    #[test]
    fn outgoing_edges_filters_by_source() {
        let graph = StageGraph::new(
            vec![
                node("a", "A", true),
                node("b", "B", false),
                node("c", "C", false),
            ],
            vec![edge("a", "b", false), edge("a", "c", true), edge("b", "c", false)],
        )
        .unwrap();
        assert_eq!(graph.outgoing_edges("a").count(), 2);
        assert_eq!(graph.outgoing_edges("c").count(), 0);
    }

    #[test]
    fn optional_inbound_is_structural() {
        let graph = StageGraph::new(
            vec![
                node("a", "A", true),
                node("b", "B", false),
                node("c", "C", false),
            ],
            vec![edge("a", "c", true), edge("b", "c", false)],
        )
        .unwrap();
        assert!(graph.has_optional_inbound("c"));
        assert!(!graph.has_optional_inbound("b"));
    }

    #[test]
    fn expected_count_is_normalized_to_at_least_one() {
        let mut e = edge("a", "b", false);
        e.expected_count = 0;
        let graph = StageGraph::new(
            vec![node("a", "A", true), node("b", "B", false)],
            vec![e],
        )
        .unwrap();
        assert_eq!(graph.edges()[0].expected_count, 1);
    }
}
