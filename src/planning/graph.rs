//! In-memory navigation graph of one location.

use std::collections::HashMap;

use crate::store::{FrameId, GraphData, GraphNode, NodeId};

/// Nodes and weighted adjacency of a mapped route.
#[derive(Clone, Debug, Default)]
pub struct NavigationGraph {
    nodes: HashMap<NodeId, GraphNode>,
    adjacency: HashMap<NodeId, Vec<(NodeId, f32)>>,
    by_frame: HashMap<FrameId, NodeId>,
    /// Node with the highest position index
    terminal: Option<NodeId>,
}

impl NavigationGraph {
    /// Build from a store graph query. Edges touching unknown nodes are dropped.
    pub fn from_data(data: GraphData) -> Self {
        let mut graph = Self::default();

        for node in data.nodes {
            graph.by_frame.insert(node.frame_id, node.id);
            graph.adjacency.entry(node.id).or_default();
            let is_terminal = graph
                .terminal
                .and_then(|t| graph.nodes.get(&t))
                .is_none_or(|t| node.position_index > t.position_index);
            if is_terminal {
                graph.terminal = Some(node.id);
            }
            graph.nodes.insert(node.id, node);
        }

        for edge in data.edges {
            if !graph.nodes.contains_key(&edge.from) || !graph.nodes.contains_key(&edge.to) {
                tracing::warn!(
                    "Dropping edge {} -> {}: endpoint not in graph",
                    edge.from,
                    edge.to
                );
                continue;
            }
            if edge.distance < 0.0 {
                tracing::warn!(
                    "Dropping edge {} -> {}: negative distance {}",
                    edge.from,
                    edge.to,
                    edge.distance
                );
                continue;
            }
            graph
                .adjacency
                .entry(edge.from)
                .or_default()
                .push((edge.to, edge.distance));
        }

        graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.nodes.get(&id).map(|n| n.position_index)
    }

    /// Outgoing edges of a node as (neighbor, distance).
    pub fn neighbors(&self, id: NodeId) -> &[(NodeId, f32)] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Node created for a landmark frame.
    pub fn node_for_frame(&self, frame_id: FrameId) -> Option<NodeId> {
        self.by_frame.get(&frame_id).copied()
    }

    /// End of the route: the node with the highest position index.
    pub fn terminal_node(&self) -> Option<NodeId> {
        self.terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::GraphEdge;

    fn edge(from: NodeId, to: NodeId, distance: f32) -> GraphEdge {
        GraphEdge { from, to, distance }
    }

    fn node(id: NodeId, position_index: usize) -> GraphNode {
        GraphNode {
            id,
            location_id: 1,
            frame_id: id + 100,
            position_index,
        }
    }

    #[test]
    fn test_lookups() {
        let graph = NavigationGraph::from_data(GraphData {
            nodes: vec![node(7, 0), node(8, 1), node(9, 2)],
            edges: vec![
                edge(7, 8, 0.7),
                edge(8, 7, 0.7),
                edge(8, 9, 0.7),
                edge(9, 8, 0.7),
            ],
        });

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.position(9), Some(2));
        assert_eq!(graph.node_for_frame(108), Some(8));
        assert_eq!(graph.terminal_node(), Some(9));
        assert_eq!(graph.neighbors(8).len(), 2);
        assert!(graph.neighbors(42).is_empty());
    }

    #[test]
    fn test_terminal_ignores_node_order() {
        let graph = NavigationGraph::from_data(GraphData {
            nodes: vec![node(3, 2), node(1, 0), node(2, 1)],
            edges: vec![],
        });
        assert_eq!(graph.terminal_node(), Some(3));
    }

    #[test]
    fn test_drops_dangling_edges() {
        let graph = NavigationGraph::from_data(GraphData {
            nodes: vec![node(1, 0)],
            edges: vec![edge(1, 2, 0.7)],
        });
        assert!(graph.neighbors(1).is_empty());
    }

    #[test]
    fn test_empty_graph() {
        let graph = NavigationGraph::from_data(GraphData::default());
        assert!(graph.is_empty());
        assert_eq!(graph.terminal_node(), None);
    }
}
