//! A* route planner over the landmark graph.
//!
//! The heuristic is the position-index difference times the per-step
//! distance. It is admissible and consistent only because every location's
//! graph is a simple path whose true distance is exactly that product. It
//! must not be reused if the graph ever grows non-adjacent edges.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use super::graph::NavigationGraph;
use crate::store::NodeId;

/// Entry in the open set.
#[derive(Clone, Copy, Debug)]
struct SearchNode {
    node: NodeId,
    f_score: f32,
    /// Push counter, so equal f-scores pop in insertion order
    order: u64,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchNode {}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (lower f_score = higher priority)
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* planner for landmark routes.
#[derive(Clone, Debug)]
pub struct RoutePlanner {
    /// Meters per position index
    step_distance: f32,
}

impl RoutePlanner {
    pub fn new(step_distance: f32) -> Self {
        Self { step_distance }
    }

    /// Plan a route from `start` to `goal`.
    ///
    /// Returns the node ids in start→goal order, or `None` when either node
    /// is unknown or the goal is unreachable.
    pub fn plan(
        &self,
        graph: &NavigationGraph,
        start: NodeId,
        goal: NodeId,
    ) -> Option<Vec<NodeId>> {
        graph.node(start)?;
        graph.node(goal)?;

        let mut open_set = BinaryHeap::new();
        let mut g_score: HashMap<NodeId, f32> = HashMap::new();
        let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();
        let mut closed_set: HashSet<NodeId> = HashSet::new();
        let mut pushes = 0u64;

        g_score.insert(start, 0.0);
        open_set.push(SearchNode {
            node: start,
            f_score: self.heuristic(graph, start, goal),
            order: pushes,
        });

        while let Some(SearchNode { node: current, .. }) = open_set.pop() {
            if current == goal {
                return Some(Self::reconstruct_path(&came_from, current));
            }

            // Stale heap entry
            if !closed_set.insert(current) {
                continue;
            }

            let current_g = *g_score.get(&current).unwrap_or(&f32::INFINITY);

            for &(neighbor, distance) in graph.neighbors(current) {
                if closed_set.contains(&neighbor) {
                    continue;
                }

                let tentative_g = current_g + distance;
                if tentative_g < *g_score.get(&neighbor).unwrap_or(&f32::INFINITY) {
                    came_from.insert(neighbor, current);
                    g_score.insert(neighbor, tentative_g);

                    pushes += 1;
                    open_set.push(SearchNode {
                        node: neighbor,
                        f_score: tentative_g + self.heuristic(graph, neighbor, goal),
                        order: pushes,
                    });
                }
            }
        }

        tracing::debug!("No route from node {} to node {}", start, goal);
        None
    }

    /// Position-index distance in meters.
    #[inline]
    fn heuristic(&self, graph: &NavigationGraph, from: NodeId, to: NodeId) -> f32 {
        match (graph.position(from), graph.position(to)) {
            (Some(a), Some(b)) => a.abs_diff(b) as f32 * self.step_distance,
            _ => 0.0,
        }
    }

    /// Walk the predecessor map back from the goal, then reverse.
    fn reconstruct_path(came_from: &HashMap<NodeId, NodeId>, goal: NodeId) -> Vec<NodeId> {
        let mut path = vec![goal];
        let mut current = goal;
        while let Some(&prev) = came_from.get(&current) {
            path.push(prev);
            current = prev;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GraphData, GraphEdge, GraphNode};
    use proptest::prelude::*;

    fn edge(from: NodeId, to: NodeId, distance: f32) -> GraphEdge {
        GraphEdge { from, to, distance }
    }

    /// Path graph 0..n with node id = 10 + position.
    fn path_graph(n: usize) -> NavigationGraph {
        let nodes = (0..n)
            .map(|i| GraphNode {
                id: 10 + i as NodeId,
                location_id: 1,
                frame_id: 100 + i as NodeId,
                position_index: i,
            })
            .collect();
        let mut edges = Vec::new();
        for i in 1..n as NodeId {
            edges.push(edge(9 + i, 10 + i, 0.7));
            edges.push(edge(10 + i, 9 + i, 0.7));
        }
        NavigationGraph::from_data(GraphData { nodes, edges })
    }

    #[test]
    fn test_forward_route() {
        let graph = path_graph(3);
        let planner = RoutePlanner::new(0.7);
        assert_eq!(planner.plan(&graph, 10, 12), Some(vec![10, 11, 12]));
    }

    #[test]
    fn test_backward_route() {
        let graph = path_graph(5);
        let planner = RoutePlanner::new(0.7);
        assert_eq!(planner.plan(&graph, 14, 11), Some(vec![14, 13, 12, 11]));
    }

    #[test]
    fn test_start_is_goal() {
        let graph = path_graph(3);
        let planner = RoutePlanner::new(0.7);
        assert_eq!(planner.plan(&graph, 11, 11), Some(vec![11]));
    }

    #[test]
    fn test_unknown_nodes() {
        let graph = path_graph(3);
        let planner = RoutePlanner::new(0.7);
        assert_eq!(planner.plan(&graph, 10, 99), None);
        assert_eq!(planner.plan(&graph, 99, 10), None);
    }

    #[test]
    fn test_disconnected_goal() {
        // Two separate segments: 0-1 and 2-3
        let nodes = (0..4)
            .map(|i| GraphNode {
                id: i,
                location_id: 1,
                frame_id: i,
                position_index: i as usize,
            })
            .collect();
        let edges = vec![
            edge(0, 1, 0.7),
            edge(1, 0, 0.7),
            edge(2, 3, 0.7),
            edge(3, 2, 0.7),
        ];
        let graph = NavigationGraph::from_data(GraphData { nodes, edges });
        let planner = RoutePlanner::new(0.7);
        assert_eq!(planner.plan(&graph, 0, 3), None);
    }

    #[test]
    fn test_prefers_cheaper_detour() {
        // 0 -> 2 directly costs 5.0, via 1 costs 1.4
        let nodes = (0..3)
            .map(|i| GraphNode {
                id: i,
                location_id: 1,
                frame_id: i,
                position_index: i as usize,
            })
            .collect();
        let edges = vec![
            edge(0, 2, 5.0),
            edge(0, 1, 0.7),
            edge(1, 2, 0.7),
        ];
        let graph = NavigationGraph::from_data(GraphData { nodes, edges });
        let planner = RoutePlanner::new(0.7);
        assert_eq!(planner.plan(&graph, 0, 2), Some(vec![0, 1, 2]));
    }

    proptest! {
        #[test]
        fn prop_path_graph_routes_are_monotonic(
            (n, start, goal) in (1usize..40).prop_flat_map(|n| (Just(n), 0..n, 0..n))
        ) {
            let graph = path_graph(n);
            let planner = RoutePlanner::new(0.7);
            let path = planner
                .plan(&graph, 10 + start as NodeId, 10 + goal as NodeId)
                .expect("path graph is connected");

            prop_assert_eq!(path.len(), start.abs_diff(goal) + 1);
            prop_assert_eq!(path[0], 10 + start as NodeId);
            prop_assert_eq!(*path.last().unwrap(), 10 + goal as NodeId);

            let positions: Vec<usize> = path
                .iter()
                .map(|&id| graph.position(id).unwrap())
                .collect();
            let ascending = positions.windows(2).all(|w| w[1] == w[0] + 1);
            let descending = positions.windows(2).all(|w| w[0] == w[1] + 1);
            prop_assert!(ascending || descending);
        }
    }
}
