//! Route planning over the landmark graph.
//!
//! This module provides:
//! - Navigation graph with O(1) node lookup and adjacency iteration
//! - A* route planner with a position-index heuristic

mod astar;
mod graph;

pub use astar::RoutePlanner;
pub use graph::NavigationGraph;
