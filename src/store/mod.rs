//! Landmark store: mapped locations, their landmark frames and the derived
//! navigation graph.
//!
//! The engine only relies on the [`LandmarkStore`] contract. [`MemoryStore`]
//! is the bundled implementation; it can mirror itself to a JSON snapshot.

mod memory;

pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::features::DescriptorSet;

pub type LocationId = u64;
pub type FrameId = u64;
pub type NodeId = u64;

/// Distance in meters between consecutive landmarks.
///
/// Walking at 1.4 m/s with a capture every 0.5 s.
pub const DEFAULT_STEP_DISTANCE: f32 = 0.7;

/// A mapped route, identified by its unique name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub created_at_us: u64,
}

/// One accepted capture along a mapped route. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub id: FrameId,
    pub location_id: LocationId,
    /// 0-based, contiguous within a location
    pub sequence_index: usize,
    pub image_ref: String,
    pub descriptors: DescriptorSet,
    pub captured_at_us: u64,
}

/// Graph node, one per landmark frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub location_id: LocationId,
    pub frame_id: FrameId,
    /// Mirrors the frame's sequence index
    pub position_index: usize,
}

/// Directed, weighted edge between two nodes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub distance: f32,
}

/// Graph query result for one location.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    /// Ordered by position index
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Read/write contract of the landmark store.
pub trait LandmarkStore: Send + Sync {
    /// Create a location, or return the id of the existing one with that name.
    fn create_location(&self, name: &str) -> Result<LocationId>;

    /// Store the next landmark frame of a location.
    ///
    /// Also creates its graph node and a bidirectional edge to the node at
    /// `sequence_index - 1` when that node exists.
    fn append_frame(
        &self,
        location_id: LocationId,
        sequence_index: usize,
        image_ref: &str,
        descriptors: DescriptorSet,
    ) -> Result<FrameId>;

    /// Location names, newest first.
    fn list_locations(&self) -> Result<Vec<String>>;

    /// Frames of a location ordered by sequence index. Empty when unknown.
    fn fetch_frames(&self, location: &str) -> Result<Vec<LandmarkFrame>>;

    /// Nodes and edges of a location. Empty when unknown.
    fn fetch_graph(&self, location: &str) -> Result<GraphData>;
}
