//! In-memory landmark store with optional JSON snapshot persistence.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{
    DEFAULT_STEP_DISTANCE, FrameId, GraphData, GraphEdge, GraphNode, LandmarkFrame, LandmarkStore,
    Location, LocationId, NodeId,
};
use crate::error::{DrishtiError, Result};
use crate::features::DescriptorSet;
use crate::utils::now_us;

/// Everything the store holds, in the form written to disk.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    locations: Vec<Location>,
    frames: Vec<LandmarkFrame>,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    next_location_id: LocationId,
    next_frame_id: FrameId,
    next_node_id: NodeId,
}

impl StoreData {
    fn location_by_name(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.name == name)
    }
}

/// Thread-safe in-memory [`LandmarkStore`].
#[derive(Debug)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
    /// Snapshot file rewritten after every mutation
    path: Option<PathBuf>,
    step_distance: f32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty, purely in-memory store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(StoreData {
                next_location_id: 1,
                next_frame_id: 1,
                next_node_id: 1,
                ..Default::default()
            }),
            path: None,
            step_distance: DEFAULT_STEP_DISTANCE,
        }
    }

    /// Open a store backed by a JSON snapshot, loading it if the file exists.
    pub fn open(path: &Path) -> Result<Self> {
        let mut store = Self::new();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let data: StoreData = serde_json::from_str(&content)?;
            tracing::info!(
                "Loaded landmark store from {:?}: {} locations, {} frames",
                path,
                data.locations.len(),
                data.frames.len()
            );
            store.data = RwLock::new(data);
        } else {
            tracing::info!("Creating new landmark store at {:?}", path);
        }
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Use a different edge weight for newly appended frames.
    pub fn with_step_distance(mut self, step_distance: f32) -> Self {
        self.step_distance = step_distance;
        self
    }

    /// Write the snapshot file, if this store has one.
    fn persist(&self, data: &StoreData) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        // Write-then-rename, readers never see a partial file
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(data)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl LandmarkStore for MemoryStore {
    fn create_location(&self, name: &str) -> Result<LocationId> {
        let mut data = self.data.write();
        if let Some(existing) = data.location_by_name(name) {
            return Ok(existing.id);
        }

        let id = data.next_location_id;
        data.next_location_id += 1;
        data.locations.push(Location {
            id,
            name: name.to_string(),
            created_at_us: now_us(),
        });
        self.persist(&data)?;

        tracing::debug!("Created location {} ({})", name, id);
        Ok(id)
    }

    fn append_frame(
        &self,
        location_id: LocationId,
        sequence_index: usize,
        image_ref: &str,
        descriptors: DescriptorSet,
    ) -> Result<FrameId> {
        let mut data = self.data.write();
        if !data.locations.iter().any(|l| l.id == location_id) {
            return Err(DrishtiError::Store(format!(
                "Unknown location id {}",
                location_id
            )));
        }
        if data
            .nodes
            .iter()
            .any(|n| n.location_id == location_id && n.position_index == sequence_index)
        {
            return Err(DrishtiError::Store(format!(
                "Location {} already has a frame at sequence {}",
                location_id, sequence_index
            )));
        }

        let frame_id = data.next_frame_id;
        data.next_frame_id += 1;
        data.frames.push(LandmarkFrame {
            id: frame_id,
            location_id,
            sequence_index,
            image_ref: image_ref.to_string(),
            descriptors,
            captured_at_us: now_us(),
        });

        let node_id = data.next_node_id;
        data.next_node_id += 1;
        data.nodes.push(GraphNode {
            id: node_id,
            location_id,
            frame_id,
            position_index: sequence_index,
        });

        // Link to the previous landmark in both directions
        let prev = sequence_index.checked_sub(1).and_then(|prev_index| {
            data.nodes
                .iter()
                .find(|n| n.location_id == location_id && n.position_index == prev_index)
                .map(|n| n.id)
        });
        if let Some(prev) = prev {
            let distance = self.step_distance;
            data.edges.push(GraphEdge {
                from: prev,
                to: node_id,
                distance,
            });
            data.edges.push(GraphEdge {
                from: node_id,
                to: prev,
                distance,
            });
        }

        self.persist(&data)?;
        Ok(frame_id)
    }

    fn list_locations(&self) -> Result<Vec<String>> {
        let data = self.data.read();
        let mut locations: Vec<&Location> = data.locations.iter().collect();
        locations.sort_by(|a, b| {
            b.created_at_us
                .cmp(&a.created_at_us)
                .then(b.id.cmp(&a.id))
        });
        Ok(locations.into_iter().map(|l| l.name.clone()).collect())
    }

    fn fetch_frames(&self, location: &str) -> Result<Vec<LandmarkFrame>> {
        let data = self.data.read();
        let Some(loc) = data.location_by_name(location) else {
            return Ok(Vec::new());
        };
        let mut frames: Vec<LandmarkFrame> = data
            .frames
            .iter()
            .filter(|f| f.location_id == loc.id)
            .cloned()
            .collect();
        frames.sort_by_key(|f| f.sequence_index);
        Ok(frames)
    }

    fn fetch_graph(&self, location: &str) -> Result<GraphData> {
        let data = self.data.read();
        let Some(loc) = data.location_by_name(location) else {
            return Ok(GraphData::default());
        };
        let mut nodes: Vec<GraphNode> = data
            .nodes
            .iter()
            .filter(|n| n.location_id == loc.id)
            .copied()
            .collect();
        nodes.sort_by_key(|n| n.position_index);

        let edges = data
            .edges
            .iter()
            .filter(|e| nodes.iter().any(|n| n.id == e.from))
            .copied()
            .collect();

        Ok(GraphData { nodes, edges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Descriptor;

    fn descriptors(n: usize) -> DescriptorSet {
        DescriptorSet::from_descriptors((0..n as u64).map(|i| Descriptor([i, 0, 0, 0])).collect())
    }

    #[test]
    fn test_create_location_is_idempotent() {
        let store = MemoryStore::new();
        let a = store.create_location("kitchen").unwrap();
        let b = store.create_location("kitchen").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.list_locations().unwrap(), vec!["kitchen".to_string()]);
    }

    #[test]
    fn test_list_locations_newest_first() {
        let store = MemoryStore::new();
        store.create_location("kitchen").unwrap();
        store.create_location("bedroom").unwrap();
        store.create_location("porch").unwrap();
        assert_eq!(
            store.list_locations().unwrap(),
            vec!["porch", "bedroom", "kitchen"]
        );
    }

    #[test]
    fn test_append_builds_path_graph() {
        let store = MemoryStore::new();
        let loc = store.create_location("kitchen").unwrap();
        for (seq, count) in [80, 60, 55].into_iter().enumerate() {
            store
                .append_frame(loc, seq, &format!("frames/{}_{}.jpg", loc, seq), descriptors(count))
                .unwrap();
        }

        let frames = store.fetch_frames("kitchen").unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(
            frames.iter().map(|f| f.descriptors.len()).collect::<Vec<_>>(),
            vec![80, 60, 55]
        );

        let graph = store.fetch_graph("kitchen").unwrap();
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 4);
        assert!(graph.edges.iter().all(|e| e.distance == 0.7));
        for edge in &graph.edges {
            let from = graph.nodes.iter().find(|n| n.id == edge.from).unwrap();
            let to = graph.nodes.iter().find(|n| n.id == edge.to).unwrap();
            assert_eq!(from.position_index.abs_diff(to.position_index), 1);
        }
    }

    #[test]
    fn test_graph_is_per_location() {
        let store = MemoryStore::new();
        let a = store.create_location("kitchen").unwrap();
        let b = store.create_location("hall").unwrap();
        store.append_frame(a, 0, "a0", descriptors(60)).unwrap();
        store.append_frame(b, 0, "b0", descriptors(60)).unwrap();
        store.append_frame(a, 1, "a1", descriptors(60)).unwrap();
        store.append_frame(b, 1, "b1", descriptors(60)).unwrap();

        let graph = store.fetch_graph("kitchen").unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 2);
        assert!(graph.nodes.iter().all(|n| n.location_id == a));
    }

    #[test]
    fn test_append_rejects_duplicate_sequence_and_unknown_location() {
        let store = MemoryStore::new();
        let loc = store.create_location("kitchen").unwrap();
        store.append_frame(loc, 0, "f0", descriptors(60)).unwrap();
        assert!(store.append_frame(loc, 0, "f0", descriptors(60)).is_err());
        assert!(store.append_frame(99, 0, "x", descriptors(60)).is_err());
    }

    #[test]
    fn test_unknown_location_queries_are_empty() {
        let store = MemoryStore::new();
        assert!(store.fetch_frames("nowhere").unwrap().is_empty());
        assert_eq!(store.fetch_graph("nowhere").unwrap(), GraphData::default());
    }
}
