//! End-to-end scenarios on a three-landmark "kitchen" route.
//!
//! These run the engine pieces synchronously (no background threads):
//! store writes, graph construction, planning and the session state machine.

use std::sync::Arc;

use drishti_nav::config::{LocalizationConfig, NavigationConfig};
use drishti_nav::features::{Descriptor, DescriptorSet};
use drishti_nav::planning::{NavigationGraph, RoutePlanner};
use drishti_nav::session::{ARRIVAL_MESSAGE, NavigationSession, SessionEvent};
use drishti_nav::store::{LandmarkStore, MemoryStore};
use drishti_nav::testing::distinct_descriptors;
use drishti_nav::Localizer;

use approx::assert_relative_eq;

fn kitchen_views() -> Vec<Vec<Descriptor>> {
    [80, 60, 55]
        .iter()
        .enumerate()
        .map(|(i, &n)| distinct_descriptors(500 + i as u64, n))
        .collect()
}

fn map_kitchen(store: &MemoryStore, views: &[Vec<Descriptor>]) {
    let location = store.create_location("kitchen").unwrap();
    for (seq, view) in views.iter().enumerate() {
        store
            .append_frame(
                location,
                seq,
                &format!("data/saved_frames/{}_{}.jpg", location, seq),
                DescriptorSet::from_descriptors(view.clone()),
            )
            .unwrap();
    }
}

#[test]
fn test_mapping_builds_path_graph() {
    let store = MemoryStore::new();
    map_kitchen(&store, &kitchen_views());

    let frames = store.fetch_frames("kitchen").unwrap();
    assert_eq!(frames.len(), 3);
    let counts: Vec<usize> = frames.iter().map(|f| f.descriptors.len()).collect();
    assert_eq!(counts, vec![80, 60, 55]);

    let graph = store.fetch_graph("kitchen").unwrap();
    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.edges.len(), 4);
    for edge in &graph.edges {
        assert_relative_eq!(edge.distance, 0.7);
        let from = graph.nodes.iter().find(|n| n.id == edge.from).unwrap();
        let to = graph.nodes.iter().find(|n| n.id == edge.to).unwrap();
        assert_eq!(from.position_index.abs_diff(to.position_index), 1);
    }
    // Every edge has its reverse
    for edge in &graph.edges {
        assert!(
            graph
                .edges
                .iter()
                .any(|e| e.from == edge.to && e.to == edge.from)
        );
    }
}

#[test]
fn test_navigation_reaches_terminal_after_two_instructions() {
    let store = Arc::new(MemoryStore::new());
    let views = kitchen_views();
    map_kitchen(&store, &views);

    let data = store.fetch_graph("kitchen").unwrap();
    let nodes: Vec<u64> = data.nodes.iter().map(|n| n.id).collect();
    let graph = NavigationGraph::from_data(data);

    // Planner alone: node0 -> terminal
    let planner = RoutePlanner::new(0.7);
    let terminal = graph.terminal_node().unwrap();
    assert_eq!(terminal, nodes[2]);
    assert_eq!(planner.plan(&graph, nodes[0], terminal), Some(nodes.clone()));

    let localizer = Localizer::new(LocalizationConfig::default(), store.clone());
    let mut session = NavigationSession::new(
        "kitchen",
        graph,
        None,
        localizer,
        NavigationConfig::default(),
    );

    let live = DescriptorSet::from_descriptors(views[0].clone());
    let events = session.localization_tick(Some(&live));
    assert!(events.contains(&SessionEvent::RoutePlanned {
        path: nodes.clone()
    }));

    session.instruction_tick();
    assert!(!session.has_arrived());
    let events = session.instruction_tick();
    assert!(session.has_arrived());
    assert!(events.contains(&SessionEvent::Instruction {
        text: "Destination reached".into(),
        step: 2,
        path_len: 3,
    }));
    assert!(events.contains(&SessionEvent::Speak(ARRIVAL_MESSAGE.into())));
}

#[test]
fn test_lowering_other_scores_keeps_best_frame() {
    let store = Arc::new(MemoryStore::new());
    let live = distinct_descriptors(1, 100);
    let location = store.create_location("hall").unwrap();

    // Frame 1 is the best match; the others share fewer descriptors
    let shares = [40, 70, 35];
    for (seq, share) in shares.iter().enumerate() {
        let mut view = live[..*share].to_vec();
        view.extend(distinct_descriptors(900 + seq as u64, 20));
        store
            .append_frame(location, seq, "", DescriptorSet::from_descriptors(view))
            .unwrap();
    }

    let localizer = Localizer::new(LocalizationConfig::default(), store.clone());
    let live_set = DescriptorSet::from_descriptors(live.clone());
    let before = localizer.localize(Some(&live_set), "hall");
    assert_eq!(before.sequence_index, Some(1));
    assert_relative_eq!(before.confidence, 70.0);

    // Same route with weaker competitors
    let weaker = Arc::new(MemoryStore::new());
    let location = weaker.create_location("hall").unwrap();
    for (seq, share) in [5, 70, 0].iter().enumerate() {
        let mut view = live[..*share].to_vec();
        view.extend(distinct_descriptors(900 + seq as u64, 20));
        weaker
            .append_frame(location, seq, "", DescriptorSet::from_descriptors(view))
            .unwrap();
    }
    let localizer = Localizer::new(LocalizationConfig::default(), weaker);
    let after = localizer.localize(Some(&live_set), "hall");
    assert_eq!(after.sequence_index, before.sequence_index);
    assert_relative_eq!(after.confidence, before.confidence);
}

#[test]
fn test_store_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("landmarks.json");
    let views = kitchen_views();

    {
        let store = MemoryStore::open(&path).unwrap();
        map_kitchen(&store, &views);
        store.create_location("bathroom").unwrap();
    }
    assert!(path.exists());

    let reopened = MemoryStore::open(&path).unwrap();
    assert_eq!(reopened.list_locations().unwrap(), vec!["bathroom", "kitchen"]);
    let frames = reopened.fetch_frames("kitchen").unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[2].descriptors.descriptors(), views[2].as_slice());
    assert_eq!(reopened.fetch_graph("kitchen").unwrap().edges.len(), 4);

    // Ids keep counting after a reload
    let location = reopened.create_location("garage").unwrap();
    assert!(location > frames[0].location_id);
}
