//! Tick-driven navigation state machine for one trip.
//!
//! The session owns the route graph (loaded once when the trip starts), the
//! planned path and the confidence history. It performs no I/O: each tick
//! returns the events the caller must publish or speak.

use crate::capabilities::Detection;
use crate::config::NavigationConfig;
use crate::features::DescriptorSet;
use crate::localization::Localizer;
use crate::planning::{NavigationGraph, RoutePlanner};
use crate::store::NodeId;
use crate::utils::{normalize_confidence, smooth};

use super::navigator::{Instruction, Navigator};

pub const ARRIVAL_MESSAGE: &str = "You have arrived at your destination";
pub const LOST_MESSAGE: &str = "Unable to determine location. Please look around";

/// Observable outcome of a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Normalized and smoothed confidence of the latest localization
    Confidence { confidence: f32, smoothed: f32 },
    Localized { node: NodeId, position: usize },
    /// Localization failed `misses` times in a row
    Lost { misses: u32 },
    RoutePlanned { path: Vec<NodeId> },
    NoRoute { from: NodeId, to: NodeId },
    Instruction {
        text: String,
        step: usize,
        path_len: usize,
    },
    Obstacles(Vec<Detection>),
    Speak(String),
    Arrived,
}

/// State of one navigation trip.
pub struct NavigationSession {
    destination: String,
    graph: NavigationGraph,
    goal: Option<NodeId>,
    planner: RoutePlanner,
    navigator: Navigator,
    localizer: Localizer,
    config: NavigationConfig,
    current_node: Option<NodeId>,
    smoothed_confidence: Option<f32>,
    misses: u32,
    arrived: bool,
}

impl NavigationSession {
    /// Start a trip towards `goal`, or the end of the route when `None`.
    pub fn new(
        destination: impl Into<String>,
        graph: NavigationGraph,
        goal: Option<NodeId>,
        localizer: Localizer,
        config: NavigationConfig,
    ) -> Self {
        let goal = goal.or_else(|| graph.terminal_node());
        Self {
            destination: destination.into(),
            graph,
            goal,
            planner: RoutePlanner::new(config.step_distance),
            navigator: Navigator::new(),
            localizer,
            config,
            current_node: None,
            smoothed_confidence: None,
            misses: 0,
            arrived: false,
        }
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn goal(&self) -> Option<NodeId> {
        self.goal
    }

    pub fn current_node(&self) -> Option<NodeId> {
        self.current_node
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn has_arrived(&self) -> bool {
        self.arrived
    }

    /// Localize the live view and update the route.
    pub fn localization_tick(&mut self, live: Option<&DescriptorSet>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.arrived {
            return events;
        }

        let result = self.localizer.localize(live, &self.destination);
        let confidence = normalize_confidence(result.confidence);
        let smoothed = smooth(
            self.smoothed_confidence,
            confidence,
            self.config.confidence_smoothing,
        );
        self.smoothed_confidence = Some(smoothed);
        events.push(SessionEvent::Confidence {
            confidence,
            smoothed,
        });

        let resolved = result
            .frame_id
            .and_then(|frame_id| self.graph.node_for_frame(frame_id))
            .and_then(|node| self.graph.position(node).map(|p| (node, p)));

        let Some((node, position)) = resolved else {
            self.misses = self.misses.saturating_add(1);
            tracing::debug!(
                "Localization miss {} in {} (confidence {:.1})",
                self.misses,
                self.destination,
                confidence
            );
            events.push(SessionEvent::Lost {
                misses: self.misses,
            });
            let every = self.config.lost_warning_after;
            if every > 0 && self.misses % every == 0 {
                tracing::warn!("Lost localization in {}", self.destination);
                events.push(SessionEvent::Speak(LOST_MESSAGE.to_string()));
            }
            return events;
        };

        self.misses = 0;
        self.current_node = Some(node);
        tracing::debug!(
            "Localized at node {} (position {}, confidence {:.1})",
            node,
            position,
            confidence
        );
        events.push(SessionEvent::Localized { node, position });

        if !self.navigator.has_path() {
            self.plan_from(node, &mut events);
        } else if self.config.replan_on_drift && self.has_drifted(position) {
            tracing::info!(
                "Position {} is off the planned route, re-planning",
                position
            );
            self.plan_from(node, &mut events);
        }

        self.publish_instruction(&mut events);
        events
    }

    /// Speak the current instruction and move one step along the path.
    pub fn instruction_tick(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.arrived {
            return events;
        }
        let Some(instruction) = self.navigator.instruction(self.config.step_distance) else {
            return events;
        };

        events.push(SessionEvent::Speak(instruction.to_string()));
        self.navigator.advance();
        self.publish_instruction(&mut events);
        events
    }

    /// Publish detections and warn about the most urgent one when close.
    pub fn obstacle_tick(&mut self, detections: Vec<Detection>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if let Some(nearest) = detections.first()
            && nearest.distance < self.config.obstacle_warning_distance
        {
            tracing::info!(
                "Obstacle {} at {:.1} m (priority {})",
                nearest.class,
                nearest.distance,
                nearest.priority
            );
            events.push(SessionEvent::Speak(format!(
                "Warning! {} ahead at {:.1} meters",
                nearest.class, nearest.distance
            )));
        }
        events.insert(0, SessionEvent::Obstacles(detections));
        events
    }

    fn has_drifted(&self, position: usize) -> bool {
        self.navigator
            .current_node()
            .and_then(|expected| self.graph.position(expected))
            .is_some_and(|expected| expected.abs_diff(position) > self.config.drift_tolerance)
    }

    fn plan_from(&mut self, start: NodeId, events: &mut Vec<SessionEvent>) {
        let Some(goal) = self.goal else {
            tracing::warn!("Route to {} has no nodes", self.destination);
            return;
        };

        match self.planner.plan(&self.graph, start, goal) {
            Some(path) => {
                tracing::info!(
                    "Planned route to {}: {} nodes from {} to {}",
                    self.destination,
                    path.len(),
                    start,
                    goal
                );
                self.navigator.set_path(path.clone());
                events.push(SessionEvent::RoutePlanned { path });
            }
            None => {
                tracing::warn!("No route from node {} to node {}", start, goal);
                self.navigator.clear();
                events.push(SessionEvent::NoRoute {
                    from: start,
                    to: goal,
                });
            }
        }
    }

    fn publish_instruction(&mut self, events: &mut Vec<SessionEvent>) {
        let Some(instruction) = self.navigator.instruction(self.config.step_distance) else {
            return;
        };
        events.push(SessionEvent::Instruction {
            text: instruction.to_string(),
            step: self.navigator.step(),
            path_len: self.navigator.path().len(),
        });
        if instruction == Instruction::DestinationReached {
            self.arrived = true;
            tracing::info!("Arrived at {}", self.destination);
            events.push(SessionEvent::Speak(ARRIVAL_MESSAGE.to_string()));
            events.push(SessionEvent::Arrived);
        }
    }
}
