//! Navigation thread: drives a [`NavigationSession`] from the camera.
//!
//! One loop polls three deadlines. Localization and obstacle checks share
//! a single capture per poll; ticks run one after another, so a slow
//! localization delays the obstacle check of the same poll.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::capabilities::{FrameSource, ObstacleSource, Voice};
use crate::config::NavigationConfig;
use crate::features::FeatureExtractor;
use crate::session::{NavigationSession, SessionEvent, Ticker};
use crate::shared::{Mode, SessionStatus, SharedState};

/// Navigation thread state and logic.
pub struct NavigationThread {
    config: NavigationConfig,
    shared: Arc<SharedState>,
    camera: Arc<dyn FrameSource>,
    extractor: Arc<dyn FeatureExtractor>,
    obstacles: Arc<ObstacleSource>,
    voice: Arc<dyn Voice>,
    session: NavigationSession,
    epoch: u64,
}

impl NavigationThread {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: NavigationConfig,
        shared: Arc<SharedState>,
        camera: Arc<dyn FrameSource>,
        extractor: Arc<dyn FeatureExtractor>,
        obstacles: Arc<ObstacleSource>,
        voice: Arc<dyn Voice>,
        session: NavigationSession,
        epoch: u64,
    ) -> Self {
        Self {
            config,
            shared,
            camera,
            extractor,
            obstacles,
            voice,
            session,
            epoch,
        }
    }

    /// Run until arrival, stop or shutdown.
    pub fn run(&mut self) {
        tracing::info!("Navigation thread started for {}", self.session.destination());

        let start = Instant::now();
        let mut localization = Ticker::new(self.config.localization_period(), start);
        let mut obstacle = Ticker::new(self.config.obstacle_period(), start);
        let mut instruction = Ticker::new(self.config.instruction_period(), start);

        loop {
            if self.shared.should_shutdown() || !self.shared.is_current(self.epoch) {
                break;
            }

            let now = Instant::now();
            let localization_due = localization.is_due(now);
            let obstacle_due = obstacle.is_due(now);

            if localization_due || obstacle_due {
                match self.camera.capture() {
                    Ok(frame) => {
                        if localization_due {
                            let live = match self.extractor.extract(&frame) {
                                Ok(set) => Some(set),
                                Err(e) => {
                                    tracing::warn!("Feature extraction failed: {}", e);
                                    None
                                }
                            };
                            let events = self.session.localization_tick(live.as_ref());
                            localization.fire(Instant::now());
                            if !self.publish(events) {
                                break;
                            }
                        }

                        if obstacle_due {
                            let detections = self.obstacles.detect(&frame);
                            let events = self.session.obstacle_tick(detections);
                            obstacle.fire(Instant::now());
                            if !self.publish(events) {
                                break;
                            }
                        }
                    }
                    // Deadlines stay due, so the next poll retries
                    Err(e) => tracing::warn!("Frame capture failed: {}", e),
                }
            }

            // Instructions wait for a route
            if self.session.navigator().has_path() && instruction.is_due(Instant::now()) {
                let events = self.session.instruction_tick();
                instruction.fire(Instant::now());
                if !self.publish(events) {
                    break;
                }
            }

            thread::sleep(self.config.poll_interval());
        }

        tracing::info!(
            "Navigation thread exiting (arrived: {})",
            self.session.has_arrived()
        );
    }

    /// Apply events to the shared status and the voice.
    ///
    /// Returns false once the loop must exit: the session was stopped or
    /// replaced, or the user arrived.
    fn publish(&self, events: Vec<SessionEvent>) -> bool {
        for event in events {
            if self
                .shared
                .update(self.epoch, |status| apply_event(status, &event))
                .is_none()
            {
                return false;
            }

            match event {
                SessionEvent::Speak(text) => self.voice.speak(&text),
                SessionEvent::Arrived => {
                    self.shared.finish(self.epoch, Mode::Navigating);
                    return false;
                }
                _ => {}
            }
        }
        true
    }
}

/// Reflect a session event in the status snapshot.
pub fn apply_event(status: &mut SessionStatus, event: &SessionEvent) {
    match event {
        SessionEvent::Confidence {
            confidence,
            smoothed,
        } => {
            status.confidence = *confidence;
            status.smoothed_confidence = *smoothed;
        }
        SessionEvent::Localized { position, .. } => {
            status.current_position = Some(*position);
        }
        SessionEvent::RoutePlanned { path } => {
            status.path_length = path.len();
            status.step_index = 0;
        }
        SessionEvent::NoRoute { .. } => {
            status.path_length = 0;
            status.step_index = 0;
            status.navigation_instruction.clear();
        }
        SessionEvent::Instruction {
            text,
            step,
            path_len,
        } => {
            status.navigation_instruction.clone_from(text);
            status.step_index = *step;
            status.path_length = *path_len;
        }
        SessionEvent::Obstacles(detections) => {
            status.obstacles.clone_from(detections);
        }
        SessionEvent::Lost { .. } | SessionEvent::Speak(_) | SessionEvent::Arrived => {}
    }
}
