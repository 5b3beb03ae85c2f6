//! Command surface of the engine.
//!
//! [`Guide`] owns the capabilities and the shared state, validates mode
//! transitions and spawns one control loop per active mode. Every command
//! is acknowledged through the voice and returns a [`CommandResult`].

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use crate::capabilities::{FrameSource, ObstacleSource, Voice};
use crate::commands::{CommandResponse, CommandResult, VoiceCommand, parse_voice_command};
use crate::config::DrishtiConfig;
use crate::error::{DrishtiError, Result};
use crate::features::FeatureExtractor;
use crate::localization::Localizer;
use crate::planning::NavigationGraph;
use crate::session::NavigationSession;
use crate::shared::{Mode, SessionStatus, SharedState};
use crate::store::{LandmarkStore, LocationId, NodeId};
use crate::threads::{MappingThread, NavigationThread, spawn_mapping, spawn_navigation};

pub const EMERGENCY_MESSAGE: &str = "Emergency assistance requested. Help is on the way.";

/// Location name used when mapping is started without one.
pub const DEFAULT_LOCATION_NAME: &str = "unnamed_location";

/// Timeout for spoken commands.
const LISTEN_TIMEOUT: Duration = Duration::from_secs(5);

/// External collaborators the engine runs against.
#[derive(Clone)]
pub struct Capabilities {
    pub store: Arc<dyn LandmarkStore>,
    pub camera: Arc<dyn FrameSource>,
    pub extractor: Arc<dyn FeatureExtractor>,
    pub obstacles: Arc<ObstacleSource>,
    pub voice: Arc<dyn Voice>,
}

/// Mapping and navigation controller.
pub struct Guide {
    config: DrishtiConfig,
    shared: Arc<SharedState>,
    caps: Capabilities,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Guide {
    pub fn new(config: DrishtiConfig, caps: Capabilities) -> Self {
        Self {
            config,
            shared: Arc::new(SharedState::new()),
            caps,
            workers: Mutex::new(Vec::new()),
        }
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Current session snapshot.
    pub fn status(&self) -> SessionStatus {
        self.shared.snapshot()
    }

    pub fn mode(&self) -> Mode {
        self.shared.mode()
    }

    /// Start recording landmarks for `name`.
    pub fn start_mapping(&self, name: &str) -> CommandResult {
        let name = match name.trim() {
            "" => DEFAULT_LOCATION_NAME,
            trimmed => trimmed,
        };

        let epoch = self.shared.begin(Mode::Mapping, |status| {
            status.current_location = Some(name.to_string());
        })?;

        let (location_id, next_sequence) = match self.prepare_location(name) {
            Ok(prepared) => prepared,
            Err(e) => {
                self.shared.finish(epoch, Mode::Mapping);
                return Err(e);
            }
        };

        let worker = MappingThread::new(
            self.config.mapping.clone(),
            self.config.store.frames_dir.clone(),
            Arc::clone(&self.shared),
            Arc::clone(&self.caps.store),
            Arc::clone(&self.caps.camera),
            Arc::clone(&self.caps.extractor),
            location_id,
            next_sequence,
            epoch,
        );
        self.spawn(epoch, Mode::Mapping, spawn_mapping(worker))?;

        tracing::info!(
            "Mapping {} (location {}) from landmark {}",
            name,
            location_id,
            next_sequence
        );
        self.caps.voice.speak(&format!("Starting to map {}", name));
        Ok(CommandResponse::MappingStarted {
            location: name.to_string(),
        })
    }

    /// Stop mapping and report how many landmarks were stored.
    pub fn stop_mapping(&self) -> CommandResult {
        let last = self.shared.stop(Mode::Mapping)?;
        let location = last.current_location.unwrap_or_default();
        let frames = last.mapping_frames;

        tracing::info!("Mapping of {} complete: {} landmarks", location, frames);
        self.caps.voice.speak(&format!(
            "Mapping complete. Saved {} landmarks for {}",
            frames, location
        ));
        Ok(CommandResponse::MappingStopped { location, frames })
    }

    /// Navigate to the end of the route recorded for `destination`.
    pub fn start_navigation(&self, destination: &str) -> CommandResult {
        self.start_navigation_to(destination, None)
    }

    /// Navigate to `goal` within `destination`, or to its last landmark.
    pub fn start_navigation_to(&self, destination: &str, goal: Option<NodeId>) -> CommandResult {
        let known = self.caps.store.list_locations()?;
        if !known.iter().any(|name| name == destination) {
            tracing::warn!("Navigation requested to unknown location {}", destination);
            self.caps
                .voice
                .speak(&format!("Location {} not found", destination));
            return Err(DrishtiError::NotFound(destination.to_string()));
        }

        // Loaded once for the whole trip
        let graph = NavigationGraph::from_data(self.caps.store.fetch_graph(destination)?);
        if let Some(goal) = goal
            && graph.node(goal).is_none()
        {
            return Err(DrishtiError::InvalidState(format!(
                "Node {} is not part of {}",
                goal, destination
            )));
        }

        let epoch = self.shared.begin(Mode::Navigating, |status| {
            status.destination = Some(destination.to_string());
        })?;

        let localizer = Localizer::new(
            self.config.localization.clone(),
            Arc::clone(&self.caps.store),
        );
        let session = NavigationSession::new(
            destination,
            graph,
            goal,
            localizer,
            self.config.navigation.clone(),
        );
        let worker = NavigationThread::new(
            self.config.navigation.clone(),
            Arc::clone(&self.shared),
            Arc::clone(&self.caps.camera),
            Arc::clone(&self.caps.extractor),
            Arc::clone(&self.caps.obstacles),
            Arc::clone(&self.caps.voice),
            session,
            epoch,
        );
        self.spawn(epoch, Mode::Navigating, spawn_navigation(worker))?;

        tracing::info!("Navigating to {}", destination);
        self.caps
            .voice
            .speak(&format!("Navigating to {}", destination));
        Ok(CommandResponse::NavigationStarted {
            destination: destination.to_string(),
        })
    }

    /// Stop the active trip.
    pub fn stop_navigation(&self) -> CommandResult {
        self.shared.stop(Mode::Navigating)?;
        self.caps.voice.speak("Navigation stopped");
        Ok(CommandResponse::NavigationStopped)
    }

    /// Speak the last resolved position.
    pub fn where_am_i(&self) -> CommandResult {
        let status = self.shared.snapshot();
        match (status.current_position, &status.destination) {
            (Some(position), Some(destination)) => self.caps.voice.speak(&format!(
                "You are at position {} in {}",
                position, destination
            )),
            _ => self.caps.voice.speak("Location unknown"),
        }
        Ok(CommandResponse::Position {
            position: status.current_position,
            destination: status.destination,
        })
    }

    /// Announce an emergency and wait until it has been spoken.
    pub fn emergency(&self) -> CommandResult {
        tracing::warn!("Emergency requested");
        self.caps.voice.speak_blocking(EMERGENCY_MESSAGE);
        Ok(CommandResponse::EmergencyAlerted)
    }

    /// Listen for a spoken command and run it.
    pub fn handle_voice_command(&self) -> CommandResult {
        let Some(text) = self.caps.voice.listen(LISTEN_TIMEOUT) else {
            return Err(DrishtiError::Unrecognized(
                "No command recognized".to_string(),
            ));
        };
        tracing::debug!("Heard: {}", text);
        self.run_voice_command(&text)
    }

    /// Run a command from already recognized text.
    pub fn run_voice_command(&self, text: &str) -> CommandResult {
        let locations = self.caps.store.list_locations()?;
        match parse_voice_command(text, &locations) {
            VoiceCommand::StartMapping(name) => self.start_mapping(&name),
            VoiceCommand::Stop => match self.shared.mode() {
                Mode::Mapping => self.stop_mapping(),
                Mode::Navigating => self.stop_navigation(),
                Mode::Idle => Err(DrishtiError::InvalidState("Nothing to stop".to_string())),
            },
            VoiceCommand::Navigate(Some(destination)) => self.start_navigation(&destination),
            VoiceCommand::Navigate(None) => {
                self.caps.voice.speak("Destination not found");
                Err(DrishtiError::Unrecognized(
                    "Destination not recognized".to_string(),
                ))
            }
            VoiceCommand::WhereAmI => self.where_am_i(),
            VoiceCommand::Unknown => Err(DrishtiError::Unrecognized(
                "Command not understood".to_string(),
            )),
        }
    }

    /// Stop any active mode and wait for the loops to exit.
    pub fn shutdown(&self) {
        self.shared.signal_shutdown();
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in workers {
            if handle.join().is_err() {
                tracing::error!("Control loop panicked");
            }
        }
        tracing::info!("Guide shut down");
    }

    /// Create `name` if needed and find where its route continues.
    fn prepare_location(&self, name: &str) -> Result<(LocationId, usize)> {
        let location_id = self.caps.store.create_location(name)?;
        let next_sequence = self
            .caps
            .store
            .fetch_frames(name)?
            .iter()
            .map(|frame| frame.sequence_index + 1)
            .max()
            .unwrap_or(0);
        Ok((location_id, next_sequence))
    }

    /// Track a spawned loop, or roll back the session if spawning failed.
    fn spawn(&self, epoch: u64, mode: Mode, spawned: Result<JoinHandle<()>>) -> Result<()> {
        match spawned {
            Ok(handle) => {
                let mut workers = self.workers.lock();
                workers.retain(|h| !h.is_finished());
                workers.push(handle);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to spawn {} loop: {}", mode, e);
                self.shared.finish(epoch, mode);
                Err(e)
            }
        }
    }
}

impl Drop for Guide {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObstacleConfig;
    use crate::sim::PackedDescriptorExtractor;
    use crate::store::MemoryStore;
    use crate::testing::{FailingSource, RecordingVoice};

    fn guide(voice: Arc<RecordingVoice>) -> (Guide, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let caps = Capabilities {
            store: store.clone(),
            camera: Arc::new(FailingSource),
            extractor: Arc::new(PackedDescriptorExtractor),
            obstacles: Arc::new(ObstacleSource::unavailable(&ObstacleConfig::default())),
            voice,
        };
        (Guide::new(DrishtiConfig::default(), caps), store)
    }

    #[test]
    fn test_unknown_destination_is_rejected() {
        let voice = Arc::new(RecordingVoice::default());
        let (guide, _) = guide(voice.clone());
        let err = guide.start_navigation("kitchen").unwrap_err();
        assert!(matches!(err, DrishtiError::NotFound(ref name) if name == "kitchen"));
        assert_eq!(err.to_string(), "Location kitchen not found");
        assert_eq!(guide.mode(), Mode::Idle);
        assert_eq!(voice.spoken(), vec!["Location kitchen not found"]);
    }

    #[test]
    fn test_mapping_round_trip() {
        let voice = Arc::new(RecordingVoice::default());
        let (guide, store) = guide(voice.clone());

        let started = guide.start_mapping("  ").unwrap();
        assert_eq!(
            started,
            CommandResponse::MappingStarted {
                location: DEFAULT_LOCATION_NAME.into()
            }
        );
        assert_eq!(guide.mode(), Mode::Mapping);
        assert!(matches!(
            guide.start_navigation("x"),
            Err(DrishtiError::NotFound(_))
        ));
        assert!(matches!(
            guide.start_mapping("hall"),
            Err(DrishtiError::Busy(_))
        ));

        let stopped = guide.stop_mapping().unwrap();
        assert_eq!(
            stopped,
            CommandResponse::MappingStopped {
                location: DEFAULT_LOCATION_NAME.into(),
                frames: 0
            }
        );
        assert_eq!(guide.mode(), Mode::Idle);
        assert_eq!(store.list_locations().unwrap(), vec![DEFAULT_LOCATION_NAME]);
        assert_eq!(
            voice.spoken(),
            vec![
                "Starting to map unnamed_location",
                "Mapping complete. Saved 0 landmarks for unnamed_location"
            ]
        );
    }

    #[test]
    fn test_stop_without_session() {
        let voice = Arc::new(RecordingVoice::default());
        let (guide, _) = guide(voice);
        let err = guide.stop_navigation().unwrap_err();
        assert_eq!(err.to_string(), "Not in navigation mode");
        let err = guide.stop_mapping().unwrap_err();
        assert_eq!(err.to_string(), "Not in mapping mode");
    }

    #[test]
    fn test_emergency_and_where_am_i() {
        let voice = Arc::new(RecordingVoice::default());
        let (guide, _) = guide(voice.clone());
        assert_eq!(guide.emergency().unwrap(), CommandResponse::EmergencyAlerted);
        guide.where_am_i().unwrap();
        assert_eq!(voice.blocking(), vec![EMERGENCY_MESSAGE]);
        assert_eq!(voice.spoken(), vec!["Location unknown"]);
    }

    #[test]
    fn test_voice_commands() {
        let voice = Arc::new(RecordingVoice::default());
        let (guide, _) = guide(voice.clone());

        assert!(matches!(
            guide.handle_voice_command(),
            Err(DrishtiError::Unrecognized(_))
        ));

        voice.push_heard("map the hall");
        let started = guide.handle_voice_command().unwrap();
        assert_eq!(
            started,
            CommandResponse::MappingStarted {
                location: "hall".into()
            }
        );

        voice.push_heard("stop mapping");
        assert!(matches!(
            guide.handle_voice_command().unwrap(),
            CommandResponse::MappingStopped { .. }
        ));

        let err = guide.run_voice_command("take me to the garage").unwrap_err();
        assert_eq!(err.to_string(), "Destination not recognized");
        assert_eq!(voice.spoken().last().map(String::as_str), Some("Destination not found"));

        let err = guide.run_voice_command("sing a song").unwrap_err();
        assert_eq!(err.to_string(), "Command not understood");
    }
}
