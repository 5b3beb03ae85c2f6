//! Mapping thread: records landmark frames along a route.
//!
//! Every capture interval the thread:
//! - Reads a frame from the shared camera
//! - Extracts descriptors
//! - Stores the frame as the next landmark when it has enough descriptors
//!
//! Mapping a known location continues its route after the last stored
//! landmark.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::capabilities::FrameSource;
use crate::config::MappingConfig;
use crate::error::Result;
use crate::features::FeatureExtractor;
use crate::session::Ticker;
use crate::shared::SharedState;
use crate::store::{LandmarkStore, LocationId};

/// Mapping thread state and logic.
pub struct MappingThread {
    config: MappingConfig,
    frames_dir: String,
    shared: Arc<SharedState>,
    store: Arc<dyn LandmarkStore>,
    camera: Arc<dyn FrameSource>,
    extractor: Arc<dyn FeatureExtractor>,
    location_id: LocationId,
    epoch: u64,
    /// Sequence index of the next stored landmark
    next_sequence: usize,
    /// Landmarks stored by this session
    frames: usize,
}

impl MappingThread {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: MappingConfig,
        frames_dir: String,
        shared: Arc<SharedState>,
        store: Arc<dyn LandmarkStore>,
        camera: Arc<dyn FrameSource>,
        extractor: Arc<dyn FeatureExtractor>,
        location_id: LocationId,
        next_sequence: usize,
        epoch: u64,
    ) -> Self {
        Self {
            config,
            frames_dir,
            shared,
            store,
            camera,
            extractor,
            location_id,
            epoch,
            next_sequence,
            frames: 0,
        }
    }

    /// Run until the session is stopped or shutdown is signaled.
    pub fn run(&mut self) {
        tracing::info!("Mapping thread started for location {}", self.location_id);

        let mut capture = Ticker::new(self.config.capture_interval(), Instant::now());

        loop {
            if self.shared.should_shutdown() || !self.shared.is_current(self.epoch) {
                break;
            }

            if capture.is_due(Instant::now()) {
                match self.capture_landmark() {
                    Ok(_) => capture.fire(Instant::now()),
                    // Retried on the next poll
                    Err(e) => tracing::warn!("Mapping capture skipped: {}", e),
                }
            }

            thread::sleep(self.config.poll_interval());
        }

        tracing::info!(
            "Mapping thread exiting after {} landmarks for location {}",
            self.frames,
            self.location_id
        );
    }

    /// Capture one frame and store it if it is distinctive enough.
    ///
    /// Returns whether a landmark was stored. Errors only for capture failures.
    pub fn capture_landmark(&mut self) -> Result<bool> {
        let frame = self.camera.capture()?;

        let descriptors = match self.extractor.extract(&frame) {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!("Feature extraction failed: {}", e);
                return Ok(false);
            }
        };

        if descriptors.len() <= self.config.min_descriptors {
            tracing::debug!(
                "Frame {} rejected: {} descriptors",
                frame.sequence,
                descriptors.len()
            );
            return Ok(false);
        }

        if !self.shared.is_current(self.epoch) {
            return Ok(false);
        }

        let sequence_index = self.next_sequence;
        let image_ref = format!(
            "{}/{}_{}.jpg",
            self.frames_dir, self.location_id, sequence_index
        );
        let count = descriptors.len();

        // Outside the gate: a snapshot-backed store rewrites its file here
        let frame_id = match self.store.append_frame(
            self.location_id,
            sequence_index,
            &image_ref,
            descriptors,
        ) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Failed to store landmark {}: {}", sequence_index, e);
                return Ok(false);
            }
        };
        self.next_sequence += 1;
        self.frames += 1;

        let frames = self.frames;
        if self
            .shared
            .update(self.epoch, |status| status.mapping_frames = frames)
            .is_none()
        {
            tracing::debug!("Landmark {} stored after mapping stopped", sequence_index);
        }

        tracing::debug!(
            "Stored landmark {} (frame {}, {} descriptors)",
            sequence_index,
            frame_id,
            count
        );
        Ok(true)
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn next_sequence(&self) -> usize {
        self.next_sequence
    }
}
