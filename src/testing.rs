//! Test doubles for the capability traits.
//!
//! Shared by unit tests and the integration tests under `tests/`.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::capabilities::{Detection, Frame, FrameSource, ObstacleDetector, Voice};
use crate::error::{DrishtiError, Result};
use crate::features::Descriptor;
use crate::sim::{pack_descriptors, random_scene};

/// `n` random descriptors from `seed`.
///
/// Sets from different seeds are ~128 bits apart, far outside the match
/// distance, so they never match each other.
pub fn distinct_descriptors(seed: u64, n: usize) -> Vec<Descriptor> {
    let mut rng = StdRng::seed_from_u64(seed);
    random_scene(&mut rng, n)
}

/// Frame whose payload is the given descriptors.
pub fn packed_frame(sequence: u64, descriptors: &[Descriptor]) -> Frame {
    Frame {
        sequence,
        width: 640,
        height: 480,
        pixels: pack_descriptors(descriptors),
        captured_at_us: 0,
    }
}

#[derive(Debug)]
struct Script {
    views: Vec<Vec<Descriptor>>,
    next: usize,
}

/// Camera replaying scripted descriptor sets, repeating the last one.
#[derive(Debug)]
pub struct PackedDescriptorSource {
    script: Mutex<Script>,
    /// Move to the next view after each capture
    advance: bool,
}

impl PackedDescriptorSource {
    /// Plays the views in order, one per capture.
    pub fn new(views: Vec<Vec<Descriptor>>) -> Self {
        Self {
            script: Mutex::new(Script { views, next: 0 }),
            advance: true,
        }
    }

    /// Keeps showing the first view until [`Self::show`] is called.
    pub fn holding(views: Vec<Vec<Descriptor>>) -> Self {
        Self {
            advance: false,
            ..Self::new(views)
        }
    }

    /// Jump to view `index` for the following captures.
    pub fn show(&self, index: usize) {
        self.script.lock().next = index;
    }

    /// Replace the script and start again from its first view.
    pub fn replay(&self, views: Vec<Vec<Descriptor>>) {
        *self.script.lock() = Script { views, next: 0 };
    }
}

impl FrameSource for PackedDescriptorSource {
    fn capture(&self) -> Result<Frame> {
        let mut script = self.script.lock();
        let index = script.next.min(script.views.len().saturating_sub(1));
        let view = script
            .views
            .get(index)
            .ok_or_else(|| DrishtiError::CaptureFailure("no scripted views".to_string()))?;
        let frame = packed_frame(script.next as u64, view);
        if self.advance {
            script.next += 1;
        }
        Ok(frame)
    }
}

/// Camera that always fails.
#[derive(Debug, Default)]
pub struct FailingSource;

impl FrameSource for FailingSource {
    fn capture(&self) -> Result<Frame> {
        Err(DrishtiError::CaptureFailure("camera disconnected".to_string()))
    }
}

/// Detector returning the same detections for every frame.
#[derive(Debug, Default)]
pub struct ScriptedDetector {
    detections: Mutex<Vec<Detection>>,
}

impl ScriptedDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections: Mutex::new(detections),
        }
    }

    pub fn set(&self, detections: Vec<Detection>) {
        *self.detections.lock() = detections;
    }
}

impl ObstacleDetector for ScriptedDetector {
    fn detect(&self, _frame: &Frame) -> Result<Vec<Detection>> {
        Ok(self.detections.lock().clone())
    }
}

/// Voice that records what was said and replays scripted input.
#[derive(Debug, Default)]
pub struct RecordingVoice {
    spoken: Mutex<Vec<String>>,
    blocking: Mutex<Vec<String>>,
    heard: Mutex<VecDeque<String>>,
}

impl RecordingVoice {
    /// Queue text for the next `listen`.
    pub fn push_heard(&self, text: &str) {
        self.heard.lock().push_back(text.to_string());
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn blocking(&self) -> Vec<String> {
        self.blocking.lock().clone()
    }

    pub fn has_spoken(&self, text: &str) -> bool {
        self.spoken.lock().iter().any(|s| s == text)
    }
}

impl Voice for RecordingVoice {
    fn speak(&self, text: &str) {
        self.spoken.lock().push(text.to_string());
    }

    fn speak_blocking(&self, text: &str) {
        self.blocking.lock().push(text.to_string());
    }

    fn listen(&self, _timeout: Duration) -> Option<String> {
        self.heard.lock().pop_front()
    }
}
