//! External capabilities consumed by the engine.
//!
//! The camera, obstacle model and speech engine live outside this crate.
//! They are reached through the traits below so the control loops can run
//! against real devices, the simulated walk or test doubles alike.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{FallbackMode, ObstacleConfig};
use crate::error::Result;
use crate::obstacles::{SyntheticDetector, rank};

/// A captured camera frame.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    /// Monotonic capture counter of the source
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    /// Raw pixel or packed feature payload, as produced by the source
    pub pixels: Vec<u8>,
    /// Capture time in microseconds since the Unix epoch
    pub captured_at_us: u64,
}

/// Single shared image-capture device.
pub trait FrameSource: Send + Sync {
    /// Read the latest frame. Errors are reported as `CaptureFailure`.
    fn capture(&self) -> Result<Frame>;
}

/// Pixel-space bounding box (x1, y1) - (x2, y2).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

/// A typed obstacle detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Object class, e.g. "person" or "chair"
    pub class: String,
    /// Model confidence (0.0-1.0)
    pub confidence: f32,
    pub bbox: BoundingBox,
    /// Estimated distance in meters
    pub distance: f32,
    /// Warning priority, higher is more urgent
    pub priority: u8,
}

/// Black-box obstacle detection model.
///
/// Detections must come back sorted by descending priority, then ascending
/// distance (see [`crate::obstacles::rank`]).
pub trait ObstacleDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// Behaviour when no detection model is available.
#[derive(Debug)]
pub enum FallbackPolicy {
    /// Report an empty scene
    Empty,
    /// Generate random detections; for demos and tests only
    Synthetic(SyntheticDetector),
}

/// Where obstacle detections come from.
pub enum ObstacleSource {
    Model(Arc<dyn ObstacleDetector>),
    Unavailable(FallbackPolicy),
}

impl std::fmt::Debug for ObstacleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObstacleSource::Model(_) => f.write_str("ObstacleSource::Model"),
            ObstacleSource::Unavailable(policy) => {
                f.debug_tuple("ObstacleSource::Unavailable").field(policy).finish()
            }
        }
    }
}

impl ObstacleSource {
    /// Source for when no model could be loaded, using the configured fallback.
    pub fn unavailable(config: &ObstacleConfig) -> Self {
        let policy = match config.fallback {
            FallbackMode::Empty => FallbackPolicy::Empty,
            FallbackMode::Synthetic => FallbackPolicy::Synthetic(SyntheticDetector::new(
                config.synthetic_probability,
                config.synthetic_seed,
            )),
        };
        tracing::warn!(
            "Obstacle detection model unavailable, using {:?} fallback",
            config.fallback
        );
        ObstacleSource::Unavailable(policy)
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ObstacleSource::Model(_))
    }

    /// Detect obstacles in a frame, most urgent first.
    ///
    /// Model failures yield no detections.
    pub fn detect(&self, frame: &Frame) -> Vec<Detection> {
        match self {
            ObstacleSource::Model(model) => match model.detect(frame) {
                Ok(mut detections) => {
                    // Stable, so an already ranked list is unchanged
                    rank(&mut detections);
                    detections
                }
                Err(e) => {
                    tracing::warn!("Obstacle detection failed: {}", e);
                    Vec::new()
                }
            },
            ObstacleSource::Unavailable(FallbackPolicy::Empty) => Vec::new(),
            ObstacleSource::Unavailable(FallbackPolicy::Synthetic(generator)) => {
                generator.generate(frame)
            }
        }
    }
}

/// Speech input and output.
pub trait Voice: Send + Sync {
    /// Speak without waiting for completion.
    fn speak(&self, text: &str);

    /// Speak and wait until the utterance has finished.
    fn speak_blocking(&self, text: &str);

    /// Listen for a spoken command; `None` when nothing was recognized.
    fn listen(&self, timeout: Duration) -> Option<String>;
}

/// Voice that writes utterances to the log. Used when running headless.
#[derive(Debug, Default)]
pub struct LogVoice;

impl Voice for LogVoice {
    fn speak(&self, text: &str) {
        tracing::info!(target: "drishti_nav::voice", "Speaking: {}", text);
    }

    fn speak_blocking(&self, text: &str) {
        tracing::info!(target: "drishti_nav::voice", "Speaking (blocking): {}", text);
    }

    fn listen(&self, _timeout: Duration) -> Option<String> {
        None
    }
}
