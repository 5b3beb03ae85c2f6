//! Obstacle ranking helpers shared by detector implementations.
//!
//! Detection models only report classes and boxes. The helpers here turn
//! those into the urgency-ordered list the navigation loop expects:
//! - class priority table for indoor walking
//! - coarse distance estimate from relative box area
//! - ordering by descending priority, then ascending distance

use std::cmp::Ordering;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::capabilities::{BoundingBox, Detection, Frame};

/// Warning priority of an object class.
pub fn class_priority(class: &str) -> u8 {
    match class {
        "person" => 3,
        "chair" | "sofa" | "diningtable" | "bed" => 2,
        _ => 1,
    }
}

/// Distance estimate in meters from the box area as a fraction of the frame.
///
/// Larger boxes are closer. Returns one of 0.5, 1.0, 1.5 or 2.5.
pub fn estimate_distance(normalized_area: f32) -> f32 {
    if normalized_area > 0.3 {
        0.5
    } else if normalized_area > 0.15 {
        1.0
    } else if normalized_area > 0.05 {
        1.5
    } else {
        2.5
    }
}

/// Sort detections by descending priority, then ascending distance.
pub fn rank(detections: &mut [Detection]) {
    detections.sort_by(|a, b| {
        b.priority.cmp(&a.priority).then(
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal),
        )
    });
}

/// Build a detection from a normalized box `(xmin, ymin, xmax, ymax)` in [0, 1].
pub fn detection_from_normalized(
    class: &str,
    confidence: f32,
    normalized: (f32, f32, f32, f32),
    frame_width: u32,
    frame_height: u32,
) -> Detection {
    let (xmin, ymin, xmax, ymax) = normalized;
    let w = frame_width as f32;
    let h = frame_height as f32;
    let area = ((xmax - xmin) * (ymax - ymin)).max(0.0);
    Detection {
        class: class.to_string(),
        confidence,
        bbox: BoundingBox {
            x1: (xmin * w) as u32,
            y1: (ymin * h) as u32,
            x2: (xmax * w) as u32,
            y2: (ymax * h) as u32,
        },
        distance: estimate_distance(area),
        priority: class_priority(class),
    }
}

/// Random detections used when no model is available and the synthetic
/// fallback was explicitly configured.
#[derive(Debug)]
pub struct SyntheticDetector {
    probability: f64,
    rng: Mutex<StdRng>,
}

const SYNTHETIC_CLASSES: [&str; 3] = ["chair", "person", "table"];

impl SyntheticDetector {
    pub fn new(probability: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            probability: probability.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }

    /// At most one detection centred in the frame, 1.0-2.5 m away.
    pub fn generate(&self, frame: &Frame) -> Vec<Detection> {
        let mut rng = self.rng.lock();
        if !rng.random_bool(self.probability) {
            return Vec::new();
        }
        let class = SYNTHETIC_CLASSES[rng.random_range(0..SYNTHETIC_CLASSES.len())];
        vec![Detection {
            class: class.to_string(),
            confidence: 0.85,
            bbox: BoundingBox {
                x1: frame.width / 3,
                y1: frame.height / 3,
                x2: 2 * frame.width / 3,
                y2: 2 * frame.height / 3,
            },
            distance: rng.random_range(1.0..2.5),
            priority: 2,
        }]
    }
}
