//! Simulated walk along a route, for the demo binary and tests.
//!
//! Frames produced here carry packed binary descriptors instead of pixels.
//! Each landmark has a fixed base descriptor set; every capture flips a few
//! random bits per descriptor to imitate sensor noise, and the walker moves
//! to the next landmark after a configured number of captures.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::capabilities::{Frame, FrameSource};
use crate::config::SimulationConfig;
use crate::error::{DrishtiError, Result};
use crate::features::{Descriptor, DescriptorSet, FeatureExtractor, KeyPoint};
use crate::utils::now_us;

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;

/// Pack descriptors into a frame payload.
pub fn pack_descriptors(descriptors: &[Descriptor]) -> Vec<u8> {
    descriptors.iter().flat_map(|d| d.to_bytes()).collect()
}

/// Random base descriptors, one set per landmark.
pub fn random_scene(rng: &mut StdRng, count: usize) -> Vec<Descriptor> {
    (0..count)
        .map(|_| Descriptor([rng.random(), rng.random(), rng.random(), rng.random()]))
        .collect()
}

#[derive(Debug)]
struct WalkState {
    captures: u64,
    rng: StdRng,
}

/// Camera that walks a straight route of synthetic landmarks.
#[derive(Debug)]
pub struct SimulatedWalk {
    scenes: Vec<Vec<Descriptor>>,
    noise_bits: u32,
    captures_per_landmark: u64,
    state: Mutex<WalkState>,
}

impl SimulatedWalk {
    pub fn new(config: &SimulationConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let scenes = (0..config.landmarks)
            .map(|_| random_scene(&mut rng, config.descriptors_per_frame))
            .collect();
        Self {
            scenes,
            noise_bits: config.noise_bits,
            captures_per_landmark: config.captures_per_landmark.max(1) as u64,
            state: Mutex::new(WalkState { captures: 0, rng }),
        }
    }

    /// Landmark the walker is standing at.
    pub fn current_landmark(&self) -> usize {
        let captures = self.state.lock().captures;
        self.landmark_for(captures)
    }

    /// Whether every landmark has been visited for its full capture budget.
    pub fn is_finished(&self) -> bool {
        let total = self.scenes.len() as u64 * self.captures_per_landmark;
        self.state.lock().captures >= total
    }

    /// Walk back to the start of the route.
    pub fn reset(&self) {
        self.state.lock().captures = 0;
    }

    pub fn landmarks(&self) -> usize {
        self.scenes.len()
    }

    fn landmark_for(&self, captures: u64) -> usize {
        let index = (captures / self.captures_per_landmark) as usize;
        index.min(self.scenes.len().saturating_sub(1))
    }
}

impl FrameSource for SimulatedWalk {
    fn capture(&self) -> Result<Frame> {
        if self.scenes.is_empty() {
            return Err(DrishtiError::CaptureFailure(
                "simulated route has no landmarks".to_string(),
            ));
        }

        let mut state = self.state.lock();
        let landmark = self.landmark_for(state.captures);
        let noisy: Vec<Descriptor> = self.scenes[landmark]
            .iter()
            .map(|base| {
                let mut d = *base;
                for _ in 0..self.noise_bits {
                    let bit = state.rng.random_range(0..256usize);
                    d.0[bit / 64] ^= 1u64 << (bit % 64);
                }
                d
            })
            .collect();

        let frame = Frame {
            sequence: state.captures,
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            pixels: pack_descriptors(&noisy),
            captured_at_us: now_us(),
        };
        state.captures += 1;
        Ok(frame)
    }
}

/// Extractor for frames whose payload is packed descriptors.
///
/// Keypoints are laid out on a grid over the frame; trailing bytes that do
/// not form a whole descriptor are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackedDescriptorExtractor;

impl FeatureExtractor for PackedDescriptorExtractor {
    fn extract(&self, frame: &Frame) -> Result<DescriptorSet> {
        let columns = (frame.width / 32).max(1);
        let (keypoints, descriptors) = frame
            .pixels
            .chunks_exact(Descriptor::BYTES)
            .enumerate()
            .map(|(i, chunk)| {
                let mut bytes = [0u8; Descriptor::BYTES];
                bytes.copy_from_slice(chunk);
                let i = i as u32;
                let keypoint = KeyPoint {
                    x: ((i % columns) * 32 + 16) as f32,
                    y: ((i / columns) * 32 + 16) as f32,
                    size: 31.0,
                    ..KeyPoint::default()
                };
                (keypoint, Descriptor::from_bytes(&bytes))
            })
            .unzip();
        Ok(DescriptorSet::new(keypoints, descriptors))
    }
}
