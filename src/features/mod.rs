//! Visual features: binary descriptors, keypoint metadata and matching.
//!
//! Landmarks are described by 256-bit ORB-style binary descriptors compared
//! with Hamming distance. Each descriptor carries the geometric metadata of
//! the keypoint it was computed at so stored frames can be redrawn or
//! re-verified later.

mod matcher;

pub use matcher::{CrossCheckMatcher, FeatureMatch};

use serde::{Deserialize, Serialize};

use crate::capabilities::Frame;
use crate::error::Result;

/// A 256-bit binary descriptor stored as 4 x u64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor(pub [u64; 4]);

impl Descriptor {
    /// Size of a packed descriptor in bytes.
    pub const BYTES: usize = 32;

    /// Number of bits that differ (0-256).
    #[inline]
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    /// Decode a little-endian packed descriptor.
    pub fn from_bytes(bytes: &[u8; Self::BYTES]) -> Self {
        let mut words = [0u64; 4];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            *word = u64::from_le_bytes(buf);
        }
        Self(words)
    }

    /// Encode as little-endian bytes.
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let mut bytes = [0u8; Self::BYTES];
        for (chunk, word) in bytes.chunks_exact_mut(8).zip(&self.0) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }
}

/// Keypoint geometry attached to a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KeyPoint {
    /// Column in pixels
    pub x: f32,
    /// Row in pixels
    pub y: f32,
    /// Diameter of the meaningful neighbourhood
    pub size: f32,
    /// Orientation in degrees
    pub angle: f32,
    /// Detector response (corner strength)
    pub response: f32,
    /// Pyramid level the keypoint was found at
    pub octave: i32,
}

/// Keypoints and their descriptors, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorSet {
    keypoints: Vec<KeyPoint>,
    descriptors: Vec<Descriptor>,
}

impl DescriptorSet {
    /// Build a set from aligned keypoints and descriptors.
    ///
    /// Extra entries on the longer side are dropped.
    pub fn new(mut keypoints: Vec<KeyPoint>, mut descriptors: Vec<Descriptor>) -> Self {
        let n = keypoints.len().min(descriptors.len());
        keypoints.truncate(n);
        descriptors.truncate(n);
        Self {
            keypoints,
            descriptors,
        }
    }

    /// Build a set from descriptors alone, with default keypoint geometry.
    pub fn from_descriptors(descriptors: Vec<Descriptor>) -> Self {
        let keypoints = vec![KeyPoint::default(); descriptors.len()];
        Self {
            keypoints,
            descriptors,
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn keypoints(&self) -> &[KeyPoint] {
        &self.keypoints
    }
}

/// Converts a captured frame into keypoint descriptors.
///
/// Implementations may return an empty set for textureless frames.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, frame: &Frame) -> Result<DescriptorSet>;
}
