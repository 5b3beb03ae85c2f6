//! Landmark localization: which stored frame does the live view match best?
//!
//! Every stored frame of a location is scored against the live descriptor
//! set with the cross-checked Hamming matcher. The frame with the highest
//! score wins if that score clears the confidence threshold. Ties go to the
//! frame with the lowest sequence index, independent of store order.
//!
//! The returned confidence is the raw match count. Callers normalize it with
//! [`crate::utils::normalize_confidence`].

use std::sync::Arc;

use crate::config::LocalizationConfig;
use crate::features::{CrossCheckMatcher, DescriptorSet};
use crate::store::{FrameId, LandmarkFrame, LandmarkStore};

/// Outcome of one localization attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalizationResult {
    /// Best matching frame, if its score cleared the threshold
    pub frame_id: Option<FrameId>,
    /// Raw match score of the best frame (0 when nothing was compared)
    pub confidence: f32,
    /// Sequence index of the matched frame
    pub sequence_index: Option<usize>,
}

impl LocalizationResult {
    /// The "no match" sentinel with the given raw score.
    pub fn no_match(confidence: f32) -> Self {
        Self {
            frame_id: None,
            confidence,
            sequence_index: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.frame_id.is_some()
    }
}

/// Best-scoring candidate seen so far.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    frame_id: FrameId,
    sequence_index: usize,
    score: usize,
}

/// Matches live descriptors against the landmarks of a location.
pub struct Localizer {
    config: LocalizationConfig,
    matcher: CrossCheckMatcher,
    store: Arc<dyn LandmarkStore>,
}

impl Localizer {
    pub fn new(config: LocalizationConfig, store: Arc<dyn LandmarkStore>) -> Self {
        let matcher = CrossCheckMatcher::new(config.max_match_distance);
        Self {
            config,
            matcher,
            store,
        }
    }

    /// Localize a live descriptor set within `location`.
    ///
    /// Never fails: store errors and weak input both yield the sentinel.
    pub fn localize(&self, live: Option<&DescriptorSet>, location: &str) -> LocalizationResult {
        let Some(live) = live.filter(|set| set.len() >= self.config.min_keypoints) else {
            tracing::trace!("Too few keypoints to localize");
            return LocalizationResult::no_match(0.0);
        };

        let frames = match self.store.fetch_frames(location) {
            Ok(frames) => frames,
            Err(e) => {
                tracing::warn!("Failed to fetch landmarks for {}: {}", location, e);
                return LocalizationResult::no_match(0.0);
            }
        };

        self.localize_against(live, &frames)
    }

    /// Localize against an explicit frame list.
    pub fn localize_against(
        &self,
        live: &DescriptorSet,
        frames: &[LandmarkFrame],
    ) -> LocalizationResult {
        if live.len() < self.config.min_keypoints || frames.is_empty() {
            return LocalizationResult::no_match(0.0);
        }

        let mut best: Option<Candidate> = None;

        for frame in frames {
            if frame.descriptors.is_empty() {
                continue;
            }

            let score = self
                .matcher
                .match_score(live.descriptors(), frame.descriptors.descriptors());

            tracing::trace!(
                "Frame {} (seq {}) scored {}",
                frame.id,
                frame.sequence_index,
                score
            );

            let better = match best {
                None => true,
                Some(b) => {
                    score > b.score || (score == b.score && frame.sequence_index < b.sequence_index)
                }
            };
            if better {
                best = Some(Candidate {
                    frame_id: frame.id,
                    sequence_index: frame.sequence_index,
                    score,
                });
            }
        }

        match best {
            Some(b) if b.score >= self.config.min_match_score => LocalizationResult {
                frame_id: Some(b.frame_id),
                confidence: b.score as f32,
                sequence_index: Some(b.sequence_index),
            },
            Some(b) => LocalizationResult::no_match(b.score as f32),
            None => LocalizationResult::no_match(0.0),
        }
    }
}
