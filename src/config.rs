//! Configuration loading for DrishtiNav

use crate::error::{DrishtiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DrishtiConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub localization: LocalizationConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub obstacles: ObstacleConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Landmark store settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StoreConfig {
    /// JSON snapshot file. In-memory only when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Prefix used when recording image references for captured frames
    #[serde(default = "default_frames_dir")]
    pub frames_dir: String,
}

/// Landmark matching thresholds
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LocalizationConfig {
    /// Live frames with fewer keypoints are rejected outright (default: 10)
    #[serde(default = "default_min_keypoints")]
    pub min_keypoints: usize,

    /// Hamming distance below which a cross-checked match counts (default: 50)
    #[serde(default = "default_max_match_distance")]
    pub max_match_distance: u32,

    /// Match score needed to accept a landmark (default: 30)
    #[serde(default = "default_min_match_score")]
    pub min_match_score: usize,
}

/// Mapping loop settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MappingConfig {
    /// Seconds between landmark captures (default: 0.5)
    #[serde(default = "default_capture_interval")]
    pub capture_interval_secs: f32,

    /// A frame is kept only with more descriptors than this (default: 50)
    #[serde(default = "default_min_descriptors")]
    pub min_descriptors: usize,

    /// Poll interval of the mapping loop in milliseconds (default: 100)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Navigation loop settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NavigationConfig {
    /// Seconds between localization ticks (default: 1.0)
    #[serde(default = "default_localization_period")]
    pub localization_period_secs: f32,

    /// Seconds between obstacle checks (default: 0.5)
    #[serde(default = "default_obstacle_period")]
    pub obstacle_period_secs: f32,

    /// Seconds between spoken instructions (default: 5.0)
    #[serde(default = "default_instruction_period")]
    pub instruction_period_secs: f32,

    /// Poll interval of the navigation loop in milliseconds (default: 100)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Distance between consecutive landmarks in meters (default: 0.7)
    #[serde(default = "default_step_distance")]
    pub step_distance: f32,

    /// Obstacles closer than this trigger a spoken warning (default: 1.5)
    #[serde(default = "default_obstacle_warning_distance")]
    pub obstacle_warning_distance: f32,

    /// Consecutive localization misses before asking the user to look around
    #[serde(default = "default_lost_warning_after")]
    pub lost_warning_after: u32,

    /// Weight of the newest confidence sample in the smoothed value (default: 0.5)
    #[serde(default = "default_confidence_smoothing")]
    pub confidence_smoothing: f32,

    /// Re-plan when localization lands away from the planned path (default: true)
    #[serde(default = "default_replan_on_drift")]
    pub replan_on_drift: bool,

    /// Position difference tolerated before re-planning (default: 1)
    #[serde(default = "default_drift_tolerance")]
    pub drift_tolerance: usize,
}

/// What to do when no obstacle detection model is available
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Report no obstacles
    #[default]
    Empty,
    /// Generate random detections (demos and tests only)
    Synthetic,
}

/// Obstacle detection settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ObstacleConfig {
    #[serde(default)]
    pub fallback: FallbackMode,

    /// Chance of a synthetic detection per check (default: 0.3)
    #[serde(default = "default_synthetic_probability")]
    pub synthetic_probability: f64,

    /// Seed for the synthetic generator. Entropy-seeded when unset.
    #[serde(default)]
    pub synthetic_seed: Option<u64>,
}

/// Simulated walk used by the binary
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Location name to map and navigate
    #[serde(default = "default_sim_location")]
    pub location: String,

    /// Number of landmarks along the simulated route
    #[serde(default = "default_sim_landmarks")]
    pub landmarks: usize,

    /// Descriptors rendered per simulated frame
    #[serde(default = "default_sim_descriptors")]
    pub descriptors_per_frame: usize,

    /// Bits flipped per descriptor to imitate sensor noise
    #[serde(default = "default_sim_noise_bits")]
    pub noise_bits: u32,

    /// Captures spent at each landmark before moving on
    #[serde(default = "default_sim_captures_per_landmark")]
    pub captures_per_landmark: usize,

    /// Seed of the simulated scene
    #[serde(default = "default_sim_seed")]
    pub seed: u64,

    /// Give up on the simulated trip after this many seconds
    #[serde(default = "default_sim_timeout")]
    pub timeout_secs: f32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            frames_dir: default_frames_dir(),
        }
    }
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            min_keypoints: default_min_keypoints(),
            max_match_distance: default_max_match_distance(),
            min_match_score: default_min_match_score(),
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            capture_interval_secs: default_capture_interval(),
            min_descriptors: default_min_descriptors(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            localization_period_secs: default_localization_period(),
            obstacle_period_secs: default_obstacle_period(),
            instruction_period_secs: default_instruction_period(),
            poll_interval_ms: default_poll_interval_ms(),
            step_distance: default_step_distance(),
            obstacle_warning_distance: default_obstacle_warning_distance(),
            lost_warning_after: default_lost_warning_after(),
            confidence_smoothing: default_confidence_smoothing(),
            replan_on_drift: default_replan_on_drift(),
            drift_tolerance: default_drift_tolerance(),
        }
    }
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            fallback: FallbackMode::default(),
            synthetic_probability: default_synthetic_probability(),
            synthetic_seed: None,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            location: default_sim_location(),
            landmarks: default_sim_landmarks(),
            descriptors_per_frame: default_sim_descriptors(),
            noise_bits: default_sim_noise_bits(),
            captures_per_landmark: default_sim_captures_per_landmark(),
            seed: default_sim_seed(),
            timeout_secs: default_sim_timeout(),
        }
    }
}

// Default value functions
fn default_frames_dir() -> String {
    "data/saved_frames".to_string()
}
fn default_min_keypoints() -> usize {
    10
}
fn default_max_match_distance() -> u32 {
    50
}
fn default_min_match_score() -> usize {
    30
}
fn default_capture_interval() -> f32 {
    0.5
}
fn default_min_descriptors() -> usize {
    50
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_localization_period() -> f32 {
    1.0
}
fn default_obstacle_period() -> f32 {
    0.5
}
fn default_instruction_period() -> f32 {
    5.0
}
fn default_step_distance() -> f32 {
    0.7
} // 1.4 m/s walking speed at a 0.5 s capture interval
fn default_obstacle_warning_distance() -> f32 {
    1.5
}
fn default_lost_warning_after() -> u32 {
    1
}
fn default_confidence_smoothing() -> f32 {
    0.5
}
fn default_replan_on_drift() -> bool {
    true
}
fn default_drift_tolerance() -> usize {
    1
}
fn default_synthetic_probability() -> f64 {
    0.3
}

// Simulation defaults
fn default_sim_location() -> String {
    "kitchen".to_string()
}
fn default_sim_landmarks() -> usize {
    6
}
fn default_sim_descriptors() -> usize {
    120
}
fn default_sim_noise_bits() -> u32 {
    8
}
fn default_sim_captures_per_landmark() -> usize {
    2
}
fn default_sim_seed() -> u64 {
    7
}
fn default_sim_timeout() -> f32 {
    120.0
}

impl DrishtiConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DrishtiError::Config(format!("Failed to read config file: {}", e)))?;
        let config: DrishtiConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the control loops cannot run with.
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("mapping.capture_interval_secs", self.mapping.capture_interval_secs),
            (
                "navigation.localization_period_secs",
                self.navigation.localization_period_secs,
            ),
            (
                "navigation.obstacle_period_secs",
                self.navigation.obstacle_period_secs,
            ),
            (
                "navigation.instruction_period_secs",
                self.navigation.instruction_period_secs,
            ),
        ];
        for (name, value) in periods {
            if !(value.is_finite() && value >= 0.0) {
                return Err(DrishtiError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.navigation.confidence_smoothing) {
            return Err(DrishtiError::Config(format!(
                "navigation.confidence_smoothing must be within [0, 1], got {}",
                self.navigation.confidence_smoothing
            )));
        }
        if self.navigation.step_distance < 0.0 {
            return Err(DrishtiError::Config(
                "navigation.step_distance must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl MappingConfig {
    pub fn capture_interval(&self) -> Duration {
        Duration::from_secs_f32(self.capture_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl NavigationConfig {
    pub fn localization_period(&self) -> Duration {
        Duration::from_secs_f32(self.localization_period_secs)
    }

    pub fn obstacle_period(&self) -> Duration {
        Duration::from_secs_f32(self.obstacle_period_secs)
    }

    pub fn instruction_period(&self) -> Duration {
        Duration::from_secs_f32(self.instruction_period_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_field_guide_values() {
        let config = DrishtiConfig::default();
        assert_eq!(config.localization.min_keypoints, 10);
        assert_eq!(config.localization.max_match_distance, 50);
        assert_eq!(config.localization.min_match_score, 30);
        assert_eq!(config.mapping.min_descriptors, 50);
        assert_eq!(config.navigation.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.navigation.instruction_period(), Duration::from_secs(5));
        assert!(config.store.path.is_none());
        assert_eq!(config.obstacles.fallback, FallbackMode::Empty);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: DrishtiConfig = toml::from_str(
            r#"
            [navigation]
            instruction_period_secs = 2.0
            replan_on_drift = false

            [obstacles]
            fallback = "synthetic"
            synthetic_seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.navigation.instruction_period_secs, 2.0);
        assert!(!config.navigation.replan_on_drift);
        assert_eq!(config.navigation.localization_period_secs, 1.0);
        assert_eq!(config.obstacles.fallback, FallbackMode::Synthetic);
        assert_eq!(config.obstacles.synthetic_seed, Some(42));
        assert_eq!(config.localization.min_match_score, 30);
    }

    #[test]
    fn test_validate_rejects_bad_smoothing() {
        let mut config = DrishtiConfig::default();
        config.navigation.confidence_smoothing = 1.5;
        assert!(matches!(config.validate(), Err(DrishtiError::Config(_))));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let result = DrishtiConfig::load(Path::new("/nonexistent/drishti.toml"));
        assert!(matches!(result, Err(DrishtiError::Config(_))));
    }
}
