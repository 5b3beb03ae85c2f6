//! DrishtiNav - landmark-based indoor navigation for visually impaired users
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │             guide / commands / threads              │  ← Command surface, control loops
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                session / shared                     │  ← Trip state machine, mode gate
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │            localization / planning                  │  ← Landmark matching, A*
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │      features / store / capabilities / obstacles    │  ← Foundation
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! A route is mapped by walking it once: every accepted capture becomes a
//! landmark frame and a node in the route's path graph. While navigating,
//! the live view is matched against those landmarks to find the user's
//! position, a route is planned to the end of the path, and directions and
//! obstacle warnings are spoken on fixed cadences.

pub mod capabilities;
pub mod commands;
pub mod config;
pub mod error;
pub mod features;
pub mod guide;
pub mod localization;
pub mod obstacles;
pub mod planning;
pub mod session;
pub mod shared;
pub mod sim;
pub mod store;
pub mod testing;
pub mod threads;
pub mod utils;

pub use capabilities::{
    BoundingBox, Detection, FallbackPolicy, Frame, FrameSource, LogVoice, ObstacleDetector,
    ObstacleSource, Voice,
};
pub use commands::{CommandResponse, CommandResult, VoiceCommand, parse_voice_command};
pub use config::DrishtiConfig;
pub use error::{DrishtiError, Result};
pub use features::{Descriptor, DescriptorSet, FeatureExtractor, KeyPoint};
pub use guide::{Capabilities, Guide};
pub use localization::{LocalizationResult, Localizer};
pub use planning::{NavigationGraph, RoutePlanner};
pub use session::{Instruction, NavigationSession, Navigator, SessionEvent};
pub use shared::{Mode, SessionStatus, SharedState};
pub use store::{LandmarkStore, MemoryStore};
