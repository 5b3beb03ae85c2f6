//! Shared state between the command surface and the control loops.
//!
//! Provides:
//! - Mode gate: mapping and navigation are mutually exclusive, and every
//!   transition goes through one mutex
//! - Session epoch: each started session gets a fresh epoch, and loop writes
//!   tagged with an older epoch are discarded
//! - Read-only status snapshot for presentation layers

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::capabilities::Detection;
use crate::error::{DrishtiError, Result};

/// Operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// No active session.
    #[default]
    Idle,
    /// Recording landmarks for a location.
    Mapping,
    /// Guiding the user to a destination.
    Navigating,
}

impl Mode {
    /// Noun used in user-facing messages.
    fn label(self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Mapping => "mapping",
            Mode::Navigating => "navigation",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of the active session, as shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStatus {
    pub mode: Mode,
    /// Location being mapped
    pub current_location: Option<String>,
    /// Landmarks stored so far in this mapping session
    pub mapping_frames: usize,
    /// Navigation destination
    pub destination: Option<String>,
    /// Sequence index of the last resolved landmark
    pub current_position: Option<usize>,
    /// Latest normalized confidence (0-100)
    pub confidence: f32,
    pub smoothed_confidence: f32,
    /// Latest detections, most urgent first
    pub obstacles: Vec<Detection>,
    pub navigation_instruction: String,
    pub path_length: usize,
    pub step_index: usize,
}

#[derive(Debug, Default)]
struct Control {
    mode: Mode,
    epoch: u64,
}

/// Shared state between all threads.
#[derive(Debug, Default)]
pub struct SharedState {
    /// Mode gate. Always taken before `status`.
    control: Mutex<Control>,
    status: RwLock<SessionStatus>,
    /// Shutdown signal for graceful termination
    shutdown: AtomicBool,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `mode` from idle and return the new session epoch.
    ///
    /// `init` fills in the fresh status while the gate is held.
    pub fn begin(&self, mode: Mode, init: impl FnOnce(&mut SessionStatus)) -> Result<u64> {
        let mut control = self.control.lock();
        if control.mode != Mode::Idle {
            return Err(DrishtiError::Busy(format!(
                "cannot start {} while {} is active",
                mode, control.mode
            )));
        }
        control.mode = mode;
        control.epoch += 1;

        let mut status = self.status.write();
        *status = SessionStatus {
            mode,
            ..SessionStatus::default()
        };
        init(&mut *status);

        tracing::info!("Mode {} -> {} (epoch {})", Mode::Idle, mode, control.epoch);
        Ok(control.epoch)
    }

    /// Stop `mode` on request. Returns the status as it was when stopped.
    pub fn stop(&self, mode: Mode) -> Result<SessionStatus> {
        let mut control = self.control.lock();
        if control.mode != mode || mode == Mode::Idle {
            return Err(DrishtiError::InvalidState(format!("Not in {} mode", mode)));
        }
        control.mode = Mode::Idle;
        control.epoch += 1;

        let mut status = self.status.write();
        let previous = status.clone();
        *status = SessionStatus::default();

        tracing::info!("Mode {} -> {} (stopped)", mode, Mode::Idle);
        Ok(previous)
    }

    /// End the session with `epoch` from inside its own loop.
    ///
    /// Returns false if the session was already stopped or replaced. The last
    /// position and instruction stay visible.
    pub fn finish(&self, epoch: u64, mode: Mode) -> bool {
        let mut control = self.control.lock();
        if control.epoch != epoch || control.mode != mode {
            return false;
        }
        control.mode = Mode::Idle;
        control.epoch += 1;

        let mut status = self.status.write();
        status.mode = Mode::Idle;
        status.destination = None;
        status.current_location = None;
        status.path_length = 0;
        status.step_index = 0;
        status.obstacles.clear();

        tracing::info!("Mode {} -> {} (finished)", mode, Mode::Idle);
        true
    }

    /// Whether `epoch` still names the running session.
    pub fn is_current(&self, epoch: u64) -> bool {
        let control = self.control.lock();
        control.epoch == epoch && control.mode != Mode::Idle
    }

    /// Apply `f` to the status if `epoch` is still current.
    ///
    /// The gate is held for the duration of `f`, so a concurrent stop either
    /// happens before (and `f` is skipped) or waits until `f` returns.
    pub fn update<T>(&self, epoch: u64, f: impl FnOnce(&mut SessionStatus) -> T) -> Option<T> {
        let control = self.control.lock();
        if control.epoch != epoch || control.mode == Mode::Idle {
            return None;
        }
        let mut status = self.status.write();
        Some(f(&mut *status))
    }

    /// Copy of the current status.
    pub fn snapshot(&self) -> SessionStatus {
        self.status.read().clone()
    }

    pub fn mode(&self) -> Mode {
        self.control.lock().mode
    }

    /// Signal shutdown.
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Check if shutdown is signaled.
    pub fn should_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}
