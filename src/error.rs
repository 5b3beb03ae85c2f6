//! Error types for DrishtiNav

use thiserror::Error;

/// DrishtiNav error type
#[derive(Error, Debug)]
pub enum DrishtiError {
    #[error("Location {0} not found")]
    NotFound(String),

    #[error("Insufficient signal: {0}")]
    InsufficientSignal(String),

    #[error("No route from node {from} to node {to}")]
    NoRoute { from: u64, to: u64 },

    #[error("Frame capture failed: {0}")]
    CaptureFailure(String),

    #[error("Busy: {0}")]
    Busy(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Unrecognized(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for DrishtiError {
    fn from(e: toml::de::Error) -> Self {
        DrishtiError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for DrishtiError {
    fn from(e: serde_json::Error) -> Self {
        DrishtiError::Store(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DrishtiError>;
