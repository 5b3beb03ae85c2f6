//! Command results and spoken-command parsing.

use crate::error::Result;

/// Result of a command execution.
pub type CommandResult = Result<CommandResponse>;

/// Response data from command execution.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResponse {
    /// Mapping started.
    MappingStarted {
        /// Location being mapped.
        location: String,
    },

    /// Mapping stopped.
    MappingStopped {
        location: String,
        /// Landmarks stored during the session.
        frames: usize,
    },

    /// Navigation started.
    NavigationStarted { destination: String },

    /// Navigation stopped on request.
    NavigationStopped,

    /// Answer to "where am I".
    Position {
        position: Option<usize>,
        destination: Option<String>,
    },

    /// Emergency message delivered.
    EmergencyAlerted,
}

impl CommandResponse {
    /// Human-readable outcome.
    pub fn message(&self) -> String {
        match self {
            CommandResponse::MappingStarted { location } => format!("Mapping {}", location),
            CommandResponse::MappingStopped { frames, .. } => {
                format!("Mapping complete: {} frames", frames)
            }
            CommandResponse::NavigationStarted { destination } => {
                format!("Navigating to {}", destination)
            }
            CommandResponse::NavigationStopped => "Navigation stopped".to_string(),
            CommandResponse::Position { .. } => "Location query".to_string(),
            CommandResponse::EmergencyAlerted => "Emergency alert sent".to_string(),
        }
    }
}

/// Intent extracted from recognized speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCommand {
    /// Start mapping the named location.
    StartMapping(String),
    /// Stop whichever mode is active.
    Stop,
    /// Navigate to a known location; `None` when none was mentioned.
    Navigate(Option<String>),
    WhereAmI,
    Unknown,
}

/// Location name used when a mapping command names none.
pub const UNNAMED_LOCATION: &str = "unnamed";

/// Parse recognized text against the known location names.
///
/// "stop" is checked first so that "stop mapping" stops rather than starts.
pub fn parse_voice_command(text: &str, locations: &[String]) -> VoiceCommand {
    let text = text.trim().to_lowercase();

    if text.contains("stop") {
        return VoiceCommand::Stop;
    }

    if text.contains("where am i") {
        return VoiceCommand::WhereAmI;
    }

    if text.contains("map") || text.contains("create") {
        let words: Vec<&str> = text.split_whitespace().collect();
        let name = match words.as_slice() {
            [_, .., last] => (*last).to_string(),
            _ => UNNAMED_LOCATION.to_string(),
        };
        return VoiceCommand::StartMapping(name);
    }

    if text.contains("navigate") || text.contains("go to") || text.contains("take me") {
        let destination = locations
            .iter()
            .find(|name| text.contains(&name.to_lowercase()))
            .cloned();
        return VoiceCommand::Navigate(destination);
    }

    VoiceCommand::Unknown
}
