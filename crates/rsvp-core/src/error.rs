//! Error types for rsvp-core.
//!
//! Every error here is returned synchronously to the immediate caller and
//! none is fatal to the process. Background tasks (reminders, the idle
//! sweep) never surface errors: a missing calendar or date at fire time is
//! treated as nothing to do.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by calendar operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// No calendar exists for this reference; the invitation may be expired.
    #[error("empty calendar, the invitation might be expired")]
    InvalidCalendar,

    /// The date is not registered on the calendar.
    #[error("this date is not available anymore")]
    InvalidEvent,

    /// The user already joined this date.
    #[error("event already joined")]
    AlreadyJoined,

    /// The raw date input could not be parsed.
    #[error("unrecognized date: {0}")]
    InvalidDate(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to load configuration from {path}: {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration
    #[error("failed to parse configuration: {0}")]
    ParseFailed(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Core error type for rsvp-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Calendar-state errors
    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
