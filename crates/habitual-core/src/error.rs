//! Core error types for habitual-core.
//!
//! The hierarchy mirrors the three ways things go wrong in this system:
//! talking to the server, reading local configuration, and accepting bad
//! input from the host page. Cue playback has its own small error type
//! because those failures are always logged and swallowed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for habitual-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// HTTP API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while talking to the backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused, reset, timeout).
    #[error("Request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status and no usable JSON body.
    #[error("Server returned HTTP {status} for {path}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    /// The configured base URL cannot be joined with an endpoint path.
    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the failure happened before any response arrived.
    pub fn is_connection(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not determine or create the configuration directory
    #[error("Configuration directory unavailable: {0}")]
    DirUnavailable(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A phase duration was zero
    #[error("Invalid value for '{field}': duration must be positive")]
    NonPositiveDuration { field: &'static str },

    /// The declared cycle length disagrees with the sum of the phases
    #[error("cycle_duration is {declared}s but phases sum to {actual}s")]
    CycleMismatch { declared: u32, actual: u32 },

    /// Activity type outside the known enumeration
    #[error("Unknown activity type: {0}")]
    UnknownActivity(String),
}

/// Audio and haptic cue failures. Never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CueError {
    /// Asset could not be fetched or decoded
    #[error("Audio asset missing: {0}")]
    AssetMissing(String),

    /// Playback was refused by the output device
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// The host has no such capability
    #[error("Capability unsupported: {0}")]
    Unsupported(&'static str),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::InvalidValue {
            key: "<file>".into(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
