//! # Habitual Core Library
//!
//! Client-side logic for a habit tracker with a guided breathing exercise.
//! Every host (the `habitual` CLI, or any other front end) drives the same
//! library and supplies only rendering, sound and input.
//!
//! ## Architecture
//!
//! - **Breathing**: A wall-clock phase scheduler that the host ticks once
//!   per display frame, plus cue planning and session telemetry
//! - **Tracker**: Activity badges with a per-badge in-flight guard and
//!   feedback animations
//! - **API**: HTTP client for the tap and session endpoints
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`BreathingEngine`]: Phase scheduler state machine
//! - [`BreathingGuide`]: Drives view, cues and telemetry from the engine
//! - [`ActivityTracker`]: Badge click handling
//! - [`ApiClient`]: Backend access
//! - [`Config`]: Client configuration

pub mod api;
pub mod breathing;
pub mod error;
pub mod events;
pub mod storage;
pub mod tracker;

pub use api::ApiClient;
pub use breathing::{
    BreathingEngine, BreathingGuide, Locale, Phase, SessionReporter, SessionState, Technique,
    TickOutcome,
};
pub use error::{ApiError, ConfigError, CoreError, CueError, Result, ValidationError};
pub use events::Event;
pub use storage::Config;
pub use tracker::{ActivityKind, ActivityTracker, ActivityType, BadgeId, ClickOutcome, Effect};
