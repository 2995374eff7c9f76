//! Guided breathing: a wall-clock phase scheduler plus the pieces that turn
//! its position into a balloon, readouts, cues and server telemetry.

mod clock;
mod cues;
mod engine;
mod guide;
mod locale;
mod phase;
mod presentation;
mod session;
mod technique;
mod view;

pub use clock::{Clock, ManualClock, SystemClock};
pub use cues::{
    AudioCue, AudioSink, CuePlan, CuePlanner, HapticSink, DEFAULT_PHASE_CUE_DURATION, HAPTIC_PULSE,
    PHASE_START_WINDOW,
};
pub use engine::{BreathingEngine, SessionState, TickOutcome};
pub use guide::{
    BreathingGuide, Confirm, FrameOutcome, GuideOptions, SessionEnd, COMPLETION_REDIRECT_DELAY,
    SESSION_EXIT_PATH,
};
pub use locale::Locale;
pub use phase::PhasePosition;
pub use presentation::{
    balloon_percent, countdown, format_remaining, remaining_pct, remaining_secs, BalloonSizer,
    BALLOON_MAX_PCT, BALLOON_MIN_PCT,
};
pub use session::{
    SessionAction, SessionApi, SessionId, SessionReporter, SessionRequest, SessionResponse,
};
pub use technique::{Phase, PhaseCue, Technique};
pub use view::{BarElement, Frame, GuideView, GuideViewBuilder, SizedElement, TextElement};
