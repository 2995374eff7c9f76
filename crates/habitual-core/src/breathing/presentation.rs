//! Pure mappings from a schedule position to what the guide shows.

use serde::{Deserialize, Serialize};

use super::technique::Phase;

/// Smallest balloon size, as a percentage of the usable range.
pub const BALLOON_MIN_PCT: f64 = 10.0;
/// Largest balloon size, as a percentage of the usable range.
pub const BALLOON_MAX_PCT: f64 = 90.0;

/// Balloon size metric for a phase and its progress, clamped to [10, 90].
pub fn balloon_percent(phase: Phase, progress: f64) -> f64 {
    let span = BALLOON_MAX_PCT - BALLOON_MIN_PCT;
    let pct = match phase {
        Phase::Inhale => BALLOON_MIN_PCT + progress * span,
        Phase::HoldStart => BALLOON_MAX_PCT,
        Phase::Exhale => BALLOON_MAX_PCT - progress * span,
        Phase::HoldEnd => BALLOON_MIN_PCT,
    };
    pct.clamp(BALLOON_MIN_PCT, BALLOON_MAX_PCT)
}

/// Converts the size metric into pixels for a given viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalloonSizer {
    pub min_px: f64,
    pub max_px: f64,
}

impl BalloonSizer {
    pub const DEFAULT_VIEWPORT: f64 = 420.0;

    /// Bounds derived from viewport width: the minimum is 10% of the width
    /// but never below `floor_px`; the maximum is 90% but never above `cap_px`.
    pub fn for_viewport(viewport_width: f64, floor_px: f64, cap_px: f64) -> Self {
        let width = if viewport_width > 0.0 {
            viewport_width
        } else {
            Self::DEFAULT_VIEWPORT
        };
        let min_px = floor_px.max(width * 0.10);
        let max_px = cap_px.min(width * 0.90).max(min_px);
        Self { min_px, max_px }
    }

    pub fn size_px(&self, percent: f64) -> f64 {
        let percent = percent.clamp(BALLOON_MIN_PCT, BALLOON_MAX_PCT);
        let t = (percent - BALLOON_MIN_PCT) / (BALLOON_MAX_PCT - BALLOON_MIN_PCT);
        self.min_px + (self.max_px - self.min_px) * t
    }

    /// Size shown before the first tick: fully deflated, ready to inhale.
    pub fn initial_px(&self) -> f64 {
        self.min_px
    }
}

impl Default for BalloonSizer {
    fn default() -> Self {
        Self::for_viewport(Self::DEFAULT_VIEWPORT, 40.0, 350.0)
    }
}

pub fn remaining_secs(total_secs: f64, elapsed_secs: f64) -> f64 {
    (total_secs - elapsed_secs).max(0.0)
}

/// Progress bar width: starts at 100 and drains to 0.
pub fn remaining_pct(total_secs: f64, elapsed_secs: f64) -> f64 {
    if total_secs <= 0.0 {
        return 0.0;
    }
    (remaining_secs(total_secs, elapsed_secs) / total_secs * 100.0).min(100.0)
}

/// `M:SS`, seconds truncated.
pub fn format_remaining(secs: f64) -> String {
    let whole = secs.max(0.0).floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

/// Countdown number for the phase, shown only for values 1 through 10.
pub fn countdown(phase_duration: f64, phase_elapsed: f64) -> Option<u8> {
    let count = (phase_duration - phase_elapsed).ceil();
    if (1.0..=10.0).contains(&count) {
        Some(count as u8)
    } else {
        None
    }
}
