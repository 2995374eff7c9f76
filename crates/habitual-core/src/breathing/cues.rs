//! Audio and haptic cue planning.
//!
//! The planner decides *what* should sound on a tick; the sinks decide *how*.
//! Each phase instance (cycle index + phase) gets exactly one opening cue and
//! one haptic pulse, followed by a spoken countdown where every number plays
//! at most once.

use std::time::Duration;

use super::locale::Locale;
use super::phase::PhasePosition;
use super::technique::{Phase, PhaseCue};
use crate::error::CueError;

/// How far into a phase its opening cue may still fire.
pub const PHASE_START_WINDOW: Duration = Duration::from_millis(100);
/// Countdown delay used until the sink reports the real length of a phase cue.
pub const DEFAULT_PHASE_CUE_DURATION: Duration = Duration::from_millis(500);
/// Length of the haptic pulse at each phase start.
pub const HAPTIC_PULSE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCue {
    PhaseInhale,
    PhaseExhale,
    PhaseHold,
    /// Spoken number, 1 through 10.
    Count(u8),
}

impl AudioCue {
    pub fn for_phase(phase: Phase) -> Self {
        match phase.cue() {
            PhaseCue::Inhale => AudioCue::PhaseInhale,
            PhaseCue::Exhale => AudioCue::PhaseExhale,
            PhaseCue::Hold => AudioCue::PhaseHold,
        }
    }

    pub fn file_name(&self) -> String {
        match self {
            AudioCue::PhaseInhale => "phase_inhale.mp3".into(),
            AudioCue::PhaseExhale => "phase_exhale.mp3".into(),
            AudioCue::PhaseHold => "phase_hold.mp3".into(),
            AudioCue::Count(n) => format!("count_{n}.mp3"),
        }
    }

    pub fn asset_path(&self, locale: Locale) -> String {
        format!("{}{}", locale.audio_base_path(), self.file_name())
    }

    /// Every recording the guide may request: three phase cues and ten counts.
    pub fn manifest() -> Vec<AudioCue> {
        let mut cues = vec![AudioCue::PhaseInhale, AudioCue::PhaseExhale, AudioCue::PhaseHold];
        cues.extend((1..=10).map(AudioCue::Count));
        cues
    }
}

/// Where audio cues end up. Implemented by the host.
pub trait AudioSink {
    /// Fetch one asset ahead of time. Missing assets are reported, not fatal.
    fn load(&mut self, _cue: &AudioCue, _path: &str) -> Result<(), CueError> {
        Ok(())
    }

    fn play(&mut self, cue: &AudioCue) -> Result<(), CueError>;

    /// Whether the asset has buffered enough to start immediately.
    fn is_ready(&self, _cue: &AudioCue) -> bool {
        true
    }

    /// Measured length of the phase cue recording, if known.
    fn phase_cue_duration(&self) -> Option<Duration> {
        None
    }
}

/// Vibration motor or equivalent.
pub trait HapticSink {
    fn vibrate(&mut self, pulse: Duration) -> Result<(), CueError>;
}

/// Cues due on one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CuePlan {
    /// Set on the first tick of a phase instance.
    pub phase_started: Option<Phase>,
    pub phase_cue: Option<AudioCue>,
    pub count_cue: Option<AudioCue>,
    pub haptic: Option<Duration>,
}

impl CuePlan {
    pub fn is_empty(&self) -> bool {
        self.phase_started.is_none()
            && self.phase_cue.is_none()
            && self.count_cue.is_none()
            && self.haptic.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CuePlanner {
    current: Option<(u64, Phase)>,
    last_count: Option<u8>,
}

impl CuePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide the cues for this tick. `count_delay` is how long the opening
    /// cue takes to finish before numbers start.
    pub fn plan(&mut self, position: &PhasePosition, count_delay: Duration) -> CuePlan {
        let mut plan = CuePlan::default();
        let key = (position.cycle_index, position.phase);
        let entering = self.current != Some(key);
        if entering {
            self.current = Some(key);
            self.last_count = None;
            plan.phase_started = Some(position.phase);
        }

        let elapsed = Duration::from_secs_f64(position.phase_elapsed.max(0.0));
        if entering && elapsed < PHASE_START_WINDOW {
            plan.phase_cue = Some(AudioCue::for_phase(position.phase));
            plan.haptic = Some(HAPTIC_PULSE);
        }

        if elapsed >= count_delay {
            let count = super::presentation::countdown(position.phase_duration, position.phase_elapsed);
            if let Some(n) = count {
                if self.last_count != Some(n) {
                    self.last_count = Some(n);
                    plan.count_cue = Some(AudioCue::Count(n));
                }
            }
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breathing::Technique;

    fn at(t: &Technique, secs: f64) -> PhasePosition {
        PhasePosition::locate(t, secs)
    }

    #[test]
    fn asset_paths_follow_locale() {
        assert_eq!(
            AudioCue::PhaseHold.asset_path(Locale::Ru),
            "/static/audio/ru/phase_hold.mp3"
        );
        assert_eq!(AudioCue::Count(7).asset_path(Locale::En), "/static/audio/en/count_7.mp3");
        assert_eq!(AudioCue::manifest().len(), 13);
    }

    #[test]
    fn phase_cue_and_pulse_fire_once_per_phase() {
        let t = Technique::new(4, 4, 4, 4, 1).unwrap();
        let mut planner = CuePlanner::new();

        let first = planner.plan(&at(&t, 0.0), DEFAULT_PHASE_CUE_DURATION);
        assert_eq!(first.phase_cue, Some(AudioCue::PhaseInhale));
        assert_eq!(first.haptic, Some(HAPTIC_PULSE));

        let second = planner.plan(&at(&t, 0.05), DEFAULT_PHASE_CUE_DURATION);
        assert_eq!(second.phase_cue, None);
        assert_eq!(second.haptic, None);

        let hold = planner.plan(&at(&t, 4.01), DEFAULT_PHASE_CUE_DURATION);
        assert_eq!(hold.phase_cue, Some(AudioCue::PhaseHold));
        assert_eq!(hold.phase_started, Some(Phase::HoldStart));
    }

    #[test]
    fn countdown_plays_each_number_once_after_the_phase_cue() {
        let t = Technique::new(4, 4, 4, 4, 1).unwrap();
        let mut planner = CuePlanner::new();
        let mut counts = Vec::new();
        let mut secs = 0.0;
        while secs < 4.0 {
            if let Some(AudioCue::Count(n)) =
                planner.plan(&at(&t, secs), DEFAULT_PHASE_CUE_DURATION).count_cue
            {
                counts.push(n);
            }
            secs += 1.0 / 60.0;
        }
        assert_eq!(counts, vec![4, 3, 2, 1]);
    }

    #[test]
    fn late_first_frame_skips_opening_cue() {
        let t = Technique::new(4, 4, 4, 4, 1).unwrap();
        let mut planner = CuePlanner::new();
        let plan = planner.plan(&at(&t, 1.5), DEFAULT_PHASE_CUE_DURATION);
        assert_eq!(plan.phase_started, Some(Phase::Inhale));
        assert_eq!(plan.phase_cue, None);
        assert_eq!(plan.count_cue, Some(AudioCue::Count(3)));
    }

    #[test]
    fn same_phase_in_next_cycle_cues_again() {
        let t = Technique::new(4, 4, 4, 4, 1).unwrap();
        let mut planner = CuePlanner::new();
        planner.plan(&at(&t, 0.0), DEFAULT_PHASE_CUE_DURATION);
        let next = planner.plan(&at(&t, 16.02), DEFAULT_PHASE_CUE_DURATION);
        assert_eq!(next.phase_cue, Some(AudioCue::PhaseInhale));
    }
}
