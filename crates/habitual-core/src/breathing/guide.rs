//! The breathing guide: one scheduler tick drives the balloon, the displays,
//! the cues and the telemetry.

use std::time::Duration;

use chrono::Utc;

use super::clock::{Clock, SystemClock};
use super::cues::{AudioCue, AudioSink, CuePlanner, HapticSink, DEFAULT_PHASE_CUE_DURATION};
use super::engine::{BreathingEngine, SessionState, TickOutcome};
use super::locale::Locale;
use super::phase::PhasePosition;
use super::presentation::BalloonSizer;
use super::session::{SessionId, SessionReporter};
use super::view::{Frame, GuideView};
use crate::error::CueError;
use crate::events::Event;

/// Where the host navigates once a session ends.
pub const SESSION_EXIT_PATH: &str = "/breathe/";
/// Pause between the completion message and navigation.
pub const COMPLETION_REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Interactive yes/no prompt supplied by the host.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideOptions {
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
    pub locale: Locale,
    pub sizer: BalloonSizer,
}

impl Default for GuideOptions {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            vibration_enabled: true,
            locale: Locale::default(),
            sizer: BalloonSizer::default(),
        }
    }
}

/// How a session ended and what the host should do next.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEnd {
    pub state: SessionState,
    pub cycles_completed: u64,
    /// Message to show before navigating, if any.
    pub message: Option<String>,
    pub redirect_to: &'static str,
    pub redirect_after: Duration,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Continue(Frame),
    /// Nothing to draw: idle, paused, or already finished. The host should
    /// stop requesting frames until the state changes.
    Halted,
    Finished(SessionEnd),
}

pub struct BreathingGuide<C: Clock = SystemClock> {
    engine: BreathingEngine<C>,
    view: GuideView,
    planner: CuePlanner,
    audio: Option<Box<dyn AudioSink>>,
    haptics: Option<Box<dyn HapticSink>>,
    reporter: SessionReporter,
    options: GuideOptions,
    pending: Vec<Event>,
}

impl<C: Clock> BreathingGuide<C> {
    pub fn new(
        engine: BreathingEngine<C>,
        view: GuideView,
        reporter: SessionReporter,
        options: GuideOptions,
    ) -> Self {
        Self {
            engine,
            view,
            planner: CuePlanner::new(),
            audio: None,
            haptics: None,
            reporter,
            options,
            pending: Vec::new(),
        }
    }

    pub fn with_audio(mut self, sink: impl AudioSink + 'static) -> Self {
        self.audio = Some(Box::new(sink));
        self
    }

    pub fn with_haptics(mut self, sink: impl HapticSink + 'static) -> Self {
        self.haptics = Some(Box::new(sink));
        self
    }

    pub fn engine(&self) -> &BreathingEngine<C> {
        &self.engine
    }

    pub fn state(&self) -> SessionState {
        self.engine.state()
    }

    /// Register the session, preload audio and start the clock.
    pub fn start(&mut self) -> Option<Event> {
        if self.engine.state() != SessionState::Idle {
            return None;
        }
        self.reporter.start(
            self.engine.technique().id,
            self.options.sound_enabled,
            self.options.vibration_enabled,
        );

        if self.options.sound_enabled {
            self.preload_audio();
        }

        self.view.prime(self.options.sizer.initial_px());
        self.view.set_pause_label(self.options.locale.pause_label());
        let event = self.engine.start();
        tracing::info!(
            technique = %self.engine.technique().name,
            total_secs = self.engine.technique().total_secs(),
            "Starting breathing animation"
        );
        event
    }

    /// One display frame.
    pub fn frame(&mut self) -> FrameOutcome {
        match self.engine.tick() {
            None => FrameOutcome::Halted,
            Some(TickOutcome::Completed(event)) => {
                let cycles = self.engine.cycles_completed();
                self.reporter.complete(cycles);
                tracing::info!(cycles, "breathing session completed");
                FrameOutcome::Finished(SessionEnd {
                    state: SessionState::Completed,
                    cycles_completed: cycles,
                    message: Some(self.options.locale.completed_message().to_string()),
                    redirect_to: SESSION_EXIT_PATH,
                    redirect_after: COMPLETION_REDIRECT_DELAY,
                    event,
                })
            }
            Some(TickOutcome::Progress {
                position,
                elapsed_secs,
                cycle_completed,
            }) => {
                if let Some(cycles) = cycle_completed {
                    tracing::debug!(cycles, "cycle boundary crossed");
                    self.reporter.cycles(cycles);
                    self.pending.push(Event::CycleCompleted {
                        cycles_completed: cycles,
                        at: Utc::now(),
                    });
                }
                let frame = Frame::compose(
                    &position,
                    elapsed_secs,
                    self.engine.technique().total_secs(),
                    &self.options.sizer,
                    self.options.locale,
                );
                self.view.render(&frame);
                self.dispatch_cues(&position);
                FrameOutcome::Continue(frame)
            }
        }
    }

    /// Phase and cycle events produced since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending)
    }

    pub fn toggle_pause(&mut self) -> Option<Event> {
        let event = self.engine.toggle_pause()?;
        let label = if self.engine.is_paused() {
            self.options.locale.resume_label()
        } else {
            self.options.locale.pause_label()
        };
        self.view.set_pause_label(label);
        Some(event)
    }

    /// The page was hidden. A running session pauses; it never resumes on its own.
    pub fn on_hidden(&mut self) -> Option<Event> {
        if self.engine.is_running() {
            self.toggle_pause()
        } else {
            None
        }
    }

    /// Ask the user, then cancel. Declining leaves the session untouched.
    pub fn cancel(&mut self, confirm: &mut dyn Confirm) -> Option<SessionEnd> {
        if self.engine.state().is_terminal() {
            return None;
        }
        if !confirm.confirm(self.options.locale.cancel_prompt()) {
            return None;
        }
        let event = self.engine.cancel(true)?;
        let cycles = self.engine.cycles_completed();
        self.reporter.cancel(cycles);
        tracing::info!(cycles, "breathing session cancelled");
        Some(SessionEnd {
            state: SessionState::Cancelled,
            cycles_completed: cycles,
            message: None,
            redirect_to: SESSION_EXIT_PATH,
            redirect_after: Duration::ZERO,
            event,
        })
    }

    /// Tear down and give queued telemetry up to `limit` to reach the server.
    pub async fn shutdown(self, limit: Duration) -> Option<SessionId> {
        self.reporter.finish(limit).await
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn preload_audio(&mut self) {
        let Some(audio) = self.audio.as_mut() else {
            return;
        };
        let locale = self.options.locale;
        for cue in AudioCue::manifest() {
            let path = cue.asset_path(locale);
            if let Err(e) = audio.load(&cue, &path) {
                tracing::warn!("Audio file {path} not loaded: {e}");
            }
        }
    }

    fn dispatch_cues(&mut self, position: &PhasePosition) {
        let delay = self
            .audio
            .as_ref()
            .and_then(|a| a.phase_cue_duration())
            .unwrap_or(DEFAULT_PHASE_CUE_DURATION);
        let plan = self.planner.plan(position, delay);

        if let Some(phase) = plan.phase_started {
            tracing::debug!(phase = phase.as_str(), cycle = position.cycle_index, "phase started");
            self.pending.push(Event::PhaseStarted {
                phase,
                cycle_index: position.cycle_index,
                duration_secs: position.phase_duration,
                at: Utc::now(),
            });
        }

        if self.options.sound_enabled {
            if let Some(audio) = self.audio.as_mut() {
                if let Some(cue) = plan.phase_cue {
                    if let Err(e) = audio.play(&cue) {
                        tracing::warn!("Audio play failed: {e}");
                    }
                }
                if let Some(cue) = plan.count_cue {
                    if !audio.is_ready(&cue) {
                        tracing::debug!(?cue, "count cue not buffered; skipped");
                    } else if let Err(e) = audio.play(&cue) {
                        tracing::warn!("Count audio play failed: {e}");
                    }
                }
            }
        }

        if self.options.vibration_enabled {
            if let (Some(pulse), Some(haptics)) = (plan.haptic, self.haptics.as_mut()) {
                match haptics.vibrate(pulse) {
                    Ok(()) => {}
                    Err(CueError::Unsupported(what)) => {
                        tracing::info!("{what} unavailable; haptic cues off");
                        self.haptics = None;
                    }
                    Err(e) => tracing::warn!("Vibration failed: {e}"),
                }
            }
        }
    }
}
