//! Breathing phase scheduler.
//!
//! Like a stopwatch, the engine keeps no thread of its own. The host calls
//! `tick()` once per display frame and the engine derives everything from
//! the wall clock: active time is `now - start - total_paused`.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused <-> Running) -> (Completed | Cancelled)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = BreathingEngine::new(technique);
//! engine.start();
//! // Once per frame:
//! match engine.tick() {
//!     Some(TickOutcome::Progress { position, .. }) => render(position),
//!     Some(TickOutcome::Completed(event)) => finish(event),
//!     None => {} // paused, idle, or finished
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use super::phase::PhasePosition;
use super::technique::Technique;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

/// What one call to `tick()` produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Progress {
        position: PhasePosition,
        elapsed_secs: f64,
        /// Set on the tick where the cycle counter advanced.
        cycle_completed: Option<u64>,
    },
    /// The session reached its natural end on this tick.
    Completed(Event),
}

/// Core breathing engine.
#[derive(Debug, Clone)]
pub struct BreathingEngine<C: Clock = SystemClock> {
    technique: Technique,
    clock: C,
    state: SessionState,
    start_ms: Option<u64>,
    pause_started_ms: Option<u64>,
    total_paused_ms: u64,
    ended_ms: Option<u64>,
    current_cycle: u64,
}

impl BreathingEngine<SystemClock> {
    pub fn new(technique: Technique) -> Self {
        Self::with_clock(technique, SystemClock)
    }
}

impl<C: Clock> BreathingEngine<C> {
    pub fn with_clock(technique: Technique, clock: C) -> Self {
        Self {
            technique,
            clock,
            state: SessionState::Idle,
            start_ms: None,
            pause_started_ms: None,
            total_paused_ms: 0,
            ended_ms: None,
            current_cycle: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn technique(&self) -> &Technique {
        &self.technique
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    pub fn cycles_completed(&self) -> u64 {
        self.current_cycle
    }

    pub fn total_paused_ms(&self) -> u64 {
        self.total_paused_ms
    }

    /// Active milliseconds since start. Frozen while paused and after the end.
    pub fn elapsed_ms(&self) -> u64 {
        let Some(start) = self.start_ms else {
            return 0;
        };
        let now = match self.state {
            SessionState::Paused => self.pause_started_ms.unwrap_or(start),
            SessionState::Completed | SessionState::Cancelled => self.ended_ms.unwrap_or(start),
            _ => self.clock.now_ms(),
        };
        now.saturating_sub(start).saturating_sub(self.total_paused_ms)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_ms() as f64 / 1000.0
    }

    pub fn remaining_secs(&self) -> f64 {
        (self.technique.total_secs() - self.elapsed_secs()).max(0.0)
    }

    /// Current position in the schedule, or `None` before start.
    pub fn position(&self) -> Option<PhasePosition> {
        self.start_ms
            .map(|_| PhasePosition::locate(&self.technique, self.elapsed_secs()))
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let position = self.position();
        Event::StateSnapshot {
            state: self.state,
            phase: position.map(|p| p.phase),
            cycle_index: position.map(|p| p.cycle_index).unwrap_or(0),
            elapsed_secs: self.elapsed_secs(),
            remaining_secs: self.remaining_secs(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state != SessionState::Idle {
            return None;
        }
        self.state = SessionState::Running;
        self.start_ms = Some(self.clock.now_ms());
        Some(Event::SessionStarted {
            technique_id: self.technique.id,
            total_secs: self.technique.total_secs(),
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != SessionState::Running {
            return None;
        }
        self.pause_started_ms = Some(self.clock.now_ms());
        self.state = SessionState::Paused;
        Some(Event::SessionPaused {
            elapsed_secs: self.elapsed_secs(),
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != SessionState::Paused {
            return None;
        }
        let paused_ms = self
            .pause_started_ms
            .take()
            .map(|since| self.clock.now_ms().saturating_sub(since))
            .unwrap_or(0);
        self.total_paused_ms = self.total_paused_ms.saturating_add(paused_ms);
        self.state = SessionState::Running;
        Some(Event::SessionResumed {
            elapsed_secs: self.elapsed_secs(),
            paused_ms,
            at: Utc::now(),
        })
    }

    pub fn toggle_pause(&mut self) -> Option<Event> {
        match self.state {
            SessionState::Paused => self.resume(),
            _ => self.pause(),
        }
    }

    /// Cancel the session. Without confirmation nothing happens.
    pub fn cancel(&mut self, confirmed: bool) -> Option<Event> {
        if !confirmed || self.state.is_terminal() {
            return None;
        }
        self.finish(SessionState::Cancelled)
    }

    /// Call once per frame.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if self.state != SessionState::Running {
            return None;
        }

        let elapsed = self.elapsed_secs();
        let cycle = self.technique.cycle_duration();
        if elapsed >= self.technique.total_secs() {
            // Only stop once the final hold of the current cycle is underway.
            let cycle_elapsed = elapsed % cycle;
            let hold_end = self.technique.phase_duration(super::Phase::HoldEnd);
            if cycle_elapsed >= cycle - hold_end {
                return self.finish(SessionState::Completed).map(TickOutcome::Completed);
            }
        }

        let position = PhasePosition::locate(&self.technique, elapsed);
        let cycle_completed = if position.cycle_index > self.current_cycle {
            self.current_cycle = position.cycle_index;
            Some(self.current_cycle)
        } else {
            None
        };

        Some(TickOutcome::Progress {
            position,
            elapsed_secs: elapsed,
            cycle_completed,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self, terminal: SessionState) -> Option<Event> {
        let ended = match self.state {
            SessionState::Paused => self.pause_started_ms.unwrap_or_else(|| self.clock.now_ms()),
            _ => self.clock.now_ms(),
        };
        self.ended_ms = Some(ended);
        self.state = terminal;
        let elapsed_secs = self.elapsed_secs();
        let cycles_completed = self.current_cycle;
        Some(match terminal {
            SessionState::Completed => Event::SessionCompleted {
                cycles_completed,
                elapsed_secs,
                at: Utc::now(),
            },
            _ => Event::SessionCancelled {
                cycles_completed,
                elapsed_secs,
                at: Utc::now(),
            },
        })
    }
}
