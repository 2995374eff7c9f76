use serde::{Deserialize, Serialize};

use super::technique::{Phase, Technique};

/// Where a given moment of active time falls in the breathing schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhasePosition {
    pub phase: Phase,
    /// Seconds elapsed since the phase began.
    pub phase_elapsed: f64,
    pub phase_duration: f64,
    /// `phase_elapsed / phase_duration`, within [0, 1].
    pub progress: f64,
    /// Zero-based index of the cycle in progress.
    pub cycle_index: u64,
    /// Seconds elapsed since the current cycle began.
    pub cycle_elapsed: f64,
}

impl PhasePosition {
    /// Locate `elapsed` active seconds within the technique's repeating cycle.
    ///
    /// Pure function of its inputs. Negative input is treated as zero.
    pub fn locate(technique: &Technique, elapsed: f64) -> Self {
        let elapsed = elapsed.max(0.0);
        let cycle = technique.cycle_duration();
        let cycle_index = (elapsed / cycle).floor() as u64;
        let cycle_elapsed = elapsed % cycle;

        let mut boundary = 0.0;
        let mut selected = Phase::HoldEnd;
        let mut phase_start = cycle - technique.phase_duration(Phase::HoldEnd);
        for phase in Phase::ALL {
            let duration = technique.phase_duration(phase);
            if cycle_elapsed < boundary + duration {
                selected = phase;
                phase_start = boundary;
                break;
            }
            boundary += duration;
        }

        let phase_duration = technique.phase_duration(selected);
        let phase_elapsed = cycle_elapsed - phase_start;
        let progress = (phase_elapsed / phase_duration).clamp(0.0, 1.0);

        Self {
            phase: selected,
            phase_elapsed,
            phase_duration,
            progress,
            cycle_index,
            cycle_elapsed,
        }
    }

    /// Seconds left in the current phase.
    pub fn phase_remaining(&self) -> f64 {
        (self.phase_duration - self.phase_elapsed).max(0.0)
    }
}
