use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The four ordered phases of a breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Inhale,
    HoldStart,
    Exhale,
    HoldEnd,
}

/// Which spoken cue opens a phase. Both holds share one recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseCue {
    Inhale,
    Exhale,
    Hold,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Inhale, Phase::HoldStart, Phase::Exhale, Phase::HoldEnd];

    /// The phase that follows this one; `HoldEnd` wraps to the next cycle's `Inhale`.
    pub fn next(self) -> Phase {
        match self {
            Phase::Inhale => Phase::HoldStart,
            Phase::HoldStart => Phase::Exhale,
            Phase::Exhale => Phase::HoldEnd,
            Phase::HoldEnd => Phase::Inhale,
        }
    }

    pub fn cue(self) -> PhaseCue {
        match self {
            Phase::Inhale => PhaseCue::Inhale,
            Phase::Exhale => PhaseCue::Exhale,
            Phase::HoldStart | Phase::HoldEnd => PhaseCue::Hold,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Inhale => "inhale",
            Phase::HoldStart => "hold_start",
            Phase::Exhale => "exhale",
            Phase::HoldEnd => "hold_end",
        }
    }
}

/// A breathing technique as supplied by the host page.
///
/// Durations are whole seconds, the session length is in minutes. The
/// payload may carry a precomputed `cycle_duration`; it is checked against
/// the phase sum and otherwise ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, alias = "name_ru")]
    pub name: String,
    pub inhale: u32,
    pub hold_start: u32,
    pub exhale: u32,
    pub hold_end: u32,
    pub recommended_time_min: u32,
    #[serde(default, skip_serializing)]
    cycle_duration: Option<u32>,
}

impl Technique {
    /// Build and validate a technique.
    ///
    /// # Errors
    /// Returns `ValidationError::NonPositiveDuration` when any phase or the
    /// session length is zero.
    pub fn new(
        inhale: u32,
        hold_start: u32,
        exhale: u32,
        hold_end: u32,
        recommended_time_min: u32,
    ) -> Result<Self, ValidationError> {
        let technique = Self {
            id: None,
            name: String::new(),
            inhale,
            hold_start,
            exhale,
            hold_end,
            recommended_time_min,
            cycle_duration: None,
        };
        technique.validate()?;
        Ok(technique)
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Parse the JSON payload the page embeds for the guide.
    ///
    /// # Errors
    /// Fails on malformed JSON or on any invariant violation.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let technique: Technique = serde_json::from_str(json)?;
        technique.validate()?;
        Ok(technique)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("inhale", self.inhale),
            ("hold_start", self.hold_start),
            ("exhale", self.exhale),
            ("hold_end", self.hold_end),
            ("recommended_time_min", self.recommended_time_min),
        ];
        if let Some(&(field, _)) = fields.iter().find(|(_, v)| *v == 0) {
            return Err(ValidationError::NonPositiveDuration { field });
        }
        if let Some(declared) = self.cycle_duration {
            let actual = self.cycle_secs();
            if declared != actual {
                return Err(ValidationError::CycleMismatch { declared, actual });
            }
        }
        Ok(())
    }

    fn cycle_secs(&self) -> u32 {
        self.inhale
            .saturating_add(self.hold_start)
            .saturating_add(self.exhale)
            .saturating_add(self.hold_end)
    }

    /// Length of one full cycle in seconds.
    pub fn cycle_duration(&self) -> f64 {
        self.cycle_secs() as f64
    }

    /// Recommended session length in seconds.
    pub fn total_secs(&self) -> f64 {
        self.recommended_time_min as f64 * 60.0
    }

    pub fn phase_duration(&self, phase: Phase) -> f64 {
        let secs = match phase {
            Phase::Inhale => self.inhale,
            Phase::HoldStart => self.hold_start,
            Phase::Exhale => self.exhale,
            Phase::HoldEnd => self.hold_end,
        };
        secs as f64
    }

    /// Offset of the phase's start within a cycle, in seconds.
    pub fn phase_offset(&self, phase: Phase) -> f64 {
        Phase::ALL
            .iter()
            .take_while(|p| **p != phase)
            .map(|p| self.phase_duration(*p))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_breathing_cycle_is_sum_of_phases() {
        let t = Technique::new(4, 4, 4, 4, 1).unwrap();
        assert_eq!(t.cycle_duration(), 16.0);
        assert_eq!(t.total_secs(), 60.0);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let err = Technique::new(4, 0, 4, 4, 1).unwrap_err();
        assert_eq!(err, ValidationError::NonPositiveDuration { field: "hold_start" });
    }

    #[test]
    fn page_payload_parses_with_cycle_duration() {
        let json = r#"{"id":7,"name_ru":"Квадрат","inhale":4,"hold_start":4,"exhale":4,
            "hold_end":4,"cycle_duration":16,"recommended_time_min":5}"#;
        let t = Technique::from_json(json).unwrap();
        assert_eq!(t.id, Some(7));
        assert_eq!(t.name, "Квадрат");
        assert_eq!(t.total_secs(), 300.0);
    }

    #[test]
    fn mismatched_cycle_duration_is_rejected() {
        let json = r#"{"inhale":4,"hold_start":7,"exhale":8,"hold_end":1,
            "cycle_duration":19,"recommended_time_min":2}"#;
        assert!(Technique::from_json(json).is_err());
    }

    #[test]
    fn phase_offsets_accumulate_in_order() {
        let t = Technique::new(4, 7, 8, 1, 1).unwrap();
        assert_eq!(t.phase_offset(Phase::Inhale), 0.0);
        assert_eq!(t.phase_offset(Phase::HoldStart), 4.0);
        assert_eq!(t.phase_offset(Phase::Exhale), 11.0);
        assert_eq!(t.phase_offset(Phase::HoldEnd), 19.0);
    }

    #[test]
    fn holds_share_a_cue() {
        assert_eq!(Phase::HoldStart.cue(), Phase::HoldEnd.cue());
        assert_ne!(Phase::Inhale.cue(), Phase::Exhale.cue());
        assert_eq!(Phase::HoldEnd.next(), Phase::Inhale);
    }
}
