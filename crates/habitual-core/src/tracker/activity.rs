use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The habits a badge can count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityType {
    /// A craving that was resisted.
    Resist,
    Smoked,
    Sport,
}

impl ActivityType {
    pub const ALL: [ActivityType; 3] = [ActivityType::Resist, ActivityType::Smoked, ActivityType::Sport];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Resist => "RESIST",
            ActivityType::Smoked => "SMOKED",
            ActivityType::Sport => "SPORT",
        }
    }

    /// Key under which the server reports this type in `counts`.
    pub fn count_key(self) -> &'static str {
        match self {
            ActivityType::Resist => "resist",
            ActivityType::Smoked => "smoked",
            ActivityType::Sport => "sport",
        }
    }
}

impl std::str::FromStr for ActivityType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RESIST" => Ok(ActivityType::Resist),
            "SMOKED" => Ok(ActivityType::Smoked),
            "SPORT" => Ok(ActivityType::Sport),
            _ => Err(ValidationError::UnknownActivity(s.to_string())),
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity type as written on a badge. Markup may carry types this client
/// does not know; those still post to the server but get no effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Known(ActivityType),
    Unknown(String),
}

impl ActivityKind {
    pub fn parse(raw: &str) -> Self {
        raw.parse()
            .map(ActivityKind::Known)
            .unwrap_or_else(|_| ActivityKind::Unknown(raw.to_string()))
    }

    /// Value sent as `activity_type`.
    pub fn wire_name(&self) -> &str {
        match self {
            ActivityKind::Known(t) => t.as_str(),
            ActivityKind::Unknown(raw) => raw,
        }
    }

    pub fn count_key(&self) -> String {
        match self {
            ActivityKind::Known(t) => t.count_key().to_string(),
            ActivityKind::Unknown(raw) => raw.to_lowercase(),
        }
    }

    pub fn effect(&self) -> Option<Effect> {
        match self {
            ActivityKind::Known(t) => Some(Effect::for_activity(*t)),
            ActivityKind::Unknown(_) => None,
        }
    }
}

impl From<ActivityType> for ActivityKind {
    fn from(t: ActivityType) -> Self {
        ActivityKind::Known(t)
    }
}

/// Animation played on a badge after a successful tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    ConfettiBurst,
    GreyOut,
    SuccessGlow,
}

impl Effect {
    pub fn for_activity(activity: ActivityType) -> Self {
        match activity {
            ActivityType::Resist => Effect::ConfettiBurst,
            ActivityType::Smoked => Effect::GreyOut,
            ActivityType::Sport => Effect::SuccessGlow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_type_maps_to_its_own_effect() {
        assert_eq!(Effect::for_activity(ActivityType::Resist), Effect::ConfettiBurst);
        assert_eq!(Effect::for_activity(ActivityType::Smoked), Effect::GreyOut);
        assert_eq!(Effect::for_activity(ActivityType::Sport), Effect::SuccessGlow);
    }

    #[test]
    fn parsing_is_case_insensitive_and_keeps_unknowns() {
        assert_eq!(ActivityKind::parse("sport"), ActivityKind::Known(ActivityType::Sport));
        let odd = ActivityKind::parse("MEDITATE");
        assert_eq!(odd.wire_name(), "MEDITATE");
        assert_eq!(odd.count_key(), "meditate");
        assert_eq!(odd.effect(), None);
    }

    #[test]
    fn serde_uses_upper_case_names() {
        let json = serde_json::to_string(&ActivityType::Smoked).unwrap();
        assert_eq!(json, "\"SMOKED\"");
        assert_eq!(ActivityType::Smoked.count_key(), "smoked");
    }
}
