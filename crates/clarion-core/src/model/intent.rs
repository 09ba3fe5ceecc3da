use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The classified category of an emergency request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum IntentKind {
    /// Immediate life-saving assistance.
    Rescue,
    /// General guidance or status updates.
    Information,
    /// Locating specific resources or contacts.
    Resource,
    /// Nothing matched with enough confidence; ask for clarification.
    Unknown,
}

/// Hazard categories recognized by the keyword tables and the fallback
/// knowledge base.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum HazardKind {
    Flood,
    Wildfire,
    Earthquake,
    Hurricane,
    Tornado,
    Medical,
    General,
}

impl HazardKind {
    /// Keywords whose presence in an utterance indicates this hazard.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Flood => &["flood", "flooding", "water rising", "submerged"],
            Self::Wildfire => &["wildfire", "fire", "burning", "flames", "smoke"],
            Self::Earthquake => &["earthquake", "tremor", "quake", "shaking", "aftershock"],
            Self::Hurricane => &["hurricane", "cyclone", "typhoon", "storm surge", "storm"],
            Self::Tornado => &["tornado", "twister", "funnel cloud"],
            Self::Medical => &[
                "bleeding",
                "heart attack",
                "stroke",
                "wound",
                "ambulance",
                "unconscious",
            ],
            Self::General => &[],
        }
    }
}

/// The outcome of intent classification for one utterance.
///
/// Never mutated after creation; a fresh `Intent` is built when a
/// clarification answer fills in a missing slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    /// Classifier confidence in [0, 1].
    pub confidence: f32,
    pub location: Option<String>,
    pub hazard: Option<HazardKind>,
}

impl Intent {
    pub fn unknown() -> Self {
        Self {
            kind: IntentKind::Unknown,
            confidence: 0.0,
            location: None,
            hazard: None,
        }
    }

    /// Returns a copy with the location slot filled in.
    pub fn with_location(&self, location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..self.clone()
        }
    }

    /// The hazard slot, defaulting to General when nothing was detected.
    pub fn hazard_or_general(&self) -> HazardKind {
        self.hazard.unwrap_or(HazardKind::General)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hazard_serializes_snake_case() {
        let json = serde_json::to_string(&HazardKind::Wildfire).unwrap();
        assert_eq!(json, "\"wildfire\"");
    }

    #[test]
    fn with_location_preserves_other_slots() {
        let intent = Intent {
            kind: IntentKind::Rescue,
            confidence: 0.7,
            location: None,
            hazard: Some(HazardKind::Flood),
        };
        let filled = intent.with_location("Gurdaspur");
        assert_eq!(filled.kind, IntentKind::Rescue);
        assert_eq!(filled.hazard, Some(HazardKind::Flood));
        assert_eq!(filled.location.as_deref(), Some("Gurdaspur"));
    }
}
