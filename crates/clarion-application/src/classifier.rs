//! Pattern-based intent classification.
//!
//! The fast path: keyword tables for distress, resource and
//! information vocabulary, hazard detection, and location slot
//! extraction, all without an external call. The orchestrator only
//! consults the AI backend when the confidence computed here falls
//! below its threshold.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use strum::IntoEnumIterator;

use clarion_core::model::{HazardKind, Intent, IntentKind};

/// Vocabulary signalling immediate life-safety need.
const DISTRESS_WORDS: &[&str] = &[
    "help", "emergency", "trapped", "stuck", "hurt", "injured", "danger", "save", "rescue",
    "drowning", "dying", "sos",
];

/// Vocabulary signalling a lookup for contacts or supplies.
const RESOURCE_WORDS: &[&str] = &[
    "where", "find", "need", "needs", "supplies", "resource", "resources", "contact", "contacts",
    "number", "numbers", "shelter", "shelters", "locate", "food", "blankets",
];

/// Vocabulary signalling a request for guidance or status.
const INFORMATION_WORDS: &[&str] = &[
    "what", "how", "should", "do", "information", "update", "updates", "status", "forecast",
    "prepare", "preparing", "safety", "guidance",
];

static LOCATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // "on the Gurdaspur highway"
        r"on the ([A-Z][A-Za-z]*(?: [A-Z][A-Za-z]*)*) (?:highway|road|bridge|freeway)",
        // "in Austin, Texas" / "in Miami"
        r"\bin ([A-Z][A-Za-z]*(?:,? [A-Z][A-Za-z]*)*)",
        r"\bnear ([A-Z][A-Za-z]*(?: [A-Z][A-Za-z]*)*)",
        r"\bat ([A-Z][A-Za-z]*(?: [A-Z][A-Za-z]*)*)",
        // "Manhattan area"
        r"([A-Z][A-Za-z]*(?: [A-Z][A-Za-z]*)*) area",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("location pattern"))
    .collect()
});

/// Classifies one utterance from keyword patterns alone.
pub fn classify_utterance(text: &str) -> Intent {
    let lower = text.to_lowercase();
    let words: HashSet<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let distress = hits(&words, DISTRESS_WORDS);
    let resource = hits(&words, RESOURCE_WORDS);
    let information = hits(&words, INFORMATION_WORDS);

    let hazard = detect_hazard(&lower);
    let location = extract_location(text);

    // Routing rules, in order:
    // 1. a clear resource majority routes to the resource agent even
    //    when distress vocabulary is present ("need emergency contact
    //    numbers" is a lookup, not a rescue);
    // 2. any distress match routes to rescue, which also settles the
    //    rescue/information tie in favor of life safety;
    // 3. remaining matches route to information, then resource;
    // 4. nothing matched: unknown.
    let (kind, matched) = if resource > distress && resource > information {
        (IntentKind::Resource, resource)
    } else if distress > 0 {
        (IntentKind::Rescue, distress)
    } else if information > 0 {
        (IntentKind::Information, information)
    } else if resource > 0 {
        (IntentKind::Resource, resource)
    } else {
        (IntentKind::Unknown, 0)
    };

    let confidence = if matched == 0 {
        0.0
    } else {
        let hazard_bonus = if hazard.is_some() { 0.15 } else { 0.0 };
        (0.4 + 0.15 * matched as f32 + hazard_bonus).min(0.95)
    };

    Intent {
        kind,
        confidence,
        location,
        hazard,
    }
}

fn hits(words: &HashSet<&str>, table: &[&str]) -> usize {
    table.iter().filter(|w| words.contains(*w)).count()
}

/// First hazard whose vocabulary appears in the lowered text.
pub fn detect_hazard(lower: &str) -> Option<HazardKind> {
    for hazard in HazardKind::iter() {
        if hazard.keywords().iter().any(|k| lower.contains(k)) {
            return Some(hazard);
        }
    }
    None
}

/// Pulls a capitalized place name out of the raw text.
pub fn extract_location(text: &str) -> Option<String> {
    for pattern in LOCATION_PATTERNS.iter() {
        if let Some(capture) = pattern.captures(text) {
            let place = capture.get(1)?.as_str().trim().trim_end_matches(',');
            // Pronouns and sentence leads sneak through the
            // capitalization heuristic; a single short word that is not
            // a known place marker is ignored.
            if place.len() >= 3 && !matches!(place, "The" | "This" | "That") {
                return Some(place.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distress_plus_hazard_is_rescue_without_ai() {
        let intent = classify_utterance("Help, I'm stuck in a flood on the Gurdaspur highway");
        assert_eq!(intent.kind, IntentKind::Rescue);
        assert!(intent.confidence >= 0.6);
        assert_eq!(intent.hazard, Some(HazardKind::Flood));
        assert_eq!(intent.location.as_deref(), Some("Gurdaspur"));
    }

    #[test]
    fn rescue_beats_information_on_tie() {
        // Both "help" (distress) and "what"/"should" (information)
        // match; life safety wins.
        let intent = classify_utterance("What should I do? Help, there is smoke everywhere");
        assert_eq!(intent.kind, IntentKind::Rescue);
    }

    #[test]
    fn contact_lookup_routes_to_resource_despite_distress_words() {
        let intent =
            classify_utterance("I need emergency contact numbers for wildfire help in California");
        assert_eq!(intent.kind, IntentKind::Resource);
        assert!(intent.confidence >= 0.6);
        assert_eq!(intent.hazard, Some(HazardKind::Wildfire));
        assert_eq!(intent.location.as_deref(), Some("California"));
    }

    #[test]
    fn guidance_question_is_information() {
        let intent = classify_utterance("What should I do during a hurricane in Miami?");
        assert_eq!(intent.kind, IntentKind::Information);
        assert!(intent.confidence >= 0.6);
        assert_eq!(intent.hazard, Some(HazardKind::Hurricane));
        assert_eq!(intent.location.as_deref(), Some("Miami"));
    }

    #[test]
    fn unmatched_text_is_unknown_with_zero_confidence() {
        let intent = classify_utterance("the quick brown fox jumps over it");
        assert_eq!(intent.kind, IntentKind::Unknown);
        assert_eq!(intent.confidence, 0.0);
    }

    #[test]
    fn location_patterns_cover_common_shapes() {
        assert_eq!(
            extract_location("we are near Sacramento right now").as_deref(),
            Some("Sacramento")
        );
        assert_eq!(
            extract_location("flooding in Austin, Texas tonight").as_deref(),
            Some("Austin, Texas")
        );
        assert_eq!(extract_location("no places here").as_deref(), None);
    }
}
