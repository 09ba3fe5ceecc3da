use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::contact::{ContactRecord, dedupe_contacts};
use super::intent::HazardKind;

/// The closed set of response producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SpecialistKind {
    Rescue,
    Information,
    Resource,
    /// The orchestrator itself, for clarifications and last-resort
    /// answers.
    Orchestrator,
}

/// Machine-parseable payload attached to an [`AgentResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    RescueBrief {
        hazard: HazardKind,
        safety_warning: String,
        instructions: Vec<String>,
        shelter_advice: String,
        contacts: Vec<ContactRecord>,
    },
    InformationBrief {
        hazard: HazardKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<String>,
        sections: Vec<InformationSection>,
    },
    ContactSheet {
        region: String,
        contacts: Vec<ContactRecord>,
        failed_sources: Vec<String>,
    },
    Clarification {
        question: String,
    },
}

/// One titled block of an information brief.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InformationSection {
    pub title: String,
    pub body: String,
}

/// Structured response produced by exactly one specialist per invocation.
///
/// The orchestrator may merge several responses into one outward answer,
/// but merging always builds a new value; individual responses stay
/// immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub specialist: SpecialistKind,
    pub summary_text: String,
    pub payload: ResponsePayload,
    pub confidence: f32,
    pub used_fallback: bool,
}

impl AgentResponse {
    /// Builds the aggregate of a rescue response and contacts obtained
    /// from the resource agent's lookup.
    ///
    /// `enrichment_fell_back` records whether the secondary lookup used
    /// fallback data (or never completed); the flag is OR-merged so a
    /// degraded contributing step can never be hidden by the merge.
    pub fn merge_contacts(
        &self,
        extra: Vec<ContactRecord>,
        enrichment_fell_back: bool,
    ) -> AgentResponse {
        let mut merged = self.clone();
        merged.used_fallback = merged.used_fallback || enrichment_fell_back;

        if let ResponsePayload::RescueBrief { contacts, .. } = &mut merged.payload {
            let mut all = Vec::with_capacity(contacts.len() + extra.len());
            all.extend(contacts.drain(..));
            all.extend(extra);
            *contacts = dedupe_contacts(all);
        }

        merged
    }

    /// Contacts carried by this response, if the payload has any.
    pub fn contacts(&self) -> &[ContactRecord] {
        match &self.payload {
            ResponsePayload::RescueBrief { contacts, .. } => contacts,
            ResponsePayload::ContactSheet { contacts, .. } => contacts,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContactKind;

    fn rescue_response() -> AgentResponse {
        AgentResponse {
            specialist: SpecialistKind::Rescue,
            summary_text: "Move to higher ground.".into(),
            payload: ResponsePayload::RescueBrief {
                hazard: HazardKind::Flood,
                safety_warning: "Flood reported.".into(),
                instructions: vec!["Move to higher ground immediately".into()],
                shelter_advice: "Contact local authorities for shelter locations.".into(),
                contacts: vec![ContactRecord::new(ContactKind::EmergencyPhone, "911").fallback()],
            },
            confidence: 0.8,
            used_fallback: false,
        }
    }

    #[test]
    fn merge_produces_new_value_and_ors_fallback() {
        let original = rescue_response();
        let merged = original.merge_contacts(
            vec![ContactRecord::new(ContactKind::Phone, "1-800-621-3362")],
            true,
        );

        assert!(!original.used_fallback, "original must stay untouched");
        assert!(merged.used_fallback);
        assert_eq!(merged.contacts().len(), 2);
        assert_eq!(original.contacts().len(), 1);
    }

    #[test]
    fn merge_dedupes_enrichment_against_own_contacts() {
        let original = rescue_response();
        let merged = original.merge_contacts(
            vec![ContactRecord::new(ContactKind::EmergencyPhone, "9 1 1").with_confidence(0.9)],
            false,
        );
        assert_eq!(merged.contacts().len(), 1);
        assert!(
            !merged.contacts()[0].used_fallback,
            "live duplicate clears the fallback flag on the record"
        );
    }
}
