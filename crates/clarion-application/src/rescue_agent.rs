//! Rescue agent: life-safety briefs.

use async_trait::async_trait;
use tracing::{debug, warn};

use clarion_core::ClarionError;
use clarion_core::knowledge;
use clarion_core::model::{
    AgentResponse, ConversationContext, HazardKind, Intent, ResponsePayload, SpecialistKind,
    Utterance,
};
use clarion_interaction::{Collaborators, Verification};

use crate::specialist::Specialist;

const AGENT_NAME: &str = "Rescue Agent";

/// Hazards the verification source can plausibly confirm, probed in
/// priority order when the hazard slot is missing.
const PROBE_ORDER: &[HazardKind] = &[
    HazardKind::Flood,
    HazardKind::Wildfire,
    HazardKind::Hurricane,
    HazardKind::Tornado,
];

/// Produces ordered safety instructions and baseline contacts for a
/// distress call. The orchestrator enriches the result with the
/// resource agent's live contact lookup.
pub struct RescueAgent {
    collaborators: Collaborators,
}

impl RescueAgent {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Settles the hazard for this turn.
    ///
    /// A known hazard is confirmed against the verification source when
    /// one is wired; a missing hazard is probed. Verification failures
    /// never block the brief, they only degrade it.
    async fn settle_hazard(
        &self,
        intent: &Intent,
        location: Option<&str>,
    ) -> (HazardKind, f32, bool) {
        let Some(verifier) = &self.collaborators.verifier else {
            // No verification source: deliver unverified local guidance.
            return (intent.hazard_or_general(), 0.8, true);
        };

        match intent.hazard {
            Some(hazard) => match verifier.verify(hazard, location).await {
                Ok(Verification::Confirmed) => {
                    debug!(%hazard, "hazard confirmed by verification source");
                    (hazard, 1.0, false)
                }
                Ok(_) => (hazard, 0.9, false),
                Err(err) => {
                    warn!(%hazard, error = %err, "hazard verification failed");
                    (hazard, 0.8, true)
                }
            },
            None => {
                for candidate in PROBE_ORDER {
                    match verifier.verify(*candidate, location).await {
                        Ok(Verification::Confirmed) => {
                            debug!(hazard = %candidate, "probe confirmed active hazard");
                            return (*candidate, 0.9, false);
                        }
                        Ok(_) => continue,
                        Err(err) => {
                            warn!(error = %err, "hazard probe failed");
                            return (HazardKind::General, 0.7, true);
                        }
                    }
                }
                (HazardKind::General, 0.8, false)
            }
        }
    }
}

#[async_trait]
impl Specialist for RescueAgent {
    fn name(&self) -> &'static str {
        AGENT_NAME
    }

    async fn handle(
        &self,
        intent: &Intent,
        _utterance: &Utterance,
        context: &ConversationContext,
    ) -> Result<AgentResponse, ClarionError> {
        let location = intent
            .location
            .as_deref()
            .or_else(|| context.known_location());

        let (hazard, verification_factor, verification_fell_back) =
            self.settle_hazard(intent, location).await;

        let instructions = knowledge::safety_instructions(hazard);
        let warning = knowledge::safety_warning(hazard, location);
        let shelter_advice = "Contact local authorities for shelter locations. If evacuation \
                              is necessary, bring water, food, medications and important documents."
            .to_string();

        // Baseline contacts from the knowledge base; the orchestrator
        // merges live contacts over these.
        let region = knowledge::region_for_location(location);
        let contacts = knowledge::fallback_contacts(region);

        let mut summary = vec![warning.clone(), String::new()];
        for (i, step) in instructions.iter().enumerate() {
            summary.push(format!("{}. {step}", i + 1));
        }
        if let Some(primary) = contacts.first() {
            summary.push(format!("Call {} immediately if you can.", primary.value));
        }

        let confidence = (intent.confidence.max(0.6) * verification_factor).clamp(0.0, 0.95);

        Ok(AgentResponse {
            specialist: SpecialistKind::Rescue,
            summary_text: summary.join("\n"),
            confidence,
            used_fallback: verification_fell_back,
            payload: ResponsePayload::RescueBrief {
                hazard,
                safety_warning: warning,
                instructions,
                shelter_advice,
                contacts,
            },
        })
    }
}
