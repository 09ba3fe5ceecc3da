//! The intent-routing dispatcher.
//!
//! Owns the conversation state machine: classifies each utterance,
//! routes it to one specialist, coordinates the rescue/resource
//! cooperation, and guarantees that a well-formed response comes back
//! no matter which collaborators are down. The orchestrator performs
//! no extraction or network calls itself; it only delegates.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use clarion_core::ClarionError;
use clarion_core::activity::ActivityReporter;
use clarion_core::config::ClarionConfig;
use clarion_core::knowledge;
use clarion_core::model::{
    AgentResponse, ConversationContext, Intent, IntentKind, PendingClarification, ResponsePayload,
    SpecialistKind, Utterance,
};
use clarion_interaction::Collaborators;

use crate::classifier::classify_utterance;
use crate::information_agent::InformationAgent;
use crate::rescue_agent::RescueAgent;
use crate::resource_agent::ResourceAgent;
use crate::specialist::Specialist;

const ORCHESTRATOR: &str = "Orchestrator";

/// Routes utterances to the closed set of specialists.
pub struct Orchestrator {
    config: ClarionConfig,
    collaborators: Collaborators,
    reporter: ActivityReporter,
    rescue: RescueAgent,
    information: InformationAgent,
    resource: ResourceAgent,
}

impl Orchestrator {
    pub fn new(
        config: ClarionConfig,
        collaborators: Collaborators,
        reporter: ActivityReporter,
    ) -> Self {
        let rescue = RescueAgent::new(collaborators.clone());
        let information = InformationAgent::new(config.clone(), collaborators.clone());
        let resource = ResourceAgent::new(config.clone(), collaborators.clone(), reporter.clone());
        Self {
            config,
            collaborators,
            reporter,
            rescue,
            information,
            resource,
        }
    }

    /// Processes one turn.
    ///
    /// The only hard error is an empty utterance; every other failure
    /// mode resolves to a degraded but well-formed response. The whole
    /// turn runs under the configured budget, after which in-flight
    /// secondary work is cancelled and the best available answer is
    /// returned.
    pub async fn route(
        &self,
        utterance: &Utterance,
        context: &mut ConversationContext,
    ) -> Result<AgentResponse, ClarionError> {
        if utterance.is_blank() {
            return Err(ClarionError::EmptyUtterance);
        }

        let cancel = CancellationToken::new();
        let turn = self.route_inner(utterance, context, &cancel);

        match tokio::time::timeout(self.config.turn_budget, turn).await {
            Ok(response) => Ok(response),
            Err(_) => {
                cancel.cancel();
                warn!(budget = ?self.config.turn_budget, "turn budget exhausted");
                self.reporter.failed(
                    ORCHESTRATOR,
                    "turn budget exhausted, answering from local data",
                );
                Ok(self.last_resort(
                    "This is taking longer than expected. If you are in immediate danger, \
                     call your local emergency number (911 in the US, 112 in much of the \
                     world) right now.",
                ))
            }
        }
    }

    async fn route_inner(
        &self,
        utterance: &Utterance,
        context: &mut ConversationContext,
        cancel: &CancellationToken,
    ) -> AgentResponse {
        let intent = self.resolve_intent(utterance, context).await;
        let intent = context.enrich_intent(&intent);
        context.record_turn(&intent);

        info!(
            kind = %intent.kind,
            confidence = intent.confidence,
            hazard = ?intent.hazard,
            location = ?intent.location,
            "intent resolved"
        );

        match intent.kind {
            IntentKind::Unknown => {
                context.set_pending(PendingClarification::Rephrase);
                self.reporter.finished(
                    ORCHESTRATOR,
                    "could not classify request, asking for clarification",
                );
                self.clarification(
                    "I couldn't tell what you need. Tell me what is happening and where \
                     you are, and I'll help.",
                    // Classification had no live backing if no AI
                    // backend was reachable for the low-confidence path.
                    !self.collaborators.ai_available(),
                )
            }
            IntentKind::Resource if intent.location.is_none() => {
                context.set_pending(PendingClarification::Location {
                    draft: intent.clone(),
                });
                self.reporter
                    .finished(ORCHESTRATOR, "resource lookup needs a location");
                self.clarification(
                    "I can look up emergency contacts for you. Where are you located?",
                    false,
                )
            }
            IntentKind::Rescue => self.rescue_turn(&intent, utterance, context, cancel).await,
            IntentKind::Information => {
                self.invoke(&self.information, &intent, utterance, context)
                    .await
            }
            IntentKind::Resource => {
                self.invoke(&self.resource, &intent, utterance, context)
                    .await
            }
        }
    }

    /// Settles the intent for this utterance: an open clarification is
    /// answered first; otherwise patterns classify, and the AI backend
    /// breaks low-confidence ties when configured.
    async fn resolve_intent(
        &self,
        utterance: &Utterance,
        context: &mut ConversationContext,
    ) -> Intent {
        if let Some(pending) = context.take_pending() {
            match pending {
                PendingClarification::Location { draft } => {
                    let answer = utterance.text.trim();
                    debug!(answer, "treating utterance as location answer");
                    self.reporter
                        .finished(ORCHESTRATOR, format!("location received: {answer}"));
                    return draft.with_location(answer);
                }
                PendingClarification::Rephrase => {
                    // Nothing was salvaged last turn; classify fresh.
                }
            }
        }

        self.reporter
            .started(ORCHESTRATOR, "classifying intent from patterns");
        let pattern_intent = classify_utterance(&utterance.text);

        if pattern_intent.confidence >= self.config.classify_threshold {
            self.reporter.finished(
                ORCHESTRATOR,
                format!(
                    "intent {} at {:.0}% from patterns",
                    pattern_intent.kind,
                    pattern_intent.confidence * 100.0
                ),
            );
            return pattern_intent;
        }

        // Low-confidence pattern result: let the AI backend break the
        // tie if one is configured. The pattern answer stands when the
        // backend is absent, slow, or unsure.
        let Some(ai) = &self.collaborators.ai else {
            return pattern_intent;
        };

        self.reporter
            .started(ORCHESTRATOR, "pattern confidence low, asking AI backend");
        match tokio::time::timeout(self.config.call_timeout, ai.classify(&utterance.text)).await {
            Ok(Ok(guess))
                if guess.kind != IntentKind::Unknown
                    && guess.confidence >= self.config.classify_threshold =>
            {
                self.reporter.finished(
                    ORCHESTRATOR,
                    format!(
                        "AI classified intent {} at {:.0}%",
                        guess.kind,
                        guess.confidence * 100.0
                    ),
                );
                Intent {
                    kind: guess.kind,
                    confidence: guess.confidence,
                    location: guess.location.or(pattern_intent.location),
                    hazard: guess.hazard.or(pattern_intent.hazard),
                }
            }
            Ok(Ok(_)) => {
                debug!("AI classification below threshold, keeping pattern result");
                pattern_intent
            }
            Ok(Err(err)) => {
                warn!(error = %err, "AI classification failed");
                self.reporter
                    .failed(ORCHESTRATOR, "AI classification unavailable");
                pattern_intent
            }
            Err(_) => {
                warn!("AI classification timed out");
                self.reporter
                    .failed(ORCHESTRATOR, "AI classification timed out");
                pattern_intent
            }
        }
    }

    /// A rescue turn: the rescue brief and the resource agent's
    /// contact lookup run concurrently, the lookup bounded by its own
    /// timeout so a slow secondary can never block the life-safety
    /// answer.
    async fn rescue_turn(
        &self,
        intent: &Intent,
        utterance: &Utterance,
        context: &ConversationContext,
        cancel: &CancellationToken,
    ) -> AgentResponse {
        let region = knowledge::region_for_location(intent.location.as_deref());
        let hazard = intent.hazard_or_general();

        self.reporter
            .started(self.rescue.name(), "preparing life-safety brief");
        self.reporter.started(
            self.resource.name(),
            format!("enriching with live contacts for '{region}'"),
        );

        let (rescue_result, enrichment) = tokio::join!(
            self.rescue.handle(intent, utterance, context),
            tokio::time::timeout(
                self.config.enrichment_timeout,
                self.resource.find_contacts(region, hazard, None, cancel),
            )
        );

        let response = match rescue_result {
            Ok(response) => {
                self.reporter
                    .finished(self.rescue.name(), "life-safety brief ready");
                response
            }
            Err(err) => {
                warn!(error = %err, "rescue agent failed");
                self.reporter
                    .failed(self.rescue.name(), format!("brief failed: {err}"));
                self.last_resort(
                    "I couldn't build a full safety brief. If you are in immediate danger, \
                     call your local emergency number right now.",
                )
            }
        };

        match enrichment {
            Ok(lookup) => {
                self.reporter.finished(
                    self.resource.name(),
                    format!("{} contacts merged", lookup.contacts.len()),
                );
                response.merge_contacts(lookup.contacts, lookup.used_fallback)
            }
            Err(_) => {
                cancel.cancel();
                self.reporter.failed(
                    self.resource.name(),
                    "contact enrichment timed out, proceeding with local contacts",
                );
                // The brief already carries knowledge-base contacts.
                response.merge_contacts(Vec::new(), true)
            }
        }
    }

    /// Delegates a single-specialist turn, converting any error into
    /// the generic degraded response.
    async fn invoke(
        &self,
        specialist: &dyn Specialist,
        intent: &Intent,
        utterance: &Utterance,
        context: &ConversationContext,
    ) -> AgentResponse {
        self.reporter
            .started(specialist.name(), "handling request");
        match specialist.handle(intent, utterance, context).await {
            Ok(response) => {
                self.reporter.finished(
                    specialist.name(),
                    format!(
                        "response ready (confidence {:.0}%{})",
                        response.confidence * 100.0,
                        if response.used_fallback {
                            ", fallback data"
                        } else {
                            ""
                        }
                    ),
                );
                response
            }
            Err(err) => {
                warn!(agent = specialist.name(), error = %err, "specialist failed");
                self.reporter
                    .failed(specialist.name(), format!("failed: {err}"));
                self.last_resort(
                    "I ran into a problem answering that. Please try rephrasing; if this \
                     is a life-threatening emergency, call your local emergency number.",
                )
            }
        }
    }

    fn clarification(&self, question: &str, used_fallback: bool) -> AgentResponse {
        AgentResponse {
            specialist: SpecialistKind::Orchestrator,
            summary_text: question.to_string(),
            confidence: 0.3,
            used_fallback,
            payload: ResponsePayload::Clarification {
                question: question.to_string(),
            },
        }
    }

    /// The worst-case answer: always well-formed, always labeled.
    fn last_resort(&self, message: &str) -> AgentResponse {
        AgentResponse {
            specialist: SpecialistKind::Orchestrator,
            summary_text: message.to_string(),
            confidence: 0.2,
            used_fallback: true,
            payload: ResponsePayload::Clarification {
                question: "Could you rephrase your request?".to_string(),
            },
        }
    }
}
