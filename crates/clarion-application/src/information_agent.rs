//! Information agent: search-and-summarize guidance.

use async_trait::async_trait;
use tracing::{debug, warn};

use clarion_core::ClarionError;
use clarion_core::config::ClarionConfig;
use clarion_core::knowledge;
use clarion_core::model::{
    AgentResponse, ConversationContext, HazardKind, InformationSection, Intent, ResponsePayload,
    SpecialistKind, Utterance,
};
use clarion_interaction::{Collaborators, SearchHit};

use crate::specialist::Specialist;

const AGENT_NAME: &str = "Information Agent";

/// Which information the user is asking for, detected from keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InfoNeeds {
    weather: bool,
    evacuation: bool,
    shelter: bool,
}

impl InfoNeeds {
    fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        let mut needs = Self {
            weather: has(&["weather", "forecast", "rain", "storm", "alert", "wind"]),
            evacuation: has(&["evacuation", "evacuate", "route", "road", "escape", "leave"]),
            shelter: has(&["shelter", "safe place", "camp", "stay", "refuge"]),
        };
        // An unqualified question gets the full brief.
        if !needs.weather && !needs.evacuation && !needs.shelter {
            needs = Self {
                weather: true,
                evacuation: true,
                shelter: true,
            };
        }
        needs
    }
}

/// Answers guidance questions from live search when possible, from the
/// fallback knowledge base otherwise. Fallback answers are templated
/// and deliberately generic: this agent never invents specific facts
/// like shelter addresses.
pub struct InformationAgent {
    collaborators: Collaborators,
    config: ClarionConfig,
}

impl InformationAgent {
    pub fn new(config: ClarionConfig, collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    async fn live_answer(
        &self,
        utterance: &Utterance,
        hazard: HazardKind,
        location: Option<&str>,
    ) -> Result<(String, Vec<InformationSection>), ClarionError> {
        let search = self
            .collaborators
            .search
            .as_ref()
            .ok_or_else(|| ClarionError::external("search", "no search credential", false))?;

        let place = location.unwrap_or("the affected area");
        let query = format!("{} {hazard} safety guidance {place}", utterance.text.trim());
        let hits = tokio::time::timeout(
            self.config.call_timeout,
            search.search(&query, 3),
        )
        .await
        .map_err(|_| ClarionError::timeout("information search"))??;

        if hits.is_empty() {
            return Err(ClarionError::external("search", "search returned nothing", false));
        }

        let sections: Vec<InformationSection> = hits
            .iter()
            .map(|hit| InformationSection {
                title: hit.title.clone(),
                body: hit.snippet.clone(),
            })
            .collect();

        // AI synthesis when available; raw snippets otherwise.
        let summary = match &self.collaborators.ai {
            Some(ai) => {
                let prompt = Self::synthesis_prompt(utterance, hazard, place, &hits);
                match tokio::time::timeout(self.config.call_timeout, ai.summarize(&prompt)).await {
                    Ok(Ok(text)) if !text.trim().is_empty() => text,
                    Ok(Err(err)) => {
                        debug!(error = %err, "AI synthesis failed, using snippets");
                        Self::snippet_summary(hazard, place, &hits)
                    }
                    Ok(Ok(_)) | Err(_) => Self::snippet_summary(hazard, place, &hits),
                }
            }
            None => Self::snippet_summary(hazard, place, &hits),
        };

        Ok((summary, sections))
    }

    fn synthesis_prompt(
        utterance: &Utterance,
        hazard: HazardKind,
        place: &str,
        hits: &[SearchHit],
    ) -> String {
        let mut sources = String::new();
        for hit in hits {
            sources.push_str(&format!("- {} ({}): {}\n", hit.title, hit.url, hit.snippet));
        }
        format!(
            "You are an emergency information assistant. Answer the question below \
             in a short, factual brief with clear recommendations. If information \
             is missing, say so instead of guessing.\n\n\
             Question: \"{}\"\nHazard: {hazard}\nLocation: {place}\n\nSources:\n{sources}",
            utterance.text.trim()
        )
    }

    fn snippet_summary(hazard: HazardKind, place: &str, hits: &[SearchHit]) -> String {
        let mut parts = vec![format!("Latest {hazard} guidance for {place}:")];
        for hit in hits {
            if !hit.snippet.is_empty() {
                parts.push(format!("- {}: {}", hit.title, hit.snippet));
            }
        }
        parts.push(
            "Follow instructions from local authorities and stay tuned to official channels."
                .to_string(),
        );
        parts.join("\n")
    }

    /// Templated offline answer. Generic on purpose: no addresses, no
    /// invented specifics.
    fn fallback_answer(
        &self,
        needs: InfoNeeds,
        hazard: HazardKind,
        location: Option<&str>,
    ) -> (String, Vec<InformationSection>) {
        let place = location.unwrap_or("your area");
        let mut sections = Vec::new();

        let instructions = knowledge::safety_instructions(hazard);
        sections.push(InformationSection {
            title: format!("{hazard} safety basics"),
            body: instructions.join(". "),
        });

        if needs.weather {
            sections.push(InformationSection {
                title: "Weather".to_string(),
                body: "Live weather data is unavailable right now; check local weather \
                       services or emergency broadcasts for current alerts."
                    .to_string(),
            });
        }
        if needs.evacuation {
            sections.push(InformationSection {
                title: "Evacuation".to_string(),
                body: "Contact local authorities for current evacuation routes and road \
                       closures before moving."
                    .to_string(),
            });
        }
        if needs.shelter {
            sections.push(InformationSection {
                title: "Shelter".to_string(),
                body: "Local authorities maintain the list of open emergency shelters; \
                       call your regional emergency line for the nearest one."
                    .to_string(),
            });
        }

        let mut summary = vec![format!("General {hazard} guidance for {place}:")];
        summary.extend(instructions.iter().map(|s| format!("- {s}")));
        summary.push(
            "Live information services are unreachable, so this is standard guidance; \
             confirm specifics with local authorities."
                .to_string(),
        );

        (summary.join("\n"), sections)
    }
}

#[async_trait]
impl Specialist for InformationAgent {
    fn name(&self) -> &'static str {
        AGENT_NAME
    }

    async fn handle(
        &self,
        intent: &Intent,
        utterance: &Utterance,
        context: &ConversationContext,
    ) -> Result<AgentResponse, ClarionError> {
        let location = intent
            .location
            .as_deref()
            .or_else(|| context.known_location());
        let hazard = intent.hazard_or_general();
        let needs = InfoNeeds::detect(&utterance.text);

        match self.live_answer(utterance, hazard, location).await {
            Ok((summary, sections)) => Ok(AgentResponse {
                specialist: SpecialistKind::Information,
                summary_text: summary,
                confidence: intent.confidence.max(0.6),
                used_fallback: false,
                payload: ResponsePayload::InformationBrief {
                    hazard,
                    location: location.map(str::to_string),
                    sections,
                },
            }),
            Err(err) => {
                warn!(error = %err, "live information path unavailable, using knowledge base");
                let (summary, sections) = self.fallback_answer(needs, hazard, location);
                Ok(AgentResponse {
                    specialist: SpecialistKind::Information,
                    summary_text: summary,
                    confidence: (intent.confidence * 0.8).min(0.7),
                    used_fallback: true,
                    payload: ResponsePayload::InformationBrief {
                        hazard,
                        location: location.map(str::to_string),
                        sections,
                    },
                })
            }
        }
    }
}
