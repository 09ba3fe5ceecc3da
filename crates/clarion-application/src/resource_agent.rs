//! Resource agent: contact discovery and extraction.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use clarion_core::ClarionError;
use clarion_core::activity::ActivityReporter;
use clarion_core::config::ClarionConfig;
use clarion_core::knowledge;
use clarion_core::model::{
    AgentResponse, ContactKind, ContactRecord, ConversationContext, HazardKind, Intent,
    ResponsePayload, SpecialistKind, Utterance,
};
use clarion_interaction::{Collaborators, ExtractionEngine};

use crate::specialist::Specialist;

/// Well-known contact pages used when search is unavailable or thin.
const FALLBACK_URLS: &[&str] = &[
    "https://ndrf.gov.in/contact-us",
    "https://www.nhc.noaa.gov/contact.shtml",
    "https://www.ready.gov/contacts",
];

const AGENT_NAME: &str = "Resource Agent";

/// Result of one contact lookup.
#[derive(Debug, Clone)]
pub struct ContactLookup {
    pub region: String,
    pub contacts: Vec<ContactRecord>,
    pub failed_sources: Vec<String>,
    /// True when the knowledge base (rather than live extraction)
    /// produced the contacts.
    pub used_fallback: bool,
}

/// Finds emergency contacts for a region, hybrid pattern/AI extraction
/// over concurrently fetched pages, with the knowledge base as floor.
pub struct ResourceAgent {
    collaborators: Collaborators,
    engine: ExtractionEngine,
    reporter: ActivityReporter,
    config: ClarionConfig,
}

impl ResourceAgent {
    pub fn new(
        config: ClarionConfig,
        collaborators: Collaborators,
        reporter: ActivityReporter,
    ) -> Self {
        let engine = ExtractionEngine::new(
            collaborators.fetcher.clone(),
            collaborators.ai.clone(),
            &config,
        );
        Self {
            collaborators,
            engine,
            reporter,
            config,
        }
    }

    /// The public contact-lookup contract, also used by the
    /// orchestrator to enrich rescue responses.
    ///
    /// Never errors: total source failure degrades to the fallback
    /// knowledge base with every record labeled.
    pub async fn find_contacts(
        &self,
        region: &str,
        hazard: HazardKind,
        urls: Option<&[String]>,
        cancel: &CancellationToken,
    ) -> ContactLookup {
        self.reporter.started(
            "Extraction Engine",
            format!("contact lookup for region '{region}'"),
        );

        let candidate_urls = match urls {
            Some(urls) if !urls.is_empty() => urls.to_vec(),
            _ => self.discover_urls(region, hazard).await,
        };

        let report = self.engine.extract_all(&candidate_urls, cancel).await;
        let failed_sources = report.failed_sources();

        if report.contacts.is_empty() {
            warn!(
                region,
                sources = candidate_urls.len(),
                "no contacts extracted, serving knowledge base"
            );
            self.reporter.failed(
                "Extraction Engine",
                format!(
                    "no live source yielded contacts for '{region}', using local knowledge base"
                ),
            );
            return ContactLookup {
                region: region.to_string(),
                contacts: knowledge::fallback_contacts(region),
                failed_sources,
                used_fallback: true,
            };
        }

        info!(
            region,
            contacts = report.contacts.len(),
            failed = failed_sources.len(),
            "contact extraction complete"
        );
        self.reporter.finished(
            "Extraction Engine",
            format!("extracted {} contacts for '{region}'", report.contacts.len()),
        );

        ContactLookup {
            region: region.to_string(),
            contacts: report.contacts,
            failed_sources,
            used_fallback: false,
        }
    }

    /// Search for candidate contact pages; pad thin or failed searches
    /// with the well-known fallback URLs.
    async fn discover_urls(&self, region: &str, hazard: HazardKind) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();

        if let Some(search) = &self.collaborators.search {
            let query =
                format!("emergency contact numbers {region} {hazard} disaster management");
            match tokio::time::timeout(self.config.call_timeout, search.search(&query, 3)).await {
                Ok(Ok(hits)) => {
                    urls.extend(hits.into_iter().map(|hit| hit.url));
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "contact page search failed");
                }
                Err(_) => {
                    warn!("contact page search timed out");
                }
            }
        }

        if urls.len() < 2 {
            urls.extend(FALLBACK_URLS.iter().map(|u| u.to_string()));
            urls.dedup();
        }
        urls
    }

    fn summarize(lookup: &ContactLookup) -> String {
        let mut parts = vec![format!(
            "Emergency contacts for {}:",
            if lookup.region == knowledge::REGION_GENERAL {
                "your area".to_string()
            } else {
                lookup.region.clone()
            }
        )];

        for kind in [
            ContactKind::EmergencyPhone,
            ContactKind::Phone,
            ContactKind::Email,
            ContactKind::Address,
        ] {
            let values: Vec<&str> = lookup
                .contacts
                .iter()
                .filter(|c| c.kind == kind)
                .map(|c| c.value.as_str())
                .collect();
            if values.is_empty() {
                continue;
            }
            let heading = match kind {
                ContactKind::EmergencyPhone => "Emergency numbers",
                ContactKind::Phone => "Other numbers",
                ContactKind::Email => "Email",
                ContactKind::Address => "Locations",
            };
            parts.push(format!("{heading}: {}", values.join(", ")));
        }

        if lookup.used_fallback {
            parts.push(
                "These are standard emergency contacts from the local directory; \
                 live sources could not be reached."
                    .to_string(),
            );
        }
        parts.join("\n")
    }
}

#[async_trait]
impl Specialist for ResourceAgent {
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
        let region = knowledge::region_for_location(location);
        let hazard = intent.hazard_or_general();

        let lookup = self
            .find_contacts(region, hazard, None, &CancellationToken::new())
            .await;

        let confidence = if lookup.used_fallback {
            (intent.confidence * 0.9).min(0.85)
        } else {
            intent.confidence
        };

        Ok(AgentResponse {
            specialist: SpecialistKind::Resource,
            summary_text: Self::summarize(&lookup),
            used_fallback: lookup.used_fallback,
            confidence,
            payload: ResponsePayload::ContactSheet {
                region: lookup.region,
                contacts: lookup.contacts,
                failed_sources: lookup.failed_sources,
            },
        })
    }
}
