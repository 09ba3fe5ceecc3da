//! Bundle of optional external collaborators.
//!
//! Built once from the immutable configuration; every field is
//! independently optional and callers check availability at call time,
//! never only at startup.

use std::sync::Arc;

use clarion_core::config::ClarionConfig;

use crate::ai_backend::{AiBackend, CerebrasBackend};
use crate::fetch::{HttpPageFetcher, PageFetcher, UnreachableFetcher};
use crate::search::{ExaSearchClient, SearchProvider};
use crate::verify::{HazardVerifier, NwsHazardVerifier};

/// Handles to the external collaborators the agents may call.
#[derive(Clone)]
pub struct Collaborators {
    pub ai: Option<Arc<dyn AiBackend>>,
    pub search: Option<Arc<dyn SearchProvider>>,
    pub verifier: Option<Arc<dyn HazardVerifier>>,
    pub fetcher: Arc<dyn PageFetcher>,
}

impl Collaborators {
    /// Wires production implementations for every collaborator whose
    /// credential is present. The page fetcher and the hazard verifier
    /// need no credential and are always wired.
    pub fn from_config(config: &ClarionConfig) -> Self {
        Self {
            ai: CerebrasBackend::from_config(config)
                .map(|backend| Arc::new(backend) as Arc<dyn AiBackend>),
            search: ExaSearchClient::from_config(config)
                .map(|client| Arc::new(client) as Arc<dyn SearchProvider>),
            verifier: Some(Arc::new(NwsHazardVerifier::from_config(config))),
            fetcher: Arc::new(HttpPageFetcher::from_config(config)),
        }
    }

    /// Fully offline bundle: no AI, no search, no verification, and a
    /// fetcher that fails every URL. Used for tests and as the floor
    /// the degradation contract is measured against.
    pub fn offline(_config: &ClarionConfig) -> Self {
        Self {
            ai: None,
            search: None,
            verifier: None,
            fetcher: Arc::new(UnreachableFetcher),
        }
    }

    pub fn ai_available(&self) -> bool {
        self.ai.is_some()
    }

    pub fn search_available(&self) -> bool {
        self.search.is_some()
    }
}
