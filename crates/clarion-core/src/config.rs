//! Runtime configuration.
//!
//! One immutable value constructed at process start and passed
//! explicitly into each collaborator constructor. Every credential is
//! independently optional; callers introspect availability per call and
//! choose the live or the fallback path.

use std::env;
use std::time::Duration;

/// Immutable runtime configuration for a Clarion process.
#[derive(Debug, Clone)]
pub struct ClarionConfig {
    /// Credential for the AI backend (classification, extraction
    /// assistance, synthesis). `None` disables every AI path.
    pub ai_api_key: Option<String>,
    /// Chat model used by the AI backend.
    pub ai_model: String,
    /// Credential for the web search collaborator.
    pub search_api_key: Option<String>,
    /// User-Agent sent to public data services (the NWS API rejects
    /// anonymous clients).
    pub http_user_agent: String,

    /// Pattern-classification confidence below which the AI backend is
    /// consulted.
    pub classify_threshold: f32,
    /// Concurrent workers for multi-URL fetch/extract.
    pub fetch_concurrency: usize,
    /// Timeout for a single page fetch.
    pub fetch_timeout: Duration,
    /// Timeout for any other single collaborator call.
    pub call_timeout: Duration,
    /// Budget for the secondary contact enrichment during a rescue turn.
    pub enrichment_timeout: Duration,
    /// Budget for a whole turn; past this the turn completes on
    /// whatever partial or fallback data is available.
    pub turn_budget: Duration,
}

impl Default for ClarionConfig {
    fn default() -> Self {
        Self {
            ai_api_key: None,
            ai_model: "llama-4-scout-17b-16e-instruct".to_string(),
            search_api_key: None,
            http_user_agent: concat!("clarion/", env!("CARGO_PKG_VERSION")).to_string(),
            classify_threshold: 0.6,
            fetch_concurrency: 5,
            fetch_timeout: Duration::from_secs(5),
            call_timeout: Duration::from_secs(8),
            enrichment_timeout: Duration::from_secs(10),
            turn_budget: Duration::from_secs(20),
        }
    }
}

impl ClarionConfig {
    /// Builds the configuration from environment variables.
    ///
    /// Recognized keys: `CEREBRAS_API_KEY`, `CEREBRAS_MODEL_NAME`,
    /// `EXA_API_KEY`, `CLARION_FETCH_CONCURRENCY`,
    /// `CLARION_TURN_BUDGET_SECS`. Missing credentials leave the
    /// matching collaborator disabled rather than failing.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.ai_api_key = non_empty(env::var("CEREBRAS_API_KEY").ok());
        if let Some(model) = non_empty(env::var("CEREBRAS_MODEL_NAME").ok()) {
            config.ai_model = model;
        }
        config.search_api_key = non_empty(env::var("EXA_API_KEY").ok());

        if let Some(n) = env::var("CLARION_FETCH_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            config.fetch_concurrency = n.max(1);
        }
        if let Some(secs) = env::var("CLARION_TURN_BUDGET_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.turn_budget = Duration::from_secs(secs.max(1));
        }

        config
    }

    /// Whether an AI backend credential is configured.
    pub fn ai_available(&self) -> bool {
        self.ai_api_key.is_some()
    }

    /// Whether the search collaborator credential is configured.
    pub fn search_available(&self) -> bool {
        self.search_api_key.is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
