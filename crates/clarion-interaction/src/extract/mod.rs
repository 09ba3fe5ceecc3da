//! Extraction engine: concurrent fetch + hybrid contact extraction.
//!
//! Each source document walks the state machine
//! `Fetching -> Parsed -> Extracted -> (Done | Failed)`. `Failed` is
//! terminal and reported; a fetch gets exactly one bounded retry with
//! backoff. No state is shared across documents beyond the final
//! aggregation, so the per-document workers run freely in parallel.

mod patterns;

pub use patterns::{PatternExtraction, extract_contacts};

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use clarion_core::ClarionError;
use clarion_core::config::ClarionConfig;
use clarion_core::model::{ContactRecord, dedupe_contacts};

use crate::ai_backend::{AiBackend, ExtractionHints};
use crate::fetch::PageFetcher;

/// Lifecycle of one source document inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentState {
    Fetching,
    Parsed,
    Extracted,
    Done,
    Failed,
}

/// Terminal report for one source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub url: String,
    pub state: DocumentState,
    pub contacts: Vec<ContactRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated result of a multi-source extraction run.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Union of every successful source, deduplicated.
    pub contacts: Vec<ContactRecord>,
    pub outcomes: Vec<SourceOutcome>,
}

impl ExtractionReport {
    /// URLs whose documents ended in `Failed`.
    pub fn failed_sources(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.state == DocumentState::Failed)
            .map(|o| o.url.clone())
            .collect()
    }

    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty()
            && self
                .outcomes
                .iter()
                .all(|o| o.state == DocumentState::Failed)
    }
}

/// Shared fetch/extract utility used by the resource agent.
pub struct ExtractionEngine {
    fetcher: Arc<dyn PageFetcher>,
    ai: Option<Arc<dyn AiBackend>>,
    concurrency: usize,
    fetch_timeout: Duration,
}

impl ExtractionEngine {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        ai: Option<Arc<dyn AiBackend>>,
        config: &ClarionConfig,
    ) -> Self {
        Self {
            fetcher,
            ai,
            concurrency: config.fetch_concurrency.max(1),
            fetch_timeout: config.fetch_timeout,
        }
    }

    /// Engine variant with the AI assist disabled (pure pattern mode).
    pub fn pattern_only(fetcher: Arc<dyn PageFetcher>, config: &ClarionConfig) -> Self {
        Self::new(fetcher, None, config)
    }

    /// Fetches and extracts from every URL with bounded parallelism.
    ///
    /// Partial failures shrink the result; they never fail the call.
    /// Cancellation marks still-pending documents as failed and returns
    /// whatever already completed.
    pub async fn extract_all(
        &self,
        urls: &[String],
        cancel: &CancellationToken,
    ) -> ExtractionReport {
        let mut report = ExtractionReport::default();

        for chunk in urls.chunks(self.concurrency) {
            if cancel.is_cancelled() {
                for url in chunk {
                    report.outcomes.push(SourceOutcome {
                        url: url.clone(),
                        state: DocumentState::Failed,
                        contacts: Vec::new(),
                        error: Some("cancelled before fetch".to_string()),
                    });
                }
                continue;
            }
            let outcomes = join_all(chunk.iter().map(|url| self.extract_one(url, cancel))).await;
            report.outcomes.extend(outcomes);
        }

        let mut all = Vec::new();
        for outcome in &report.outcomes {
            all.extend(outcome.contacts.iter().cloned());
        }
        report.contacts = dedupe_contacts(all);
        report
    }

    async fn extract_one(&self, url: &str, cancel: &CancellationToken) -> SourceOutcome {
        let mut outcome = SourceOutcome {
            url: url.to_string(),
            state: DocumentState::Fetching,
            contacts: Vec::new(),
            error: None,
        };

        let body = tokio::select! {
            _ = cancel.cancelled() => {
                outcome.state = DocumentState::Failed;
                outcome.error = Some("cancelled".to_string());
                return outcome;
            }
            result = self.fetch_with_retry(url) => result,
        };

        let body = match body {
            Ok(body) => body,
            Err(err) => {
                warn!(url, error = %err, "document fetch failed");
                outcome.state = DocumentState::Failed;
                outcome.error = Some(err.to_string());
                return outcome;
            }
        };

        outcome.state = DocumentState::Parsed;
        let text = strip_markup(&body);

        outcome.state = DocumentState::Extracted;
        let found = extract_contacts(&text, Some(url));
        outcome.contacts = found.contacts;

        // AI assist only when the patterns came up short or left
        // ambiguous spans, and only if a backend is wired in.
        let needs_assist = outcome.contacts.is_empty() || !found.ambiguous.is_empty();
        if needs_assist {
            if let Some(ai) = &self.ai {
                let hints = ExtractionHints {
                    source_url: Some(url.to_string()),
                    ambiguous_spans: found.ambiguous,
                };
                match ai.extract_contacts(&text, &hints).await {
                    Ok(records) => {
                        debug!(url, count = records.len(), "AI extraction assist");
                        outcome.contacts.extend(records);
                    }
                    Err(err) => {
                        // Assist failures degrade, they do not fail the
                        // document: the pattern result stands.
                        debug!(url, error = %err, "AI extraction assist unavailable");
                    }
                }
            }
        }

        outcome.state = DocumentState::Done;
        outcome
    }

    /// One bounded retry with jittered backoff on retryable errors.
    async fn fetch_with_retry(&self, url: &str) -> Result<String, ClarionError> {
        match self.fetch_once(url).await {
            Ok(body) => Ok(body),
            Err(err) if err.is_retryable() => {
                let jitter = rand::thread_rng().gen_range(0..200u64);
                tokio::time::sleep(Duration::from_millis(400 + jitter)).await;
                self.fetch_once(url).await
            }
            Err(err) => Err(err),
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, ClarionError> {
        tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(url))
            .await
            .map_err(|_| ClarionError::timeout(format!("fetch of {url}")))?
    }
}

static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").expect("script pattern")
});
static BLOCK_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</(p|div|li|tr|h[1-6])>|<br\s*/?>").expect("block-end pattern")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

/// Reduces an HTML (or markdown) document to plain text, keeping line
/// structure so the address heuristics still see line boundaries.
pub fn strip_markup(body: &str) -> String {
    let no_scripts = SCRIPT_BLOCK.replace_all(body, " ");
    let with_breaks = BLOCK_END.replace_all(&no_scripts, "\n");
    let no_tags = TAG.replace_all(&with_breaks, " ");
    no_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use clarion_core::model::ContactKind;

    /// Fetcher serving canned bodies; unknown URLs are unreachable.
    struct StaticFetcher {
        pages: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, b)| (u.to_string(), b.to_string()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String, ClarionError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned().ok_or_else(|| {
                ClarionError::external("page_fetch", format!("{url} unreachable"), false)
            })
        }
    }

    const RELIEF_PAGE: &str = "<html><body><h1>Relief Center</h1>\
        <p>Emergency hotline: 1-800-222-1222</p>\
        <p>Office: (512) 555-0182</p>\
        <p>Write to aid@relief.example.org</p>\
        </body></html>";

    fn config() -> ClarionConfig {
        ClarionConfig::default()
    }

    #[tokio::test]
    async fn partial_failure_returns_union_of_successes() {
        let fetcher = Arc::new(StaticFetcher::new(&[("https://ok.example/contact", RELIEF_PAGE)]));
        let engine = ExtractionEngine::pattern_only(fetcher.clone(), &config());

        let urls = vec![
            "https://ok.example/contact".to_string(),
            "https://down.example/contact".to_string(),
        ];
        let report = engine.extract_all(&urls, &CancellationToken::new()).await;

        // Both URLs were attempted despite one being down.
        assert_eq!(fetcher.calls.lock().unwrap().len(), 2);

        assert!(!report.contacts.is_empty());
        assert_eq!(report.failed_sources(), vec!["https://down.example/contact"]);
        assert!(!report.all_failed());
        // Nothing fabricated for the unreachable source.
        assert!(
            report
                .contacts
                .iter()
                .all(|c| c.source_url.as_deref() == Some("https://ok.example/contact"))
        );
    }

    #[tokio::test]
    async fn pattern_mode_is_idempotent() {
        let fetcher = Arc::new(StaticFetcher::new(&[("https://ok.example/contact", RELIEF_PAGE)]));
        let engine = ExtractionEngine::pattern_only(fetcher, &config());
        let urls = vec!["https://ok.example/contact".to_string()];

        let first = engine.extract_all(&urls, &CancellationToken::new()).await;
        let second = engine.extract_all(&urls, &CancellationToken::new()).await;
        assert_eq!(first.contacts, second.contacts);
    }

    #[tokio::test]
    async fn total_failure_is_reported_not_raised() {
        let fetcher = Arc::new(StaticFetcher::new(&[]));
        let engine = ExtractionEngine::pattern_only(fetcher, &config());
        let urls = vec![
            "https://a.example".to_string(),
            "https://b.example".to_string(),
        ];
        let report = engine.extract_all(&urls, &CancellationToken::new()).await;
        assert!(report.all_failed());
        assert!(report.contacts.is_empty());
    }

    #[tokio::test]
    async fn cancellation_skips_pending_documents() {
        let fetcher = Arc::new(StaticFetcher::new(&[("https://ok.example/contact", RELIEF_PAGE)]));
        let engine = ExtractionEngine::pattern_only(fetcher, &config());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let urls = vec!["https://ok.example/contact".to_string()];
        let report = engine.extract_all(&urls, &cancel).await;
        assert!(report.all_failed());
    }

    #[tokio::test]
    async fn strips_markup_but_keeps_line_structure() {
        let text = strip_markup("<p>450 Relief Center Blvd, Springfield 62704</p><p>next</p>");
        assert!(text.contains("450 Relief Center Blvd, Springfield 62704\n"));
    }

    #[tokio::test]
    async fn emergency_classification_survives_dedup_against_plain_phone() {
        let page = "<p>Emergency hotline: 1-800-222-1222</p>\
                    <p>General enquiries 1-800-222-1222</p>";
        let fetcher = Arc::new(StaticFetcher::new(&[("https://x.example", page)]));
        let engine = ExtractionEngine::pattern_only(fetcher, &config());
        let report = engine
            .extract_all(&["https://x.example".to_string()], &CancellationToken::new())
            .await;

        let matching: Vec<_> = report
            .contacts
            .iter()
            .filter(|c| c.value.contains("222-1222"))
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].kind, ContactKind::EmergencyPhone);
    }
}
