//! Web search collaborator - direct REST implementation for the Exa
//! search API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use clarion_core::ClarionError;
use clarion_core::config::ClarionConfig;

const BASE_URL: &str = "https://api.exa.ai/search";
const SNIPPET_CHARS: usize = 2000;

/// One ranked search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// The search/knowledge collaborator contract.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ClarionError>;
}

/// Search provider implementation backed by the Exa HTTP API.
#[derive(Clone)]
pub struct ExaSearchClient {
    client: Client,
    api_key: String,
}

impl ExaSearchClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// Builds the client from configuration, or `None` when no
    /// credential is configured.
    pub fn from_config(config: &ClarionConfig) -> Option<Self> {
        config
            .search_api_key
            .as_deref()
            .map(|key| Self::new(key, config.call_timeout))
    }
}

#[async_trait]
impl SearchProvider for ExaSearchClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ClarionError> {
        let request = SearchRequest {
            query: query.to_string(),
            search_type: "auto".to_string(),
            num_results: limit,
            contents: ContentsSpec {
                text: TextSpec {
                    max_characters: SNIPPET_CHARS,
                },
            },
        };

        let response = self
            .client
            .post(BASE_URL)
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                ClarionError::external(
                    "search",
                    format!("Exa search request failed: {err}"),
                    err.is_connect() || err.is_timeout(),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Exa error body".to_string());
            return Err(ClarionError::external(
                "search",
                format!("Exa search returned {status}: {body}"),
                matches!(
                    status,
                    StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
                ),
            ));
        }

        let parsed: SearchResponse = response.json().await.map_err(|err| {
            ClarionError::external(
                "search",
                format!("Failed to parse Exa response: {err}"),
                false,
            )
        })?;

        Ok(parsed
            .results
            .into_iter()
            .map(|result| SearchHit {
                title: result.title.unwrap_or_else(|| result.url.clone()),
                snippet: result
                    .text
                    .map(|t| t.chars().take(200).collect())
                    .unwrap_or_default(),
                url: result.url,
            })
            .collect())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    query: String,
    #[serde(rename = "type")]
    search_type: String,
    num_results: usize,
    contents: ContentsSpec,
}

#[derive(Serialize)]
struct ContentsSpec {
    text: TextSpec,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextSpec {
    max_characters: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    title: Option<String>,
    url: String,
    text: Option<String>,
}
