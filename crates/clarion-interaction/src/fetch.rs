//! Page-fetch collaborator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use clarion_core::ClarionError;
use clarion_core::config::ClarionConfig;

/// The page-fetch collaborator contract. Returns the page body as text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ClarionError>;
}

/// Plain HTTP fetcher with a per-request timeout.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    pub fn from_config(config: &ClarionConfig) -> Self {
        Self::new(&config.http_user_agent, config.fetch_timeout)
    }
}

/// Fetcher for fully offline operation: every URL is unreachable.
pub struct UnreachableFetcher;

#[async_trait]
impl PageFetcher for UnreachableFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ClarionError> {
        Err(ClarionError::external(
            "page_fetch",
            format!("network disabled, {url} unreachable"),
            false,
        ))
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ClarionError> {
        let response = self.client.get(url).send().await.map_err(|err| {
            ClarionError::external(
                "page_fetch",
                format!("fetch of {url} failed: {err}"),
                err.is_connect() || err.is_timeout(),
            )
        })?;

        if !response.status().is_success() {
            return Err(ClarionError::external(
                "page_fetch",
                format!("fetch of {url} returned {}", response.status()),
                response.status().is_server_error(),
            ));
        }

        response.text().await.map_err(|err| {
            ClarionError::external("page_fetch", format!("reading body of {url}: {err}"), false)
        })
    }
}
