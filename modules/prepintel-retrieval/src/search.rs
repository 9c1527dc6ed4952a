//! Search-API seam. The aggregator only sees the [`WebSearcher`] trait, so
//! tests substitute scripted fakes and a missing credential becomes a noop.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

/// One raw search-API result. All fields are best-effort; only `url` matters
/// for candidate identity.
#[derive(Debug, Clone, Default)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub content: String,
    pub raw_content: String,
    pub snippet: String,
    pub answer: String,
}

#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>>;

    /// False when no credential is configured; retrieval short-circuits.
    fn is_configured(&self) -> bool {
        true
    }
}

// --- Tavily ---

pub struct TavilySearcher {
    client: tavily_client::TavilyClient,
}

impl TavilySearcher {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: tavily_client::TavilyClient::new(api_key),
        }
    }
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>> {
        let results = self
            .client
            .search(query, max_results)
            .await
            .context("Tavily search request failed")?;

        let hits: Vec<SearchHit> = results
            .into_iter()
            .map(|r| SearchHit {
                url: r.url,
                title: r.title,
                content: r.content,
                raw_content: r.raw_content.unwrap_or_default(),
                snippet: r.snippet.unwrap_or_default(),
                answer: r.answer.unwrap_or_default(),
            })
            .collect();

        info!(query, count = hits.len(), "Tavily search complete");
        Ok(hits)
    }
}

/// No-op searcher for when no API key is configured.
pub struct NoopSearcher;

#[async_trait]
impl WebSearcher for NoopSearcher {
    async fn search(&self, _query: &str, _max_results: u32) -> Result<Vec<SearchHit>> {
        Ok(Vec::new())
    }

    fn is_configured(&self) -> bool {
        false
    }
}
