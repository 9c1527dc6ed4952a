//! Per-candidate fetch and extraction. `SourceEnricher::content_for` is the
//! whole contract for one candidate: live fetch with content-type dispatch,
//! then offline fallbacks, then the floor/ceiling policy. It never errors —
//! an unusable candidate yields an empty string and is dropped upstream.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use prepintel_common::{clamp_chars, clean_text};

use crate::extract::{
    pdf_to_text, ContentExtractor, MarkupTextExtractor, ReadabilityExtractor,
};
use crate::types::{SourceCandidate, MAX_CONTENT_CHARS, MIN_CONTENT_CHARS};

const USER_AGENT: &str = "PrepIntelBot/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

// --- Live HTTP fetcher ---

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?
            .error_for_status()
            .context("Non-success status")?;

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await.context("Failed to read body")?;

        Ok(FetchedPage { content_type, body })
    }
}

// --- Enrichment pipeline ---

pub struct SourceEnricher {
    fetcher: Arc<dyn PageFetcher>,
    structured: Box<dyn ContentExtractor>,
    fallback: Box<dyn ContentExtractor>,
}

impl SourceEnricher {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            structured: Box::new(ReadabilityExtractor),
            fallback: Box::new(MarkupTextExtractor),
        }
    }

    pub fn with_extractors(
        fetcher: Arc<dyn PageFetcher>,
        structured: Box<dyn ContentExtractor>,
        fallback: Box<dyn ContentExtractor>,
    ) -> Self {
        Self {
            fetcher,
            structured,
            fallback,
        }
    }

    /// Cleaned, length-clamped content for one candidate, or empty string
    /// when every strategy and fallback stays below the content floor.
    pub async fn content_for(&self, candidate: &SourceCandidate) -> String {
        let url = candidate.url.as_str();
        if url.is_empty() {
            return String::new();
        }

        let mut text = match self.fetcher.fetch(url).await {
            Ok(page) => self.extract_live(url, &page),
            Err(e) => {
                debug!(url, error = %e, "Live fetch failed, using offline fallbacks");
                String::new()
            }
        };

        if clean_text(&text).is_empty() {
            text = String::new();
            let fallbacks = [
                &candidate.raw_content,
                &candidate.api_content,
                &candidate.snippet,
            ];
            for fallback in fallbacks {
                let cleaned = clean_text(fallback);
                if cleaned.chars().count() >= MIN_CONTENT_CHARS {
                    text = cleaned;
                    break;
                }
            }
        }

        let cleaned = clean_text(&text);
        if cleaned.chars().count() < MIN_CONTENT_CHARS {
            return String::new();
        }
        clamp_chars(&cleaned, MAX_CONTENT_CHARS).to_string()
    }

    fn extract_live(&self, url: &str, page: &FetchedPage) -> String {
        let content_type = page
            .content_type
            .as_deref()
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.contains("pdf") || url.to_ascii_lowercase().ends_with(".pdf") {
            return pdf_to_text(&page.body);
        }

        let markup = String::from_utf8_lossy(&page.body);
        let text = self.structured.extract(&markup, url);
        if !text.trim().is_empty() {
            debug!(url, strategy = self.structured.name(), bytes = text.len(), "Extracted content");
            return text;
        }
        let text = self.fallback.extract(&markup, url);
        if !text.trim().is_empty() {
            debug!(url, strategy = self.fallback.name(), bytes = text.len(), "Extracted content");
        }
        text
    }
}
