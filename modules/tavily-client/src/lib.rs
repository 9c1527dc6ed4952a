pub mod error;

pub use error::{Result, TavilyError};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

const TAVILY_API_URL: &str = "https://api.tavily.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    include_raw_content: bool,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub raw_content: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

impl TavilyClient {
    pub fn new(api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.to_string(),
            base_url: TAVILY_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Run an advanced-depth search with raw page content included.
    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchResult>> {
        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            search_depth: "advanced",
            include_raw_content: true,
            max_results,
        };

        debug!(query, max_results, "Tavily search request");

        let resp = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(TavilyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let data: SearchResponse = resp.json().await?;
        Ok(data.results)
    }
}
