use serde::{Deserialize, Serialize};

/// Minimum cleaned-text length for a source to be usable at all.
pub const MIN_CONTENT_CHARS: usize = 300;
/// Maximum cleaned-text length kept per source.
pub const MAX_CONTENT_CHARS: usize = 10_000;

/// A search-result URL not yet fetched or validated.
#[derive(Debug, Clone)]
pub struct SourceCandidate {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub source_domain: String,
    /// Pre-fetched page text supplied by the search API, fallback only.
    pub raw_content: String,
    /// Search-API summary text, fallback only.
    pub api_content: String,
}

/// A validated, content-bearing source meeting the minimum-length floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedSource {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(rename = "source")]
    pub source_domain: String,
    pub snippet: String,
    pub content: String,
}

/// Lower-cased hostname with a leading "www." stripped; "web" when the URL
/// cannot be parsed.
pub fn derive_source_domain(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or("").to_ascii_lowercase();
            let host = host.strip_prefix("www.").unwrap_or(&host);
            if host.is_empty() {
                "web".to_string()
            } else {
                host.to_string()
            }
        }
        Err(_) => "web".to_string(),
    }
}
