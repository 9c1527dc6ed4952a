//! Content-extraction strategies. Each is side-effect-free and tolerant of
//! malformed input: failure means an empty string, never an error.

use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tracing::debug;

pub trait ContentExtractor: Send + Sync {
    /// Best-effort plain text from markup. Empty string when nothing usable
    /// can be extracted.
    fn extract(&self, markup: &str, url: &str) -> String;
    fn name(&self) -> &'static str;
}

// --- Readability main-content extraction ---

/// Structured extraction: Readability-style main-content transform with the
/// page URL as context.
pub struct ReadabilityExtractor;

impl ContentExtractor for ReadabilityExtractor {
    fn extract(&self, markup: &str, url: &str) -> String {
        let parsed_url = url::Url::parse(url).ok();
        let config = TransformConfig {
            readability: true,
            main_content: true,
            return_format: ReturnFormat::Markdown,
            filter_images: true,
            filter_svg: true,
            clean_html: true,
        };
        let input = TransformInput {
            url: parsed_url.as_ref(),
            content: markup.as_bytes(),
            screenshot_bytes: None,
            encoding: None,
            selector_config: None,
            ignore_tags: None,
        };

        transform_content_input(input, &config)
    }

    fn name(&self) -> &'static str {
        "readability"
    }
}

// --- Raw-markup fallback ---

/// Fallback extraction: parse the markup and join all visible text with
/// single spaces, skipping script/style subtrees.
pub struct MarkupTextExtractor;

impl ContentExtractor for MarkupTextExtractor {
    fn extract(&self, markup: &str, _url: &str) -> String {
        let doc = scraper::Html::parse_document(markup);
        let mut parts: Vec<&str> = Vec::new();

        for node in doc.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript"))
            });
            if hidden {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }

        parts.join(" ")
    }

    fn name(&self) -> &'static str {
        "markup-text"
    }
}

// --- Null object for disabled strategies ---

pub struct NoopExtractor;

impl ContentExtractor for NoopExtractor {
    fn extract(&self, _markup: &str, _url: &str) -> String {
        String::new()
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

// --- PDF text extraction ---

/// Extract text from an in-memory PDF, page by page. A page whose extraction
/// fails contributes an empty string; pages are joined with newlines.
pub fn pdf_to_text(bytes: &[u8]) -> String {
    let doc = match lopdf::Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(error = %e, "Failed to load PDF");
            return String::new();
        }
    };

    let mut pages: Vec<String> = Vec::new();
    for &number in doc.get_pages().keys() {
        pages.push(doc.extract_text(&[number]).unwrap_or_default());
    }
    pages.join("\n")
}
