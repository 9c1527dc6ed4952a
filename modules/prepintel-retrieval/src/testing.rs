//! Shared fixtures and fakes for the retrieval tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;

use crate::fetcher::{FetchedPage, PageFetcher};
use crate::search::{SearchHit, WebSearcher};

/// Build a minimal one-page PDF with the given text in its content stream.
pub fn pdf_with_text(text: &str) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content stream"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize PDF");
    buf
}

/// A paragraph of printable filler text of at least `chars` characters.
pub fn filler(chars: usize) -> String {
    let sentence = "The onsite loop covers coding, system design, and behavioral rounds. ";
    sentence.repeat(chars / sentence.len() + 1)
}

/// Fetcher serving canned pages per URL; unknown URLs fail like a network
/// error. Counts fetches so tests can assert fan-out behavior.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, FetchedPage>,
    pub fetches: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_html(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: Bytes::from(body.to_string()),
            },
        );
        self
    }

    pub fn with_page(mut self, url: &str, content_type: &str, body: Vec<u8>) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                content_type: Some(content_type.to_string()),
                body: Bytes::from(body),
            },
        );
        self
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("connection refused: {url}"))
    }
}

/// Fetcher that always fails, for offline-fallback tests.
pub struct FailingFetcher;

#[async_trait]
impl PageFetcher for FailingFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        Err(anyhow!("timed out fetching {url}"))
    }
}

/// Searcher replaying a scripted list of per-query outcomes in order.
/// Queries beyond the script return no hits.
pub struct ScriptedSearcher {
    script: Mutex<Vec<Result<Vec<SearchHit>>>>,
    pub calls: AtomicUsize,
}

impl ScriptedSearcher {
    pub fn new(script: Vec<Result<Vec<SearchHit>>>) -> Self {
        // Stored reversed so each call pops the next outcome.
        let mut script = script;
        script.reverse();
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WebSearcher for ScriptedSearcher {
    async fn search(&self, _query: &str, _max_results: u32) -> Result<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop() {
            Some(outcome) => outcome,
            None => Ok(Vec::new()),
        }
    }
}

pub fn hit(url: &str, title: &str) -> SearchHit {
    SearchHit {
        url: url.to_string(),
        title: title.to_string(),
        ..SearchHit::default()
    }
}
