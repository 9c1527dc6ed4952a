//! Query-plan execution and concurrent candidate enrichment.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};

use crate::fetcher::SourceEnricher;
use crate::planner;
use crate::search::{SearchHit, WebSearcher};
use crate::types::{derive_source_domain, EnrichedSource, SourceCandidate};

/// Hard cap on sources returned per call, regardless of caller input.
pub const MAX_SOURCES_CAP: usize = 3;
/// Bound on simultaneous candidate fetches.
const MAX_CONCURRENT_FETCHES: usize = 4;

pub struct SourceAggregator {
    searcher: Arc<dyn WebSearcher>,
    enricher: SourceEnricher,
}

impl SourceAggregator {
    pub fn new(searcher: Arc<dyn WebSearcher>, enricher: SourceEnricher) -> Self {
        Self { searcher, enricher }
    }

    /// Retrieve up to `max_sources` (clamped to [1, 3]) usable interview
    /// sources for a company/role pair. Never errors: every failure mode
    /// resolves to fewer or zero sources.
    pub async fn fetch_interview_sources(
        &self,
        company: &str,
        role: &str,
        max_sources: usize,
    ) -> Vec<EnrichedSource> {
        if !self.searcher.is_configured() {
            warn!("Search credentials missing; cannot fetch sources");
            return Vec::new();
        }

        let max_sources = max_sources.clamp(1, MAX_SOURCES_CAP);
        let company = company.trim();
        let role = role.trim();
        if company.is_empty() && role.is_empty() {
            warn!("Neither company nor role provided; skipping search");
            return Vec::new();
        }

        let candidates = self.collect_candidates(company, role, max_sources).await;
        if candidates.is_empty() {
            return Vec::new();
        }

        // Fan out bounded by the worker cap, consume completions in finish
        // order, stop at the cap. Stragglers still in flight are dropped with
        // the stream.
        let enricher = &self.enricher;
        let width = MAX_CONCURRENT_FETCHES.min(candidates.len());
        let mut completions = stream::iter(candidates)
            .map(|candidate| async move {
                let content = enricher.content_for(&candidate).await;
                (candidate, content)
            })
            .buffer_unordered(width);

        let mut enriched: Vec<EnrichedSource> = Vec::new();
        while let Some((candidate, content)) = completions.next().await {
            if content.is_empty() {
                continue;
            }
            enriched.push(EnrichedSource {
                id: format!("S{}", enriched.len() + 1),
                url: candidate.url.clone(),
                title: candidate.title.clone(),
                source_domain: candidate.source_domain.clone(),
                snippet: candidate.snippet.clone(),
                content,
            });
            if enriched.len() >= max_sources {
                break;
            }
        }

        info!(
            company,
            role,
            sources = enriched.len(),
            "Source retrieval complete"
        );
        enriched
    }

    /// Run the query plan sequentially, deduplicate by exact URL, and stop
    /// once `max_sources` candidates are collected. A failed query is logged
    /// and skipped; it never aborts the rest of the plan.
    async fn collect_candidates(
        &self,
        company: &str,
        role: &str,
        max_sources: usize,
    ) -> Vec<SourceCandidate> {
        let mut candidates: Vec<SourceCandidate> = Vec::new();
        let mut seen_urls: HashSet<String> = HashSet::new();

        for query in planner::query_plan(company, role) {
            if candidates.len() >= max_sources {
                break;
            }
            let hits = match self.searcher.search(&query, max_sources as u32).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(query = query.as_str(), error = %e, "Search query failed");
                    continue;
                }
            };

            for hit in hits {
                if candidates.len() >= max_sources {
                    break;
                }
                let url = hit.url.trim().to_string();
                if url.is_empty() || !seen_urls.insert(url.clone()) {
                    continue;
                }
                candidates.push(candidate_from_hit(hit, url, company, role));
            }
        }

        info!(count = candidates.len(), "Collected search candidates");
        candidates
    }
}

fn candidate_from_hit(hit: SearchHit, url: String, company: &str, role: &str) -> SourceCandidate {
    let fallback_title = {
        let named = format!("{company} {role}").trim().to_string();
        if named.is_empty() {
            "Interview source".to_string()
        } else {
            named
        }
    };
    let title = first_non_empty(&[hit.title.as_str(), url.as_str()]).unwrap_or(fallback_title);
    let snippet = first_non_empty(&[
        hit.snippet.as_str(),
        hit.content.as_str(),
        hit.answer.as_str(),
        title.as_str(),
    ])
    .unwrap_or_default();

    SourceCandidate {
        source_domain: derive_source_domain(&url),
        url,
        title,
        snippet,
        raw_content: hit.raw_content,
        api_content: hit.content,
    }
}

fn first_non_empty(values: &[&str]) -> Option<String> {
    values
        .iter()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::SourceEnricher;
    use crate::search::NoopSearcher;
    use crate::testing::{filler, hit, FailingFetcher, ScriptedSearcher, StubFetcher};
    use crate::types::{MAX_CONTENT_CHARS, MIN_CONTENT_CHARS};

    use anyhow::anyhow;
    use std::sync::atomic::Ordering;

    fn article(text: &str) -> String {
        format!("<html><body><article><p>{text}</p></article></body></html>")
    }

    fn aggregator(searcher: ScriptedSearcher, fetcher: StubFetcher) -> SourceAggregator {
        SourceAggregator::new(
            Arc::new(searcher),
            SourceEnricher::new(Arc::new(fetcher)),
        )
    }

    #[tokio::test]
    async fn happy_path_returns_capped_sources_with_dense_ids() {
        let hits = vec![
            hit("https://a.example.com/1", "One"),
            hit("https://b.example.com/2", "Two"),
            hit("https://c.example.com/3", "Three"),
            hit("https://d.example.com/4", "Four"),
            hit("https://e.example.com/5", "Five"),
        ];
        let searcher = ScriptedSearcher::new(vec![Ok(hits)]);
        let mut fetcher = StubFetcher::new();
        for url in [
            "https://a.example.com/1",
            "https://b.example.com/2",
            "https://c.example.com/3",
            "https://d.example.com/4",
            "https://e.example.com/5",
        ] {
            fetcher = fetcher.with_html(url, &article(&filler(600)));
        }

        let sources = aggregator(searcher, fetcher)
            .fetch_interview_sources("Acme", "Software Engineer", 3)
            .await;

        assert_eq!(sources.len(), 3);
        for (i, source) in sources.iter().enumerate() {
            assert_eq!(source.id, format!("S{}", i + 1));
            let chars = source.content.chars().count();
            assert!((MIN_CONTENT_CHARS..=MAX_CONTENT_CHARS).contains(&chars));
        }
        let mut urls: Vec<_> = sources.iter().map(|s| s.url.as_str()).collect();
        urls.sort_unstable();
        urls.dedup();
        assert_eq!(urls.len(), 3);
    }

    #[tokio::test]
    async fn caller_supplied_cap_is_clamped() {
        let searcher = ScriptedSearcher::new(vec![Ok(vec![
            hit("https://a.example.com/1", "One"),
            hit("https://b.example.com/2", "Two"),
            hit("https://c.example.com/3", "Three"),
            hit("https://d.example.com/4", "Four"),
        ])]);
        let fetcher = StubFetcher::new()
            .with_html("https://a.example.com/1", &article(&filler(600)))
            .with_html("https://b.example.com/2", &article(&filler(600)))
            .with_html("https://c.example.com/3", &article(&filler(600)))
            .with_html("https://d.example.com/4", &article(&filler(600)));

        let sources = aggregator(searcher, fetcher)
            .fetch_interview_sources("Acme", "", 99)
            .await;
        assert!(sources.len() <= MAX_SOURCES_CAP);
    }

    #[tokio::test]
    async fn zero_cap_is_raised_to_one() {
        let searcher = ScriptedSearcher::new(vec![Ok(vec![hit(
            "https://a.example.com/1",
            "One",
        )])]);
        let fetcher =
            StubFetcher::new().with_html("https://a.example.com/1", &article(&filler(600)));

        let sources = aggregator(searcher, fetcher)
            .fetch_interview_sources("Acme", "", 0)
            .await;
        assert_eq!(sources.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_urls_across_queries_are_collapsed() {
        // First query yields one candidate, so the plan continues; the second
        // and third queries repeat the same URL.
        let searcher = ScriptedSearcher::new(vec![
            Ok(vec![hit("https://a.example.com/same", "One")]),
            Ok(vec![hit("https://a.example.com/same", "Dup")]),
            Ok(vec![
                hit("https://a.example.com/same", "Dup"),
                hit("https://b.example.com/other", "Two"),
            ]),
        ]);
        let fetcher = StubFetcher::new()
            .with_html("https://a.example.com/same", &article(&filler(600)))
            .with_html("https://b.example.com/other", &article(&filler(600)));

        let sources = aggregator(searcher, fetcher)
            .fetch_interview_sources("Acme", "", 3)
            .await;

        let urls: HashSet<_> = sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls.len(), sources.len(), "duplicate url in result");
    }

    #[tokio::test]
    async fn missing_credential_short_circuits_without_search_calls() {
        let enricher = SourceEnricher::new(Arc::new(FailingFetcher));
        let aggregator = SourceAggregator::new(Arc::new(NoopSearcher), enricher);

        let sources = aggregator
            .fetch_interview_sources("Acme", "Engineer", 3)
            .await;
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn empty_company_and_role_short_circuit() {
        let searcher = Arc::new(ScriptedSearcher::new(vec![Ok(vec![hit(
            "https://a.example.com/1",
            "One",
        )])]));
        let agg = SourceAggregator::new(
            searcher.clone() as Arc<dyn WebSearcher>,
            SourceEnricher::new(Arc::new(StubFetcher::new())),
        );

        let sources = agg.fetch_interview_sources("   ", "", 3).await;
        assert!(sources.is_empty());
        // The query plan must not have been issued at all.
        assert_eq!(searcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_queries_are_skipped_not_fatal() {
        let searcher = ScriptedSearcher::new(vec![
            Err(anyhow!("connection reset")),
            Err(anyhow!("dns failure")),
            Ok(vec![
                hit("https://a.example.com/1", "One"),
                hit("https://b.example.com/2", "Two"),
                hit("https://c.example.com/3", "Three"),
            ]),
        ]);
        let fetcher = StubFetcher::new()
            .with_html("https://a.example.com/1", &article(&filler(600)))
            .with_html("https://b.example.com/2", &article(&filler(600)))
            .with_html("https://c.example.com/3", &article(&filler(600)));

        let sources = aggregator(searcher, fetcher)
            .fetch_interview_sources("Acme", "Engineer", 3)
            .await;
        assert_eq!(sources.len(), 3);
    }

    #[tokio::test]
    async fn all_fetches_fail_snippet_rescues_one() {
        let mut rescued = hit("https://a.example.com/1", "One");
        rescued.snippet = filler(400);
        let mut short1 = hit("https://b.example.com/2", "Two");
        short1.snippet = "too short".to_string();
        let mut short2 = hit("https://c.example.com/3", "Three");
        short2.raw_content = "also short".to_string();

        let searcher = ScriptedSearcher::new(vec![Ok(vec![rescued.clone(), short1, short2])]);
        let enricher = SourceEnricher::new(Arc::new(FailingFetcher));
        let aggregator = SourceAggregator::new(Arc::new(searcher), enricher);

        let sources = aggregator
            .fetch_interview_sources("Acme", "Engineer", 3)
            .await;

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, "S1");
        assert_eq!(sources[0].url, "https://a.example.com/1");
        assert_eq!(
            sources[0].content,
            prepintel_common::clean_text(&rescued.snippet)
        );
    }

    #[tokio::test]
    async fn no_candidates_yields_empty() {
        let searcher = ScriptedSearcher::new(vec![Ok(vec![]), Ok(vec![]), Ok(vec![])]);
        let sources = aggregator(searcher, StubFetcher::new())
            .fetch_interview_sources("Acme", "Engineer", 2)
            .await;
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn query_plan_stops_once_candidate_cap_is_hit() {
        let searcher = ScriptedSearcher::new(vec![Ok(vec![
            hit("https://a.example.com/1", "One"),
            hit("https://b.example.com/2", "Two"),
        ])]);
        let fetcher = StubFetcher::new()
            .with_html("https://a.example.com/1", &article(&filler(600)))
            .with_html("https://b.example.com/2", &article(&filler(600)));

        let agg = aggregator(searcher, fetcher);
        let sources = agg.fetch_interview_sources("Acme", "", 2).await;
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn candidate_title_and_snippet_fallback_chain() {
        let mut h = hit("https://a.example.com/1", "");
        h.content = "api summary".to_string();
        let c = candidate_from_hit(h, "https://a.example.com/1".to_string(), "Acme", "SWE");
        assert_eq!(c.title, "https://a.example.com/1");
        assert_eq!(c.snippet, "api summary");
        assert_eq!(c.source_domain, "a.example.com");

        let h = hit("https://a.example.com/1", "  ");
        let c = candidate_from_hit(h, String::new(), "", "");
        assert_eq!(c.title, "Interview source");
        assert_eq!(c.snippet, "Interview source");
        assert_eq!(c.source_domain, "web");
    }
}
