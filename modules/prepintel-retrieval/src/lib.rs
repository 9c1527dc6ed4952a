//! Best-effort retrieval of interview intel sources.
//!
//! Search queries fan out to the search API, candidate URLs are fetched and
//! extracted concurrently, and everything degrades to fewer (or zero) sources
//! rather than surfacing an error to the caller.

pub mod aggregator;
pub mod extract;
pub mod fetcher;
pub mod planner;
pub mod search;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use aggregator::SourceAggregator;
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher, SourceEnricher};
pub use search::{NoopSearcher, SearchHit, TavilySearcher, WebSearcher};
pub use types::{EnrichedSource, SourceCandidate, MAX_CONTENT_CHARS, MIN_CONTENT_CHARS};
