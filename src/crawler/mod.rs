//! Crawl engine: fetch backends, link extraction, and the crawl loop

mod capabilities;
mod coordinator;
mod extractor;
mod fetcher;

pub use capabilities::{CheckCrawledPredicate, PostFetchObserver};
pub use coordinator::{Coordinator, RunMode};
pub use extractor::{ExtractionStats, LinkExtractor};
pub use fetcher::{
    BrowserFetcher, BrowserSession, FetchBackend, FetchError, FetchOutcome, HttpFetcher,
};
