//! Collaborator hook traits
//!
//! Host applications extend the crawl loop through these seams. Observers
//! see every successfully fetched page; predicates vote during the startup
//! prune of already-crawled frontier entries.

use crate::frontier::FrontierEntry;

/// Notified after each successful fetch of an internal page when the
/// browser backend is active
pub trait PostFetchObserver: Send {
    fn on_fetched(&mut self, url: &str, url_id: i64);
}

/// Votes on whether a restored frontier entry counts as already crawled
///
/// An entry is pruned only when the store has a crawl record for it AND
/// every registered predicate agrees. Any dissent keeps the entry queued.
pub trait CheckCrawledPredicate: Send {
    fn is_already_crawled(&mut self, entry: &FrontierEntry, url_id: i64) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingObserver {
        seen: Vec<(String, i64)>,
    }

    impl PostFetchObserver for CountingObserver {
        fn on_fetched(&mut self, url: &str, url_id: i64) {
            self.seen.push((url.to_string(), url_id));
        }
    }

    #[test]
    fn test_observer_receives_url_and_id() {
        let mut observer = CountingObserver { seen: vec![] };
        observer.on_fetched("http://example.com/a", 7);
        assert_eq!(observer.seen, vec![("http://example.com/a".to_string(), 7)]);
    }
}
