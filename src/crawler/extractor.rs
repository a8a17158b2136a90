//! Link extraction
//!
//! Runs the configured selector rules against fetched HTML, filters the
//! raw attribute values, records one link edge per distinct target, and
//! queues targets that have not been seen yet.
//!
//! Edges are recorded for every extracted target regardless of whether it
//! gets queued; the link graph is complete even when crawling is not.

use crate::cache::IdentifierCache;
use crate::config::LinkConfig;
use crate::frontier::{Category, Frontier, FrontierEntry};
use crate::storage::{LinkEdge, SqliteStorage, Storage};
use crate::url::{extract_host, has_scheme, in_blacklist, in_whitelist, UrlClassifier};
use crate::{Result, SitegraphError};
use scraper::{Html, Selector};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Per-page extraction counts, for logging
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Distinct targets extracted after filtering
    pub discovered: usize,
    /// Targets newly queued on the frontier
    pub enqueued: usize,
}

/// A compiled selector rule
struct CompiledRule {
    selector: Selector,
    attributes: Vec<String>,
}

/// Extracts, classifies, records, and queues links from fetched pages
pub struct LinkExtractor {
    rules: Vec<CompiledRule>,
    exclude_str: Vec<String>,
    require_str: Vec<String>,
    exclude_type: Vec<Category>,
    skip_crawled: bool,
}

impl LinkExtractor {
    /// Compiles the configured selector rules. A selector that does not
    /// parse is a configuration fault, reported up front.
    pub fn new(links: &LinkConfig, skip_crawled: bool) -> Result<Self> {
        let mut rules = Vec::with_capacity(links.selectors.len());
        for rule in &links.selectors {
            let selector =
                Selector::parse(&rule.selector).map_err(|_| SitegraphError::Selector {
                    selector: rule.selector.clone(),
                })?;
            rules.push(CompiledRule {
                selector,
                attributes: rule.attributes.clone(),
            });
        }

        Ok(Self {
            rules,
            exclude_str: links.exclude_str.clone(),
            require_str: links.require_str.clone(),
            exclude_type: links.exclude_type.clone(),
            skip_crawled,
        })
    }

    /// Pulls raw attribute values out of a document, in selector-rule
    /// order, deduplicated, with the substring filters applied
    pub fn extract_values(&self, body: &str) -> Vec<String> {
        let document = Html::parse_document(body);
        let mut values = Vec::new();

        for rule in &self.rules {
            for element in document.select(&rule.selector) {
                for attribute in &rule.attributes {
                    if let Some(value) = element.value().attr(attribute) {
                        if value.is_empty() {
                            continue;
                        }
                        if in_blacklist(value, &self.exclude_str) {
                            continue;
                        }
                        if !in_whitelist(value, &self.require_str) {
                            continue;
                        }
                        if !values.iter().any(|v| v == value) {
                            values.push(value.to_string());
                        }
                    }
                }
            }
        }

        values
    }

    /// Processes one fetched page: extracts targets, records an edge for
    /// each, and queues the ones not yet seen at depth + 1.
    ///
    /// A target is not queued when its category is excluded, when an entry
    /// with the same literal URL is already in that queue, or when a crawl
    /// record for it exists in this run (or in any run, if configured to
    /// skip previously crawled URLs).
    #[allow(clippy::too_many_arguments)]
    pub fn process(
        &self,
        body: &str,
        source: &FrontierEntry,
        source_url_id: i64,
        run_id: i64,
        classifier: &UrlClassifier,
        ids: &mut IdentifierCache,
        storage: &Arc<Mutex<SqliteStorage>>,
        frontier: &mut Frontier,
    ) -> Result<ExtractionStats> {
        let values = self.extract_values(body);
        let mut stats = ExtractionStats {
            discovered: values.len(),
            enqueued: 0,
        };

        let root_id = ids.resolve_domain(classifier.root_domain(), classifier.https())?;
        let root_prefix = ids.domain_info(root_id)?.url_prefix();

        let mut edges = Vec::with_capacity(values.len());

        for value in values {
            let category = classifier.classify(&value, ids)?;

            // Relative values always resolve against the root domain
            let (absolute, domain_id) = if has_scheme(&value) {
                let host = extract_host(&value).unwrap_or_default();
                let domain_id = ids.resolve_domain(host, classifier.https())?;
                (value, domain_id)
            } else if value.starts_with('/') {
                (format!("{root_prefix}{value}"), root_id)
            } else {
                (format!("{root_prefix}/{value}"), root_id)
            };

            let target_id = ids.resolve_url(&absolute, domain_id)?;
            edges.push(LinkEdge {
                run_id,
                from_url: source_url_id,
                to_url: target_id,
            });

            if self.exclude_type.contains(&category) {
                continue;
            }
            if frontier.contains(category, &absolute) {
                continue;
            }

            let crawled = {
                let storage = storage.lock().unwrap();
                let scope = if self.skip_crawled { None } else { Some(run_id) };
                storage.has_crawl_record(target_id, scope)?
            };
            if crawled {
                continue;
            }

            frontier.push(category, FrontierEntry::new(absolute, source.depth + 1));
            stats.enqueued += 1;
        }

        storage.lock().unwrap().insert_link_edges(&edges)?;

        debug!(
            url = %source.url,
            discovered = stats.discovered,
            enqueued = stats.enqueued,
            "extracted links"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SelectorRule, SubdomainConfig};

    fn link_config(selectors: Vec<(&str, Vec<&str>)>) -> LinkConfig {
        LinkConfig {
            selectors: selectors
                .into_iter()
                .map(|(selector, attributes)| SelectorRule {
                    selector: selector.to_string(),
                    attributes: attributes.into_iter().map(String::from).collect(),
                })
                .collect(),
            ..LinkConfig::default()
        }
    }

    fn classifier() -> UrlClassifier {
        UrlClassifier::new(
            "example.com",
            false,
            vec!["html".to_string()],
            SubdomainConfig::default(),
        )
    }

    fn harness() -> (Arc<Mutex<SqliteStorage>>, IdentifierCache, Frontier, i64) {
        let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
        let run_id = storage.lock().unwrap().create_run("test-hash").unwrap();
        let ids = IdentifierCache::new(storage.clone());
        (storage, ids, Frontier::new(), run_id)
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let config = link_config(vec![("a[", vec!["href"])]);
        assert!(matches!(
            LinkExtractor::new(&config, false),
            Err(SitegraphError::Selector { .. })
        ));
    }

    #[test]
    fn test_extract_values_applies_filters() {
        let mut config = link_config(vec![("a", vec!["href"])]);
        config.exclude_str = vec!["logout".to_string()];
        config.require_str = vec!["/docs".to_string()];
        let extractor = LinkExtractor::new(&config, false).unwrap();

        let body = r#"<html><body>
            <a href="/docs/intro">in</a>
            <a href="/docs/logout">excluded</a>
            <a href="/blog/post">not required</a>
            <a href="/docs/intro">duplicate</a>
        </body></html>"#;

        assert_eq!(extractor.extract_values(body), vec!["/docs/intro"]);
    }

    #[test]
    fn test_extract_values_multiple_rules() {
        let config = link_config(vec![("a", vec!["href"]), ("img", vec!["src"])]);
        let extractor = LinkExtractor::new(&config, false).unwrap();

        let body = r#"<html><body>
            <a href="/page">p</a>
            <img src="/logo.png">
        </body></html>"#;

        assert_eq!(extractor.extract_values(body), vec!["/page", "/logo.png"]);
    }

    #[test]
    fn test_process_queues_and_records_edges() {
        let (storage, mut ids, mut frontier, run_id) = harness();
        let classifier = classifier();
        let extractor = LinkExtractor::new(&link_config(vec![("a", vec!["href"])]), false).unwrap();

        let root = ids.resolve_domain("example.com", false).unwrap();
        let source = FrontierEntry::new("http://example.com/", 0);
        let source_id = ids.resolve_url(&source.url, root).unwrap();

        let body = r#"<html><body>
            <a href="/about">about</a>
            <a href="http://other.com/x">ext</a>
            <a href="/report.pdf">pdf</a>
        </body></html>"#;

        let stats = extractor
            .process(
                body, &source, source_id, run_id, &classifier, &mut ids, &storage, &mut frontier,
            )
            .unwrap();

        assert_eq!(stats.discovered, 3);
        assert_eq!(stats.enqueued, 3);
        assert!(frontier.contains(Category::Internal, "http://example.com/about"));
        assert!(frontier.contains(Category::External, "http://other.com/x"));
        assert!(frontier.contains(Category::File, "http://example.com/report.pdf"));
        assert_eq!(storage.lock().unwrap().count_link_edges(run_id).unwrap(), 3);
    }

    #[test]
    fn test_process_increments_depth() {
        let (storage, mut ids, mut frontier, run_id) = harness();
        let classifier = classifier();
        let extractor = LinkExtractor::new(&link_config(vec![("a", vec!["href"])]), false).unwrap();

        let root = ids.resolve_domain("example.com", false).unwrap();
        let source = FrontierEntry::new("http://example.com/deep", 4);
        let source_id = ids.resolve_url(&source.url, root).unwrap();

        extractor
            .process(
                r#"<a href="/deeper">x</a>"#,
                &source,
                source_id,
                run_id,
                &classifier,
                &mut ids,
                &storage,
                &mut frontier,
            )
            .unwrap();

        let entry = frontier
            .pop(Category::Internal, crate::frontier::Ordering::Fifo)
            .unwrap();
        assert_eq!(entry.depth, 5);
    }

    #[test]
    fn test_process_skips_queued_and_crawled_but_keeps_edges() {
        let (storage, mut ids, mut frontier, run_id) = harness();
        let classifier = classifier();
        let extractor = LinkExtractor::new(&link_config(vec![("a", vec!["href"])]), false).unwrap();

        let root = ids.resolve_domain("example.com", false).unwrap();
        let source = FrontierEntry::new("http://example.com/", 0);
        let source_id = ids.resolve_url(&source.url, root).unwrap();

        // Already queued
        frontier.push(
            Category::Internal,
            FrontierEntry::new("http://example.com/queued", 1),
        );
        // Already crawled in this run
        let crawled_id = ids.resolve_url("http://example.com/crawled", root).unwrap();
        storage
            .lock()
            .unwrap()
            .insert_crawl_record(run_id, crawled_id, Category::Internal, 1, Some(200), 0.1)
            .unwrap();

        let body = r#"<html><body>
            <a href="/queued">q</a>
            <a href="/crawled">c</a>
            <a href="/fresh">f</a>
        </body></html>"#;

        let stats = extractor
            .process(
                body, &source, source_id, run_id, &classifier, &mut ids, &storage, &mut frontier,
            )
            .unwrap();

        assert_eq!(stats.discovered, 3);
        assert_eq!(stats.enqueued, 1);
        assert_eq!(frontier.len(Category::Internal), 2);
        // Edges are recorded even for skipped targets
        assert_eq!(storage.lock().unwrap().count_link_edges(run_id).unwrap(), 3);
    }

    #[test]
    fn test_process_respects_excluded_categories() {
        let (storage, mut ids, mut frontier, run_id) = harness();
        let classifier = classifier();
        let mut config = link_config(vec![("a", vec!["href"])]);
        config.exclude_type = vec![Category::External, Category::File];
        let extractor = LinkExtractor::new(&config, false).unwrap();

        let root = ids.resolve_domain("example.com", false).unwrap();
        let source = FrontierEntry::new("http://example.com/", 0);
        let source_id = ids.resolve_url(&source.url, root).unwrap();

        let body = r#"<html><body>
            <a href="/page">p</a>
            <a href="http://other.com/">e</a>
            <a href="/data.csv">f</a>
        </body></html>"#;

        let stats = extractor
            .process(
                body, &source, source_id, run_id, &classifier, &mut ids, &storage, &mut frontier,
            )
            .unwrap();

        assert_eq!(stats.enqueued, 1);
        assert!(frontier.is_empty(Category::External));
        assert!(frontier.is_empty(Category::File));
        // Excluded categories still get edges
        assert_eq!(storage.lock().unwrap().count_link_edges(run_id).unwrap(), 3);
    }

    #[test]
    fn test_skip_crawled_looks_across_runs() {
        let (storage, mut ids, mut frontier, run_id) = harness();
        let classifier = classifier();
        let extractor = LinkExtractor::new(&link_config(vec![("a", vec!["href"])]), true).unwrap();

        let root = ids.resolve_domain("example.com", false).unwrap();
        let source = FrontierEntry::new("http://example.com/", 0);
        let source_id = ids.resolve_url(&source.url, root).unwrap();

        // Crawled during an earlier run
        let earlier_run = storage.lock().unwrap().create_run("old-hash").unwrap();
        let old_id = ids.resolve_url("http://example.com/old", root).unwrap();
        storage
            .lock()
            .unwrap()
            .insert_crawl_record(earlier_run, old_id, Category::Internal, 0, Some(200), 0.1)
            .unwrap();

        let stats = extractor
            .process(
                r#"<a href="/old">o</a>"#,
                &source,
                source_id,
                run_id,
                &classifier,
                &mut ids,
                &storage,
                &mut frontier,
            )
            .unwrap();

        assert_eq!(stats.enqueued, 0);
        assert!(frontier.is_empty(Category::Internal));
    }

    #[test]
    fn test_relative_value_without_slash_gets_one() {
        let (storage, mut ids, mut frontier, run_id) = harness();
        let classifier = classifier();
        let extractor = LinkExtractor::new(&link_config(vec![("a", vec!["href"])]), false).unwrap();

        let root = ids.resolve_domain("example.com", false).unwrap();
        let source = FrontierEntry::new("http://example.com/", 0);
        let source_id = ids.resolve_url(&source.url, root).unwrap();

        extractor
            .process(
                r#"<a href="page.html">p</a>"#,
                &source,
                source_id,
                run_id,
                &classifier,
                &mut ids,
                &storage,
                &mut frontier,
            )
            .unwrap();

        assert!(frontier.contains(Category::Internal, "http://example.com/page.html"));
    }
}
