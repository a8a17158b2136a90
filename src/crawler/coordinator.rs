//! Crawl coordination: the main crawl loop
//!
//! This module drives a run end to end:
//! - Restoring and seeding the frontier
//! - Pruning entries already crawled
//! - Visiting category queues in a fixed order under count and time budgets
//! - Recording fetches, bodies, headers, and extracted links
//! - Consecutive-error escalation with a frontier checkpoint
//! - Persisting leftover entries on shutdown

use crate::cache::IdentifierCache;
use crate::config::{Config, FetchMethod};
use crate::crawler::capabilities::{CheckCrawledPredicate, PostFetchObserver};
use crate::crawler::extractor::LinkExtractor;
use crate::crawler::fetcher::{BrowserFetcher, BrowserSession, FetchBackend, HttpFetcher};
use crate::frontier::{Category, Frontier, FrontierEntry, Ordering};
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::url::{extract_host, UrlClassifier};
use crate::{Result, SitegraphError};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How the loop treats fetch failures
///
/// A run starts `Normal`: failures are tolerated up to the configured
/// consecutive-error maximum, with failed entries optionally re-queued.
/// Crossing the maximum checkpoints the frontier and switches to
/// `Escalated`, where the next failure aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Normal,
    Escalated,
}

/// Fetch attempts made so far, per category and overall
#[derive(Debug, Default, Clone, Copy)]
struct AttemptCounts {
    internal: u64,
    external: u64,
    file: u64,
    total: u64,
}

impl AttemptCounts {
    fn for_category(&self, category: Category) -> u64 {
        match category {
            Category::Internal => self.internal,
            Category::External => self.external,
            Category::File => self.file,
        }
    }

    fn record(&mut self, category: Category) {
        match category {
            Category::Internal => self.internal += 1,
            Category::External => self.external += 1,
            Category::File => self.file += 1,
        }
        self.total += 1;
    }
}

/// Owns every moving part of one crawl run
pub struct Coordinator {
    config: Config,
    storage: Arc<Mutex<SqliteStorage>>,
    ids: IdentifierCache,
    frontier: Frontier,
    classifier: UrlClassifier,
    extractor: LinkExtractor,
    backend: FetchBackend,
    observers: Vec<Box<dyn PostFetchObserver>>,
    check_crawled: Vec<Box<dyn CheckCrawledPredicate>>,
    run_id: i64,
    mode: RunMode,
    error_count: u32,
    counts: AttemptCounts,
}

impl Coordinator {
    /// Creates a coordinator with the HTTP backend. The browser method
    /// needs a session; use [`Coordinator::with_browser`] for it.
    pub fn new(config: Config, config_hash: &str) -> Result<Self> {
        if config.crawler.method == FetchMethod::Browser {
            return Err(crate::ConfigError::Validation(
                "crawler.method = \"browser\" requires an injected browser session".to_string(),
            )
            .into());
        }
        let backend = FetchBackend::Http(HttpFetcher::new(&config.crawler)?);
        Self::build(config, config_hash, backend)
    }

    /// Creates a coordinator driving the given browser session
    pub fn with_browser(
        config: Config,
        config_hash: &str,
        session: Box<dyn BrowserSession>,
    ) -> Result<Self> {
        let backend = FetchBackend::Browser(BrowserFetcher::new(session));
        Self::build(config, config_hash, backend)
    }

    fn build(config: Config, config_hash: &str, backend: FetchBackend) -> Result<Self> {
        let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let run_id = storage.create_run(config_hash)?;
        let storage = Arc::new(Mutex::new(storage));

        let classifier = UrlClassifier::from_config(&config);
        let extractor = LinkExtractor::new(&config.links, config.crawler.skip_crawled)?;
        let ids = IdentifierCache::new(Arc::clone(&storage));

        Ok(Self {
            config,
            storage,
            ids,
            frontier: Frontier::new(),
            classifier,
            extractor,
            backend,
            observers: Vec::new(),
            check_crawled: Vec::new(),
            run_id,
            mode: RunMode::Normal,
            error_count: 0,
            counts: AttemptCounts::default(),
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn run_mode(&self) -> RunMode {
        self.mode
    }

    /// Direct frontier access, for hosts that queue work themselves
    pub fn frontier_mut(&mut self) -> &mut Frontier {
        &mut self.frontier
    }

    /// Classifies a URL against this run's domain state, for hosts that
    /// generate their own seed lists
    pub fn classify(&mut self, url: &str) -> Result<Category> {
        self.classifier.classify(url, &mut self.ids)
    }

    pub fn add_observer(&mut self, observer: Box<dyn PostFetchObserver>) {
        self.observers.push(observer);
    }

    pub fn add_check_crawled(&mut self, predicate: Box<dyn CheckCrawledPredicate>) {
        self.check_crawled.push(predicate);
    }

    /// Runs the crawl to completion
    ///
    /// The frontier is restored and seeded, already-crawled entries are
    /// pruned when `skip-crawled` is set, then each category queue is
    /// drained in fixed order under its budgets. Whatever remains at the
    /// end is persisted when configured, and the run row is closed either
    /// way.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            run_id = self.run_id,
            domain = %self.config.site.domain,
            "starting crawl run"
        );

        self.restore_frontier()?;
        self.seed_frontier();
        if self.config.crawler.skip_crawled {
            self.prune_crawled()?;
        }

        let outcome = self.crawl_loop().await;

        self.backend.release();

        match outcome {
            Ok(()) => {
                if self.config.site.save_uncrawled {
                    let leftover = self.frontier.drain_all();
                    info!(entries = leftover.len(), "persisting uncrawled entries");
                    self.storage.lock().unwrap().save_uncrawled(&leftover)?;
                }
                self.storage
                    .lock()
                    .unwrap()
                    .finish_run(self.run_id, RunStatus::Completed)?;
                info!(
                    run_id = self.run_id,
                    attempts = self.counts.total,
                    "crawl run completed"
                );
                Ok(())
            }
            Err(e) => {
                // Best effort: keep the leftover frontier and close the run
                // before reporting the failure.
                if self.config.site.save_uncrawled {
                    let leftover = self.frontier.drain_all();
                    let _ = self.storage.lock().unwrap().save_uncrawled(&leftover);
                }
                let _ = self
                    .storage
                    .lock()
                    .unwrap()
                    .finish_run(self.run_id, RunStatus::Failed);
                Err(e)
            }
        }
    }

    /// Loads entries persisted by a previous run, then clears the snapshot
    /// so it is not replayed twice
    fn restore_frontier(&mut self) -> Result<()> {
        if !self.config.site.load_uncrawled {
            return Ok(());
        }

        let entries = self.storage.lock().unwrap().load_uncrawled()?;
        if !entries.is_empty() {
            info!(entries = entries.len(), "restoring uncrawled entries");
            self.frontier.load(entries);
        }
        self.storage.lock().unwrap().clear_uncrawled()?;
        Ok(())
    }

    /// Queues the configured seed URLs at depth 0, resolving relative
    /// seeds against the domain root. An internal queue still empty
    /// afterwards gets the domain root itself as its seed.
    fn seed_frontier(&mut self) {
        let scheme = if self.config.site.https {
            "https://"
        } else {
            "http://"
        };
        let root = format!("{scheme}{}", self.config.site.domain);

        for category in Category::ALL {
            for url in self.config.links.initial_urls.for_category(category) {
                let absolute = if crate::url::has_scheme(url) {
                    url.clone()
                } else if url.starts_with('/') {
                    format!("{root}{url}")
                } else {
                    format!("{root}/{url}")
                };
                if !self.frontier.contains(category, &absolute) {
                    self.frontier.push(category, FrontierEntry::new(absolute, 0));
                }
            }
        }

        if self.frontier.is_empty(Category::Internal) {
            debug!(url = %root, "seeding frontier with domain root");
            self.frontier.push(Category::Internal, FrontierEntry::new(root, 0));
        }
    }

    /// Drops queued entries that already have a crawl record from any run,
    /// if every registered predicate agrees. Any dissent keeps the entry.
    fn prune_crawled(&mut self) -> Result<()> {
        if self.frontier.total_len() == 0 {
            return Ok(());
        }

        let mut drop = Vec::new();
        for (category, entry) in self.frontier.snapshot() {
            let domain_id = self.entry_domain_id(&entry.url)?;
            let url_id = self.ids.resolve_url(&entry.url, domain_id)?;

            let crawled = self.storage.lock().unwrap().has_crawl_record(url_id, None)?;
            if !crawled {
                continue;
            }

            let all_agree = self
                .check_crawled
                .iter_mut()
                .all(|p| p.is_already_crawled(&entry, url_id));
            if all_agree {
                drop.push((category, entry.url));
            }
        }

        if !drop.is_empty() {
            debug!(pruned = drop.len(), "pruning already crawled entries");
            self.frontier
                .retain(|category, entry| !drop.iter().any(|(c, u)| *c == category && u == &entry.url));
        }

        Ok(())
    }

    /// Visits category queues in fixed order, each under its own count and
    /// elapsed-time budget plus the run-wide totals
    async fn crawl_loop(&mut self) -> Result<()> {
        let run_started = Instant::now();
        let ordering = if self.config.links.random {
            Ordering::Random
        } else {
            Ordering::Fifo
        };
        let delay = self.config.crawler.delay.effective_seconds();

        for category in Category::ALL {
            if self.config.links.exclude_type.contains(&category) {
                debug!(%category, "category excluded from crawling");
                continue;
            }

            let category_started = Instant::now();

            while !self.frontier.is_empty(category)
                && self.budget_allows(category, category_started, run_started)
            {
                let entry = match self.frontier.pop(category, ordering) {
                    Some(entry) => entry,
                    None => break,
                };

                match self.attempt(category, &entry).await {
                    Ok(()) => {
                        self.error_count = 0;
                    }
                    Err(e) => {
                        // Only fetch errors are tolerated; store and
                        // allocation failures abort immediately. Either way
                        // the in-flight entry goes back on the queue so the
                        // shutdown flush still covers it.
                        let tolerable = matches!(e, SitegraphError::Fetch(_));
                        if !tolerable || self.mode == RunMode::Escalated {
                            self.frontier.push(category, entry);
                            return Err(e);
                        }
                        self.handle_failure(category, entry, &e)?;
                    }
                }

                self.counts.record(category);

                if delay > 0.0 {
                    tokio::time::sleep(Duration::from_secs_f64(delay)).await;
                }
            }
        }

        Ok(())
    }

    /// One fetch attempt: fetch, record, extract, notify
    async fn attempt(&mut self, category: Category, entry: &FrontierEntry) -> Result<()> {
        debug!(url = %entry.url, %category, depth = entry.depth, "fetching");

        let outcome = self.backend.fetch(&entry.url).await?;

        let domain_id = self.entry_domain_id(&entry.url)?;
        let url_id = self.ids.resolve_url(&entry.url, domain_id)?;

        {
            let mut storage = self.storage.lock().unwrap();
            let record_id = storage.insert_crawl_record(
                self.run_id,
                url_id,
                category,
                entry.depth,
                outcome.status,
                outcome.elapsed_seconds,
            )?;
            storage.insert_crawl_body(self.run_id, record_id, &outcome.body)?;
            if let Some(headers) = &outcome.headers {
                storage.insert_crawl_headers(self.run_id, record_id, headers)?;
            }
        }

        // HTTP extracts from 200 responses; the browser backend has no
        // status, so any rendered content counts.
        let extract = category == Category::Internal
            && match outcome.status {
                Some(status) => status == 200,
                None => !outcome.body.is_empty(),
            };

        if extract {
            self.extractor.process(
                &outcome.body,
                entry,
                url_id,
                self.run_id,
                &self.classifier,
                &mut self.ids,
                &self.storage,
                &mut self.frontier,
            )?;
        }

        if category == Category::Internal && matches!(self.backend, FetchBackend::Browser(_)) {
            for observer in &mut self.observers {
                observer.on_fetched(&entry.url, url_id);
            }
        }

        Ok(())
    }

    /// Failure bookkeeping under `Normal` mode: count it, optionally
    /// re-queue the entry at the back, recover the backend, and escalate
    /// once the consecutive-error maximum is reached
    fn handle_failure(
        &mut self,
        category: Category,
        entry: FrontierEntry,
        error: &SitegraphError,
    ) -> Result<()> {
        self.error_count += 1;
        warn!(
            url = %entry.url,
            consecutive = self.error_count,
            "fetch failed: {error}"
        );

        if self.config.crawler.retry_on_error {
            self.frontier.push(category, entry);
        }

        if let Err(recover_err) = self.backend.recover() {
            warn!("backend recovery failed: {recover_err}");
        }

        if self.error_count >= self.config.site.error_max {
            error!(
                error_max = self.config.site.error_max,
                "consecutive error maximum reached, escalating"
            );
            let checkpoint = self.frontier.snapshot();
            self.storage.lock().unwrap().save_uncrawled(&checkpoint)?;
            self.mode = RunMode::Escalated;
        }

        Ok(())
    }

    fn budget_allows(
        &self,
        category: Category,
        category_started: Instant,
        run_started: Instant,
    ) -> bool {
        let max_links = &self.config.links.max_links;
        if max_links.total > 0 && self.counts.total >= max_links.total {
            return false;
        }
        let category_limit = max_links.for_category(category);
        if category_limit > 0 && self.counts.for_category(category) >= category_limit {
            return false;
        }

        let max_time = &self.config.links.max_time;
        if max_time.total > 0 && run_started.elapsed().as_secs_f64() >= max_time.total as f64 {
            return false;
        }
        let time_limit = max_time.for_category(category);
        if time_limit > 0 && category_started.elapsed().as_secs_f64() >= time_limit as f64 {
            return false;
        }

        true
    }

    /// Owning domain for an entry's URL: its host when absolute, the root
    /// domain otherwise
    fn entry_domain_id(&mut self, url: &str) -> Result<i64> {
        let https = self.classifier.https();
        match extract_host(url) {
            Some(host) if !host.is_empty() => self.ids.resolve_domain(host, https),
            _ => self.ids.resolve_domain(self.classifier.root_domain(), https),
        }
    }
}
