//! Crawl frontier: the not-yet-fetched URL entries, partitioned by category
//!
//! The frontier holds three independent queues. Ordering is FIFO unless the
//! random policy is configured, in which case a queue is shuffled before
//! each pop. Count and time limits are enforced by the crawl loop, not here.

use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::VecDeque;

/// Link category: same site, different site, or non-page resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Internal,
    External,
    File,
}

impl Category {
    /// Fixed deterministic order in which the crawl loop visits categories
    pub const ALL: [Category; 3] = [Category::Internal, Category::File, Category::External];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
            Self::File => "file",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "internal" => Some(Self::Internal),
            "external" => Some(Self::External),
            "file" => Some(Self::File),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A queued URL awaiting a fetch. Transient; exists only while queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Literal URL string. No normalization is applied anywhere; two
    /// strings differing by a trailing slash are distinct entries.
    pub url: String,

    /// Seed entries are depth 0; extracted links are parent depth + 1
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// Queue ordering policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    Fifo,
    Random,
}

/// Three ordered queues of pending fetches, keyed by category
#[derive(Debug, Default)]
pub struct Frontier {
    internal: VecDeque<FrontierEntry>,
    external: VecDeque<FrontierEntry>,
    file: VecDeque<FrontierEntry>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, category: Category) -> &VecDeque<FrontierEntry> {
        match category {
            Category::Internal => &self.internal,
            Category::External => &self.external,
            Category::File => &self.file,
        }
    }

    fn queue_mut(&mut self, category: Category) -> &mut VecDeque<FrontierEntry> {
        match category {
            Category::Internal => &mut self.internal,
            Category::External => &mut self.external,
            Category::File => &mut self.file,
        }
    }

    /// Appends an entry to the back of a category queue
    pub fn push(&mut self, category: Category, entry: FrontierEntry) {
        self.queue_mut(category).push_back(entry);
    }

    /// Removes and returns the next entry. Under the random policy the
    /// queue is shuffled first, so selection order is not stable.
    pub fn pop(&mut self, category: Category, ordering: Ordering) -> Option<FrontierEntry> {
        let queue = self.queue_mut(category);
        if ordering == Ordering::Random {
            queue.make_contiguous().shuffle(&mut rand::thread_rng());
        }
        queue.pop_front()
    }

    /// Whether an entry with the identical literal URL is already queued
    /// in this category
    pub fn contains(&self, category: Category, url: &str) -> bool {
        self.queue(category).iter().any(|e| e.url == url)
    }

    pub fn is_empty(&self, category: Category) -> bool {
        self.queue(category).is_empty()
    }

    pub fn len(&self, category: Category) -> usize {
        self.queue(category).len()
    }

    /// Total entries across all categories
    pub fn total_len(&self) -> usize {
        Category::ALL.iter().map(|c| self.len(*c)).sum()
    }

    /// Clones every queued entry, front to back, for checkpointing
    pub fn snapshot(&self) -> Vec<(Category, FrontierEntry)> {
        let mut entries = Vec::with_capacity(self.total_len());
        for category in Category::ALL {
            for entry in self.queue(category) {
                entries.push((category, entry.clone()));
            }
        }
        entries
    }

    /// Removes and returns every remaining entry, for shutdown persistence
    pub fn drain_all(&mut self) -> Vec<(Category, FrontierEntry)> {
        let mut drained = Vec::with_capacity(self.total_len());
        for category in Category::ALL {
            for entry in self.queue_mut(category).drain(..) {
                drained.push((category, entry));
            }
        }
        drained
    }

    /// Restores entries persisted by a previous run
    pub fn load(&mut self, entries: Vec<(Category, FrontierEntry)>) {
        for (category, entry) in entries {
            self.push(category, entry);
        }
    }

    /// Retains only the entries the predicate accepts, across all queues
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(Category, &FrontierEntry) -> bool,
    {
        for category in Category::ALL {
            match category {
                Category::Internal => self.internal.retain(|e| keep(category, e)),
                Category::External => self.external.retain(|e| keep(category, e)),
                Category::File => self.file.retain(|e| keep(category, e)),
            }
        }
    }
}
