//! Storage trait definitions
//!
//! The crawl engine only uses this CRUD contract; the SQLite implementation
//! lives in `sqlite.rs`.

use crate::frontier::{Category, FrontierEntry};
use crate::storage::{DomainRecord, LinkEdge, RunRecord, RunStatus};
use thiserror::Error;

/// Storage-specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Domain id {0} not found")]
    DomainNotFound(i64),

    #[error("Run id {0} not found")]
    RunNotFound(i64),

    #[error("Unknown category {0:?} in persisted row")]
    UnknownCategory(String),
}

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// CRUD contract consumed by the crawl engine
///
/// All inserts are append-only except `set_subdomain_of` (written at most
/// once per domain) and the uncrawled snapshot, which is replaced wholesale.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new run row, returning its id
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Marks a run finished with the given status
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Domains =====

    /// Point lookup by name (the natural key)
    fn find_domain(&self, name: &str) -> StorageResult<Option<i64>>;

    /// Inserts a domain row. Returns `None` when the name already exists,
    /// so the caller can re-resolve once.
    fn insert_domain(&mut self, name: &str, https: bool) -> StorageResult<Option<i64>>;

    fn get_domain(&self, id: i64) -> StorageResult<DomainRecord>;

    /// Records that a domain is a subdomain of another
    fn set_subdomain_of(&mut self, id: i64, parent: i64) -> StorageResult<()>;

    // ===== Urls =====

    /// Point lookup by the literal URL string
    fn find_url(&self, raw: &str) -> StorageResult<Option<i64>>;

    /// Inserts a URL row. Returns `None` when the string already exists.
    fn insert_url(&mut self, raw: &str, domain_id: i64) -> StorageResult<Option<i64>>;

    // ===== Crawl records =====

    /// Appends one crawl record, returning the record id
    fn insert_crawl_record(
        &mut self,
        run_id: i64,
        url_id: i64,
        category: Category,
        depth: u32,
        status: Option<u16>,
        elapsed_seconds: f64,
    ) -> StorageResult<i64>;

    fn insert_crawl_body(&mut self, run_id: i64, record_id: i64, body: &str) -> StorageResult<()>;

    fn insert_crawl_headers(
        &mut self,
        run_id: i64,
        record_id: i64,
        headers: &str,
    ) -> StorageResult<()>;

    /// Whether a crawl record exists for this URL, optionally scoped to one run
    fn has_crawl_record(&self, url_id: i64, run_id: Option<i64>) -> StorageResult<bool>;

    fn count_crawl_records(&self, run_id: i64) -> StorageResult<u64>;

    // ===== Link edges =====

    /// Appends a batch of edges in a single transaction
    fn insert_link_edges(&mut self, edges: &[LinkEdge]) -> StorageResult<()>;

    fn count_link_edges(&self, run_id: i64) -> StorageResult<u64>;

    // ===== Uncrawled snapshot =====

    /// Replaces the uncrawled snapshot with the given entries
    fn save_uncrawled(&mut self, entries: &[(Category, FrontierEntry)]) -> StorageResult<()>;

    fn load_uncrawled(&self) -> StorageResult<Vec<(Category, FrontierEntry)>>;

    fn clear_uncrawled(&mut self) -> StorageResult<()>;
}
