//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler:
//! - SQLite initialization and schema management
//! - Domain and URL identity rows
//! - Append-only crawl records, bodies, headers, and link edges
//! - The uncrawled frontier snapshot used for resumption
//! - Run tracking

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

/// A domain row. `subdomain_of`, once set, never changes again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
    pub id: i64,
    pub name: String,
    pub https: bool,
    pub subdomain_of: Option<i64>,
}

impl DomainRecord {
    /// Scheme + host prefix used when absolutizing relative links
    pub fn url_prefix(&self) -> String {
        let scheme = if self.https { "https://" } else { "http://" };
        format!("{}{}", scheme, self.name)
    }
}

/// A directed source -> target edge discovered during link extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkEdge {
    pub run_id: i64,
    pub from_url: i64,
    pub to_url: i64,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[RunStatus::Running, RunStatus::Completed, RunStatus::Failed] {
            assert_eq!(
                RunStatus::from_db_string(status.to_db_string()),
                Some(*status)
            );
        }
    }

    #[test]
    fn test_run_status_invalid() {
        assert_eq!(RunStatus::from_db_string("invalid"), None);
    }

    #[test]
    fn test_domain_url_prefix() {
        let plain = DomainRecord {
            id: 1,
            name: "example.com".to_string(),
            https: false,
            subdomain_of: None,
        };
        assert_eq!(plain.url_prefix(), "http://example.com");

        let secure = DomainRecord { https: true, ..plain };
        assert_eq!(secure.url_prefix(), "https://example.com");
    }
}
