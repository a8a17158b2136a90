//! Sitegraph: a single-site link-graph crawler
//!
//! This crate crawls a web domain breadth-first, classifying discovered links
//! as internal, external, or file resources, and persists the visited-URL and
//! link graph to SQLite across runs.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod frontier;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for sitegraph operations
#[derive(Debug, Error)]
pub enum SitegraphError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Failed to allocate identifier for {kind} {key:?}")]
    IdentifierAllocation { kind: &'static str, key: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Invalid link selector {selector:?}")]
    Selector { selector: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for sitegraph operations
pub type Result<T> = std::result::Result<T, SitegraphError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::frontier::{Category, Frontier, FrontierEntry};
pub use crate::url::UrlClassifier;
