//! Database schema definitions
//!
//! All SQL schema for the sitegraph database lives here.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Every domain ever referenced. Identity is the name as written.
CREATE TABLE IF NOT EXISTS domains (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    https INTEGER NOT NULL DEFAULT 0,
    subdomain_of INTEGER REFERENCES domains(id)
);

-- Every URL ever referenced. Identity is the literal string.
CREATE TABLE IF NOT EXISTS urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    domain_id INTEGER NOT NULL REFERENCES domains(id)
);

CREATE INDEX IF NOT EXISTS idx_urls_domain ON urls(domain_id);

-- One row per attempted fetch, append-only
CREATE TABLE IF NOT EXISTS crawl_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url_id INTEGER NOT NULL REFERENCES urls(id),
    category TEXT NOT NULL,
    depth INTEGER NOT NULL,
    status INTEGER,
    elapsed_seconds REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crawl_records_url ON crawl_records(url_id);
CREATE INDEX IF NOT EXISTS idx_crawl_records_run_url ON crawl_records(run_id, url_id);

-- Raw response bodies, one per crawl record
CREATE TABLE IF NOT EXISTS crawl_bodies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    record_id INTEGER NOT NULL REFERENCES crawl_records(id),
    body TEXT NOT NULL
);

-- Raw response headers as JSON, one per HTTP crawl record
CREATE TABLE IF NOT EXISTS crawl_headers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    record_id INTEGER NOT NULL REFERENCES crawl_records(id),
    headers TEXT NOT NULL
);

-- Directed source -> target edges discovered during extraction, append-only
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    from_url INTEGER NOT NULL REFERENCES urls(id),
    to_url INTEGER NOT NULL REFERENCES urls(id)
);

CREATE INDEX IF NOT EXISTS idx_links_from ON links(from_url);
CREATE INDEX IF NOT EXISTS idx_links_to ON links(to_url);

-- Frontier snapshot persisted across runs
CREATE TABLE IF NOT EXISTS uncrawled (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    category TEXT NOT NULL,
    depth INTEGER NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
