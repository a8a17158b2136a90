//! SQLite storage implementation

use crate::frontier::{Category, FrontierEntry};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{DomainRecord, LinkEdge, RunRecord, RunStatus};
use crate::SitegraphError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates a database at the given path
    pub fn new(path: &Path) -> Result<Self, SitegraphError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SitegraphError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
        )?;

        let run = stmt
            .query_row(params![run_id], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    config_hash: row.get(3)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                        .unwrap_or(RunStatus::Running),
                })
            })
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))?;

        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        Ok(())
    }

    // ===== Domains =====

    fn find_domain(&self, name: &str) -> StorageResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM domains WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn insert_domain(&mut self, name: &str, https: bool) -> StorageResult<Option<i64>> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO domains (name, https) VALUES (?1, ?2)",
            params![name, https],
        )?;

        if changed == 0 {
            // Row appeared under the same key; caller re-resolves once
            return Ok(None);
        }

        Ok(Some(self.conn.last_insert_rowid()))
    }

    fn get_domain(&self, id: i64) -> StorageResult<DomainRecord> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, https, subdomain_of FROM domains WHERE id = ?1")?;

        let domain = stmt
            .query_row(params![id], |row| {
                Ok(DomainRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    https: row.get::<_, i64>(2)? != 0,
                    subdomain_of: row.get(3)?,
                })
            })
            .optional()?
            .ok_or(StorageError::DomainNotFound(id))?;

        Ok(domain)
    }

    fn set_subdomain_of(&mut self, id: i64, parent: i64) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE domains SET subdomain_of = ?1 WHERE id = ?2",
            params![parent, id],
        )?;
        Ok(())
    }

    // ===== Urls =====

    fn find_url(&self, raw: &str) -> StorageResult<Option<i64>> {
        let id = self
            .conn
            .query_row("SELECT id FROM urls WHERE url = ?1", params![raw], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(id)
    }

    fn insert_url(&mut self, raw: &str, domain_id: i64) -> StorageResult<Option<i64>> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO urls (url, domain_id) VALUES (?1, ?2)",
            params![raw, domain_id],
        )?;

        if changed == 0 {
            return Ok(None);
        }

        Ok(Some(self.conn.last_insert_rowid()))
    }

    // ===== Crawl records =====

    fn insert_crawl_record(
        &mut self,
        run_id: i64,
        url_id: i64,
        category: Category,
        depth: u32,
        status: Option<u16>,
        elapsed_seconds: f64,
    ) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO crawl_records (run_id, url_id, category, depth, status, elapsed_seconds)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                url_id,
                category.as_str(),
                depth,
                status,
                elapsed_seconds
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_crawl_body(&mut self, run_id: i64, record_id: i64, body: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO crawl_bodies (run_id, record_id, body) VALUES (?1, ?2, ?3)",
            params![run_id, record_id, body],
        )?;
        Ok(())
    }

    fn insert_crawl_headers(
        &mut self,
        run_id: i64,
        record_id: i64,
        headers: &str,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO crawl_headers (run_id, record_id, headers) VALUES (?1, ?2, ?3)",
            params![run_id, record_id, headers],
        )?;
        Ok(())
    }

    fn has_crawl_record(&self, url_id: i64, run_id: Option<i64>) -> StorageResult<bool> {
        let found: Option<i64> = match run_id {
            Some(run) => self
                .conn
                .query_row(
                    "SELECT id FROM crawl_records WHERE run_id = ?1 AND url_id = ?2 LIMIT 1",
                    params![run, url_id],
                    |row| row.get(0),
                )
                .optional()?,
            None => self
                .conn
                .query_row(
                    "SELECT id FROM crawl_records WHERE url_id = ?1 LIMIT 1",
                    params![url_id],
                    |row| row.get(0),
                )
                .optional()?,
        };
        Ok(found.is_some())
    }

    fn count_crawl_records(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crawl_records WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Link edges =====

    fn insert_link_edges(&mut self, edges: &[LinkEdge]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO links (run_id, from_url, to_url) VALUES (?1, ?2, ?3)")?;
            for edge in edges {
                stmt.execute(params![edge.run_id, edge.from_url, edge.to_url])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn count_link_edges(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM links WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Uncrawled snapshot =====

    fn save_uncrawled(&mut self, entries: &[(Category, FrontierEntry)]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM uncrawled", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO uncrawled (url, category, depth) VALUES (?1, ?2, ?3)")?;
            for (category, entry) in entries {
                stmt.execute(params![entry.url, category.as_str(), entry.depth])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_uncrawled(&self) -> StorageResult<Vec<(Category, FrontierEntry)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, category, depth FROM uncrawled ORDER BY id ASC")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (url, category_str, depth) = row?;
            let category = Category::from_str(&category_str)
                .ok_or(StorageError::UnknownCategory(category_str))?;
            entries.push((category, FrontierEntry { url, depth }));
        }

        Ok(entries)
    }

    fn clear_uncrawled(&mut self) -> StorageResult<()> {
        self.conn.execute("DELETE FROM uncrawled", [])?;
        Ok(())
    }
}
