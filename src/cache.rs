//! Identifier cache: memoized domain/URL to persistent-id resolution
//!
//! Every domain and URL string maps to exactly one row id in the store. The
//! cache checks its in-memory maps first, then the store, and finally
//! inserts. An insert that loses to a concurrent writer gets a single
//! re-resolve; a second miss is an allocation failure for that entry only.
//! Cached entries never expire within a run.

use crate::storage::{DomainRecord, SqliteStorage, Storage};
use crate::{Result, SitegraphError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Memoized domain/URL id resolver with create-on-miss
pub struct IdentifierCache {
    storage: Arc<Mutex<SqliteStorage>>,
    domains: HashMap<String, i64>,
    urls: HashMap<String, i64>,
    domain_info: HashMap<i64, DomainRecord>,
}

impl IdentifierCache {
    pub fn new(storage: Arc<Mutex<SqliteStorage>>) -> Self {
        Self {
            storage,
            domains: HashMap::new(),
            urls: HashMap::new(),
            domain_info: HashMap::new(),
        }
    }

    /// Resolves a domain name to its persistent id, creating the row on miss.
    /// `https_hint` is only used when the row is created.
    pub fn resolve_domain(&mut self, name: &str, https_hint: bool) -> Result<i64> {
        if let Some(&id) = self.domains.get(name) {
            return Ok(id);
        }

        let id = {
            let mut storage = self.storage.lock().unwrap();

            match storage.find_domain(name)? {
                Some(id) => id,
                None => match storage.insert_domain(name, https_hint)? {
                    Some(id) => id,
                    // Lost an insert race; re-resolve once
                    None => storage.find_domain(name)?.ok_or_else(|| {
                        SitegraphError::IdentifierAllocation {
                            kind: "domain",
                            key: name.to_string(),
                        }
                    })?,
                },
            }
        };

        self.domains.insert(name.to_string(), id);
        Ok(id)
    }

    /// Resolves a literal URL string to its persistent id, creating the row
    /// on miss under the given owning domain.
    pub fn resolve_url(&mut self, raw: &str, domain_id: i64) -> Result<i64> {
        if let Some(&id) = self.urls.get(raw) {
            return Ok(id);
        }

        let id = {
            let mut storage = self.storage.lock().unwrap();

            match storage.find_url(raw)? {
                Some(id) => id,
                None => match storage.insert_url(raw, domain_id)? {
                    Some(id) => id,
                    None => storage.find_url(raw)?.ok_or_else(|| {
                        SitegraphError::IdentifierAllocation {
                            kind: "url",
                            key: raw.to_string(),
                        }
                    })?,
                },
            }
        };

        self.urls.insert(raw.to_string(), id);
        Ok(id)
    }

    /// Returns the domain record for an id, caching it
    pub fn domain_info(&mut self, id: i64) -> Result<DomainRecord> {
        if let Some(record) = self.domain_info.get(&id) {
            return Ok(record.clone());
        }

        let record = self.storage.lock().unwrap().get_domain(id)?;
        self.domain_info.insert(id, record.clone());
        Ok(record)
    }

    /// Records a subdomain relationship in the store and mirrors it into
    /// the cache
    pub fn set_subdomain_of(&mut self, id: i64, parent: i64) -> Result<()> {
        self.storage.lock().unwrap().set_subdomain_of(id, parent)?;
        if let Some(record) = self.domain_info.get_mut(&id) {
            record.subdomain_of = Some(parent);
        }
        Ok(())
    }
}
