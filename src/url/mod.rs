//! URL classification
//!
//! Determines whether a discovered link is an internal page, an external
//! link, or a file resource, and promotes qualifying foreign hosts to
//! internal-subdomain status.
//!
//! URLs are treated as literal strings throughout; no normalization is ever
//! applied, because URL identity in the store is the string as written.

use crate::cache::IdentifierCache;
use crate::config::{Config, SubdomainConfig};
use crate::frontier::Category;
use crate::Result;

/// Whether a URL carries an http(s) scheme. Anything else is treated as a
/// site-relative path.
pub fn has_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Splits a scheme-carrying URL into its host and the remainder after the
/// host's trailing slash. A `None` remainder means the URL is a bare
/// domain root.
fn split_scheme_host(url: &str) -> Option<(&str, Option<&str>)> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))?;

    match rest.split_once('/') {
        Some((host, tail)) => Some((host, Some(tail))),
        None => Some((rest, None)),
    }
}

/// Extracts the host from a scheme-carrying URL
pub fn extract_host(url: &str) -> Option<&str> {
    split_scheme_host(url).map(|(host, _)| host)
}

/// Substring whitelist check: an empty whitelist accepts everything
pub fn in_whitelist(item: &str, whitelist: &[String]) -> bool {
    if whitelist.is_empty() {
        return true;
    }
    whitelist.iter().any(|substr| item.contains(substr.as_str()))
}

/// Substring blacklist check: an empty blacklist rejects nothing
pub fn in_blacklist(item: &str, blacklist: &[String]) -> bool {
    blacklist.iter().any(|substr| item.contains(substr.as_str()))
}

/// Classifies URLs relative to a single active crawl domain
///
/// Relative URLs are always resolved against the active domain. There is no
/// per-link base tracking, so a relative link found on a promoted subdomain
/// page still resolves against the root domain.
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    root_domain: String,
    https: bool,
    internal_exts: Vec<String>,
    subdomains: SubdomainConfig,
}

impl UrlClassifier {
    pub fn new(
        root_domain: impl Into<String>,
        https: bool,
        internal_exts: Vec<String>,
        subdomains: SubdomainConfig,
    ) -> Self {
        Self {
            root_domain: root_domain.into(),
            https,
            internal_exts,
            subdomains,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.site.domain.clone(),
            config.site.https,
            config.site.internal_exts.clone(),
            config.subdomains.clone(),
        )
    }

    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }

    pub fn https(&self) -> bool {
        self.https
    }

    /// Classifies a URL as internal, external, or file
    ///
    /// Pure given the current domain-cache state, except for the one
    /// permitted side effect: promoting a qualifying foreign host to
    /// subdomain status, which writes `subdomain_of` at most once.
    pub fn classify(&self, url: &str, ids: &mut IdentifierCache) -> Result<Category> {
        // Peel same-domain prefixes iteratively; each pass either returns
        // or shrinks the candidate to the path remainder.
        let mut candidate = url;

        loop {
            if !has_scheme(candidate) {
                return Ok(self.classify_path(candidate));
            }

            let (host, tail) = match split_scheme_host(candidate) {
                Some(parts) => parts,
                None => return Ok(Category::External),
            };

            if host == self.root_domain {
                match tail {
                    // Bare domain root
                    None => return Ok(Category::Internal),
                    Some(rest) => {
                        candidate = rest;
                        continue;
                    }
                }
            }

            if self.subdomains.allow && self.qualifies_as_subdomain(host) {
                self.promote(host, ids)?;
                return Ok(Category::Internal);
            }

            return Ok(Category::External);
        }
    }

    /// Rule 1: a path with no extension in its final segment is a page;
    /// otherwise the extension decides.
    fn classify_path(&self, path: &str) -> Category {
        let last_segment = path.rsplit('/').next().unwrap_or(path);

        if !last_segment.contains('.') {
            return Category::Internal;
        }

        for ext in &self.internal_exts {
            let suffix = format!(".{ext}");
            if path.ends_with(&suffix) {
                return Category::Internal;
            }
        }

        Category::File
    }

    fn qualifies_as_subdomain(&self, host: &str) -> bool {
        in_whitelist(host, &self.subdomains.whitelist)
            && host.contains(self.root_domain.as_str())
            && !in_blacklist(host, &self.subdomains.blacklist)
    }

    /// Looks up or creates the host's domain and marks it a subdomain of
    /// the root, idempotently.
    fn promote(&self, host: &str, ids: &mut IdentifierCache) -> Result<()> {
        let host_id = ids.resolve_domain(host, self.https)?;
        let root_id = ids.resolve_domain(&self.root_domain, self.https)?;
        let info = ids.domain_info(host_id)?;

        if info.subdomain_of != Some(root_id) {
            ids.set_subdomain_of(host_id, root_id)?;
        }

        Ok(())
    }
}
