use crate::frontier::Category;
use serde::Deserialize;

/// Main configuration structure for sitegraph
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub subdomains: SubdomainConfig,
    #[serde(default)]
    pub links: LinkConfig,
    pub output: OutputConfig,
}

/// The crawl target and site-level behavior
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Domain to crawl (host only, no scheme)
    pub domain: String,

    /// Whether the site is reached over https
    #[serde(default)]
    pub https: bool,

    /// Extensions that still count as internal pages (compared without the dot)
    #[serde(rename = "internal-exts", default = "default_internal_exts")]
    pub internal_exts: Vec<String>,

    /// Consecutive fetch errors tolerated before escalation
    #[serde(rename = "error-max", default = "default_error_max")]
    pub error_max: u32,

    /// Load leftover frontier entries persisted by a previous run
    #[serde(rename = "load-uncrawled", default)]
    pub load_uncrawled: bool,

    /// Persist unfetched frontier entries on shutdown
    #[serde(rename = "save-uncrawled", default)]
    pub save_uncrawled: bool,
}

/// Fetch behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Which fetch backend to use
    #[serde(default)]
    pub method: FetchMethod,

    /// User agent sent with every HTTP request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Re-queue failed entries at the back of their category queue
    #[serde(rename = "retry-on-error", default = "default_true")]
    pub retry_on_error: bool,

    /// Skip entries that already have a crawl record from any run
    #[serde(rename = "skip-crawled", default)]
    pub skip_crawled: bool,

    #[serde(default)]
    pub delay: DelayConfig,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            method: FetchMethod::default(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            retry_on_error: true,
            skip_crawled: false,
            delay: DelayConfig::default(),
        }
    }
}

/// Fetch backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    #[default]
    Http,
    Browser,
}

/// Post-attempt delay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DelayConfig {
    #[serde(default)]
    pub method: DelayMethod,

    /// Delay between requests, in seconds
    #[serde(default)]
    pub seconds: f64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            method: DelayMethod::Static,
            seconds: 0.0,
        }
    }
}

/// How the post-attempt delay is derived. Any method other than `static`
/// currently sleeps zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayMethod {
    #[default]
    Static,
    None,
}

impl DelayConfig {
    /// Effective sleep between crawl iterations
    pub fn effective_seconds(&self) -> f64 {
        match self.method {
            DelayMethod::Static => self.seconds,
            DelayMethod::None => 0.0,
        }
    }
}

/// Subdomain promotion configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubdomainConfig {
    /// Promote qualifying foreign hosts to internal subdomains
    #[serde(default)]
    pub allow: bool,

    /// Substring whitelist for candidate hosts; empty accepts all
    #[serde(default)]
    pub whitelist: Vec<String>,

    /// Substring blacklist for candidate hosts; empty rejects none
    #[serde(default)]
    pub blacklist: Vec<String>,
}

/// Link extraction and frontier policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    /// Shuffle a queue before each pop instead of FIFO order
    #[serde(default)]
    pub random: bool,

    /// Skip extracted values containing any of these substrings
    #[serde(rename = "exclude-str", default)]
    pub exclude_str: Vec<String>,

    /// Keep only extracted values containing one of these substrings;
    /// empty accepts all
    #[serde(rename = "require-str", default)]
    pub require_str: Vec<String>,

    /// Categories excluded from crawling entirely
    #[serde(rename = "exclude-type", default)]
    pub exclude_type: Vec<Category>,

    /// Selector/attribute pairs run against fetched content
    #[serde(default = "default_selectors")]
    pub selectors: Vec<SelectorRule>,

    /// Per-category and total fetch-count limits (0 = unlimited)
    #[serde(rename = "max-links", default)]
    pub max_links: CategoryLimits,

    /// Per-category and total elapsed-time limits in seconds (0 = unlimited)
    #[serde(rename = "max-time", default)]
    pub max_time: CategoryLimits,

    /// Seed URLs queued before the crawl starts, at depth 0
    #[serde(rename = "initial-urls", default)]
    pub initial_urls: SeedLists,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            random: false,
            exclude_str: Vec::new(),
            require_str: Vec::new(),
            exclude_type: Vec::new(),
            selectors: default_selectors(),
            max_links: CategoryLimits::default(),
            max_time: CategoryLimits::default(),
            initial_urls: SeedLists::default(),
        }
    }
}

/// One selector/attribute extraction rule
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorRule {
    /// CSS selector, e.g. `a` or `img`
    pub selector: String,

    /// Attributes read from each matched element, e.g. `href`
    pub attributes: Vec<String>,
}

/// Per-category limits plus a global total. Zero means unlimited.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CategoryLimits {
    #[serde(default)]
    pub internal: u64,
    #[serde(default)]
    pub external: u64,
    #[serde(default)]
    pub file: u64,
    #[serde(default)]
    pub total: u64,
}

impl CategoryLimits {
    pub fn for_category(&self, category: Category) -> u64 {
        match category {
            Category::Internal => self.internal,
            Category::External => self.external,
            Category::File => self.file,
        }
    }
}

/// Seed URL lists, keyed by category
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedLists {
    #[serde(default)]
    pub internal: Vec<String>,
    #[serde(default)]
    pub external: Vec<String>,
    #[serde(default)]
    pub file: Vec<String>,
}

impl SeedLists {
    pub fn for_category(&self, category: Category) -> &[String] {
        match category {
            Category::Internal => &self.internal,
            Category::External => &self.external,
            Category::File => &self.file,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_internal_exts() -> Vec<String> {
    ["htm", "html", "asp", "aspx", "php"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_error_max() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("sitegraph/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_selectors() -> Vec<SelectorRule> {
    vec![SelectorRule {
        selector: "a".to_string(),
        attributes: vec!["href".to_string()],
    }]
}
