//! Configuration loading and validation
//!
//! Configuration is a TOML file with kebab-case keys, parsed into
//! per-instance structs. Every crawl-behavior knob lives here; nothing is
//! shared global state.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    CategoryLimits, Config, CrawlerConfig, DelayConfig, DelayMethod, FetchMethod, LinkConfig,
    OutputConfig, SeedLists, SelectorRule, SiteConfig, SubdomainConfig,
};
pub use validation::validate;
