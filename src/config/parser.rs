use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sitegraph::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Crawling: {}", config.site.domain);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Recorded on each run row so crawls made under different configurations
/// can be told apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{DelayMethod, FetchMethod};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_minimal_config() {
        let config_content = r#"
[site]
domain = "example.com"

[output]
database-path = "./crawl.db"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.site.domain, "example.com");
        assert!(!config.site.https);
        assert_eq!(config.site.error_max, 10);
        assert_eq!(
            config.site.internal_exts,
            vec!["htm", "html", "asp", "aspx", "php"]
        );
        assert_eq!(config.crawler.method, FetchMethod::Http);
        assert!(config.crawler.retry_on_error);
        assert_eq!(config.crawler.timeout_secs, 30);
        assert_eq!(config.links.selectors.len(), 1);
        assert_eq!(config.links.selectors[0].selector, "a");
        assert_eq!(config.links.max_links.internal, 0);
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[site]
domain = "example.com"
https = true
internal-exts = ["html", "php"]
error-max = 3
load-uncrawled = true
save-uncrawled = true

[crawler]
method = "browser"
user-agent = "TestBot/1.0"
timeout-secs = 10
retry-on-error = false
skip-crawled = true

[crawler.delay]
method = "static"
seconds = 1.5

[subdomains]
allow = true
whitelist = ["docs"]
blacklist = ["cdn"]

[links]
random = true
exclude-str = ["logout"]
require-str = ["/en/"]
exclude-type = ["file"]
selectors = [{ selector = "a", attributes = ["href"] }, { selector = "img", attributes = ["src"] }]

[links.max-links]
internal = 100
total = 150

[links.max-time]
total = 3600

[links.initial-urls]
internal = ["https://example.com/start"]

[output]
database-path = "./crawl.db"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert!(config.site.https);
        assert_eq!(config.site.error_max, 3);
        assert_eq!(config.crawler.method, FetchMethod::Browser);
        assert_eq!(config.crawler.delay.method, DelayMethod::Static);
        assert_eq!(config.crawler.delay.seconds, 1.5);
        assert!(config.subdomains.allow);
        assert!(config.links.random);
        assert_eq!(config.links.selectors.len(), 2);
        assert_eq!(config.links.max_links.internal, 100);
        assert_eq!(config.links.max_links.external, 0);
        assert_eq!(config.links.max_time.total, 3600);
        assert_eq!(config.links.initial_urls.internal.len(), 1);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[site]
domain = ""

[output]
database-path = "./crawl.db"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
