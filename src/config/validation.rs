//! Configuration validation
//!
//! Checks that a parsed configuration is internally consistent before any
//! crawl state is created.

use crate::config::types::Config;
use crate::ConfigError;

/// Validates a parsed configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site(config)?;
    validate_crawler(config)?;
    validate_links(config)?;
    validate_output(config)?;
    Ok(())
}

fn validate_site(config: &Config) -> Result<(), ConfigError> {
    let domain = &config.site.domain;

    if domain.is_empty() {
        return Err(ConfigError::Validation(
            "site.domain must not be empty".to_string(),
        ));
    }

    if domain.contains("://") || domain.contains('/') {
        return Err(ConfigError::Validation(format!(
            "site.domain must be a bare host, got {:?}",
            domain
        )));
    }

    if config.site.error_max == 0 {
        return Err(ConfigError::Validation(
            "site.error-max must be at least 1".to_string(),
        ));
    }

    for ext in &config.site.internal_exts {
        if ext.is_empty() || ext.starts_with('.') {
            return Err(ConfigError::Validation(format!(
                "site.internal-exts entries must be bare extensions, got {:?}",
                ext
            )));
        }
    }

    Ok(())
}

fn validate_crawler(config: &Config) -> Result<(), ConfigError> {
    if config.crawler.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "crawler.timeout-secs must be at least 1".to_string(),
        ));
    }

    let seconds = config.crawler.delay.seconds;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ConfigError::Validation(format!(
            "crawler.delay.seconds must be a non-negative number, got {}",
            seconds
        )));
    }

    Ok(())
}

fn validate_links(config: &Config) -> Result<(), ConfigError> {
    if config.links.selectors.is_empty() {
        return Err(ConfigError::Validation(
            "links.selectors must not be empty".to_string(),
        ));
    }

    for rule in &config.links.selectors {
        if scraper::Selector::parse(&rule.selector).is_err() {
            return Err(ConfigError::Validation(format!(
                "links.selectors entry {:?} is not a valid CSS selector",
                rule.selector
            )));
        }
        if rule.attributes.is_empty() {
            return Err(ConfigError::Validation(format!(
                "links.selectors entry {:?} lists no attributes",
                rule.selector
            )));
        }
    }

    for category in crate::frontier::Category::ALL {
        for seed in config.links.initial_urls.for_category(category) {
            if seed.is_empty() {
                return Err(ConfigError::Validation(
                    "links.initial-urls entries must not be empty".to_string(),
                ));
            }
            if seed.contains("://") && url::Url::parse(seed).is_err() {
                return Err(ConfigError::Validation(format!(
                    "links.initial-urls entry {:?} is not a valid URL",
                    seed
                )));
            }
        }
    }

    Ok(())
}

fn validate_output(config: &Config) -> Result<(), ConfigError> {
    if config.output.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "output.database-path must not be empty".to_string(),
        ));
    }
    Ok(())
}
