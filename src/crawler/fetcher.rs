//! Fetch backends
//!
//! This module handles page retrieval for the crawler:
//! - Building the HTTP client with user agent and timeout
//! - GET requests returning status, body, and captured headers
//! - The browser-session seam for driver-rendered fetching
//! - Backend recovery after failed attempts
//!
//! An HTTP response with a non-success status is still a completed fetch;
//! only transport failures (timeout, connection, driver faults) are errors.

use crate::config::CrawlerConfig;
use reqwest::Client;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Fetch-attempt errors. Every variant names the URL that failed so the
/// retry path can log it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request for {url} timed out")]
    Timeout { url: String },

    #[error("Browser driver failed on {url}: {message}")]
    Driver { url: String, message: String },
}

/// What one completed fetch attempt produced
///
/// `status` and `headers` are `None` for browser fetches, which have no
/// response metadata to report.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub status: Option<u16>,
    pub body: String,
    pub headers: Option<String>,
    pub elapsed_seconds: f64,
}

/// Serializes response headers as a JSON object, lossily stringifying
/// non-UTF-8 values
fn headers_to_json(headers: &reqwest::header::HeaderMap) -> String {
    let mut map = serde_json::Map::new();
    for (name, value) in headers {
        let rendered = value
            .to_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|_| String::from_utf8_lossy(value.as_bytes()).into_owned());
        map.insert(name.as_str().to_string(), serde_json::Value::String(rendered));
    }
    serde_json::Value::Object(map).to_string()
}

/// Plain HTTP fetcher built on reqwest
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self { client })
    }

    /// Fetches a URL, timing the request
    ///
    /// Redirects are followed by the client; the recorded status is the
    /// final response's, whatever it is.
    pub async fn fetch(&self, url: &str) -> Result<FetchOutcome, FetchError> {
        let started = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Http {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        let status = response.status().as_u16();
        let headers = headers_to_json(response.headers());

        let body = response.text().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;

        Ok(FetchOutcome {
            status: Some(status),
            body,
            headers: Some(headers),
            elapsed_seconds: started.elapsed().as_secs_f64(),
        })
    }
}

/// Seam for a driver-controlled browser
///
/// Implementations own the driver lifecycle. `navigate` returns the
/// rendered outer HTML; `recycle` tears the session down and brings up a
/// fresh one after a fault; `release` shuts the driver down for good.
pub trait BrowserSession: Send {
    fn navigate(&mut self, url: &str) -> Result<String, String>;

    fn recycle(&mut self) -> Result<(), String>;

    fn release(&mut self);
}

/// Fetcher that drives an injected browser session
pub struct BrowserFetcher {
    session: Box<dyn BrowserSession>,
}

impl BrowserFetcher {
    pub fn new(session: Box<dyn BrowserSession>) -> Self {
        Self { session }
    }

    /// Navigates the session and returns the rendered document. There is
    /// no HTTP status to report from behind a driver.
    pub fn fetch(&mut self, url: &str) -> Result<FetchOutcome, FetchError> {
        let started = Instant::now();

        let body = self
            .session
            .navigate(url)
            .map_err(|message| FetchError::Driver {
                url: url.to_string(),
                message,
            })?;

        Ok(FetchOutcome {
            status: None,
            body,
            headers: None,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        })
    }

    pub fn recycle(&mut self) -> Result<(), FetchError> {
        self.session.recycle().map_err(|message| FetchError::Driver {
            url: String::new(),
            message,
        })
    }

    pub fn release(&mut self) {
        self.session.release();
    }
}

/// The configured fetch backend
pub enum FetchBackend {
    Http(HttpFetcher),
    Browser(BrowserFetcher),
}

impl FetchBackend {
    pub async fn fetch(&mut self, url: &str) -> Result<FetchOutcome, FetchError> {
        match self {
            Self::Http(fetcher) => fetcher.fetch(url).await,
            Self::Browser(fetcher) => fetcher.fetch(url),
        }
    }

    /// Post-failure recovery. The browser backend restarts its session;
    /// HTTP needs nothing.
    pub fn recover(&mut self) -> Result<(), FetchError> {
        match self {
            Self::Http(_) => Ok(()),
            Self::Browser(fetcher) => fetcher.recycle(),
        }
    }

    /// Shutdown hook for backends holding external resources
    pub fn release(&mut self) {
        if let Self::Browser(fetcher) = self {
            fetcher.release();
        }
    }
}
