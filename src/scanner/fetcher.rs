//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scanner, including:
//! - Building HTTP clients with compression and timeouts
//! - Rotating browser user agent strings per request
//! - Retry logic for transport failures
//! - Bounded backoff for rate-limit responses
//! - Error classification into short status tags

use crate::config::ScanConfig;
use rand::random_range;
use reqwest::{header, Client};
use std::time::Duration;

/// Browser user agents rotated across requests
///
/// Storefronts commonly reject obvious bot agents, so every request
/// presents a current desktop browser signature instead.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Delay between transport-failure retry attempts
const TRANSPORT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Base and ceiling of the rate-limit backoff schedule
const RATE_LIMIT_BACKOFF_BASE_SECS: u64 = 3;
const RATE_LIMIT_BACKOFF_CAP_SECS: u64 = 30;

/// Maximum length of an error-derived status tag
const ERROR_TAG_LEN: usize = 40;

/// Terminal status of a fetch: an HTTP code or a transport tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// The server answered with this HTTP status code
    Code(u16),
    /// No HTTP response; a short tag describing the transport failure
    Tag(String),
}

impl FetchStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchStatus::Code(code) if (200..300).contains(code))
    }

    /// Status rendered for blocked-store labels and log lines
    pub fn label(&self) -> String {
        match self {
            FetchStatus::Code(code) => code.to_string(),
            FetchStatus::Tag(tag) => tag.clone(),
        }
    }
}

/// Result of a fetch operation: the body (possibly empty) plus its status
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub body: String,
    pub status: FetchStatus,
}

impl FetchOutcome {
    fn failed(status: FetchStatus) -> Self {
        Self {
            body: String::new(),
            status,
        }
    }
}

/// Builds an HTTP client with the scanner's transport settings
///
/// Redirects follow reqwest's default policy; storefronts frequently
/// redirect apex domains to a www host and the scan must land on the
/// final page.
///
/// # Arguments
///
/// * `config` - Scan configuration holding the timeout settings
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ScanConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with retry logic
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 429 | Backoff 3s doubling, cap 30s, up to `rate_limit_retries` waits |
/// | Any other HTTP status | Returned immediately with its body |
/// | Timeout / connection failure | Retry up to `fetch_retries` times, 1s delay |
///
/// Rate-limit waits and transport retries draw on separate budgets. When a
/// budget is exhausted the outcome carries an empty body with `Code(429)`
/// or the classified transport tag.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `config` - Scan configuration holding the retry budgets
pub async fn fetch(client: &Client, url: &str, config: &ScanConfig) -> FetchOutcome {
    let mut transport_attempts = 0;
    let mut rate_limit_waits = 0;

    loop {
        let agent = USER_AGENTS[random_range(0..USER_AGENTS.len())];
        let result = client
            .get(url)
            .header(header::USER_AGENT, agent)
            .header(header::ACCEPT, ACCEPT)
            .header(header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .send()
            .await;

        let error = match result {
            Ok(response) => {
                let code = response.status().as_u16();
                if code == 429 {
                    if rate_limit_waits >= config.rate_limit_retries {
                        return FetchOutcome::failed(FetchStatus::Code(429));
                    }
                    let wait = rate_limit_backoff(rate_limit_waits);
                    tracing::debug!("Rate limited on {}, waiting {:?}", url, wait);
                    tokio::time::sleep(wait).await;
                    rate_limit_waits += 1;
                    continue;
                }

                match response.text().await {
                    Ok(body) => {
                        return FetchOutcome {
                            body,
                            status: FetchStatus::Code(code),
                        }
                    }
                    Err(e) => e,
                }
            }
            Err(e) => e,
        };

        // Transport failure path: body never arrived
        if transport_attempts >= config.fetch_retries {
            return FetchOutcome::failed(FetchStatus::Tag(classify_error(&error)));
        }
        transport_attempts += 1;
        tokio::time::sleep(TRANSPORT_RETRY_DELAY).await;
    }
}

/// Backoff duration before the nth rate-limit retry
fn rate_limit_backoff(waits_so_far: u32) -> Duration {
    let secs = RATE_LIMIT_BACKOFF_BASE_SECS << waits_so_far.min(8);
    Duration::from_secs(secs.min(RATE_LIMIT_BACKOFF_CAP_SECS))
}

/// Sleeps a uniformly random delay between requests to the same store
///
/// A zero maximum disables the delay entirely, which keeps mock-server
/// tests fast.
pub async fn request_jitter(config: &ScanConfig) {
    if config.max_request_delay_ms == 0 {
        return;
    }
    let millis = random_range(config.min_request_delay_ms..=config.max_request_delay_ms);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

/// Classifies a reqwest error into a short status tag
fn classify_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "timeout".to_string()
    } else if error.is_connect() {
        "connect".to_string()
    } else {
        error.to_string().chars().take(ERROR_TAG_LEN).collect()
    }
}
