use crate::config::{ClientConfig, ACCEPT_LANGUAGE};
use crate::error::TransportError;
use crate::scrapers::traits::Fetcher;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE as ACCEPT_LANGUAGE_HEADER};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Statuses worth another attempt
const RETRYABLE: [u16; 5] = [429, 500, 502, 503, 504];

/// reqwest-backed fetcher with retry and exponential backoff
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    backoff: Duration,
}

impl HttpFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE_HEADER, HeaderValue::from_static(ACCEPT_LANGUAGE));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|source| TransportError::Http {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            backoff: Duration::from_secs(1),
        })
    }

    /// Base delay before the first retry, doubled on each one after
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    async fn attempt(&self, url: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| TransportError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| TransportError::Http {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let mut attempt = 0;
        loop {
            match self.attempt(url).await {
                Ok(body) => {
                    debug!("Downloaded {} bytes from {}", body.len(), url);
                    return Ok(body);
                }
                Err(err) if attempt < self.max_retries && is_retryable(&err) => {
                    let delay = backoff_delay(self.backoff, attempt);
                    warn!("{}; retrying in {:?}", err, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// `base * 2^attempt`, capped instead of overflowing
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

fn is_retryable(err: &TransportError) -> bool {
    match err {
        TransportError::Status { status, .. } => RETRYABLE.contains(status),
        TransportError::Http { source, .. } => {
            source.is_timeout()
                || source.is_connect()
                || source.status().is_some_and(|s| s == StatusCode::TOO_MANY_REQUESTS)
        }
    }
}
