// # HTTP Client Adapter
//
// Issues requests to the provider API and to address-echo services.
//
// ## Attempt policy
//
// ```text
// pass 1: negotiated protocol   attempt, retry, retry   (fixed backoff)
// pass 2: HTTP/1.1 forced       attempt, retry, retry   (fixed backoff)
// ```
//
// A pass ends at the first response that is not transient. Transport
// errors (connect failures, timeouts, broken bodies) and transient statuses
// (408, 429, 5xx) consume an attempt. The second pass exists because some
// middleboxes break HTTP/2 negotiation; forcing HTTP/1.1 gets through them.
// Only when every attempt of every pass has failed does the caller see
// `Error::Network`.
//
// Every attempt is bounded by the configured timeout, so a stuck call can
// never block a run indefinitely.
//
// ## Security
//
// The bearer token is attached per request and never logged.

use ddns_core::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

pub use reqwest::Method as HttpMethod;

/// Default per-attempt timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// Default number of retries within one pass
pub const DEFAULT_RETRIES: u32 = 2;

/// Default fixed delay between retries
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Transport settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Retries after the first attempt, per pass
    pub retries: u32,
    /// Fixed delay between attempts
    pub retry_delay: Duration,
    /// Run a second pass with HTTP/1.1 forced
    pub protocol_fallback: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            protocol_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Negotiated,
    Http1,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Negotiated => f.write_str("negotiated protocol"),
            Transport::Http1 => f.write_str("HTTP/1.1"),
        }
    }
}

/// Authenticated JSON HTTP client with retry and protocol fallback
#[derive(Debug, Clone)]
pub struct HttpClient {
    negotiated: Client,
    http1: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Build a client with the given settings
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let negotiated = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        let http1 = Client::builder()
            .timeout(config.timeout)
            .http1_only()
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP/1.1 client: {e}")))?;

        Ok(Self {
            negotiated,
            http1,
            config,
        })
    }

    /// Perform a request and return the response body.
    ///
    /// Non-transient error statuses are not failures at this layer: their
    /// body is returned so the caller can surface the provider's message.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<String> {
        let passes: &[Transport] = if self.config.protocol_fallback {
            &[Transport::Negotiated, Transport::Http1]
        } else {
            &[Transport::Negotiated]
        };

        let mut last_error = String::from("no attempt made");
        for &transport in passes {
            match self.send_pass(transport, &method, url, token, body).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::warn!("{} {} failed over {}: {}", method, url, transport, e);
                    last_error = e;
                }
            }
        }

        Err(Error::network(format!("{method} {url}: {last_error}")))
    }

    /// Convenience GET
    pub async fn get(&self, url: &str, token: Option<&str>) -> Result<String> {
        self.request(Method::GET, url, token, None).await
    }

    /// One pass of up to `retries + 1` attempts over a single transport
    async fn send_pass(
        &self,
        transport: Transport,
        method: &Method,
        url: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> std::result::Result<String, String> {
        let client = match transport {
            Transport::Negotiated => &self.negotiated,
            Transport::Http1 => &self.http1,
        };

        let attempts = self.config.retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match Self::send_once(client, method, url, token, body).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::debug!(
                        "{} {} attempt {}/{} over {} failed: {}",
                        method,
                        url,
                        attempt,
                        attempts,
                        transport,
                        e
                    );
                    last_error = e;
                }
            }

            if attempt < attempts && !self.config.retry_delay.is_zero() {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        Err(last_error)
    }

    async fn send_once(
        client: &Client,
        method: &Method,
        url: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> std::result::Result<String, String> {
        let mut request = client
            .request(method.clone(), url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if is_transient(status) {
            return Err(format!("transient HTTP status {status}"));
        }

        response
            .text()
            .await
            .map_err(|e| format!("failed to read response body: {e}"))
    }
}

/// Statuses worth retrying
fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}
