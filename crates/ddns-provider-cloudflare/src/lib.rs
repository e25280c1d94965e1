// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for the DDNS system.
//
// ## Behaviour
//
// Every method is one logical API v4 call. Transport retries and the
// HTTP/1.1 fallback live in `ddns-http`; which identifiers to trust, when to
// write and when to recover are decided by the core `Reconciler`. This
// crate only speaks the wire format.
//
// A response counts as successful iff its top-level `success` field is
// `true`. The HTTP status is not consulted: Cloudflare reports failures in
// the envelope, and when it does the raw body is carried into the error so
// the operator sees the provider's own message.
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Provider refuses to be built with an empty token
//
// ## API Reference
//
// - Verify token: GET `/user/tokens/verify`
// - Zone details: GET `/zones/:zone_id`
// - List zones: GET `/zones?name=...`
// - List DNS records: GET `/zones/:zone_id/dns_records?type=...&name=...`
// - Create DNS record: POST `/zones/:zone_id/dns_records`
// - Update DNS record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::{DnsProvider, Error, RecordPayload, RecordType, Result};
use ddns_http::{HttpClient, HttpMethod};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

const PROVIDER: &str = "cloudflare";

/// Response envelope shared by every API v4 endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    result: Option<T>,
}

/// Any result object carrying an identifier (zone, record)
#[derive(Debug, Deserialize)]
struct Identified {
    id: Option<String>,
}

/// Result of `/user/tokens/verify`
#[derive(Debug, Deserialize)]
struct TokenStatus {
    status: Option<String>,
}

/// Body of create and update calls
#[derive(Debug, Serialize)]
struct RecordBody<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxied: Option<bool>,
}

impl<'a> From<&'a RecordPayload> for RecordBody<'a> {
    fn from(payload: &'a RecordPayload) -> Self {
        Self {
            record_type: payload.record_type.as_str(),
            name: &payload.name,
            content: &payload.content,
            ttl: payload.ttl,
            proxied: payload.proxied,
        }
    }
}

/// Parse a response body, accepting it only when `success` is true.
///
/// On rejection the trimmed raw body is returned for error reporting.
fn accept<T: DeserializeOwned>(body: &str) -> std::result::Result<Option<T>, String> {
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(envelope) if envelope.success => Ok(envelope.result),
        _ => Err(body.trim().to_string()),
    }
}

/// First non-empty identifier in a list result
fn first_id(items: Option<Vec<Identified>>) -> Option<String> {
    items
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|item| item.id)
        .filter(|id| !id.is_empty())
}

/// Cloudflare DNS provider
///
/// Stateless apart from the HTTP client: it holds no identifier caches.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client adapter
    client: HttpClient,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:Read and DNS:Edit permissions
    /// - `client`: HTTP client adapter used for every call
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty.
    pub fn new(api_token: impl Into<String>, client: HttpClient) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
        })
    }

    /// Point the provider at a different API base (mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn endpoint_with_query(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        Url::parse_with_params(&self.endpoint(path), query)
            .map(String::from)
            .map_err(|e| Error::config(format!("Invalid Cloudflare API URL: {e}")))
    }

    async fn call(&self, method: HttpMethod, url: &str, body: Option<&Value>) -> Result<String> {
        self.client
            .request(method, url, Some(&self.api_token), body)
            .await
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// ```http
    /// GET /user/tokens/verify
    /// ```
    async fn verify_token(&self) -> Result<()> {
        let body = self
            .call(HttpMethod::GET, &self.endpoint("/user/tokens/verify"), None)
            .await?;

        match accept::<TokenStatus>(&body) {
            Ok(Some(TokenStatus { status: Some(status) })) if status == "active" => Ok(()),
            Ok(result) => {
                let status = result
                    .and_then(|token| token.status)
                    .unwrap_or_else(|| "unknown".to_string());
                Err(Error::auth(format!("API token is not active (status: {status})")))
            }
            Err(raw) => Err(Error::auth(format!("API token verification failed: {raw}"))),
        }
    }

    /// ```http
    /// GET /zones/:zone_id
    /// ```
    async fn verify_zone(&self, zone_id: &str) -> Result<bool> {
        let url = self.endpoint(&format!("/zones/{zone_id}"));
        let body = self.call(HttpMethod::GET, &url, None).await?;

        match accept::<Identified>(&body) {
            Ok(_) => Ok(true),
            Err(raw) => {
                tracing::debug!("Zone {} did not verify: {}", zone_id, raw);
                Ok(false)
            }
        }
    }

    /// ```http
    /// GET /zones?name=example.com
    /// ```
    async fn find_zone(&self, zone_name: &str) -> Result<String> {
        let url = self.endpoint_with_query("/zones", &[("name", zone_name)])?;
        let body = self.call(HttpMethod::GET, &url, None).await?;

        let zones = accept::<Vec<Identified>>(&body).map_err(|raw| {
            Error::provider(PROVIDER, format!("zone lookup for {zone_name} failed: {raw}"))
        })?;

        first_id(zones).ok_or_else(|| Error::zone_not_found(zone_name))
    }

    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=home.example.com
    /// ```
    async fn find_record(
        &self,
        zone_id: &str,
        record_type: RecordType,
        record_name: &str,
    ) -> Result<Option<String>> {
        let url = self.endpoint_with_query(
            &format!("/zones/{zone_id}/dns_records"),
            &[("type", record_type.as_str()), ("name", record_name)],
        )?;
        let body = self.call(HttpMethod::GET, &url, None).await?;

        let records = accept::<Vec<Identified>>(&body).map_err(|raw| {
            Error::provider(
                PROVIDER,
                format!("{record_type} record lookup for {record_name} failed: {raw}"),
            )
        })?;

        Ok(first_id(records))
    }

    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// {"type":"A","name":"home.example.com","content":"1.2.3.4","ttl":300}
    /// ```
    async fn create_record(&self, zone_id: &str, payload: &RecordPayload) -> Result<String> {
        let url = self.endpoint(&format!("/zones/{zone_id}/dns_records"));
        let json = serde_json::to_value(RecordBody::from(payload))?;
        let body = self.call(HttpMethod::POST, &url, Some(&json)).await?;

        let created = accept::<Identified>(&body)
            .map_err(|raw| Error::apply(format!("create of {} failed: {raw}", payload.name)))?;

        created
            .and_then(|record| record.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::apply(format!(
                    "create of {} reported success without a record ID",
                    payload.name
                ))
            })
    }

    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// ```
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<()> {
        let url = self.endpoint(&format!("/zones/{zone_id}/dns_records/{record_id}"));
        let json = serde_json::to_value(RecordBody::from(payload))?;
        let body = self.call(HttpMethod::PUT, &url, Some(&json)).await?;

        accept::<Value>(&body)
            .map(|_| ())
            .map_err(|raw| Error::apply(format!("update of {} failed: {raw}", payload.name)))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
