// # Cloudflare DNS Provider
//
// DnsProvider implementation over the Cloudflare API v4.
//
// One HTTP request per trait call, full error propagation to the engine.
// No retries, no caching, no background tasks: the engine owns all
// sequencing and the next poll cycle is the retry mechanism.
//
// Credentials are passed per call because each managed record may carry
// its own token; they never appear in logs.
//
// ## API Reference
//
// - List Zones:       GET   `/zones?name=...`
// - List DNS Records: GET   `/zones/:zone_id/dns_records?name=...`
// - Update Record:    PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use ipsync_core::traits::{DnsProvider, RecordRef, RecordUpdate, ZoneRef};
use ipsync_core::{Error, Result};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Envelope shared by Cloudflare list responses
#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    result: Vec<T>,
}

/// Cloudflare DNS provider
#[derive(Debug, Clone)]
pub struct CloudflareDns {
    client: reqwest::Client,
    base_url: String,
}

impl CloudflareDns {
    /// Create a provider against the production API
    pub fn new() -> Self {
        Self::with_base_url(CLOUDFLARE_API_BASE)
    }

    /// Create a provider against an alternate base URL (test servers)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn zones_url(&self, zone_name: &str) -> String {
        format!("{}/zones?name={}", self.base_url, zone_name)
    }

    fn records_url(&self, zone_identifier: &str, record_name: &str) -> String {
        format!(
            "{}/zones/{}/dns_records?name={}",
            self.base_url, zone_identifier, record_name
        )
    }

    fn record_url(&self, zone_identifier: &str, record_identifier: &str) -> String {
        format!(
            "{}/zones/{}/dns_records/{}",
            self.base_url, zone_identifier, record_identifier
        )
    }

    /// Issue an authenticated GET and deserialize the list envelope
    async fn get_list<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<Vec<T>> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;

        let envelope: ListEnvelope<T> = response
            .json()
            .await
            .map_err(|e| Error::protocol(format!("failed to parse response: {e}")))?;

        Ok(envelope.result)
    }
}

impl Default for CloudflareDns {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DnsProvider for CloudflareDns {
    async fn lookup_zone(&self, zone_name: &str, token: &str) -> Result<Vec<ZoneRef>> {
        tracing::debug!(zone = %zone_name, "looking up zone");
        self.get_list(&self.zones_url(zone_name), token).await
    }

    async fn lookup_record(
        &self,
        zone_identifier: &str,
        record_name: &str,
        token: &str,
    ) -> Result<Vec<RecordRef>> {
        tracing::debug!(record = %record_name, zone_id = %zone_identifier, "looking up record");
        self.get_list(&self.records_url(zone_identifier, record_name), token)
            .await
    }

    async fn update_record(
        &self,
        zone_identifier: &str,
        record_identifier: &str,
        update: &RecordUpdate,
        token: &str,
    ) -> Result<()> {
        tracing::debug!(record = %update.name, content = %update.content, "updating record");

        let response = self
            .client
            .patch(self.record_url(zone_identifier, record_identifier))
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .json(update)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response).await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Map a transport failure onto the closed error taxonomy
fn transport_error(e: reqwest::Error) -> Error {
    Error::network(e.to_string())
}

/// Classify a non-success status, reading the provider's error payload
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error response".to_string());

    match status.as_u16() {
        401 | 403 => Err(Error::auth(format!(
            "credential rejected (status {status}): {detail}"
        ))),
        code => Err(Error::rejected(code, detail)),
    }
}
