// # HTTP Address Discovery
//
// IpSource implementation that asks an external "what is my IP" service
// for the caller's public address. Services answer either with the bare
// address as plain text (icanhazip.com, ifconfig.me) or wrapped in JSON
// (api.ipify.org with `?format=json`); both shapes are accepted.
//
// The returned string is the service's own rendering of the address,
// untouched, so the engine's byte-for-byte change detection sees exactly
// what the service said.

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

use ipsync_core::traits::IpSource;
use ipsync_core::{Error, Result};

/// Default discovery endpoint
pub const DEFAULT_DISCOVERY_URL: &str = "https://api.ipify.org/?format=json";

/// Request timeout for the discovery service
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public-address source
#[derive(Debug, Clone)]
pub struct HttpAddressSource {
    url: String,
    client: reqwest::Client,
}

impl HttpAddressSource {
    /// Create a source against the given discovery endpoint
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(DEFAULT_HTTP_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
        }
    }
}

impl Default for HttpAddressSource {
    fn default() -> Self {
        Self::new(DEFAULT_DISCOVERY_URL)
    }
}

#[async_trait]
impl IpSource for HttpAddressSource {
    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("discovery request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "discovery service answered {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("failed to read discovery response: {e}")))?;

        let ip = parse_address_body(&body)?;
        tracing::debug!(ip = %ip, url = %self.url, "observed public address");
        Ok(ip)
    }
}

/// Interpret a discovery response body as an IP address
///
/// Accepts the bare address as plain text, or a JSON object carrying it
/// in an `ip` field. The address is validated but returned as written.
fn parse_address_body(body: &str) -> Result<String> {
    let trimmed = body.trim();

    if trimmed.parse::<IpAddr>().is_ok() {
        return Ok(trimmed.to_string());
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(ip) = value.get("ip").and_then(|v| v.as_str()) {
            if ip.parse::<IpAddr>().is_ok() {
                return Ok(ip.to_string());
            }
        }
    }

    Err(Error::protocol(format!(
        "discovery response is not an address: {trimmed:.64}"
    )))
}
