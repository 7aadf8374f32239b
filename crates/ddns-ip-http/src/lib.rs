// # HTTP IP Source
//
// This crate provides an HTTP-based IP source for the DDNS system.
//
// ## Architecture
//
// Issues one GET per call to a "what is my IP" service (e.g. api.ipify.org,
// ifconfig.me/ip, icanhazip.com) and returns the body as the current IP.
// There is no caching and no internal retry: the domain loop decides when to
// ask again.

use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use std::time::Duration;

/// Default HTTP timeout for IP lookups (10 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL returning the caller's IP as plain text
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch the IP from (e.g., "https://api.ipify.org")
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("IP lookup request failed: {}", e)))?;

        // Best effort: some services answer with odd statuses but a usable body
        if !response.status().is_success() {
            tracing::warn!(
                url = %self.url,
                status = %response.status(),
                "IP lookup returned non-success status"
            );
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read IP lookup response: {}", e)))?;

        let ip = body.trim_end_matches(['\r', '\n']).to_string();
        if ip.trim().is_empty() {
            return Err(Error::network("IP lookup returned an empty body"));
        }
        tracing::debug!(ip = %ip, "Resolved public IP");

        Ok(ip)
    }
}
