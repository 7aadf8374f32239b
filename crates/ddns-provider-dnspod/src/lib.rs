// # DNSPod DNS Provider
//
// This crate provides a DNSPod DNS provider implementation for the DDNS system.
//
// ## Behaviour
//
// - One HTTP request per trait call; no retries, caching or background tasks
//   (the domain loop owns scheduling)
// - HTTP timeout configured (30 seconds)
// - Optional SOCKS5 proxy for all provider traffic
// - Typed response decoding; IDs accepted as JSON numbers or digit strings
//
// ## Security Requirements
//
// - Login token and password NEVER appear in logs or Debug output
//
// ## API Reference
//
// All calls are form-encoded `POST`s against `https://dnsapi.cn`:
//
// - List domains: `POST /Domain.List`
// - List records: `POST /Record.List`
// - Modify record: `POST /Record.Modify`
//
// Every response carries a `status` object; `status.code == "1"` means success.

use async_trait::async_trait;
use ddns_core::config::Credentials;
use ddns_core::traits::{DnsProvider, DomainId, RecordId, SubdomainRecord};
use ddns_core::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// DNSPod API base URL
const DNSPOD_API_BASE: &str = "https://dnsapi.cn";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// DNSPod rejects requests without an identifying agent
const USER_AGENT: &str = concat!("ddnsd/", env!("CARGO_PKG_VERSION"), " (dnspod client)");

/// Status code DNSPod uses for success
const STATUS_OK: &str = "1";

/// Record line name for the provider's default line
const DEFAULT_RECORD_LINE: &str = "默认";

const PROVIDER_NAME: &str = "dnspod";

/// DNSPod DNS provider
///
/// Stateless apart from the HTTP client: every call performs exactly one
/// request.
pub struct DnspodProvider {
    /// Login token or account credentials
    /// ⚠️ NEVER log these values
    credentials: Credentials,

    /// API origin, overridable for tests
    base_url: String,

    /// Whether the client tunnels through a SOCKS5 proxy
    proxied: bool,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for DnspodProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnspodProvider")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("proxied", &self.proxied)
            .finish()
    }
}

impl DnspodProvider {
    /// Create a new DNSPod provider
    ///
    /// # Parameters
    ///
    /// - `credentials`: Login token or email/password
    /// - `socks5_proxy`: Optional proxy, as `host:port` or a `socks5://` /
    ///   `socks5h://` URL
    ///
    /// # Errors
    ///
    /// `Error::Proxy` if the proxy address cannot be parsed, `Error::Config`
    /// if the HTTP client cannot be built.
    pub fn new(credentials: Credentials, socks5_proxy: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(USER_AGENT);

        let proxied = socks5_proxy.is_some();
        if let Some(address) = socks5_proxy {
            let url = proxy_url(address);
            let proxy = reqwest::Proxy::all(&url)
                .map_err(|e| Error::proxy(format!("Invalid SOCKS5 proxy {}: {}", address, e)))?;
            builder = builder.proxy(proxy);
            tracing::info!(proxy = %address, "Using SOCKS5 proxy for provider traffic");
        }

        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            base_url: DNSPOD_API_BASE.to_string(),
            proxied,
            client,
        })
    }

    /// Point the provider at a different API origin
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fields every request carries
    fn common_params(&self) -> Vec<(&'static str, String)> {
        let mut params = match &self.credentials {
            Credentials::Token(token) => vec![("login_token", token.clone())],
            Credentials::Account { email, password } => vec![
                ("login_email", email.clone()),
                ("login_password", password.clone()),
            ],
        };
        params.extend([
            ("format", "json".to_string()),
            ("lang", "en".to_string()),
            ("error_on_empty", "no".to_string()),
        ]);
        params
    }

    /// POST `params` (plus the common envelope) to `action` and decode the body
    async fn post(&self, action: &str, params: &[(&'static str, String)]) -> Result<Envelope> {
        let url = format!("{}/{}", self.base_url, action);

        let mut form = self.common_params();
        form.extend(params.iter().cloned());

        tracing::debug!(action = %action, "Sending DNSPod request");

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.transport_error(action, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(action, e))?;

        if !status.is_success() {
            tracing::warn!(
                action = %action,
                status = %status,
                "DNSPod returned non-success HTTP status"
            );
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::provider(
                PROVIDER_NAME,
                format!("Failed to decode {} response: {}", action, e),
            )
        })
    }

    fn transport_error(&self, action: &str, e: reqwest::Error) -> Error {
        if self.proxied && e.is_connect() {
            Error::proxy(format!("{} request could not pass the proxy: {}", action, e))
        } else {
            Error::network(format!("{} request failed: {}", action, e))
        }
    }
}

#[async_trait]
impl DnsProvider for DnspodProvider {
    async fn resolve_domain_id(&self, name: &str) -> Result<Option<DomainId>> {
        let envelope = self
            .post(
                "Domain.List",
                &[
                    ("type", "all".to_string()),
                    ("offset", "0".to_string()),
                    ("length", "20".to_string()),
                ],
            )
            .await?;

        if !envelope.status.is_ok() {
            tracing::warn!(
                domain = %name,
                code = %envelope.status.code,
                message = %envelope.status.message(),
                "Domain list request was rejected"
            );
            return Ok(None);
        }

        for domain in envelope.domains.unwrap_or_default() {
            if domain.name == name {
                let id = domain.id.into_u64()?;
                tracing::debug!(domain = %name, id, "Found domain ID");
                return Ok(Some(DomainId(id)));
            }
        }

        Ok(None)
    }

    async fn resolve_subdomain_record(
        &self,
        domain_id: DomainId,
        subdomain: &str,
    ) -> Result<Option<SubdomainRecord>> {
        let envelope = self
            .post(
                "Record.List",
                &[
                    ("domain_id", domain_id.to_string()),
                    ("offset", "0".to_string()),
                    ("length", "1".to_string()),
                    ("sub_domain", subdomain.to_string()),
                ],
            )
            .await?;

        if !envelope.status.is_ok() {
            tracing::warn!(
                subdomain = %subdomain,
                code = %envelope.status.code,
                message = %envelope.status.message(),
                "Record list request was rejected"
            );
            return Ok(None);
        }

        let Some(record) = envelope
            .records
            .unwrap_or_default()
            .into_iter()
            .find(|r| r.name == subdomain)
        else {
            return Ok(None);
        };

        Ok(Some(SubdomainRecord {
            id: RecordId(record.id.into_digits()?),
            name: record.name,
            value: record.value,
        }))
    }

    async fn update_record(
        &self,
        domain_id: DomainId,
        record_id: &RecordId,
        subdomain: &str,
        ip: &str,
    ) -> Result<()> {
        let envelope = self
            .post(
                "Record.Modify",
                &[
                    ("domain_id", domain_id.to_string()),
                    ("record_id", record_id.as_str().to_string()),
                    ("sub_domain", subdomain.to_string()),
                    ("record_type", "A".to_string()),
                    ("record_line", DEFAULT_RECORD_LINE.to_string()),
                    ("value", ip.to_string()),
                ],
            )
            .await?;

        if !envelope.status.is_ok() {
            tracing::warn!(
                subdomain = %subdomain,
                code = %envelope.status.code,
                message = %envelope.status.message(),
                "Record modify request was rejected"
            );
            return Err(Error::provider(
                PROVIDER_NAME,
                format!(
                    "Record.Modify failed with status {}: {}",
                    envelope.status.code,
                    envelope.status.message()
                ),
            ));
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Normalise a proxy address to a URL reqwest understands
fn proxy_url(address: &str) -> String {
    let address = address.trim();
    if address.contains("://") {
        address.to_string()
    } else {
        format!("socks5://{}", address)
    }
}

/// Response envelope shared by every API action
#[derive(Debug, Deserialize)]
struct Envelope {
    status: Status,
    #[serde(default)]
    domains: Option<Vec<DomainEntry>>,
    #[serde(default)]
    records: Option<Vec<RecordEntry>>,
}

#[derive(Debug, Deserialize)]
struct Status {
    code: String,
    #[serde(default)]
    message: Option<String>,
}

impl Status {
    fn is_ok(&self) -> bool {
        self.code == STATUS_OK
    }

    fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Deserialize)]
struct DomainEntry {
    id: RawId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RecordEntry {
    id: RawId,
    name: String,
    #[serde(default)]
    value: String,
}

/// DNSPod sends some IDs as numbers and others as strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn into_digits(self) -> Result<String> {
        match self {
            RawId::Number(n) => Ok(n.to_string()),
            RawId::Text(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => Ok(s),
            RawId::Text(s) => Err(Error::provider(
                PROVIDER_NAME,
                format!("Unexpected ID format: {:?}", s),
            )),
        }
    }

    fn into_u64(self) -> Result<u64> {
        let digits = self.into_digits()?;
        digits.parse().map_err(|_| {
            Error::provider(PROVIDER_NAME, format!("ID out of range: {}", digits))
        })
    }
}
