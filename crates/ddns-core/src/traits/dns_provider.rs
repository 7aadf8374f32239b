// # DNS Provider Trait
//
// Defines the interface for looking up and modifying DNS records via a
// provider's record-management API.
//
// ## Implementations
//
// - DNSPod: `ddns-provider-dnspod` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     if let Some(domain_id) = provider.resolve_domain_id("example.com").await? {
//         if let Some(record) = provider.resolve_subdomain_record(domain_id, "home").await? {
//             provider
//                 .update_record(domain_id, &record.id, "home", "1.2.3.4")
//                 .await?;
//         }
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;

/// Provider-assigned numeric identifier of a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomainId(pub u64);

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provider-assigned identifier of a single record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A subdomain record as currently published by the provider
///
/// Fetched fresh on every cycle; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainRecord {
    /// The record ID
    pub id: RecordId,
    /// The record's host name, relative to the domain (e.g. "home")
    pub name: String,
    /// The currently published value, as returned by the provider
    pub value: String,
}

/// Trait for DNS provider implementations
///
/// Implementations translate domain/subdomain/IP operations into provider
/// API calls and typed results.
///
/// # Thread Safety
///
/// Implementations must be thread-safe: one provider instance is shared by
/// every domain loop.
///
/// # Responsibilities
///
/// Providers execute single API calls and parse the results. They do not
/// retry, sleep, cache records, or decide whether an update is needed; all
/// of that is owned by the [`DomainLoop`](crate::engine::DomainLoop).
///
/// # Not found
///
/// A domain or record that does not exist is `Ok(None)`, never an error.
/// Callers treat it as "nothing to do" for that item.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Find the provider ID of a domain by exact name
    ///
    /// # Returns
    ///
    /// - `Ok(Some(DomainId))`: The domain is on the account
    /// - `Ok(None)`: No match, or the provider reported a failure status
    /// - `Err(Error)`: Transport, proxy, or decoding failure
    async fn resolve_domain_id(&self, name: &str) -> crate::Result<Option<DomainId>>;

    /// Find the record for one subdomain of a domain
    ///
    /// # Returns
    ///
    /// - `Ok(Some(SubdomainRecord))`: The first record whose name matches exactly
    /// - `Ok(None)`: No record yet, or the provider reported a failure status
    /// - `Err(Error)`: Transport, proxy, or decoding failure
    async fn resolve_subdomain_record(
        &self,
        domain_id: DomainId,
        subdomain: &str,
    ) -> crate::Result<Option<SubdomainRecord>>;

    /// Point a record at a new IP
    ///
    /// Side effect only. A failure status in the provider's response is
    /// returned as an error so the caller can log it; it is never fatal.
    async fn update_record(
        &self,
        domain_id: DomainId,
        record_id: &RecordId,
        subdomain: &str,
        ip: &str,
    ) -> crate::Result<()>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
