// # IP Source Trait
//
// Defines the interface for discovering the caller's current public IP.
//
// ## Implementations
//
// - HTTP "what is my IP" endpoint: `ddns-ip-http` crate
//
// The address is treated as an opaque string. It is compared, trimmed, and
// forwarded to the provider, never parsed.

use async_trait::async_trait;

/// Trait for IP source implementations
///
/// # Responsibilities
///
/// An IP source performs one lookup per call. It does not retry, poll, or
/// cache; the retry policy belongs to the [`DomainLoop`](crate::engine::DomainLoop).
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The address, with trailing line terminators removed
    /// - `Err(Error)`: If the lookup could not be completed
    async fn current(&self) -> crate::Result<String>;
}
