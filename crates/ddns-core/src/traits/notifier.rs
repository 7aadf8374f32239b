// # Notifier Trait
//
// Optional side effect invoked after a subdomain was successfully pointed at
// a new address. Delivery (webhook, mail, ...) lives outside the core.

use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Report that `fqdn` now resolves to `ip`
    ///
    /// Errors are logged by the caller and never interrupt the loop.
    async fn notify(&self, fqdn: &str, ip: &str) -> crate::Result<()>;
}
