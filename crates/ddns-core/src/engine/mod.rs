//! Per-domain reconciliation loop
//!
//! A [`DomainLoop`] is responsible for:
//! - Resolving the domain's provider ID
//! - Fetching the current public IP via IpSource
//! - Comparing it against the last IP this loop observed
//! - Checking and updating each subdomain's published record via DnsProvider
//! - Notifying after successful updates
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  IpSource   │──── current IP ────┐
//! └─────────────┘                    │
//!                                    ▼
//!                            ┌──────────────┐
//!                            │  DomainLoop  │ (owns last_observed_ip)
//!                            └──────────────┘
//!                                    │
//!         ┌──────────────────────────┼──────────────────────────┐
//!         │                          │                          │
//!         ▼                          ▼                          ▼
//! ┌──────────────┐          ┌──────────────┐          ┌──────────────┐
//! │ DnsProvider  │          │   Notifier   │          │    Events    │
//! │ (lookup/put) │          │  (optional)  │          │  (optional)  │
//! └──────────────┘          └──────────────┘          └──────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Resolve the domain ID (error → short retry sleep)
//! 2. Resolve the current IP (error or empty answer → short retry sleep)
//! 3. Same IP as last cycle → skip
//! 4. Otherwise remember the IP and reconcile every subdomain in order
//! 5. Sleep the long interval

use crate::config::{DomainConfig, EngineConfig};
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DomainId, IpSource, Notifier};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by domain loops and the supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The domain is not on the provider account
    DomainNotFound { domain: String },

    /// The public IP matches the last observed one
    IpUnchanged { domain: String, ip: String },

    /// The public IP differs from the last observed one
    IpChanged {
        domain: String,
        previous_ip: Option<String>,
        new_ip: String,
    },

    /// Record already publishes the current IP
    UpdateSkipped { fqdn: String, ip: String },

    /// Subdomain has no record at the provider
    RecordMissing { fqdn: String },

    /// Record lookup failed
    LookupFailed { fqdn: String, error: String },

    /// Record now points at the new IP
    UpdateSucceeded { fqdn: String, ip: String },

    /// Update request failed
    UpdateFailed { fqdn: String, error: String },

    /// A cycle finished normally
    CycleCompleted { domain: String },

    /// A cycle aborted before subdomain processing
    CycleFailed { domain: String, error: String },

    /// A domain loop panicked
    LoopCrashed { domain: String, reason: String },

    /// A crashed domain loop was restarted
    LoopRestarted { domain: String, attempt: u32 },

    /// A crashed domain loop exhausted its restarts
    LoopAbandoned { domain: String, restarts: u32 },
}

/// Sends engine events without ever blocking
///
/// Events are dropped (with a warning) when the channel is full, which
/// prevents unbounded memory growth when nobody is draining it.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<EngineEvent>>,
}

impl EventSink {
    /// A sink that discards every event
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Create a sink and its receiving end
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    pub fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.tx
            && tx.try_send(event).is_err()
        {
            warn!("Event channel full or closed, dropping event");
        }
    }
}

/// Collaborators shared (read-only) by every domain loop
#[derive(Clone)]
pub struct Components {
    /// DNS provider client
    pub provider: Arc<dyn DnsProvider>,

    /// Public IP source
    pub ip_source: Arc<dyn IpSource>,

    /// Optional notifier invoked after successful updates
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl Components {
    pub fn new(provider: Arc<dyn DnsProvider>, ip_source: Arc<dyn IpSource>) -> Self {
        Self {
            provider,
            ip_source,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

/// Result of one completed reconciliation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The domain is not on the provider account; nothing to do
    DomainNotFound,

    /// The public IP matched the last observed IP; no record lookups made
    IpUnchanged,

    /// Subdomains were checked against the new IP
    Reconciled(CycleSummary),
}

/// Per-subdomain tally of a reconciling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub updated: usize,
    pub unchanged: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Reconciliation loop for a single domain
///
/// ## Lifecycle
///
/// 1. Create with [`DomainLoop::new()`]
/// 2. Drive with [`DomainLoop::run()`] (never returns) or single
///    [`DomainLoop::run_cycle()`] calls
///
/// ## State
///
/// The only mutable state is `last_observed_ip`, owned exclusively by this
/// loop. It starts empty and is never persisted.
pub struct DomainLoop {
    /// Domain and subdomains to manage
    domain: DomainConfig,

    /// Shared collaborators
    components: Components,

    /// Delay after a completed cycle
    interval: Duration,

    /// Delay after a cycle that could not resolve the domain or IP
    retry_interval: Duration,

    /// Last public IP seen by this loop
    last_observed_ip: Option<String>,

    /// Event sink for external monitoring
    events: EventSink,
}

impl DomainLoop {
    /// Create a new domain loop with intervals taken from the engine configuration
    pub fn new(domain: DomainConfig, components: Components, engine: &EngineConfig) -> Self {
        Self {
            domain,
            components,
            interval: engine.interval(),
            retry_interval: engine.retry_interval(),
            last_observed_ip: None,
            events: EventSink::disabled(),
        }
    }

    /// Override the sleep intervals
    pub fn with_intervals(mut self, interval: Duration, retry_interval: Duration) -> Self {
        self.interval = interval;
        self.retry_interval = retry_interval;
        self
    }

    /// Attach an event sink
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Seed the last observed IP
    pub fn with_last_observed_ip(mut self, ip: impl Into<String>) -> Self {
        self.last_observed_ip = Some(ip.into());
        self
    }

    pub fn domain(&self) -> &DomainConfig {
        &self.domain
    }

    pub fn last_observed_ip(&self) -> Option<&str> {
        self.last_observed_ip.as_deref()
    }

    /// Run cycles forever
    ///
    /// Errors never end the loop; they only shorten the next sleep.
    pub async fn run(mut self) {
        info!(domain = %self.domain.domain_name, "Starting domain loop");

        loop {
            let delay = match self.run_cycle().await {
                Ok(_) => {
                    info!(
                        domain = %self.domain.domain_name,
                        "Going to sleep, next check in {:?}",
                        self.interval
                    );
                    self.interval
                }
                Err(e) => {
                    error!(
                        domain = %self.domain.domain_name,
                        error = %e,
                        "Cycle failed, retrying in {:?}",
                        self.retry_interval
                    );
                    self.retry_interval
                }
            };

            tokio::time::sleep(delay).await;
        }
    }

    /// Perform one reconciliation cycle
    ///
    /// # Returns
    ///
    /// - `Ok(CycleOutcome)`: The cycle completed (possibly with per-subdomain failures)
    /// - `Err(Error)`: The domain ID or the public IP could not be resolved
    #[tracing::instrument(skip(self), fields(domain = %self.domain.domain_name))]
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        debug!("Checking IP for domain");

        let domain_id = match self.resolve_domain_id().await? {
            Some(id) => id,
            None => {
                warn!("Domain not found on provider account, nothing to do");
                self.events.emit(EngineEvent::DomainNotFound {
                    domain: self.domain.domain_name.clone(),
                });
                return Ok(CycleOutcome::DomainNotFound);
            }
        };

        let current_ip = self.resolve_current_ip().await?;
        info!(ip = %current_ip, "Current IP resolved");

        if self.last_observed_ip.as_deref() == Some(current_ip.as_str()) {
            info!("IP is the same as cached one, skipping update");
            self.events.emit(EngineEvent::IpUnchanged {
                domain: self.domain.domain_name.clone(),
                ip: current_ip,
            });
            self.emit_cycle_completed();
            return Ok(CycleOutcome::IpUnchanged);
        }

        let previous_ip = self.last_observed_ip.replace(current_ip.clone());
        self.events.emit(EngineEvent::IpChanged {
            domain: self.domain.domain_name.clone(),
            previous_ip,
            new_ip: current_ip.clone(),
        });

        let summary = self.reconcile_subdomains(domain_id, &current_ip).await;
        info!(
            updated = summary.updated,
            unchanged = summary.unchanged,
            missing = summary.missing,
            failed = summary.failed,
            "Subdomains reconciled"
        );

        self.emit_cycle_completed();
        Ok(CycleOutcome::Reconciled(summary))
    }

    async fn resolve_domain_id(&self) -> Result<Option<DomainId>> {
        self.components
            .provider
            .resolve_domain_id(&self.domain.domain_name)
            .await
            .inspect_err(|e| {
                error!(error = %e, "Failed to resolve domain ID");
                self.emit_cycle_failed(e);
            })
    }

    async fn resolve_current_ip(&self) -> Result<String> {
        self.components
            .ip_source
            .current()
            .await
            .and_then(|ip| {
                if ip.trim().is_empty() {
                    Err(Error::network("IP source returned an empty address"))
                } else {
                    Ok(ip)
                }
            })
            .inspect_err(|e| {
                error!(error = %e, "Failed to get current IP");
                self.emit_cycle_failed(e);
            })
    }

    /// Check every subdomain, strictly in configured order
    async fn reconcile_subdomains(&self, domain_id: DomainId, current_ip: &str) -> CycleSummary {
        let mut summary = CycleSummary::default();
        let wanted = current_ip.trim();

        for sub_domain in &self.domain.sub_domains {
            let fqdn = self.domain.fqdn(sub_domain);

            let record = match self
                .components
                .provider
                .resolve_subdomain_record(domain_id, sub_domain)
                .await
            {
                Ok(Some(record)) => record,
                Ok(None) => {
                    warn!(subdomain = %sub_domain, "No record found for subdomain, skipping");
                    self.events.emit(EngineEvent::RecordMissing { fqdn });
                    summary.missing += 1;
                    continue;
                }
                Err(e) => {
                    error!(subdomain = %sub_domain, error = %e, "Get sub domain failed");
                    self.events.emit(EngineEvent::LookupFailed {
                        fqdn,
                        error: e.to_string(),
                    });
                    summary.failed += 1;
                    continue;
                }
            };

            if record.value.trim() == wanted {
                debug!(
                    subdomain = %sub_domain,
                    "Record already has the current IP, no need to update"
                );
                self.events.emit(EngineEvent::UpdateSkipped {
                    fqdn,
                    ip: wanted.to_string(),
                });
                summary.unchanged += 1;
                continue;
            }

            info!(
                subdomain = %sub_domain,
                from = %record.value.trim(),
                to = %wanted,
                "Updating record IP"
            );

            match self
                .components
                .provider
                .update_record(domain_id, &record.id, sub_domain, wanted)
                .await
            {
                Ok(()) => {
                    info!(subdomain = %sub_domain, ip = %wanted, "New IP updated");
                    self.events.emit(EngineEvent::UpdateSucceeded {
                        fqdn: fqdn.clone(),
                        ip: wanted.to_string(),
                    });
                    summary.updated += 1;
                    self.notify(&fqdn, wanted).await;
                }
                Err(e) => {
                    error!(
                        subdomain = %sub_domain,
                        error = %e,
                        "Failed to update record to new IP"
                    );
                    self.events.emit(EngineEvent::UpdateFailed {
                        fqdn,
                        error: e.to_string(),
                    });
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    async fn notify(&self, fqdn: &str, ip: &str) {
        let Some(notifier) = &self.components.notifier else {
            return;
        };

        if let Err(e) = notifier.notify(fqdn, ip).await {
            warn!(fqdn = %fqdn, error = %e, "Failed to send notification");
        }
    }

    fn emit_cycle_completed(&self) {
        self.events.emit(EngineEvent::CycleCompleted {
            domain: self.domain.domain_name.clone(),
        });
    }

    fn emit_cycle_failed(&self, error: &Error) {
        self.events.emit(EngineEvent::CycleFailed {
            domain: self.domain.domain_name.clone(),
            error: error.to_string(),
        });
    }
}
