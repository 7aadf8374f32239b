//! One-for-one supervision of domain loops
//!
//! Every configured domain runs its [`DomainLoop`] on its own tokio task.
//! A panic inside a loop is caught at the task boundary, reported on an
//! mpsc channel as a [`DomainFailure`], and the supervisor restarts only
//! that domain's loop with fresh state. Other domains keep running.
//!
//! ```text
//!   ┌────────────┐   ┌────────────┐   ┌────────────┐
//!   │ DomainLoop │   │ DomainLoop │   │ DomainLoop │
//!   └─────┬──────┘   └─────┬──────┘   └─────┬──────┘
//!         │ panic          │                │
//!         ▼                ▼                ▼
//!   ┌──────────────────────────────────────────────┐
//!   │   watcher tasks ── DomainFailure channel ──┐ │
//!   └────────────────────────────────────────────┼─┘
//!                                                ▼
//!                                        ┌──────────────┐
//!                                        │  Supervisor  │ (restart / give up)
//!                                        └──────────────┘
//! ```

use crate::config::{DomainConfig, EngineConfig};
use crate::engine::{Components, DomainLoop, EngineEvent, EventSink};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

/// Crash report sent by a domain loop's watcher
#[derive(Debug, Clone)]
pub struct DomainFailure {
    /// Position of the domain in the supervisor's list
    slot: usize,

    /// The domain whose loop crashed
    pub domain: DomainConfig,

    /// Panic message
    pub reason: String,

    /// When the crash was observed
    pub at: DateTime<Utc>,
}

/// Supervisor for all domain loops
pub struct Supervisor {
    /// Domains to run, one loop each
    domains: Vec<DomainConfig>,

    /// Collaborators shared by every loop
    components: Components,

    /// Intervals and restart policy
    engine: EngineConfig,

    /// Event sink shared with every loop
    events: EventSink,
}

impl Supervisor {
    /// Create a new supervisor
    pub fn new(domains: Vec<DomainConfig>, components: Components, engine: EngineConfig) -> Self {
        Self {
            domains,
            components,
            engine,
            events: EventSink::disabled(),
        }
    }

    /// Attach an event sink, shared with every domain loop
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Run until Ctrl-C
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to wait for Ctrl-C: {}", e);
            }
        })
        .await
    }

    /// Run until `shutdown` completes, then abort every domain loop
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if self.domains.is_empty() {
            return Err(Error::config("No domains configured"));
        }

        let (failure_tx, mut failure_rx) = mpsc::unbounded_channel();

        let mut handles: Vec<AbortHandle> = (0..self.domains.len())
            .map(|slot| self.spawn_domain(slot, Duration::ZERO, failure_tx.clone()))
            .collect();
        let mut restarts = vec![0u32; self.domains.len()];

        info!("Supervising {} domain loop(s)", self.domains.len());

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some(failure) = failure_rx.recv() => {
                    let slot = failure.slot;
                    let restarted = self.handle_failure(failure, &mut restarts[slot], &failure_tx);
                    if let Some(handle) = restarted {
                        handles[slot] = handle;
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        for handle in &handles {
            handle.abort();
        }
        info!("All domain loops stopped");

        Ok(())
    }

    /// Decide whether to restart a crashed loop
    ///
    /// Returns the new task's abort handle, or `None` if the restart budget
    /// is exhausted.
    fn handle_failure(
        &self,
        failure: DomainFailure,
        restarts: &mut u32,
        failure_tx: &mpsc::UnboundedSender<DomainFailure>,
    ) -> Option<AbortHandle> {
        let domain = failure.domain.domain_name;
        self.events.emit(EngineEvent::LoopCrashed {
            domain: domain.clone(),
            reason: failure.reason,
        });

        if let Some(max) = self.engine.max_restarts
            && *restarts >= max
        {
            error!(
                domain = %domain,
                restarts = *restarts,
                "Domain loop keeps crashing, giving up"
            );
            self.events.emit(EngineEvent::LoopAbandoned {
                domain,
                restarts: *restarts,
            });
            return None;
        }

        *restarts += 1;
        warn!(
            domain = %domain,
            attempt = *restarts,
            crashed_at = %failure.at,
            "Restarting domain loop in {:?}",
            self.engine.restart_delay()
        );

        let handle = self.spawn_domain(
            failure.slot,
            self.engine.restart_delay(),
            failure_tx.clone(),
        );
        self.events.emit(EngineEvent::LoopRestarted {
            domain,
            attempt: *restarts,
        });

        Some(handle)
    }

    /// Spawn a domain loop plus a watcher that reports its crash
    fn spawn_domain(
        &self,
        slot: usize,
        delay: Duration,
        failures: mpsc::UnboundedSender<DomainFailure>,
    ) -> AbortHandle {
        let domain = self.domains[slot].clone();
        let domain_loop = DomainLoop::new(domain.clone(), self.components.clone(), &self.engine)
            .with_events(self.events.clone());

        let task = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            domain_loop.run().await;
        });
        let abort = task.abort_handle();

        tokio::spawn(async move {
            match task.await {
                Ok(()) => warn!(domain = %domain.domain_name, "Domain loop exited"),
                Err(e) if e.is_panic() => {
                    let reason = panic_reason(e.into_panic());
                    error!(
                        domain = %domain.domain_name,
                        reason = %reason,
                        "Recovered from crash in domain loop"
                    );
                    let _ = failures.send(DomainFailure {
                        slot,
                        domain,
                        reason,
                        at: Utc::now(),
                    });
                }
                Err(_) => debug!(domain = %domain.domain_name, "Domain loop cancelled"),
            }
        });

        abort
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
