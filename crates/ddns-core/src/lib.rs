// # ddns-core
//
// Core library for the DNSPod dynamic DNS updater.
//
// ## Architecture Overview
//
// This library provides the reconciliation logic for dynamic DNS updates:
// - **IpSource**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for looking up and modifying records via a provider API
// - **Notifier**: Trait for reporting successful updates
// - **DomainLoop**: Per-domain fetch → compare → update → sleep cycle
// - **Supervisor**: Runs one loop per domain and restarts crashed loops
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Isolation**: Domain loops share no mutable state
// 3. **Never give up**: Per-cycle errors only shorten the next sleep
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: Records are only modified when their published value differs

pub mod traits;
pub mod engine;
pub mod supervisor;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, IpSource, Notifier};
pub use engine::{Components, CycleOutcome, CycleSummary, DomainLoop, EngineEvent, EventSink};
pub use supervisor::{DomainFailure, Supervisor};
pub use config::{Credentials, DdnsConfig, DomainConfig, EngineConfig, NotifyConfig};
pub use error::{Error, Result};
