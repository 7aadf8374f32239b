//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces the reconciliation loop talks to.
//!
//! - [`IpSource`]: Discover the current public IP
//! - [`DnsProvider`]: Look up and modify records via a provider API
//! - [`Notifier`]: Report successful updates

pub mod ip_source;
pub mod dns_provider;
pub mod notifier;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DomainId, RecordId, SubdomainRecord};
pub use notifier::Notifier;
