//! Test doubles and common utilities for contract tests
//!
//! This module provides in-memory stand-ins for the provider, IP source and
//! notifier that record every call the loop makes.

#![allow(dead_code)]

use ddns_core::config::{DomainConfig, EngineConfig};
use ddns_core::engine::{Components, DomainLoop};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DomainId, IpSource, Notifier, RecordId, SubdomainRecord};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A recorded `update_record` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub domain_id: DomainId,
    pub record_id: RecordId,
    pub subdomain: String,
    pub ip: String,
}

/// An in-memory provider account
///
/// Successful updates are applied to the stored records, so a second cycle
/// sees what the first one wrote.
#[derive(Default)]
pub struct MockDnsProvider {
    domains: Mutex<HashMap<String, DomainId>>,
    records: Mutex<HashMap<(DomainId, String), SubdomainRecord>>,
    failing_domain_lookups: Mutex<HashSet<String>>,
    panicking_domains: Mutex<HashSet<String>>,
    failing_lookups: Mutex<HashSet<String>>,
    failing_updates: Mutex<HashSet<String>>,
    domain_calls: Mutex<Vec<String>>,
    lookup_calls: Mutex<Vec<String>>,
    updates: Mutex<Vec<UpdateCall>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(self, name: &str, id: u64) -> Self {
        self.domains
            .lock()
            .unwrap()
            .insert(name.to_string(), DomainId(id));
        self
    }

    pub fn with_record(
        self,
        domain_id: u64,
        subdomain: &str,
        record_id: &str,
        value: &str,
    ) -> Self {
        self.set_record_value(domain_id, subdomain, record_id, value);
        self
    }

    /// Simulate an out-of-band edit made through another tool
    pub fn set_record_value(&self, domain_id: u64, subdomain: &str, record_id: &str, value: &str) {
        self.records.lock().unwrap().insert(
            (DomainId(domain_id), subdomain.to_string()),
            SubdomainRecord {
                id: RecordId::new(record_id),
                name: subdomain.to_string(),
                value: value.to_string(),
            },
        );
    }

    pub fn failing_domain_lookup(self, name: &str) -> Self {
        self.failing_domain_lookups
            .lock()
            .unwrap()
            .insert(name.to_string());
        self
    }

    pub fn panicking_on_domain(self, name: &str) -> Self {
        self.panicking_domains
            .lock()
            .unwrap()
            .insert(name.to_string());
        self
    }

    pub fn failing_lookup(self, subdomain: &str) -> Self {
        self.failing_lookups
            .lock()
            .unwrap()
            .insert(subdomain.to_string());
        self
    }

    pub fn failing_update(self, subdomain: &str) -> Self {
        self.failing_updates
            .lock()
            .unwrap()
            .insert(subdomain.to_string());
        self
    }

    pub fn record_value(&self, domain_id: u64, subdomain: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .get(&(DomainId(domain_id), subdomain.to_string()))
            .map(|r| r.value.clone())
    }

    /// Domain names passed to `resolve_domain_id`, in call order
    pub fn domain_calls(&self) -> Vec<String> {
        self.domain_calls.lock().unwrap().clone()
    }

    pub fn domain_call_count(&self, name: &str) -> usize {
        self.domain_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.as_str() == name)
            .count()
    }

    /// Subdomains passed to `resolve_subdomain_record`, in call order
    pub fn lookup_calls(&self) -> Vec<String> {
        self.lookup_calls.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<UpdateCall> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn resolve_domain_id(&self, name: &str) -> Result<Option<DomainId>> {
        self.domain_calls.lock().unwrap().push(name.to_string());

        if self.panicking_domains.lock().unwrap().contains(name) {
            panic!("unexpected response shape for domain {}", name);
        }
        if self.failing_domain_lookups.lock().unwrap().contains(name) {
            return Err(Error::network("connection refused"));
        }

        Ok(self.domains.lock().unwrap().get(name).copied())
    }

    async fn resolve_subdomain_record(
        &self,
        domain_id: DomainId,
        subdomain: &str,
    ) -> Result<Option<SubdomainRecord>> {
        self.lookup_calls.lock().unwrap().push(subdomain.to_string());

        if self.failing_lookups.lock().unwrap().contains(subdomain) {
            return Err(Error::provider("mock", "malformed record list"));
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(domain_id, subdomain.to_string()))
            .cloned())
    }

    async fn update_record(
        &self,
        domain_id: DomainId,
        record_id: &RecordId,
        subdomain: &str,
        ip: &str,
    ) -> Result<()> {
        self.updates.lock().unwrap().push(UpdateCall {
            domain_id,
            record_id: record_id.clone(),
            subdomain: subdomain.to_string(),
            ip: ip.to_string(),
        });

        if self.failing_updates.lock().unwrap().contains(subdomain) {
            return Err(Error::provider("mock", "status code 8"));
        }

        if let Some(record) = self
            .records
            .lock()
            .unwrap()
            .get_mut(&(domain_id, subdomain.to_string()))
        {
            record.value = ip.to_string();
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An IP source whose answer the test controls
pub struct ScriptedIpSource {
    answer: Mutex<std::result::Result<String, String>>,
    call_count: AtomicUsize,
}

impl ScriptedIpSource {
    pub fn new(ip: &str) -> Self {
        Self {
            answer: Mutex::new(Ok(ip.to_string())),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            answer: Mutex::new(Err(reason.to_string())),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn set_ip(&self, ip: &str) {
        *self.answer.lock().unwrap() = Ok(ip.to_string());
    }

    pub fn set_failing(&self, reason: &str) {
        *self.answer.lock().unwrap() = Err(reason.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.answer
            .lock()
            .unwrap()
            .clone()
            .map_err(Error::network)
    }
}

/// A notifier that records every notification
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, fqdn: &str, ip: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((fqdn.to_string(), ip.to_string()));

        if self.fail {
            return Err(Error::notify("webhook returned 500"));
        }
        Ok(())
    }
}

/// Engine settings used by contract tests
pub fn test_engine_config() -> EngineConfig {
    EngineConfig {
        interval_secs: 300,
        retry_interval_secs: 5,
        restart_delay_secs: 0,
        max_restarts: Some(2),
        event_channel_capacity: 100,
    }
}

/// Build a loop for `domain` over the given doubles
pub fn build_loop(
    domain: DomainConfig,
    provider: &Arc<MockDnsProvider>,
    ip_source: &Arc<ScriptedIpSource>,
) -> DomainLoop {
    let components = Components::new(provider.clone(), ip_source.clone());
    DomainLoop::new(domain, components, &test_engine_config())
}
