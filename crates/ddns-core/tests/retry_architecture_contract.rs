//! Architectural Contract Test: Loop-Owned Retry Timing
//!
//! This test verifies that the domain loop, not the provider or IP source,
//! decides when to try again.
//!
//! Constraints verified:
//! - A cycle that cannot resolve the domain or IP sleeps the short retry interval
//! - A completed cycle sleeps the long interval
//! - An unknown domain is not an error and uses the long interval
//! - The loop never gives up
//!
//! Time is paused, so the intervals below are virtual.

mod common;

use common::*;
use ddns_core::config::DomainConfig;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn failing_ip_lookup_retries_on_short_interval() {
    let provider = Arc::new(MockDnsProvider::new().with_domain("example.com", 42));
    let ip_source = Arc::new(ScriptedIpSource::failing("connection reset"));

    let domain_loop = build_loop(DomainConfig::new("example.com", ["home"]), &provider, &ip_source);
    let handle = tokio::spawn(domain_loop.run());

    // Attempts at t=0, t=5 and t=10
    tokio::time::sleep(Duration::from_secs(12)).await;

    assert_eq!(ip_source.call_count(), 3);
    assert!(!handle.is_finished(), "The loop must keep running after failures");
    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn failing_domain_lookup_retries_on_short_interval() {
    let provider = Arc::new(MockDnsProvider::new().failing_domain_lookup("example.com"));
    let ip_source = Arc::new(ScriptedIpSource::new("1.2.3.4"));

    let domain_loop = build_loop(DomainConfig::new("example.com", ["home"]), &provider, &ip_source);
    let handle = tokio::spawn(domain_loop.run());

    tokio::time::sleep(Duration::from_secs(12)).await;

    assert_eq!(provider.domain_call_count("example.com"), 3);
    assert_eq!(ip_source.call_count(), 0);
    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn completed_cycle_sleeps_long_interval() {
    let provider = Arc::new(
        MockDnsProvider::new()
            .with_domain("example.com", 42)
            .with_record(42, "home", "1001", "1.2.3.4"),
    );
    let ip_source = Arc::new(ScriptedIpSource::new("1.2.3.4"));

    let domain_loop = build_loop(DomainConfig::new("example.com", ["home"]), &provider, &ip_source);
    let handle = tokio::spawn(domain_loop.run());

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(ip_source.call_count(), 1);

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(ip_source.call_count(), 2);

    // IP unchanged on the second cycle, so records were looked up only once
    assert_eq!(provider.lookup_calls().len(), 1);
    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn unknown_domain_sleeps_long_interval() {
    let provider = Arc::new(MockDnsProvider::new());
    let ip_source = Arc::new(ScriptedIpSource::new("1.2.3.4"));

    let domain_loop = build_loop(DomainConfig::new("example.com", ["home"]), &provider, &ip_source);
    let handle = tokio::spawn(domain_loop.run());

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(provider.domain_call_count("example.com"), 1);
    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn loop_recovers_after_transient_failure() {
    let provider = Arc::new(
        MockDnsProvider::new()
            .with_domain("example.com", 42)
            .with_record(42, "home", "1001", "1.1.1.1"),
    );
    let ip_source = Arc::new(ScriptedIpSource::failing("timed out"));

    let domain_loop = build_loop(DomainConfig::new("example.com", ["home"]), &provider, &ip_source);
    let handle = tokio::spawn(domain_loop.run());

    // Fails at t=0 and t=5
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(provider.update_call_count(), 0);

    // Succeeds at t=10, then sleeps until t=310
    ip_source.set_ip("2.2.2.2");
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(ip_source.call_count(), 3);
    assert_eq!(provider.update_call_count(), 1);
    assert_eq!(provider.record_value(42, "home").as_deref(), Some("2.2.2.2"));

    tokio::time::sleep(Duration::from_secs(290)).await;
    assert_eq!(ip_source.call_count(), 3);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(ip_source.call_count(), 4);
    assert_eq!(provider.update_call_count(), 1);
    handle.abort();
}
