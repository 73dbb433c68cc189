use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::error::{ConfigError, Error};
use crate::testkit;
use crate::testkit::collector::StaticCollector;
use crate::testkit::device::ScriptedConnector;

fn registry() -> CollectorRegistry {
    CollectorRegistry::new().with(Arc::new(StaticCollector::single("static")))
}

fn builder(connector: &Arc<ScriptedConnector>) -> ScrapeOrchestratorBuilder {
    ScrapeOrchestrator::builder(connector.clone())
        .settings(testkit::config::scrape(false, 2))
        .registry(registry())
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_build_rejects_duplicate_devices() {
    let connector = Arc::new(ScriptedConnector::new());
    let err = builder(&connector)
        .device(testkit::config::device("r1"))
        .device(testkit::config::device("r1"))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ConfigError::DuplicateDevice { name } if name == "r1"));
}

#[tokio::test]
async fn test_build_rejects_unknown_or_self_lease_source() {
    let connector = Arc::new(ScriptedConnector::new());

    let mut r1 = testkit::config::device("r1");
    r1.remote_lease_source = Some("nowhere".into());
    let err = builder(&connector).device(r1).build().err().unwrap();
    assert!(matches!(err, ConfigError::UnknownLeaseSource { .. }));

    let mut r2 = testkit::config::device("r2");
    r2.remote_lease_source = Some("r2".into());
    let err = builder(&connector).device(r2).build().err().unwrap();
    assert!(matches!(err, ConfigError::UnknownLeaseSource { .. }));
}

#[tokio::test]
async fn test_disabled_devices_are_not_batch_entries() {
    let connector = Arc::new(ScriptedConnector::new());
    let mut off = testkit::config::device("off");
    off.enabled = false;

    let orchestrator = builder(&connector)
        .device(testkit::config::device("on"))
        .device(off)
        .build()
        .unwrap();

    assert_eq!(orchestrator.device_names(), ["on"]);
    orchestrator.collect().await;
    assert_eq!(connector.attempts("off.test"), 0);

    // Still reachable through a probe.
    assert_eq!(orchestrator.probe("off").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_default_registry_is_builtin() {
    let connector = Arc::new(ScriptedConnector::new());
    let orchestrator = ScrapeOrchestrator::builder(connector).build().unwrap();
    assert_eq!(
        orchestrator.registry().names(),
        CollectorRegistry::builtin().names()
    );
}

// ---------------------------------------------------------------------------
// Rate guard
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_rate_guard_drops_then_admits() {
    let connector = Arc::new(ScriptedConnector::new());
    let mut settings = testkit::config::scrape(false, 1);
    settings.minimal_collect_interval_secs = 5;
    let orchestrator = ScrapeOrchestrator::builder(connector)
        .settings(settings)
        .build()
        .unwrap();

    assert!(orchestrator.admit_batch());
    tokio::time::advance(Duration::from_secs(4)).await;
    assert!(!orchestrator.admit_batch());
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(orchestrator.admit_batch());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_batch_does_not_restart_the_interval() {
    let connector = Arc::new(ScriptedConnector::new());
    let mut settings = testkit::config::scrape(false, 1);
    settings.minimal_collect_interval_secs = 5;
    let orchestrator = ScrapeOrchestrator::builder(connector)
        .settings(settings)
        .build()
        .unwrap();

    assert!(orchestrator.admit_batch());
    tokio::time::advance(Duration::from_secs(3)).await;
    assert!(!orchestrator.admit_batch());
    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(orchestrator.admit_batch());
}

#[tokio::test]
async fn test_collect_batch_carries_identity() {
    let connector = Arc::new(ScriptedConnector::new());
    let orchestrator = builder(&connector)
        .device(testkit::config::device("r1"))
        .build()
        .unwrap();

    let first = orchestrator.collect_batch().await.unwrap();
    let second = orchestrator.collect_batch().await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(first.records.len(), 1);
}

// ---------------------------------------------------------------------------
// Diagnostics and shutdown
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_status_reports_backoff_and_timings() {
    let connector = Arc::new(ScriptedConnector::new());
    connector.set_unreachable("down.test", true);
    let orchestrator = builder(&connector)
        .backoff(crate::connection::BackoffPolicy::new(
            Duration::from_secs(120),
            Duration::from_secs(900),
            5,
        ))
        .device(testkit::config::device("up"))
        .device(testkit::config::device("down"))
        .build()
        .unwrap();

    orchestrator.collect().await;
    let status = orchestrator.status().await;

    assert_eq!(status[0].device, "up");
    assert!(status[0].connected);
    assert_eq!(status[0].collectors.len(), 1);
    assert_eq!(status[0].collectors[0].runs, 1);

    assert_eq!(status[1].device, "down");
    assert!(!status[1].connected);
    assert_eq!(status[1].successive_failures, 1);
    assert_eq!(status[1].retry_in_secs, Some(120));
    assert!(status[1].collectors.is_empty());
}

#[tokio::test]
async fn test_shutdown_disconnects_entries_and_pool() {
    let connector = Arc::new(ScriptedConnector::new());
    let orchestrator = builder(&connector)
        .device(testkit::config::device("r1"))
        .device(testkit::config::device("r2"))
        .build()
        .unwrap();

    orchestrator.collect().await;
    orchestrator.probe("r1").await.unwrap();
    assert_eq!(orchestrator.pool().len(), 1);

    orchestrator.shutdown().await;
    assert_eq!(connector.closes(), 3);
    assert!(orchestrator.pool().is_empty());
}

#[tokio::test]
async fn test_probe_unknown_device() {
    let connector = Arc::new(ScriptedConnector::new());
    let orchestrator = builder(&connector).build().unwrap();

    let err = orchestrator.probe("ghost").await.unwrap_err();
    assert!(matches!(err, Error::UnknownDevice { device } if device == "ghost"));
}
