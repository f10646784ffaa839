//! Tests for the health monitor: kind dispatch, the shared port
//! sub-cache, TTL behavior, and HTTP probes.

use provider::{AdapterKind, ProviderDescriptor, ProviderKind, multiplexer_base_url};
use rudder_health::{AuthOracle, HealthCache, HealthMonitor, PortInspector, ProcessInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

#[derive(Clone)]
struct FakePorts {
    up: bool,
    probes: Arc<AtomicUsize>,
}

impl FakePorts {
    fn new(up: bool) -> Self {
        Self {
            up,
            probes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl PortInspector for FakePorts {
    fn process_on_port(&self, _port: u16) -> Option<ProcessInfo> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.up.then(|| ProcessInfo {
            pid: 42,
            command: "muxd".to_owned(),
        })
    }

    fn is_expected(&self, info: &ProcessInfo) -> bool {
        info.command == "muxd"
    }
}

struct FakeAuth {
    ok: bool,
}

impl AuthOracle for FakeAuth {
    fn authenticated(&self, _provider: &str) -> bool {
        self.ok
    }
}

fn mux_descriptor(name: &str) -> ProviderDescriptor {
    ProviderDescriptor::new(
        name,
        ProviderKind::Multiplexer,
        AdapterKind::AnthropicPassthrough,
        Url::parse(&multiplexer_base_url(name)).unwrap(),
    )
}

fn remote_descriptor(name: &str, base_url: &str) -> ProviderDescriptor {
    ProviderDescriptor::new(
        name,
        ProviderKind::RemoteApi,
        AdapterKind::AnthropicPassthrough,
        Url::parse(base_url).unwrap(),
    )
}

#[tokio::test]
async fn multiplexer_down_wins_over_auth_status() {
    let monitor = HealthMonitor::new(HealthCache::new(), FakePorts::new(false), FakeAuth { ok: true });

    let record = monitor.check(&mux_descriptor("agy")).await;
    assert!(!record.healthy);
    assert_eq!(record.error.as_deref(), Some("multiplexer not running"));
}

#[tokio::test]
async fn multiplexer_up_but_not_authenticated() {
    let monitor = HealthMonitor::new(HealthCache::new(), FakePorts::new(true), FakeAuth { ok: false });

    let record = monitor.check(&mux_descriptor("agy")).await;
    assert!(!record.healthy);
    assert_eq!(record.error.as_deref(), Some("not authenticated"));
}

#[tokio::test]
async fn multiplexer_healthy() {
    let monitor = HealthMonitor::new(HealthCache::new(), FakePorts::new(true), FakeAuth { ok: true });

    let record = monitor.check(&mux_descriptor("agy")).await;
    assert!(record.healthy);
    assert!(record.error.is_none());
}

#[tokio::test]
async fn port_probe_is_shared_across_multiplexer_providers() {
    let ports = FakePorts::new(true);
    let probes = ports.probes.clone();
    let monitor = HealthMonitor::new(HealthCache::new(), ports, FakeAuth { ok: true });

    monitor.check(&mux_descriptor("agy")).await;
    monitor.check(&mux_descriptor("codex")).await;
    // Two providers, one shared port probe.
    assert_eq!(probes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cached_record_serves_repeat_checks() {
    let ports = FakePorts::new(true);
    let probes = ports.probes.clone();
    let monitor = HealthMonitor::new(HealthCache::new(), ports, FakeAuth { ok: true });

    let first = monitor.check(&mux_descriptor("agy")).await;
    let second = monitor.check(&mux_descriptor("agy")).await;
    assert_eq!(probes.load(Ordering::SeqCst), 1);
    assert_eq!(first.checked_at, second.checked_at);
}

#[tokio::test]
async fn invalidate_all_forces_a_fresh_port_probe() {
    let ports = FakePorts::new(true);
    let probes = ports.probes.clone();
    let monitor = HealthMonitor::new(HealthCache::new(), ports, FakeAuth { ok: true });

    monitor.check(&mux_descriptor("agy")).await;
    monitor.invalidate(None);
    monitor.check(&mux_descriptor("agy")).await;
    assert_eq!(probes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn expired_ttl_forces_a_fresh_probe() {
    let ports = FakePorts::new(true);
    let probes = ports.probes.clone();
    let monitor = HealthMonitor::new(
        HealthCache::with_ttl(Duration::from_millis(30)),
        ports,
        FakeAuth { ok: true },
    );

    monitor.check(&mux_descriptor("agy")).await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    monitor.check(&mux_descriptor("agy")).await;
    assert_eq!(probes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn http_error_status_becomes_unhealthy_record() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/models")
        .with_status(500)
        .create_async()
        .await;
    let monitor = HealthMonitor::new(HealthCache::new(), FakePorts::new(true), FakeAuth { ok: true });

    let record = monitor.check(&remote_descriptor("broken", &server.url())).await;
    assert!(!record.healthy);
    assert!(record.error.unwrap().contains("500"));
    assert!(record.latency_ms > 0.0);
}

#[tokio::test]
async fn http_success_becomes_healthy_record() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/models")
        .with_status(200)
        .with_body(r#"{"data":[]}"#)
        .create_async()
        .await;
    let monitor = HealthMonitor::new(HealthCache::new(), FakePorts::new(true), FakeAuth { ok: true });

    let record = monitor.check(&remote_descriptor("glm", &server.url())).await;
    assert!(record.healthy);
    assert!(record.error.is_none());
    assert!(record.latency_ms > 0.0);
}

#[tokio::test]
async fn probe_sends_the_descriptor_auth_header() {
    let mut server = mockito::Server::new_async().await;
    // Only a request carrying the bearer header matches; anything else
    // would come back 501 and fail the assertion below.
    let _mock = server
        .mock("GET", "/models")
        .match_header("authorization", "Bearer tok123")
        .with_status(200)
        .create_async()
        .await;
    let monitor = HealthMonitor::new(HealthCache::new(), FakePorts::new(true), FakeAuth { ok: true });

    let descriptor =
        remote_descriptor("glm", &server.url()).with_auth_token(Some("tok123".into()));
    let record = monitor.check(&descriptor).await;
    assert!(record.healthy);
}

#[tokio::test]
async fn connection_failure_is_data_not_a_panic() {
    let monitor = HealthMonitor::new(HealthCache::new(), FakePorts::new(true), FakeAuth { ok: true });

    // Port 9 (discard) is not listening.
    let record = monitor.check(&remote_descriptor("dead", "http://127.0.0.1:9")).await;
    assert!(!record.healthy);
    assert!(!record.error.unwrap().is_empty());
}

#[tokio::test]
async fn check_all_reports_every_provider_independently() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/models")
        .with_status(503)
        .create_async()
        .await;
    let monitor = HealthMonitor::new(HealthCache::new(), FakePorts::new(true), FakeAuth { ok: true });

    let descriptors = vec![
        mux_descriptor("agy"),
        remote_descriptor("degraded", &server.url()),
        remote_descriptor("dead", "http://127.0.0.1:9"),
    ];
    let records = monitor.check_all(&descriptors).await;

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].provider, "agy");
    assert!(records[0].healthy);
    assert!(records[1].error.as_ref().unwrap().contains("503"));
    // One dead provider never poisons the others.
    assert!(!records[2].healthy);
}
