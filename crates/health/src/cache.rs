//! TTL cache for health verdicts.
//!
//! One record per provider name, most-recent overwrites previous, plus a
//! single shared slot for multiplexer port liveness. The cache is an
//! explicitly owned object injected into [`crate::HealthMonitor`] — no
//! process-wide globals — which also makes the TTL testable. Interior
//! mutability is lock-guarded: checks may run from preemptive threads.

use compact_str::CompactString;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long a cached verdict stays valid.
pub const HEALTH_TTL: Duration = Duration::from_secs(30);

/// A cached health verdict for one provider.
#[derive(Debug, Clone)]
pub struct HealthRecord {
    /// Provider name.
    pub provider: CompactString,
    /// Whether the provider is reachable and authenticated.
    pub healthy: bool,
    /// Wall-clock time of the probe that produced this verdict.
    pub latency_ms: f64,
    /// What went wrong, when unhealthy.
    pub error: Option<String>,
    /// When the probe ran.
    pub checked_at: Instant,
}

impl HealthRecord {
    /// A healthy verdict.
    pub fn up(provider: impl Into<CompactString>, latency_ms: f64) -> Self {
        Self {
            provider: provider.into(),
            healthy: true,
            latency_ms,
            error: None,
            checked_at: Instant::now(),
        }
    }

    /// An unhealthy verdict carrying the failure as data — health check
    /// failures are never surfaced as errors.
    pub fn down(
        provider: impl Into<CompactString>,
        latency_ms: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            healthy: false,
            latency_ms,
            error: Some(error.into()),
            checked_at: Instant::now(),
        }
    }
}

/// Shared liveness sub-record for the local multiplexer port. A single
/// instance serves every multiplexer-kind provider.
#[derive(Debug, Clone, Copy)]
pub struct MultiplexerPortStatus {
    /// Whether the expected process holds the port.
    pub healthy: bool,
    /// When the port was probed.
    pub checked_at: Instant,
}

/// TTL cache keyed by provider name, with the shared port sub-record.
#[derive(Debug)]
pub struct HealthCache {
    ttl: Duration,
    records: Mutex<HashMap<CompactString, HealthRecord>>,
    port: Mutex<Option<MultiplexerPortStatus>>,
}

impl Default for HealthCache {
    fn default() -> Self {
        Self::with_ttl(HEALTH_TTL)
    }
}

impl HealthCache {
    /// Cache with the standard 30-second TTL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache with a custom TTL. Tests shrink this to avoid wall-clock
    /// waits.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            records: Mutex::new(HashMap::new()),
            port: Mutex::new(None),
        }
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A still-valid record for the provider. A record older than the TTL
    /// is never returned.
    pub fn get(&self, provider: &str) -> Option<HealthRecord> {
        let records = self.records.lock().expect("health cache lock poisoned");
        records
            .get(provider)
            .filter(|record| record.checked_at.elapsed() < self.ttl)
            .cloned()
    }

    /// Store a fresh record, overwriting any previous one.
    pub fn put(&self, record: HealthRecord) {
        let mut records = self.records.lock().expect("health cache lock poisoned");
        records.insert(record.provider.clone(), record);
    }

    /// The still-valid shared port status, if any.
    pub fn port_status(&self) -> Option<MultiplexerPortStatus> {
        let port = self.port.lock().expect("health cache lock poisoned");
        (*port).filter(|status| status.checked_at.elapsed() < self.ttl)
    }

    /// Record a fresh port probe result.
    pub fn set_port_status(&self, healthy: bool) {
        let mut port = self.port.lock().expect("health cache lock poisoned");
        *port = Some(MultiplexerPortStatus {
            healthy,
            checked_at: Instant::now(),
        });
    }

    /// Evict one provider's record, or — with no name — every record plus
    /// the shared port status.
    pub fn invalidate(&self, provider: Option<&str>) {
        match provider {
            Some(name) => {
                let mut records = self.records.lock().expect("health cache lock poisoned");
                records.remove(name);
            }
            None => {
                let mut records = self.records.lock().expect("health cache lock poisoned");
                records.clear();
                drop(records);
                let mut port = self.port.lock().expect("health cache lock poisoned");
                *port = None;
            }
        }
    }
}
