//! Health checks with TTL caching and kind-dispatched probes.

use crate::cache::{HealthCache, HealthRecord};
use crate::probe::{AuthOracle, PortInspector};
use futures_util::future::join_all;
use provider::{MULTIPLEXER_PORT, ProviderDescriptor, ProviderKind};
use std::time::{Duration, Instant};

/// Per-request timeout on remote HTTP health checks. The only
/// cancellation primitive — there is no caller-initiated cancellation of
/// an in-flight check.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Determines live or cached reachability and authentication state for
/// resolved providers.
///
/// The cache is injected at construction and owned here; its lifecycle is
/// the monitor's. A check never returns an error — every failure becomes
/// a `healthy: false` record with a populated `error` string, so one bad
/// provider can never prevent checking another.
pub struct HealthMonitor<P, A> {
    cache: HealthCache,
    ports: P,
    auth: A,
    client: reqwest::Client,
}

impl<P: PortInspector, A: AuthOracle> HealthMonitor<P, A> {
    /// Create a monitor over the given cache and collaborators.
    pub fn new(cache: HealthCache, ports: P, auth: A) -> Self {
        Self {
            cache,
            ports,
            auth,
            client: reqwest::Client::new(),
        }
    }

    /// Check one provider, serving from cache within the TTL.
    pub async fn check(&self, descriptor: &ProviderDescriptor) -> HealthRecord {
        if let Some(record) = self.cache.get(&descriptor.name) {
            tracing::debug!(provider = %descriptor.name, "health cache hit");
            return record;
        }

        let record = match descriptor.kind {
            ProviderKind::Multiplexer => self.check_multiplexer(descriptor),
            ProviderKind::CredentialProfile | ProviderKind::RemoteApi => {
                self.check_endpoint(descriptor).await
            }
        };
        tracing::debug!(
            provider = %record.provider,
            healthy = record.healthy,
            "health check complete"
        );
        self.cache.put(record.clone());
        record
    }

    /// Check many providers concurrently — fire all, await all. No
    /// ordering guarantee between completions; results line up with the
    /// input slice.
    pub async fn check_all(&self, descriptors: &[ProviderDescriptor]) -> Vec<HealthRecord> {
        join_all(descriptors.iter().map(|descriptor| self.check(descriptor))).await
    }

    /// Evict one provider's cached record, or — with no name — every
    /// record plus the shared multiplexer port status.
    pub fn invalidate(&self, provider: Option<&str>) {
        self.cache.invalidate(provider);
    }

    /// Healthy only when the multiplexer process holds its port AND the
    /// provider is authenticated. The port verdict is shared across all
    /// multiplexer-kind providers under the same TTL. Latency covers the
    /// port probe only — zero when the shared status was still fresh.
    fn check_multiplexer(&self, descriptor: &ProviderDescriptor) -> HealthRecord {
        let (port_ok, latency_ms) = match self.cache.port_status() {
            Some(status) => (status.healthy, 0.0),
            None => {
                let start = Instant::now();
                let up = self
                    .ports
                    .process_on_port(MULTIPLEXER_PORT)
                    .is_some_and(|info| self.ports.is_expected(&info));
                let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
                self.cache.set_port_status(up);
                (up, latency_ms)
            }
        };

        if !port_ok {
            return HealthRecord::down(descriptor.name.clone(), latency_ms, "multiplexer not running");
        }
        if !self.auth.authenticated(&descriptor.name) {
            return HealthRecord::down(descriptor.name.clone(), latency_ms, "not authenticated");
        }
        HealthRecord::up(descriptor.name.clone(), latency_ms)
    }

    /// Probe `GET {base_url}/models` with the descriptor's adapter
    /// headers. 2xx is healthy; anything else — including a timeout — is
    /// an unhealthy record, never an error.
    async fn check_endpoint(&self, descriptor: &ProviderDescriptor) -> HealthRecord {
        let start = Instant::now();
        let outcome = self.probe_endpoint(descriptor).await;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(status) if status.is_success() => {
                HealthRecord::up(descriptor.name.clone(), latency_ms)
            }
            Ok(status) => HealthRecord::down(
                descriptor.name.clone(),
                latency_ms,
                format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("unknown")
                ),
            ),
            Err(err) => HealthRecord::down(descriptor.name.clone(), latency_ms, err.to_string()),
        }
    }

    async fn probe_endpoint(
        &self,
        descriptor: &ProviderDescriptor,
    ) -> anyhow::Result<reqwest::StatusCode> {
        let url = format!(
            "{}/models",
            descriptor.base_url.as_str().trim_end_matches('/')
        );
        let headers = descriptor.adapter.headers(descriptor)?;
        let response = self
            .client
            .get(&url)
            .headers(headers)
            .timeout(HTTP_TIMEOUT)
            .send()
            .await?;
        Ok(response.status())
    }
}
