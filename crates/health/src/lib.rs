//! Health monitoring crate — cached reachability and authentication state
//! per resolved provider.
//!
//! [`HealthMonitor`] answers "is this provider usable right now" without
//! hammering upstreams: verdicts live in a TTL [`HealthCache`], and all
//! multiplexer-kind providers share one port-liveness sub-record since
//! they front the same local process. Liveness and OAuth state come in
//! through the [`PortInspector`] and [`AuthOracle`] seams so the monitor
//! itself stays free of process-table and token plumbing.

mod cache;
mod monitor;
mod probe;

pub use {
    cache::{HEALTH_TTL, HealthCache, HealthRecord, MultiplexerPortStatus},
    monitor::{HTTP_TIMEOUT, HealthMonitor},
    probe::{AuthOracle, PortInspector, ProcessInfo, TcpPortInspector},
};
