//! Collaborator seams for multiplexer liveness and OAuth state.
//!
//! Both are synchronous: the auth oracle reads locally cached OAuth
//! state, and the port inspector answers from the local machine.

use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;

/// A process occupying a local port.
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    /// Process id, `0` when unknown.
    pub pid: u32,
    /// Process command line, empty when unknown.
    pub command: String,
}

/// Answers which process, if any, holds a local port.
pub trait PortInspector: Send + Sync {
    /// The process listening on `port`, or `None` when the port is free.
    fn process_on_port(&self, port: u16) -> Option<ProcessInfo>;

    /// Whether the process is the multiplexer we expect.
    fn is_expected(&self, info: &ProcessInfo) -> bool;
}

/// Reads per-provider authentication state from locally cached OAuth
/// material. No network I/O.
pub trait AuthOracle: Send + Sync {
    /// Whether the named provider currently has valid credentials.
    fn authenticated(&self, provider: &str) -> bool;
}

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Port inspector that probes by TCP connect. It cannot identify the
/// owning process, so any listener is reported with an empty
/// [`ProcessInfo`] and trusted to be the multiplexer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpPortInspector;

impl PortInspector for TcpPortInspector {
    fn process_on_port(&self, port: u16) -> Option<ProcessInfo> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
            .ok()
            .map(|_| ProcessInfo {
                pid: 0,
                command: String::new(),
            })
    }

    fn is_expected(&self, _info: &ProcessInfo) -> bool {
        true
    }
}
