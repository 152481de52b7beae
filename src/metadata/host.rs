//! Host resolution for full-context registration.
//!
//! An explicitly configured host always wins. Otherwise the outbound
//! interface address is discovered by "connecting" a UDP socket, which sends
//! no packets, and loopback is used as the last resort.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use tracing::{debug, warn};

/// Source of the externally reachable host of this instance
pub trait HostResolver: Send + Sync + std::fmt::Debug {
    fn resolve(&self) -> String;
}

/// Resolves the address of the interface used for outbound traffic
#[derive(Debug, Clone, Default)]
pub struct LocalHostResolver;

impl LocalHostResolver {
    const PROBE_ADDR: &'static str = "8.8.8.8:80";

    fn probe() -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(Self::PROBE_ADDR)?;
        Ok(socket.local_addr()?.ip())
    }
}

impl HostResolver for LocalHostResolver {
    fn resolve(&self) -> String {
        match Self::probe() {
            Ok(ip) if !ip.is_unspecified() => {
                debug!(host = %ip, "Resolved local host from outbound interface");
                ip.to_string()
            }
            Ok(_) => Ipv4Addr::LOCALHOST.to_string(),
            Err(e) => {
                warn!(error = %e, "Local host lookup failed, falling back to loopback");
                Ipv4Addr::LOCALHOST.to_string()
            }
        }
    }
}

/// Always returns the same host
#[derive(Debug, Clone)]
pub struct StaticHostResolver(pub String);

impl HostResolver for StaticHostResolver {
    fn resolve(&self) -> String {
        self.0.clone()
    }
}

/// Configured host when present, resolver otherwise
pub fn resolve_host(configured: Option<&str>, resolver: &dyn HostResolver) -> String {
    match configured {
        Some(host) if !host.trim().is_empty() => host.to_string(),
        _ => resolver.resolve(),
    }
}
