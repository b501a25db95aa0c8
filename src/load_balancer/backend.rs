//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Track health state (Healthy/Unhealthy) from passive observations
//! - Expose the canonical endpoint identity used by session affinity

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use url::Url;

use crate::session::EndpointAddress;

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// The address of the backend.
    pub addr: SocketAddr,
    /// Pre-calculated base URL for request rewriting.
    pub base_url: Url,

    /// Current health state (0=Unknown, 1=Healthy, 2=Unhealthy).
    pub state: AtomicU8,
    /// Consecutive failure count.
    pub consecutive_failures: AtomicUsize,
    /// Consecutive success count.
    pub consecutive_successes: AtomicUsize,
}

impl Backend {
    /// Create a new backend.
    pub fn new(addr: SocketAddr) -> Self {
        // Constructed from an already-validated SocketAddr, so the URL
        // cannot fail to parse.
        let base_url = Url::parse(&format!("http://{}", addr)).expect("socket addr forms a URL");
        Self {
            addr,
            base_url,
            state: AtomicU8::new(HealthState::Unknown as u8),
            consecutive_failures: AtomicUsize::new(0),
            consecutive_successes: AtomicUsize::new(0),
        }
    }

    /// Canonical endpoint identity, as round-tripped through session tokens.
    pub fn endpoint(&self) -> EndpointAddress {
        EndpointAddress::from(self.addr)
    }

    /// Return true if backend is considered healthy (Healthy or Unknown).
    pub fn is_healthy(&self) -> bool {
        self.state.load(Ordering::Relaxed) != (HealthState::Unhealthy as u8)
    }

    /// Report a successful request.
    pub fn mark_success(&self, healthy_threshold: usize) {
        self.consecutive_failures.store(0, Ordering::Relaxed);

        if self.state.load(Ordering::Relaxed) == (HealthState::Healthy as u8) {
            return;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= healthy_threshold {
            self.state.store(HealthState::Healthy as u8, Ordering::Relaxed);
        }
    }

    /// Report a failed request.
    pub fn mark_failure(&self, unhealthy_threshold: usize) {
        self.consecutive_successes.store(0, Ordering::Relaxed);

        if self.state.load(Ordering::Relaxed) == (HealthState::Unhealthy as u8) {
            return;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= unhealthy_threshold {
            self.state.store(HealthState::Unhealthy as u8, Ordering::Relaxed);
            tracing::warn!(addr = %self.addr, "Backend marked unhealthy");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_identity() {
        let backend = Backend::new("127.0.0.1:50001".parse().unwrap());
        assert_eq!(backend.endpoint().to_string(), "127.0.0.1:50001");
        // The rewrite authority comes from the prebuilt URL and must agree
        // with the endpoint identity round-tripped through session tokens.
        assert_eq!(backend.base_url.authority(), "127.0.0.1:50001");
    }

    #[test]
    fn test_health_transitions() {
        let backend = Backend::new("127.0.0.1:50001".parse().unwrap());
        assert!(backend.is_healthy()); // Unknown counts as healthy

        backend.mark_failure(2);
        assert!(backend.is_healthy());
        backend.mark_failure(2);
        assert!(!backend.is_healthy());

        backend.mark_success(2);
        assert!(!backend.is_healthy());
        backend.mark_success(2);
        assert!(backend.is_healthy());
    }
}
