//! Backend pool management.
//!
//! # Responsibilities
//! - Manage collections of backends grouped by name
//! - Honor session affinity hints before applying an algorithm
//! - Apply load balancing algorithms to select backends

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::BackendConfig;
use crate::load_balancer::{backend::Backend, round_robin::RoundRobin, LoadBalancer};
use crate::session::EndpointAddress;

/// Manages backend pools and load balancing.
#[derive(Debug)]
pub struct BackendManager {
    /// Map of backend_group name -> (Backends, LoadBalancerAlgo).
    groups: HashMap<String, (Vec<Arc<Backend>>, Box<dyn LoadBalancer>)>,
}

impl BackendManager {
    /// Create a new backend manager from configuration.
    ///
    /// Addresses were validated at config-load time; anything unparseable
    /// here is skipped with a warning rather than aborting the swap.
    pub fn new(configs: &[BackendConfig]) -> Self {
        let mut grouped: HashMap<String, Vec<Arc<Backend>>> = HashMap::new();

        for config in configs {
            if let Ok(addr) = config.address.parse() {
                let backend = Arc::new(Backend::new(addr));
                grouped.entry(config.group.clone()).or_default().push(backend);
            } else {
                tracing::warn!(address = %config.address, "Invalid backend address");
            }
        }

        let mut groups = HashMap::new();
        for (name, backends) in grouped {
            let lb: Box<dyn LoadBalancer> = Box::new(RoundRobin::new());
            groups.insert(name, (backends, lb));
        }

        Self { groups }
    }

    /// Select a backend for the given group.
    ///
    /// When `hint` names a backend that is present in the group and healthy,
    /// that backend is returned and the rotation counter is left untouched.
    /// An unknown or unhealthy hint is ignored, not an error: the algorithm
    /// picks as usual and the caller re-pins the client afterwards.
    pub fn select(
        &self,
        group_name: &str,
        hint: Option<&EndpointAddress>,
    ) -> Option<Arc<Backend>> {
        let (backends, lb) = self.groups.get(group_name)?;

        if let Some(hint) = hint {
            if let Some(backend) = backends
                .iter()
                .find(|b| b.is_healthy() && b.endpoint() == *hint)
            {
                tracing::debug!(group = %group_name, endpoint = %hint, "Session hint honored");
                return Some(backend.clone());
            }
        }

        let selected = lb.next_server(backends);
        if selected.is_none() {
            tracing::debug!(
                group = %group_name,
                backend_count = backends.len(),
                "No healthy backends found in group"
            );
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> BackendManager {
        BackendManager::new(&[
            BackendConfig {
                name: "b1".into(),
                group: "web".into(),
                address: "127.0.0.1:50000".into(),
            },
            BackendConfig {
                name: "b2".into(),
                group: "web".into(),
                address: "127.0.0.1:50001".into(),
            },
        ])
    }

    #[test]
    fn test_hint_honored_when_present() {
        let manager = manager();
        let hint = EndpointAddress::new("127.0.0.1", 50001);

        for _ in 0..4 {
            let backend = manager.select("web", Some(&hint)).unwrap();
            assert_eq!(backend.endpoint(), hint);
        }
    }

    #[test]
    fn test_unknown_hint_falls_back_to_rotation() {
        let manager = manager();
        let hint = EndpointAddress::new("127.0.0.1", 50005);

        let first = manager.select("web", Some(&hint)).unwrap();
        let second = manager.select("web", Some(&hint)).unwrap();
        assert_ne!(first.addr, second.addr);
    }

    #[test]
    fn test_unhealthy_hint_ignored() {
        let manager = manager();
        let hint = EndpointAddress::new("127.0.0.1", 50001);

        let hinted = manager.select("web", Some(&hint)).unwrap();
        hinted.mark_failure(1);

        let backend = manager.select("web", Some(&hint)).unwrap();
        assert_ne!(backend.endpoint(), hint);
    }

    #[test]
    fn test_unknown_group() {
        assert!(manager().select("missing", None).is_none());
    }
}
