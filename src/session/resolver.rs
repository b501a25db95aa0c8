//! Per-request session configuration layering.
//!
//! # Responsibilities
//! - Combine the global session filter config with an optional per-route
//!   typed override into one effective decision
//!
//! # Design Decisions
//! - No field-level merging: a route override replaces the global strategy
//!   wholesale, and an explicit route disable beats everything.
//! - Strategies are constructed once at config-accept time; resolution per
//!   request only clones `Arc`s and cannot fail.

use std::sync::Arc;

use crate::session::strategy::SessionState;

/// Compiled per-route session payload.
///
/// Built from route configuration when a config snapshot is accepted, so
/// request-time resolution never touches the factory registry.
pub enum RouteSession {
    /// Route explicitly disables session affinity.
    Disabled,
    /// Route replaces the global strategy wholesale.
    Override(Arc<dyn SessionState>),
}

/// The resolved session decision governing one request.
pub enum EffectiveSession {
    /// No affinity for this request; the filter is a pass-through.
    Inactive,
    /// Affinity handled by this strategy.
    Active(Arc<dyn SessionState>),
}

impl EffectiveSession {
    pub fn is_active(&self) -> bool {
        matches!(self, EffectiveSession::Active(_))
    }
}

/// Resolve the effective session config for one request.
///
/// Precedence, highest first: route disable, route override, global config.
/// With neither layer present the filter is inactive.
pub fn resolve(
    global: Option<&Arc<dyn SessionState>>,
    route: Option<&RouteSession>,
) -> EffectiveSession {
    match route {
        Some(RouteSession::Disabled) => EffectiveSession::Inactive,
        Some(RouteSession::Override(state)) => EffectiveSession::Active(state.clone()),
        None => match global {
            Some(state) => EffectiveSession::Active(state.clone()),
            None => EffectiveSession::Inactive,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::cookie::{CookieBasedSessionState, CookieConfig};

    fn strategy(cookie_name: &str) -> Arc<dyn SessionState> {
        Arc::new(CookieBasedSessionState::new(CookieConfig {
            name: cookie_name.to_string(),
            path: "/".to_string(),
            ttl_seconds: 60,
        }))
    }

    #[test]
    fn test_route_disable_wins() {
        let global = strategy("global");
        let resolved = resolve(Some(&global), Some(&RouteSession::Disabled));
        assert!(!resolved.is_active());
    }

    #[test]
    fn test_route_override_replaces_global() {
        use axum::http::HeaderMap;
        use crate::session::address::{encode, EndpointAddress};

        let global = strategy("global-session-cookie");
        let route = RouteSession::Override(strategy("route-session-cookie"));
        let resolved = resolve(Some(&global), Some(&route));

        // The resolved strategy must answer to the route cookie only.
        let EffectiveSession::Active(state) = resolved else {
            panic!("expected active session");
        };
        let addr = EndpointAddress::new("127.0.0.1", 50001);
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            format!("global-session-cookie=\"{}\"", encode(&addr))
                .parse()
                .unwrap(),
        );
        assert_eq!(state.parse_selection(&headers), None);
    }

    #[test]
    fn test_global_used_without_route_layer() {
        let global = strategy("global");
        assert!(resolve(Some(&global), None).is_active());
    }

    #[test]
    fn test_inactive_without_any_layer() {
        assert!(!resolve(None, None).is_active());
    }
}
