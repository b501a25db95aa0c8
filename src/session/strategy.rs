//! Session state strategy interface and factory registry.
//!
//! # Responsibilities
//! - Define the two-operation strategy interface every session state
//!   implementation must provide
//! - Map configuration-supplied strategy names to constructors
//!
//! # Design Decisions
//! - Strategies are trait objects: the request pipeline never names a
//!   concrete strategy type, so new strategies (header-based, etc.) only
//!   need a factory registration.
//! - Factories consume the raw TOML payload of the `config` table and
//!   deserialize it themselves; a bad payload is a load-time error, never
//!   a request-time one.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use thiserror::Error;

use crate::session::address::EndpointAddress;
use crate::session::cookie::CookieSessionFactory;

/// A pluggable session affinity strategy.
///
/// Both operations are infallible by contract: malformed client state
/// degrades to "no prior session" and header mutation is best-effort.
pub trait SessionState: Send + Sync + std::fmt::Debug {
    /// Inspect request headers for a prior endpoint selection.
    ///
    /// Called at most once per request, strictly before backend selection.
    fn parse_selection(&self, headers: &HeaderMap) -> Option<EndpointAddress>;

    /// Observe the endpoint actually used for the request.
    ///
    /// Called at most once per request, after selection is final and before
    /// response headers are sent downstream. `prior` is the value returned
    /// by `parse_selection` for the same request. Implementations may mutate
    /// outgoing response headers.
    fn on_host_selected(
        &self,
        headers: &mut HeaderMap,
        chosen: &EndpointAddress,
        prior: Option<&EndpointAddress>,
    );
}

/// Error constructing a strategy from configuration.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("unknown session strategy `{0}`")]
    UnknownStrategy(String),

    #[error("invalid `{strategy}` strategy config: {message}")]
    InvalidConfig {
        strategy: &'static str,
        message: String,
    },
}

/// Constructs a [`SessionState`] from its configuration payload.
pub trait SessionStateFactory: Send + Sync {
    /// Configuration-facing strategy name.
    fn name(&self) -> &'static str;

    /// Build a strategy instance from the raw `config` payload.
    fn create(&self, payload: &toml::Value) -> Result<Arc<dyn SessionState>, StrategyError>;
}

/// Name-keyed registry of session strategy factories.
pub struct SessionStateRegistry {
    factories: HashMap<&'static str, Arc<dyn SessionStateFactory>>,
}

impl SessionStateRegistry {
    /// Empty registry with no strategies registered.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the built-in `cookie` strategy registered.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CookieSessionFactory));
        registry
    }

    /// Register a factory under its own name. Later registrations replace
    /// earlier ones with the same name.
    pub fn register(&mut self, factory: Arc<dyn SessionStateFactory>) {
        self.factories.insert(factory.name(), factory);
    }

    /// Construct a strategy by name.
    pub fn create(
        &self,
        name: &str,
        payload: &toml::Value,
    ) -> Result<Arc<dyn SessionState>, StrategyError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| StrategyError::UnknownStrategy(name.to_string()))?;
        factory.create(payload)
    }
}

impl Default for SessionStateRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie_payload() -> toml::Value {
        toml::toml! {
            name = "session"
            path = "/"
            ttl_seconds = 60
        }
        .into()
    }

    #[test]
    fn test_builtin_cookie_strategy() {
        let registry = SessionStateRegistry::with_builtin();
        assert!(registry.create("cookie", &cookie_payload()).is_ok());
    }

    #[test]
    fn test_unknown_strategy() {
        let registry = SessionStateRegistry::with_builtin();
        let err = registry.create("header", &cookie_payload()).unwrap_err();
        assert!(matches!(err, StrategyError::UnknownStrategy(name) if name == "header"));
    }

    #[test]
    fn test_malformed_payload_is_a_load_time_error() {
        let registry = SessionStateRegistry::with_builtin();
        let payload: toml::Value = toml::toml! { ttl_seconds = "not a number" }.into();
        assert!(registry.create("cookie", &payload).is_err());
    }
}
