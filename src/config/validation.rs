//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing backend groups)
//! - Construct session strategies so bad names/payloads fail at load time
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function over the config and the strategy registry
//! - Runs before a config is accepted into the system; the request path
//!   assumes validated configuration

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{ProxyConfig, RouteSessionOverride};
use crate::session::{SessionStateRegistry, StrategyError};

/// A single semantic configuration error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("route `{route}` references unknown backend group `{group}`")]
    UnknownBackendGroup { route: String, group: String },

    #[error("backend `{name}` has invalid address `{address}`")]
    InvalidBackendAddress { name: String, address: String },

    #[error("session filter: {0}")]
    Session(StrategyError),

    #[error("route `{route}` session override: {error}")]
    RouteSession {
        route: String,
        error: StrategyError,
    },

    #[error("route `{route}` sets `disabled = false`; omit the override instead")]
    DisabledFlagFalse { route: String },
}

/// Validate a configuration against the strategy registry.
///
/// Collects every error rather than stopping at the first.
pub fn validate_config(
    config: &ProxyConfig,
    registry: &SessionStateRegistry,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut groups = HashSet::new();
    for backend in &config.backends {
        if backend.address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidBackendAddress {
                name: backend.name.clone(),
                address: backend.address.clone(),
            });
        }
        groups.insert(backend.group.as_str());
    }

    if let Some(session) = &config.session {
        if let Err(e) = registry.create(&session.strategy, &session.config) {
            errors.push(ValidationError::Session(e));
        }
    }

    for route in &config.routes {
        if !groups.contains(route.backend_group.as_str()) {
            errors.push(ValidationError::UnknownBackendGroup {
                route: route.name.clone(),
                group: route.backend_group.clone(),
            });
        }

        match &route.session {
            Some(RouteSessionOverride::Disable { disabled: false }) => {
                errors.push(ValidationError::DisabledFlagFalse {
                    route: route.name.clone(),
                });
            }
            Some(RouteSessionOverride::Replace(filter)) => {
                if let Err(e) = registry.create(&filter.strategy, &filter.config) {
                    errors.push(ValidationError::RouteSession {
                        route: route.name.clone(),
                        error: e,
                    });
                }
            }
            _ => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
