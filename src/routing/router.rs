//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for request
//! - Carry each route's typed session payload to the request pipeline
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Session overrides are compiled to strategy instances here, once,
//!   so the per-request path never touches the factory registry
//! - First match wins (ordered by priority, descending)
//! - Explicit no-match rather than silent default

use axum::body::Body;
use axum::http::Request;

use crate::config::schema::{RouteConfig, RouteSessionOverride};
use crate::config::validation::ValidationError;
use crate::routing::matcher::{AndMatcher, HostMatcher, Matcher, PathPrefixMatcher};
use crate::session::{RouteSession, SessionStateRegistry};

/// A compiled route.
pub struct Route {
    /// Route identifier for logging/metrics.
    pub name: String,
    /// Backend group requests are forwarded to.
    pub backend_group: String,
    /// Compiled per-route session payload, if the route carries one.
    pub session: Option<RouteSession>,
    matcher: AndMatcher,
    priority: u32,
}

/// Priority-ordered route table, immutable after compilation.
pub struct RequestRouter {
    routes: Vec<Route>,
}

impl RequestRouter {
    /// Compile routes from configuration.
    ///
    /// Session overrides are resolved against the registry here; a bad
    /// override fails compilation, keeping strategy errors at load time.
    pub fn compile(
        configs: &[RouteConfig],
        registry: &SessionStateRegistry,
    ) -> Result<Self, ValidationError> {
        let mut routes = Vec::with_capacity(configs.len());

        for config in configs {
            let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
            if let Some(host) = &config.host {
                matchers.push(Box::new(HostMatcher::new(host)));
            }
            if let Some(prefix) = &config.path_prefix {
                matchers.push(Box::new(PathPrefixMatcher::new(prefix)));
            }

            let session = match &config.session {
                None => None,
                Some(RouteSessionOverride::Disable { disabled: true }) => {
                    Some(RouteSession::Disabled)
                }
                Some(RouteSessionOverride::Disable { disabled: false }) => {
                    return Err(ValidationError::DisabledFlagFalse {
                        route: config.name.clone(),
                    });
                }
                Some(RouteSessionOverride::Replace(filter)) => {
                    let state = registry
                        .create(&filter.strategy, &filter.config)
                        .map_err(|error| ValidationError::RouteSession {
                            route: config.name.clone(),
                            error,
                        })?;
                    Some(RouteSession::Override(state))
                }
            };

            routes.push(Route {
                name: config.name.clone(),
                backend_group: config.backend_group.clone(),
                session,
                matcher: AndMatcher::new(matchers),
                priority: config.priority,
            });
        }

        routes.sort_by(|a, b| b.priority.cmp(&a.priority));

        Ok(Self { routes })
    }

    /// Find the first route matching the request.
    pub fn match_request(&self, req: &Request<Body>) -> Option<&Route> {
        self.routes.iter().find(|route| route.matcher.matches(req))
    }
}
