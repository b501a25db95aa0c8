//! Session affinity subsystem ("stateful session").
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → resolver.rs (layer global + per-route config, once per request)
//!     → filter.rs (RequestSession::begin, parse prior selection)
//!     → strategy.rs / cookie.rs (read affinity cookie)
//!     → address.rs (decode base64 token → host:port)
//!     → hint handed to load balancer
//!
//! Outgoing response
//!     → filter.rs (RequestSession::finish with the endpoint actually used)
//!     → cookie.rs (emit Set-Cookie only when the selection changed)
//! ```
//!
//! # Design Decisions
//! - Strategies are pluggable trait objects behind a name-keyed registry
//! - Malformed client tokens degrade to "no prior session", never errors
//! - Route-level config replaces the global config wholesale (no merging)
//! - One-shot per request: parse before selection, observe after, at most
//!   once each

pub mod address;
pub mod cookie;
pub mod filter;
pub mod resolver;
pub mod strategy;

pub use address::EndpointAddress;
pub use filter::RequestSession;
pub use resolver::{resolve, EffectiveSession, RouteSession};
pub use strategy::{SessionState, SessionStateFactory, SessionStateRegistry, StrategyError};
