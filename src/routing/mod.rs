//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, headers)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: matched Route (with its session payload) or NoMatch
//!
//! Route Compilation (at config accept):
//!     RouteConfig[]
//!     → Sort by priority
//!     → Compile matchers and session overrides
//!     → Freeze as immutable RequestRouter
//! ```
//!
//! # Design Decisions
//! - Routes compiled at config-accept time, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by priority)

pub mod matcher;
pub mod router;

pub use router::{RequestRouter, Route};
