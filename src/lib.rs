//! Sticky-session reverse proxy library.
//!
//! A reverse proxy whose distinguishing feature is cookie-based session
//! affinity: a client sticks to a previously selected backend by
//! round-tripping an opaque base64 token through a cookie, overridable or
//! disableable per route.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod routing;
pub mod session;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
