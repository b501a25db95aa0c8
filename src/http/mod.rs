//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, proxy handler)
//!     → request.rs (request ID stamping)
//!     → [routing layer decides backend group]
//!     → [session filter offers affinity hint]
//!     → [load balancer picks server]
//!     → forward upstream, session filter observes the result
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::{HttpServer, ProxySnapshot};
