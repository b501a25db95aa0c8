//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → backend_group identified
//!     → pool.rs (look up group, honor session hint if possible)
//!     → round_robin.rs (rotate through healthy backends)
//!     → Return selected backend or none
//! ```
//!
//! # Design Decisions
//! - A session affinity hint is checked before the algorithm runs, and is
//!   honored only when the hinted backend is present and healthy; otherwise
//!   selection silently falls back to normal rotation
//! - Unhealthy backends excluded from selection
//! - Algorithm chosen per backend group

pub mod backend;
pub mod pool;
pub mod round_robin;

use std::sync::Arc;

use crate::load_balancer::backend::Backend;

/// Selection algorithm applied within one backend group.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the next backend, or `None` when no healthy backend exists.
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>>;
}

pub use pool::BackendManager;
