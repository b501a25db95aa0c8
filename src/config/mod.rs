//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks + session strategy construction)
//!     → ProxyConfig (validated, immutable)
//!     → compiled into a snapshot shared via ArcSwap
//!
//! On reload signal:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the compiled snapshot
//!     → new requests observe the new config; in-flight requests keep theirs
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Session strategy names and payloads are resolved at load time, so a
//!   bad strategy config can never surface on the request path

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BackendConfig, ListenerConfig, ProxyConfig, RouteConfig, RouteSessionOverride,
    SessionFilterConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
