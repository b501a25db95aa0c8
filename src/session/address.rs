//! Endpoint address identity and the session token codec.
//!
//! # Responsibilities
//! - Represent a backend endpoint as an immutable `host:port` value
//! - Encode an endpoint into an opaque client-held token (base64)
//! - Decode a client-supplied token back into an endpoint, permissively
//!
//! # Design Decisions
//! - Decoding is total: malformed client input yields `None`, never an error.
//!   A client can send us arbitrary cookie bytes; none of them may fail the
//!   request.
//! - Equality is structural on the canonical `host:port` text.

use std::fmt;
use std::net::SocketAddr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Canonical identity of a backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointAddress {
    host: String,
    port: u16,
}

impl EndpointAddress {
    /// Create an endpoint address from host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse the canonical `host:port` form.
    ///
    /// Returns `None` for anything that does not look like `host:port`
    /// (empty host, missing separator, non-numeric port). Bracketed IPv6
    /// hosts are not accepted.
    pub fn parse(s: &str) -> Option<Self> {
        let (host, port) = s.rsplit_once(':')?;
        if host.is_empty() || host.contains(':') {
            return None;
        }
        let port: u16 = port.parse().ok()?;
        Some(Self {
            host: host.to_string(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl From<SocketAddr> for EndpointAddress {
    fn from(addr: SocketAddr) -> Self {
        Self {
            host: addr.ip().to_string(),
            port: addr.port(),
        }
    }
}

/// Encode an endpoint address into an opaque session token.
///
/// Standard-alphabet base64 with padding, over the UTF-8 bytes of the
/// canonical `host:port` text.
pub fn encode(addr: &EndpointAddress) -> String {
    BASE64.encode(addr.to_string().as_bytes())
}

/// Decode a session token back into an endpoint address.
///
/// Total over arbitrary input: invalid base64, non-UTF-8 payloads and
/// payloads that do not parse as `host:port` all yield `None`.
pub fn decode(token: &str) -> Option<EndpointAddress> {
    let bytes = BASE64.decode(token).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    EndpointAddress::parse(&text)
}
