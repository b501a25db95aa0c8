//! Cookie-based session state strategy.
//!
//! # Responsibilities
//! - Read a prior endpoint selection from the configured request cookie
//! - Pin the client to the endpoint actually used by emitting `Set-Cookie`
//!
//! # Wire format
//! ```text
//! <name>="<base64(host:port)>"; Path=<path>; Max-Age=<ttl-seconds>; HttpOnly
//! ```
//!
//! # Design Decisions
//! - No `Set-Cookie` when the used endpoint matches the prior selection:
//!   the client already holds a correct token and its expiry is not
//!   refreshed on every response.
//! - HttpOnly is always set; the token is never script-readable.

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::session::address::{self, EndpointAddress};
use crate::session::strategy::{SessionState, SessionStateFactory, StrategyError};

fn default_path() -> String {
    "/".to_string()
}

/// Cookie attributes, sourced from configuration. Never mutated per-request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CookieConfig {
    /// Cookie name carrying the session token.
    pub name: String,

    /// Cookie path attribute.
    #[serde(default = "default_path")]
    pub path: String,

    /// Cookie lifetime, emitted as Max-Age.
    pub ttl_seconds: u64,
}

/// Session state backed by a single affinity cookie.
#[derive(Debug)]
pub struct CookieBasedSessionState {
    config: CookieConfig,
}

impl CookieBasedSessionState {
    pub fn new(config: CookieConfig) -> Self {
        Self { config }
    }

    /// Find the configured cookie among the request's `Cookie` headers.
    ///
    /// Scans every `Cookie` header line, `;`-separated; first match wins.
    /// The value may be double-quoted.
    fn cookie_value<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        for line in headers.get_all(header::COOKIE) {
            let Ok(line) = line.to_str() else {
                continue;
            };
            for pair in line.split(';') {
                let Some((name, value)) = pair.split_once('=') else {
                    continue;
                };
                if name.trim() == self.config.name {
                    return Some(value.trim().trim_matches('"'));
                }
            }
        }
        None
    }
}

impl SessionState for CookieBasedSessionState {
    fn parse_selection(&self, headers: &HeaderMap) -> Option<EndpointAddress> {
        self.cookie_value(headers).and_then(address::decode)
    }

    fn on_host_selected(
        &self,
        headers: &mut HeaderMap,
        chosen: &EndpointAddress,
        prior: Option<&EndpointAddress>,
    ) {
        if prior == Some(chosen) {
            // Client already holds a token for the endpoint actually used.
            return;
        }

        let cookie = format!(
            "{}=\"{}\"; Path={}; Max-Age={}; HttpOnly",
            self.config.name,
            address::encode(chosen),
            self.config.path,
            self.config.ttl_seconds,
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(header::SET_COOKIE, value);
        }
    }
}

/// Factory for the built-in `cookie` strategy.
pub struct CookieSessionFactory;

impl SessionStateFactory for CookieSessionFactory {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn create(&self, payload: &toml::Value) -> Result<Arc<dyn SessionState>, StrategyError> {
        let config: CookieConfig =
            payload
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| StrategyError::InvalidConfig {
                    strategy: self.name(),
                    message: e.to_string(),
                })?;

        if config.name.is_empty() {
            return Err(StrategyError::InvalidConfig {
                strategy: self.name(),
                message: "cookie name must not be empty".to_string(),
            });
        }
        if HeaderValue::from_str(&format!("{}=x; Path={}", config.name, config.path)).is_err() {
            return Err(StrategyError::InvalidConfig {
                strategy: self.name(),
                message: "cookie name or path contains invalid header characters".to_string(),
            });
        }
        if config.ttl_seconds == 0 {
            return Err(StrategyError::InvalidConfig {
                strategy: self.name(),
                message: "ttl_seconds must be greater than zero".to_string(),
            });
        }

        Ok(Arc::new(CookieBasedSessionState::new(config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::address::encode;

    fn state(name: &str) -> CookieBasedSessionState {
        CookieBasedSessionState::new(CookieConfig {
            name: name.to_string(),
            path: "/path".to_string(),
            ttl_seconds: 120,
        })
    }

    fn request_headers(cookie_line: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie_line).unwrap());
        headers
    }

    #[test]
    fn test_parse_quoted_cookie() {
        let addr = EndpointAddress::new("127.0.0.1", 50001);
        let headers = request_headers(&format!("session=\"{}\"", encode(&addr)));
        assert_eq!(state("session").parse_selection(&headers), Some(addr));
    }

    #[test]
    fn test_parse_unquoted_cookie_among_others() {
        let addr = EndpointAddress::new("127.0.0.1", 50002);
        let headers = request_headers(&format!("theme=dark; session={}; lang=en", encode(&addr)));
        assert_eq!(state("session").parse_selection(&headers), Some(addr));
    }

    #[test]
    fn test_parse_missing_or_foreign_cookie() {
        let addr = EndpointAddress::new("127.0.0.1", 50001);
        let headers = request_headers(&format!("other-cookie=\"{}\"", encode(&addr)));
        assert_eq!(state("session").parse_selection(&headers), None);
        assert_eq!(state("session").parse_selection(&HeaderMap::new()), None);
    }

    #[test]
    fn test_parse_garbage_token_degrades_to_none() {
        let headers = request_headers("session=\"!!not-a-token!!\"");
        assert_eq!(state("session").parse_selection(&headers), None);
    }

    #[test]
    fn test_set_cookie_on_mismatch() {
        let chosen = EndpointAddress::new("127.0.0.1", 50003);
        let prior = EndpointAddress::new("127.0.0.1", 50001);

        let mut headers = HeaderMap::new();
        state("session").on_host_selected(&mut headers, &chosen, Some(&prior));

        let value = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert_eq!(
            value,
            format!(
                "session=\"{}\"; Path=/path; Max-Age=120; HttpOnly",
                encode(&chosen)
            )
        );
    }

    #[test]
    fn test_set_cookie_when_no_prior_session() {
        let chosen = EndpointAddress::new("127.0.0.1", 50000);

        let mut headers = HeaderMap::new();
        state("session").on_host_selected(&mut headers, &chosen, None);

        assert!(headers.contains_key(header::SET_COOKIE));
    }

    #[test]
    fn test_no_set_cookie_when_endpoint_unchanged() {
        let chosen = EndpointAddress::new("127.0.0.1", 50001);

        let mut headers = HeaderMap::new();
        state("session").on_host_selected(&mut headers, &chosen, Some(&chosen));

        assert!(headers.get(header::SET_COOKIE).is_none());
    }
}
