//! Per-request session affinity orchestration.
//!
//! # Data Flow
//! ```text
//! request headers arrive
//!     → RequestSession::begin (resolve effective config, parse prior selection)
//!     → hint() handed to the load balancer as a non-binding preference
//!     → [selection happens elsewhere]
//!     → finish() observes the endpoint actually used, may set a cookie
//! ```
//!
//! # Design Decisions
//! - `begin` runs `parse_selection` at most once; `finish` consumes the
//!   session so `on_host_selected` cannot run twice.
//! - Nothing here can fail the request: an inactive resolution is a
//!   pass-through, a bad token is treated as no prior session, and an
//!   aborted stream simply never reaches `finish`.

use axum::http::HeaderMap;
use std::sync::Arc;

use crate::session::address::EndpointAddress;
use crate::session::resolver::EffectiveSession;
use crate::session::strategy::SessionState;

/// Short-lived session state owned by a single request.
///
/// Created at request-header time, consulted at backend-selection time,
/// consumed at response-header time. Never shared across requests.
pub struct RequestSession {
    state: Option<Arc<dyn SessionState>>,
    hint: Option<EndpointAddress>,
}

impl RequestSession {
    /// Start session handling for one request.
    ///
    /// For an active resolution this decodes the client's prior selection
    /// from the request headers; for an inactive one every later step is a
    /// no-op.
    pub fn begin(effective: EffectiveSession, headers: &HeaderMap) -> Self {
        match effective {
            EffectiveSession::Inactive => Self {
                state: None,
                hint: None,
            },
            EffectiveSession::Active(state) => {
                let hint = state.parse_selection(headers);
                Self {
                    state: Some(state),
                    hint,
                }
            }
        }
    }

    /// The decoded prior selection, offered to the load balancer as a
    /// preferred endpoint. Non-binding: the balancer may ignore it.
    pub fn hint(&self) -> Option<&EndpointAddress> {
        self.hint.as_ref()
    }

    /// Observe the endpoint actually used and mutate response headers if
    /// the client needs re-pinning. Consumes the session.
    pub fn finish(self, headers: &mut HeaderMap, chosen: &EndpointAddress) {
        if let Some(state) = self.state {
            state.on_host_selected(headers, chosen, self.hint.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::address::encode;
    use crate::session::cookie::{CookieBasedSessionState, CookieConfig};
    use axum::http::header;

    fn active() -> EffectiveSession {
        EffectiveSession::Active(Arc::new(CookieBasedSessionState::new(CookieConfig {
            name: "session".to_string(),
            path: "/".to_string(),
            ttl_seconds: 60,
        })))
    }

    fn headers_with_cookie(addr: &EndpointAddress) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("session=\"{}\"", encode(addr)).parse().unwrap(),
        );
        headers
    }

    #[test]
    fn test_inactive_is_a_pass_through() {
        let addr = EndpointAddress::new("127.0.0.1", 50001);
        let session = RequestSession::begin(EffectiveSession::Inactive, &headers_with_cookie(&addr));
        assert!(session.hint().is_none());

        let mut response_headers = HeaderMap::new();
        session.finish(&mut response_headers, &addr);
        assert!(response_headers.is_empty());
    }

    #[test]
    fn test_hint_decoded_from_request() {
        let addr = EndpointAddress::new("127.0.0.1", 50001);
        let session = RequestSession::begin(active(), &headers_with_cookie(&addr));
        assert_eq!(session.hint(), Some(&addr));
    }

    #[test]
    fn test_no_mutation_when_hint_honored() {
        let addr = EndpointAddress::new("127.0.0.1", 50001);
        let session = RequestSession::begin(active(), &headers_with_cookie(&addr));

        let mut response_headers = HeaderMap::new();
        session.finish(&mut response_headers, &addr);
        assert!(response_headers.get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn test_re_pin_when_selection_differs() {
        let hinted = EndpointAddress::new("127.0.0.1", 50005);
        let chosen = EndpointAddress::new("127.0.0.1", 50002);
        let session = RequestSession::begin(active(), &headers_with_cookie(&hinted));

        let mut response_headers = HeaderMap::new();
        session.finish(&mut response_headers, &chosen);

        let cookie = response_headers
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.contains(&encode(&chosen)));
    }

    #[test]
    fn test_fresh_client_gets_pinned() {
        let chosen = EndpointAddress::new("127.0.0.1", 50000);
        let session = RequestSession::begin(active(), &HeaderMap::new());
        assert!(session.hint().is_none());

        let mut response_headers = HeaderMap::new();
        session.finish(&mut response_headers, &chosen);
        assert!(response_headers.contains_key(header::SET_COOKIE));
    }
}
