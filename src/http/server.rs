//! HTTP server setup and proxy handler.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Dispatch requests to the routing engine
//! - Run the session affinity filter around backend selection
//! - Forward requests to upstream backends
//! - Swap configuration snapshots atomically on reload
//!
//! # Request lifecycle
//! ```text
//! request headers → snapshot.load (one atomic config view per request)
//!     → route match → RequestSession::begin (parse affinity cookie)
//!     → backend select (hint offered, non-binding)
//!     → forward upstream
//!     → RequestSession::finish on response headers (re-pin if needed)
//! ```
//! An aborted or failed upstream exchange never reaches `finish`, so no
//! partial affinity cookie is ever emitted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::uri::{Authority, Scheme},
    http::{header, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::str::FromStr;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::HealthConfig;
use crate::config::{ConfigError, ProxyConfig, ValidationError};
use crate::http::request::{RequestIdLayer, X_REQUEST_ID};
use crate::load_balancer::BackendManager;
use crate::observability::metrics;
use crate::routing::RequestRouter;
use crate::session::{
    resolve, RequestSession, SessionState, SessionStateRegistry,
};

/// One immutable, compiled view of the configuration.
///
/// Requests load the snapshot once at request-header time and keep it for
/// their whole lifetime; reloads swap in a new snapshot without touching
/// in-flight requests.
pub struct ProxySnapshot {
    pub router: RequestRouter,
    pub backends: BackendManager,
    /// Global session strategy, prebuilt from the filter config.
    pub session: Option<Arc<dyn SessionState>>,
    pub health: HealthConfig,
}

impl ProxySnapshot {
    /// Compile a validated configuration into runtime form.
    pub fn compile(
        config: &ProxyConfig,
        registry: &SessionStateRegistry,
    ) -> Result<Self, ValidationError> {
        let router = RequestRouter::compile(&config.routes, registry)?;
        let backends = BackendManager::new(&config.backends);
        let session = config
            .session
            .as_ref()
            .map(|filter| registry.create(&filter.strategy, &filter.config))
            .transpose()
            .map_err(ValidationError::Session)?;

        Ok(Self {
            router,
            backends,
            session,
            health: config.health.clone(),
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<ArcSwap<ProxySnapshot>>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    app: Router,
    snapshot: Arc<ArcSwap<ProxySnapshot>>,
    registry: Arc<SessionStateRegistry>,
}

impl HttpServer {
    /// Create a new HTTP server with the built-in strategy registry.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        Self::with_registry(config, Arc::new(SessionStateRegistry::with_builtin()))
    }

    /// Create a new HTTP server with a caller-supplied strategy registry.
    pub fn with_registry(
        config: ProxyConfig,
        registry: Arc<SessionStateRegistry>,
    ) -> Result<Self, ConfigError> {
        let snapshot = ProxySnapshot::compile(&config, &registry)
            .map_err(|e| ConfigError::Validation(vec![e]))?;
        let snapshot = Arc::new(ArcSwap::from_pointee(snapshot));

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            snapshot: snapshot.clone(),
            client,
        };

        let app = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http());

        Ok(Self {
            app,
            snapshot,
            registry,
        })
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Validated configuration updates arriving on `config_updates` are
    /// compiled and swapped in atomically; requests in flight keep the
    /// snapshot they started with.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let snapshot = self.snapshot.clone();
        let registry = self.registry.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(new_config) => {
                            match ProxySnapshot::compile(&new_config, &registry) {
                                Ok(compiled) => {
                                    snapshot.store(Arc::new(compiled));
                                    tracing::info!("Configuration reloaded");
                                }
                                Err(e) => {
                                    tracing::error!(error = %e, "Rejected config update");
                                }
                            }
                        }
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Looks up the route, runs the session filter, selects a backend, and
/// forwards the request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();

    // One atomic snapshot per request.
    let snap = state.snapshot.load_full();

    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let method_str = request.method().to_string();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method_str,
        path = %path,
        "Proxying request"
    );

    // 1. Match route.
    let Some(route) = snap.router.match_request(&request) else {
        tracing::warn!(request_id = %request_id, path = %path, "No route matched");
        metrics::record_request(&method_str, 404, "none", start_time);
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    // 2. Resolve the effective session config and parse any prior selection.
    let effective = resolve(snap.session.as_ref(), route.session.as_ref());
    let session = RequestSession::begin(effective, request.headers());

    // 3. Select a backend, offering the decoded hint.
    let Some(backend) = snap.backends.select(&route.backend_group, session.hint()) else {
        tracing::warn!(request_id = %request_id, group = %route.backend_group, "No healthy backends");
        metrics::record_request(&method_str, 503, "none", start_time);
        return (StatusCode::SERVICE_UNAVAILABLE, "No healthy backends").into_response();
    };

    let chosen = backend.endpoint();
    if let Some(hint) = session.hint() {
        if *hint == chosen {
            metrics::record_affinity("hint_honored");
        } else {
            metrics::record_affinity("re_pinned");
        }
    }

    // 4. Rewrite the request URI to target the backend.
    let (mut parts, body) = request.into_parts();
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    if let Ok(authority) = Authority::from_str(backend.base_url.authority()) {
        uri_parts.authority = Some(authority);
    }
    if let Ok(uri) = Uri::from_parts(uri_parts) {
        parts.uri = uri;
    }
    if let Ok(value) = header::HeaderValue::from_str(&request_id) {
        parts.headers.insert(X_REQUEST_ID, value);
    }
    let upstream_request = Request::from_parts(parts, body);
    let backend_addr_str = backend.addr.to_string();

    // 5. Forward and observe the outcome.
    match state.client.request(upstream_request).await {
        Ok(response) => {
            let status = response.status();
            metrics::record_request(&method_str, status.as_u16(), &backend_addr_str, start_time);

            // Passive health marking: only hard gateway-ish errors count
            // against the backend.
            match status {
                StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => {
                    backend.mark_failure(snap.health.unhealthy_threshold as usize);
                }
                _ => {
                    backend.mark_success(snap.health.healthy_threshold as usize);
                }
            }

            let (parts, body) = response.into_parts();
            let mut response = Response::from_parts(parts, Body::new(body));

            // 6. Let the session strategy observe the endpoint actually used.
            session.finish(response.headers_mut(), &chosen);

            response
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_request(&method_str, 502, &backend_addr_str, start_time);
            backend.mark_failure(snap.health.unhealthy_threshold as usize);

            // Abort path: the session is dropped unfinished, so no cookie
            // referencing a backend that never served the response.
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
