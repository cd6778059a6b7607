//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router: management surface plus a catch-all proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Run every proxied request through the chaos engine
//! - Forward surviving requests to the target
//! - Apply config-file reloads to the live configuration
//! - Serve with graceful shutdown bounded by the grace period

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, oneshot};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::chaos::{ChaosEngine, Verdict};
use crate::config::duration::format_duration;
use crate::config::{ListenerConfig, Target};
use crate::http::forward::Forwarder;
use crate::http::{request, response};
use crate::lifecycle::shutdown::drain_with_grace;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ChaosEngine>,
    pub forwarder: Forwarder,
}

/// HTTP server for the chaos proxy.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: ListenerConfig,
}

impl HttpServer {
    /// Create a new HTTP server in front of `target`.
    pub fn new(engine: Arc<ChaosEngine>, target: Target, config: ListenerConfig) -> Self {
        let state = AppState {
            engine,
            forwarder: Forwarder::new(target),
        };

        let router = Self::build_router(state.clone());
        Self {
            router,
            state,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .merge(admin::management_router(state.clone()))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(request::set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(request::make_span))
                    .layer(request::propagate_request_id_layer()),
            )
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// `config_updates` carries overlay documents from the config watcher.
    /// A message on `shutdown` (or the coordinator going away) stops
    /// accepting; in-flight requests then get the grace period to finish.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<Vec<u8>>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            target = %self.state.forwarder.target(),
            "HTTP server starting"
        );

        let engine = Arc::clone(&self.state.engine);
        let reloader = tokio::spawn(async move {
            while let Some(document) = config_updates.recv().await {
                match engine.apply_overlay(&document) {
                    Ok(_) => tracing::info!("Configuration reloaded from file"),
                    Err(e) => tracing::error!(
                        error = %e,
                        "Failed to apply config file. Keeping current configuration."
                    ),
                }
            }
        });

        let (draining_tx, draining_rx) = oneshot::channel();
        let signal = async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received, draining in-flight requests");
            let _ = draining_tx.send(());
        };

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .into_future();

        let result = drain_with_grace(server, draining_rx, self.config.shutdown_grace.as_std()).await;
        reloader.abort();

        tracing::info!("HTTP server stopped");
        result
    }
}

/// Main proxy handler.
/// Counts the request, runs the fault gates and either answers on the
/// backend's behalf or forwards.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_string();

    // Everything under the prefix that no management route claimed.
    if admin::is_management_path(&path) {
        state.engine.stats().record_management();
        return admin::handlers::not_found().await.into_response();
    }

    state.engine.stats().record_request();

    let method = request.method().to_string();
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let config = state.engine.config();
    let verdict = state.engine.evaluate(&config, &mut rand::thread_rng());

    if let Some(delay) = verdict.delay() {
        tracing::info!(delay = %format_duration(delay), path = %path, "Injecting delay");
        tokio::time::sleep(delay).await;
    }

    match verdict {
        Verdict::Timeout(after) => {
            tracing::info!(timeout = %format_duration(after), path = %path, "Injecting timeout");
            tokio::time::sleep(after).await;
            metrics::record_request(&method, StatusCode::GATEWAY_TIMEOUT.as_u16(), "timeout", start);
            response::injected_timeout(after)
        }
        Verdict::Fail { status, .. } => {
            tracing::info!(status, path = %path, "Injecting error");
            metrics::record_request(&method, status, "error", start);
            response::injected_error(status, &config.error_message, &path)
        }
        Verdict::Forward { delay } => {
            let mut response = match state.forwarder.forward(request, client_addr).await {
                Ok(upstream) => {
                    let (parts, body) = upstream.into_parts();
                    Response::from_parts(parts, Body::new(body))
                }
                Err(e) => {
                    tracing::error!(error = %e, path = %path, "Upstream error");
                    StatusCode::BAD_GATEWAY.into_response()
                }
            };
            response::mark_forwarded(&mut response, delay);
            metrics::record_request(&method, response.status().as_u16(), "forwarded", start);
            response
        }
    }
}
