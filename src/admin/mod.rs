//! Management surface under `/_chaos`.
//!
//! Requests here never reach the fault gates or the target. There is no
//! authentication; bind the proxy somewhere only trusted callers can reach.

pub mod handlers;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{any, get},
    Router,
};

use self::handlers::*;
use crate::http::server::AppState;

/// Reserved path prefix for the management surface.
pub const MANAGEMENT_PREFIX: &str = "/_chaos";

/// Any path starting with the prefix, `/_chaosfoo` included, is reserved.
pub fn is_management_path(path: &str) -> bool {
    path.starts_with(MANAGEMENT_PREFIX)
}

pub fn management_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/_chaos/config",
            get(get_config).post(update_config).put(update_config),
        )
        .route("/_chaos/stats", any(get_stats))
        .route("/_chaos/health", any(get_health))
        .route("/_chaos", any(not_found))
        .route("/_chaos/{*rest}", any(not_found))
        .route_layer(middleware::from_fn_with_state(state, count_management))
}

async fn count_management(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    state.engine.stats().record_management();
    next.run(request).await
}
