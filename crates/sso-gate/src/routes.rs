use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::sso::{self, AuthenticatedUser, GateState};

/// Demo router: everything registered before the gate layer is protected,
/// the health probe is not.
pub fn build_routes(state: Arc<GateState>) -> Router {
    Router::new()
        .route("/", get(whoami))
        .route_layer(axum::middleware::from_fn_with_state(state, sso::require_sso))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
}

async fn whoami(Extension(user): Extension<AuthenticatedUser>) -> String {
    format!("Hello, {}", user.0)
}

async fn health_check() -> &'static str {
    "OK"
}
