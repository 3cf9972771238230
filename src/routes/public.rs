use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no credentials. `/console/navigate` reads whatever tokens are presented
/// but only checks their presence, exactly like the client-side guard.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer and the deploy health check.
        .route("/health", get(|| async { "ok" }))
        // GET /console/routes
        // The declarative route table (paths, view names, auth metadata).
        .route("/console/routes", get(handlers::get_routes))
        // GET /console/navigate?path=...
        // Guard evaluation: proceed, or redirect to the user/admin login view.
        .route("/console/navigate", get(handlers::navigate))
        // POST /console/login, POST /console/admin-login
        // Token issuance, proxied to the upstream API.
        .route("/console/login", post(handlers::login))
        .route("/console/admin-login", post(handlers::admin_login))
}
