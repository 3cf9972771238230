use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Endpoints for a signed-in end user. The `require_user` layer applied in `create_router`
/// resolves the `UserIdentity` and places it in the request extensions.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /console/me
        // The end user's profile; a 401 here is the signal to drop the cached token.
        .route("/console/me", get(handlers::get_me))
}
