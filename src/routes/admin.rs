use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Endpoints behind the admin token, nested under `/admin`. The `require_admin` layer applied in
/// `create_router` resolves the `AdminIdentity`; the end-user token plays no part here.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/console/me
        .route("/console/me", get(handlers::get_admin_me))
        // GET /admin/console/menu?path=...
        // Sidebar groups filtered by the admin's permissions, plus the active entry.
        .route("/console/menu", get(handlers::get_menu))
        // GET /admin/console/layout?path=...&width=...
        // Header, sidebar mode and content route composed for one page.
        .route("/console/layout", get(handlers::get_layout))
}
