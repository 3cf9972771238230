use crate::{
    AppState,
    auth::{AdminIdentity, UserIdentity, session_from_headers},
    error::ConsoleError,
    guard::{self, GuardDecision},
    layout::{LayoutShell, ShellView},
    menu::{MenuGroup, resolve_active},
    models::{AdminProfile, Credentials, TokenResponse, UserProfile},
    route_table::{RouteDescriptor, normalize_path},
    session::{Realm, Session},
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// Assumed viewport when the client does not report one.
const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;

// --- Query Structs ---

/// PathQuery
///
/// The SPA path a request is about. Defaults to `/`.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PathQuery {
    pub path: Option<String>,
}

/// LayoutQuery
///
/// Path plus the client's viewport width in CSS pixels.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct LayoutQuery {
    pub path: Option<String>,
    pub width: Option<u32>,
}

// --- Response Bodies ---

/// NavigateResponse
///
/// The guard's verdict for one transition, with the route that will render.
#[derive(Debug, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigateResponse {
    pub requested: String,
    pub path: String,
    pub decision: GuardDecision,
    pub title: Option<String>,
    pub route: Option<RouteDescriptor>,
}

#[derive(Debug, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct MenuResponse {
    pub groups: Vec<MenuGroup>,
    pub active: String,
}

// --- Handlers ---

/// get_routes
///
/// [Public Route] The full route table, so the SPA and the BFF agree on paths and metadata.
#[utoipa::path(
    get,
    path = "/console/routes",
    responses((status = 200, description = "Route table", body = [RouteDescriptor]))
)]
pub async fn get_routes(State(state): State<AppState>) -> Json<Vec<RouteDescriptor>> {
    Json(state.routes.routes().to_vec())
}

/// navigate
///
/// [Public Route] Evaluates the navigation guard for `path` using the tokens presented on the
/// request. Token presence decides; no upstream call is made.
#[utoipa::path(
    get,
    path = "/console/navigate",
    params(PathQuery),
    responses((status = 200, description = "Guard decision", body = NavigateResponse))
)]
pub async fn navigate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PathQuery>,
) -> Json<NavigateResponse> {
    let requested = normalize_path(query.path.as_deref().unwrap_or("/"));
    let target = state.routes.follow_redirects(&requested);
    let outcome = guard::evaluate(&target, &session_from_headers(&headers));

    let path = match outcome.decision {
        GuardDecision::Proceed => target,
        GuardDecision::Redirect(login) => login.path().to_string(),
    };
    let route = state.routes.resolve(&path).map(|m| m.route.clone());

    Json(NavigateResponse {
        requested,
        title: route
            .as_ref()
            .map(|r| format!("{} - {}", r.meta.title, state.config.app_title)),
        path,
        decision: outcome.decision,
        route,
    })
}

/// login
///
/// [Public Route] Exchanges end-user credentials for a token at the upstream API.
#[utoipa::path(
    post,
    path = "/console/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Bad credentials"),
        (status = 502, description = "Upstream unavailable")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<TokenResponse>, ConsoleError> {
    issue_token(&state, Realm::User, &credentials).await
}

/// admin_login
///
/// [Public Route] Admin counterpart of `login`.
#[utoipa::path(
    post,
    path = "/console/admin-login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Bad credentials"),
        (status = 502, description = "Upstream unavailable")
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<TokenResponse>, ConsoleError> {
    issue_token(&state, Realm::Admin, &credentials).await
}

async fn issue_token(
    state: &AppState,
    realm: Realm,
    credentials: &Credentials,
) -> Result<Json<TokenResponse>, ConsoleError> {
    let access_token = state.accounts.login(realm, credentials).await?;
    tracing::info!(?realm, username = %credentials.username, "login succeeded");
    Ok(Json(TokenResponse {
        access_token,
        token_type: Some("bearer".to_string()),
    }))
}

/// get_me
///
/// [Authenticated Route] The end user's profile as the upstream reports it.
#[utoipa::path(
    get,
    path = "/console/me",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Missing or rejected token")
    )
)]
pub async fn get_me(Extension(identity): Extension<UserIdentity>) -> Json<UserProfile> {
    Json(identity.profile)
}

/// get_admin_me
///
/// [Admin Route] The admin's profile, including permission codes.
#[utoipa::path(
    get,
    path = "/admin/console/me",
    responses(
        (status = 200, description = "Current admin", body = AdminProfile),
        (status = 401, description = "Missing or rejected admin token")
    )
)]
pub async fn get_admin_me(Extension(identity): Extension<AdminIdentity>) -> Json<AdminProfile> {
    Json(identity.profile)
}

/// get_menu
///
/// [Admin Route] The sidebar filtered by the admin's permissions, with the entry that should be
/// highlighted for `path`.
#[utoipa::path(
    get,
    path = "/admin/console/menu",
    params(PathQuery),
    responses((status = 200, description = "Visible menu", body = MenuResponse))
)]
pub async fn get_menu(
    Extension(identity): Extension<AdminIdentity>,
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Json<MenuResponse> {
    let groups = state.menu.visible(&identity.profile.permission_set());
    let active = resolve_active(query.path.as_deref().unwrap_or("/"), &groups);
    Json(MenuResponse { groups, active })
}

/// get_layout
///
/// [Admin Route] The composed layout shell for `path` at the reported viewport width.
#[utoipa::path(
    get,
    path = "/admin/console/layout",
    params(LayoutQuery),
    responses((status = 200, description = "Layout shell", body = ShellView))
)]
pub async fn get_layout(
    Extension(identity): Extension<AdminIdentity>,
    State(state): State<AppState>,
    Query(query): Query<LayoutQuery>,
) -> Json<ShellView> {
    let session = Session {
        admin_token: Some(identity.token),
        admin_profile: Some(identity.profile),
        ..Session::default()
    };
    let mut shell = LayoutShell::new(
        state.config.sidebar_breakpoint,
        query.width.unwrap_or(DEFAULT_VIEWPORT_WIDTH),
    );
    let path = state
        .routes
        .follow_redirects(query.path.as_deref().unwrap_or("/admin"));

    Json(shell.render(&path, &session, &state.menu, &state.routes))
}
