use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Navigation core: framework-independent and usable without the HTTP layer.
pub mod account;
pub mod error;
pub mod guard;
pub mod layout;
pub mod menu;
pub mod models;
pub mod navigation;
pub mod route_table;
pub mod session;
pub mod storage;

// HTTP surface of the backend-for-frontend.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod routes;
use auth::{AdminIdentity, UserIdentity};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use account::{AccountService, AccountState, HttpAccountClient, MockAccountService};
pub use config::AppConfig;
pub use error::ConsoleError;
pub use menu::MenuConfig;
pub use navigation::Navigator;
pub use route_table::RouteTable;
pub use session::SessionContext;

/// ApiDoc
///
/// OpenAPI document for the BFF, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_routes, handlers::navigate, handlers::login, handlers::admin_login,
        handlers::get_me,
        handlers::get_admin_me, handlers::get_menu, handlers::get_layout
    ),
    components(
        schemas(
            route_table::RouteDescriptor, route_table::RouteMeta, guard::GuardDecision,
            guard::LoginView, menu::MenuGroup, menu::MenuEntry, layout::ShellView,
            layout::HeaderView, layout::SidebarView, layout::SidebarMode,
            handlers::NavigateResponse, handlers::MenuResponse,
            models::UserProfile, models::AdminProfile, models::Credentials, models::TokenResponse,
            models::KnowledgeDocument, models::ModelConfig, models::AuditLog,
            models::MediaResource, models::SensitiveWordGroup,
        )
    ),
    tags(
        (name = "admissions-console", description = "Admissions console navigation API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for the BFF: the upstream account service, the loaded config
/// and the static route/menu tables.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountState,
    pub config: AppConfig,
    pub routes: Arc<RouteTable>,
    pub menu: Arc<MenuConfig>,
}

impl AppState {
    /// Builds state with the standard route table and sidebar.
    pub fn new(accounts: AccountState, config: AppConfig) -> Self {
        Self {
            accounts,
            config,
            routes: Arc::new(RouteTable::standard()),
            menu: Arc::new(MenuConfig::standard()),
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AccountState {
    fn from_ref(app_state: &AppState) -> AccountState {
        app_state.accounts.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// require_user
///
/// Rejects with 401 unless the end-user token resolves to a profile, then hands the resolved
/// `UserIdentity` to the handler through the request extensions.
async fn require_user(identity: UserIdentity, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// require_admin
///
/// Admin counterpart of `require_user`.
async fn require_admin(identity: AdminIdentity, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies scoped and global middleware, and registers the
/// application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_user)),
        )
        .nest(
            "/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer`, correlating every log line of a request by its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
