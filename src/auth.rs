use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};

use crate::{
    account::AccountState,
    models::{AdminProfile, UserProfile},
    session::Session,
};

/// Header carrying the admin bearer token. The end-user token travels in `Authorization`.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// bearer_token
///
/// The end-user token from `Authorization: Bearer <token>`, if non-empty.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// admin_token
///
/// The admin token from the `x-admin-token` header, if non-empty.
pub fn admin_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// The request's tokens as a profile-less session, for guard evaluation.
pub fn session_from_headers(headers: &HeaderMap) -> Session {
    Session::from_tokens(bearer_token(headers), admin_token(headers))
}

/// UserIdentity
///
/// An end user whose token the upstream accepted on this request.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub token: String,
    pub profile: UserProfile,
}

/// AdminIdentity
///
/// An admin whose token the upstream accepted on this request, with their permission codes.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub token: String,
    pub profile: AdminProfile,
}

/// UserIdentity Extractor
///
/// Validity of a token is only established by a successful profile fetch, so the extractor
/// performs one. Network failures and explicit rejections are not distinguished.
///
/// Rejection: Returns StatusCode::UNAUTHORIZED (401) on any failure.
impl<S> FromRequestParts<S> for UserIdentity
where
    S: Send + Sync,
    AccountState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let accounts = AccountState::from_ref(state);
        let token = bearer_token(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)?;

        let profile = accounts.fetch_user_profile(&token).await.map_err(|e| {
            tracing::debug!("user token rejected: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

        Ok(UserIdentity { token, profile })
    }
}

/// AdminIdentity Extractor
///
/// Same contract as `UserIdentity`, against the admin token and profile endpoint. The end-user
/// token is never consulted.
impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
    AccountState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let accounts = AccountState::from_ref(state);
        let token = admin_token(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)?;

        let profile = accounts.fetch_admin_profile(&token).await.map_err(|e| {
            tracing::debug!("admin token rejected: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

        Ok(AdminIdentity { token, profile })
    }
}
