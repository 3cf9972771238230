use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Identity Records (returned by the upstream profile endpoints) ---

/// UserProfile
///
/// The end-user record returned by `GET /api/auth/me`. Its presence in the session is the only
/// proof that the cached user token is still valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    #[ts(type = "number")]
    pub id: i64,
    pub username: String,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.username)
    }
}

/// AdminProfile
///
/// The administrator record returned by `GET /api/admin/auth/me`, including the permission codes
/// granted through the admin's role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminProfile {
    #[ts(type = "number")]
    pub id: i64,
    pub username: String,
    pub real_name: Option<String>,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl AdminProfile {
    pub fn display_name(&self) -> &str {
        self.real_name.as_deref().unwrap_or(&self.username)
    }

    pub fn permission_set(&self) -> PermissionSet {
        self.permissions.iter().cloned().collect()
    }
}

/// PermissionSet
///
/// Opaque permission codes held by an admin. Only ever replaced wholesale from a fresh profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Credentials
///
/// Login payload forwarded to the upstream login endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// TokenResponse
///
/// Upstream login response. Only the access token is consumed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

// --- Backend Records listed by the admin views ---

/// KnowledgeDocument
///
/// A document in the admissions knowledge base, as listed on `/admin/knowledge`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct KnowledgeDocument {
    #[ts(type = "number")]
    pub id: i64,
    pub title: String,
    pub category: Option<String>,
    pub file_type: String,
    // pending | approved | rejected
    pub review_status: String,
    pub chunk_count: u32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ModelConfig
///
/// An LLM provider configuration managed on `/admin/model-config`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ModelConfig {
    #[ts(type = "number")]
    pub id: i64,
    pub name: String,
    pub provider: String,
    pub model_name: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub is_default: bool,
    pub is_active: bool,
}

/// AuditLog
///
/// One admin operation as shown on `/admin/logs`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuditLog {
    #[ts(type = "number")]
    pub id: i64,
    pub admin_username: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub ip_address: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// MediaResource
///
/// An uploaded image or video referenced by chat answers (`/admin/media`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MediaResource {
    #[ts(type = "number")]
    pub id: i64,
    pub title: String,
    // image | video
    pub media_type: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// SensitiveWordGroup
///
/// A named group of sensitive words with a shared handling level (`/admin/sensitive-words`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SensitiveWordGroup {
    #[ts(type = "number")]
    pub id: i64,
    pub name: String,
    // block | warn | replace
    pub level: String,
    #[serde(default)]
    pub words: Vec<String>,
    pub is_active: bool,
}
