use admissions_console::{
    guard::{GuardDecision, LoginView},
    layout::SidebarMode,
    models::{AdminProfile, AuditLog, KnowledgeDocument, MediaResource, TokenResponse, UserProfile},
};
use chrono::{Datelike, Utc};
use serde_json::json;

// --- Profiles ---

#[test]
fn test_admin_profile_without_permissions_field() {
    let profile: AdminProfile = serde_json::from_value(json!({
        "id": 3,
        "username": "reviewer",
        "real_name": null,
        "role": "auditor"
    }))
    .unwrap();

    assert!(profile.permissions.is_empty());
    assert!(profile.permission_set().is_empty());
    assert_eq!(profile.display_name(), "reviewer");
}

#[test]
fn test_admin_permission_set_deduplicates() {
    let profile: AdminProfile = serde_json::from_value(json!({
        "id": 1,
        "username": "root",
        "real_name": "王老师",
        "role": "super_admin",
        "permissions": ["log:read", "knowledge:read", "log:read"]
    }))
    .unwrap();

    let set = profile.permission_set();
    assert_eq!(set.len(), 2);
    assert!(set.contains("knowledge:read"));
    assert_eq!(profile.display_name(), "王老师");
}

#[test]
fn test_user_display_name_prefers_nickname() {
    let mut user = UserProfile {
        id: 42,
        username: "applicant".to_string(),
        ..UserProfile::default()
    };
    assert_eq!(user.display_name(), "applicant");
    user.nickname = Some("小明".to_string());
    assert_eq!(user.display_name(), "小明");
}

#[test]
fn test_token_response_ignores_extra_fields() {
    let token: TokenResponse = serde_json::from_value(json!({
        "access_token": "abc",
        "expires_in": 3600
    }))
    .unwrap();
    assert_eq!(token.access_token, "abc");
    assert!(token.token_type.is_none());
}

// --- Wire Shapes ---

#[test]
fn test_guard_decision_json_shape() {
    assert_eq!(
        serde_json::to_value(GuardDecision::Proceed).unwrap(),
        json!({ "outcome": "proceed" })
    );
    assert_eq!(
        serde_json::to_value(GuardDecision::Redirect(LoginView::Admin)).unwrap(),
        json!({ "outcome": "redirect", "login": "admin" })
    );
    assert_eq!(serde_json::to_value(SidebarMode::Drawer).unwrap(), json!("drawer"));
}

// --- Backend Records ---

#[test]
fn test_backend_records_parse_upstream_payloads() {
    let doc: KnowledgeDocument = serde_json::from_value(json!({
        "id": 9,
        "title": "2026 招生简章",
        "category": null,
        "file_type": "pdf",
        "review_status": "approved",
        "chunk_count": 48,
        "created_at": "2026-03-01T08:00:00Z"
    }))
    .unwrap();
    assert_eq!(doc.created_at.year(), 2026);

    let media: MediaResource = serde_json::from_value(json!({
        "id": 2,
        "title": "校园全景",
        "media_type": "image",
        "url": "https://cdn.example.edu/campus.jpg",
        "thumbnail_url": null
    }))
    .unwrap();
    assert!(media.tags.is_empty());

    let log = AuditLog {
        id: 1,
        admin_username: "root".to_string(),
        action: "update".to_string(),
        resource_type: "model_config".to_string(),
        resource_id: Some("4".to_string()),
        ip_address: None,
        created_at: Utc::now(),
    };
    let value = serde_json::to_value(&log).unwrap();
    assert_eq!(value["resource_type"], "model_config");
    assert!(value["created_at"].is_string());
}
