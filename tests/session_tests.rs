use admissions_console::{
    models::{AdminProfile, UserProfile},
    session::{Realm, Session, SessionContext},
    storage::{ADMIN_TOKEN_KEY, KeyValueStore, MemoryStore, StoreState, USER_TOKEN_KEY},
};
use std::sync::Arc;

fn admin(permissions: &[&str]) -> AdminProfile {
    AdminProfile {
        id: 1,
        username: "root".to_string(),
        role: "super_admin".to_string(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        ..AdminProfile::default()
    }
}

fn user() -> UserProfile {
    UserProfile {
        id: 42,
        username: "applicant".to_string(),
        ..UserProfile::default()
    }
}

fn fresh() -> (SessionContext, StoreState) {
    let store = Arc::new(MemoryStore::new()) as StoreState;
    (SessionContext::bootstrap(store.clone()), store)
}

#[test]
fn test_bootstrap_restores_persisted_tokens() {
    let store = Arc::new(MemoryStore::with_entries([
        (USER_TOKEN_KEY, "u-1"),
        (ADMIN_TOKEN_KEY, ""),
    ])) as StoreState;

    let session = SessionContext::bootstrap(store).snapshot();
    assert_eq!(session.user_token.as_deref(), Some("u-1"));
    // Empty persisted values do not count as tokens.
    assert!(session.admin_token.is_none());
    assert!(session.user_profile.is_none());
}

#[test]
fn test_login_persists_and_logout_clears() {
    let (ctx, store) = fresh();

    ctx.login_admin("a-1").unwrap();
    assert_eq!(store.get(ADMIN_TOKEN_KEY).as_deref(), Some("a-1"));
    assert!(ctx.snapshot().has_admin_token());
    assert!(!ctx.snapshot().has_user_token());

    ctx.logout_admin().unwrap();
    assert!(store.get(ADMIN_TOKEN_KEY).is_none());
    assert!(ctx.snapshot().admin_token.is_none());
}

#[test]
fn test_realms_are_independent() {
    let (ctx, store) = fresh();
    ctx.login_user("u-1").unwrap();
    ctx.login_admin("a-1").unwrap();

    ctx.logout_user().unwrap();
    assert!(store.get(USER_TOKEN_KEY).is_none());
    assert_eq!(ctx.snapshot().admin_token.as_deref(), Some("a-1"));
}

#[test]
fn test_blank_login_token_rejected() {
    let (ctx, store) = fresh();
    assert!(ctx.login_user("  ").is_err());
    assert!(store.get(USER_TOKEN_KEY).is_none());
}

#[test]
fn test_admin_profile_replaces_permissions_wholesale() {
    let (ctx, _) = fresh();
    ctx.login_admin("a-1").unwrap();
    assert!(ctx.permissions().is_empty());

    let ticket = ctx.begin_admin_refresh().unwrap();
    assert!(ctx.apply_admin_profile(&ticket, admin(&["knowledge:read", "media:read"])));
    assert_eq!(ctx.permissions().len(), 2);

    let ticket = ctx.begin_admin_refresh().unwrap();
    assert!(ctx.apply_admin_profile(&ticket, admin(&["log:read"])));
    let permissions = ctx.permissions();
    assert_eq!(permissions.len(), 1);
    assert!(permissions.contains("log:read"));
    assert!(!permissions.contains("knowledge:read"));

    ctx.logout_admin().unwrap();
    assert!(ctx.permissions().is_empty());
}

#[test]
fn test_stale_profile_after_logout_is_discarded() {
    let (ctx, _) = fresh();
    ctx.login_user("u-1").unwrap();
    let ticket = ctx.begin_user_refresh().unwrap();

    // Logout and a fresh login happen while the fetch is in flight.
    ctx.logout_user().unwrap();
    ctx.login_user("u-2").unwrap();

    assert!(!ctx.apply_user_profile(&ticket, user()));
    assert!(ctx.snapshot().user_profile.is_none());
}

#[test]
fn test_stale_failure_does_not_clear_new_session() {
    let (ctx, store) = fresh();
    ctx.login_user("u-1").unwrap();
    let ticket = ctx.begin_user_refresh().unwrap();

    ctx.login_user("u-2").unwrap();

    assert!(!ctx.invalidate(&ticket));
    assert_eq!(ctx.snapshot().user_token.as_deref(), Some("u-2"));
    assert_eq!(store.get(USER_TOKEN_KEY).as_deref(), Some("u-2"));
}

#[test]
fn test_current_failure_invalidates_realm() {
    let (ctx, store) = fresh();
    ctx.login_user("u-1").unwrap();
    ctx.login_admin("a-1").unwrap();
    let before = ctx.generation(Realm::User);

    let ticket = ctx.begin_user_refresh().unwrap();
    assert!(ctx.invalidate(&ticket));

    assert!(ctx.snapshot().user_token.is_none());
    assert!(store.get(USER_TOKEN_KEY).is_none());
    assert!(ctx.generation(Realm::User) > before);
    // The admin session is untouched.
    assert_eq!(ctx.snapshot().admin_token.as_deref(), Some("a-1"));
}

#[test]
fn test_ticket_for_wrong_realm_is_rejected() {
    let (ctx, _) = fresh();
    ctx.login_user("u-1").unwrap();
    ctx.login_admin("a-1").unwrap();

    let user_ticket = ctx.begin_user_refresh().unwrap();
    assert!(!ctx.apply_admin_profile(&user_ticket, admin(&["log:read"])));
    assert!(ctx.permissions().is_empty());
}

#[test]
fn test_refresh_requires_token() {
    let (ctx, _) = fresh();
    assert!(ctx.begin_user_refresh().is_none());
    assert!(ctx.begin_admin_refresh().is_none());
}

#[test]
fn test_clones_share_state() {
    let (ctx, _) = fresh();
    let other = ctx.clone();
    other.login_user("u-1").unwrap();
    assert!(ctx.snapshot().has_user_token());

    ctx.logout_all().unwrap();
    assert_eq!(other.snapshot(), Session::default());
}
