use admissions_console::{
    account::{AccountState, MockAccountService},
    guard::{GuardDecision, LoginView},
    models::{AdminProfile, Credentials, UserProfile},
    navigation::Navigator,
    route_table::RouteTable,
    session::{Realm, Session, SessionContext},
    storage::{KeyValueStore, MemoryStore, StoreState, USER_TOKEN_KEY},
};
use std::{sync::Arc, time::Duration};

const USER_TOKEN: &str = "user-token";
const ADMIN_TOKEN: &str = "admin-token";

fn accounts() -> MockAccountService {
    MockAccountService::new()
        .with_user(
            USER_TOKEN,
            UserProfile {
                id: 42,
                username: "applicant".to_string(),
                nickname: Some("小明".to_string()),
                ..UserProfile::default()
            },
        )
        .with_admin(
            ADMIN_TOKEN,
            AdminProfile {
                id: 1,
                username: "root".to_string(),
                role: "super_admin".to_string(),
                permissions: vec!["knowledge:read".to_string()],
                ..AdminProfile::default()
            },
        )
}

struct Harness {
    navigator: Navigator,
    accounts: Arc<MockAccountService>,
    store: StoreState,
}

fn harness(mock: MockAccountService, persisted: &[(&str, &str)]) -> Harness {
    let store = Arc::new(MemoryStore::with_entries(persisted.iter().copied())) as StoreState;
    let accounts = Arc::new(mock);
    let navigator = Navigator::new(
        SessionContext::bootstrap(store.clone()),
        accounts.clone() as AccountState,
        Arc::new(RouteTable::standard()),
        "招生咨询",
    );
    Harness {
        navigator,
        accounts,
        store,
    }
}

fn credentials(password: &str) -> Credentials {
    Credentials {
        username: "root".to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_anonymous_chat_redirects_to_login() {
    let h = harness(accounts(), &[]);

    let nav = h.navigator.navigate("/chat/42");
    assert_eq!(nav.decision, GuardDecision::Redirect(LoginView::User));
    assert_eq!(nav.path, "/login");
    assert_eq!(nav.route.as_ref().map(|r| r.name.as_str()), Some("Login"));
    assert_eq!(h.navigator.current_path(), "/login");
    assert!(nav.hydration.is_none());
}

#[tokio::test]
async fn test_user_navigation_hydrates_profile_in_background() {
    let h = harness(accounts(), &[(USER_TOKEN_KEY, USER_TOKEN)]);

    let nav = h.navigator.navigate("/chat/42");
    assert_eq!(nav.decision, GuardDecision::Proceed);
    assert_eq!(nav.path, "/chat/42");
    assert_eq!(nav.params.get("id").map(String::as_str), Some("42"));
    assert_eq!(nav.title, "智能咨询 - 招生咨询");
    assert!(nav.hydration.is_some());

    nav.settled().await;
    let profile = h.navigator.session().snapshot().user_profile.expect("hydrated");
    assert_eq!(profile.display_name(), "小明");

    // Cached now, so the next transition does not fetch again.
    let nav = h.navigator.navigate("/settings");
    assert!(nav.hydration.is_none());
    assert_eq!(h.accounts.user_fetches(), 1);
}

#[tokio::test]
async fn test_navigation_does_not_wait_for_hydration() {
    let mock = accounts().with_latency(Duration::from_millis(200));
    let h = harness(mock, &[(USER_TOKEN_KEY, USER_TOKEN)]);

    let nav = h.navigator.navigate("/chat");
    // Route committed while the profile is still absent.
    assert_eq!(h.navigator.current_path(), "/chat");
    assert!(h.navigator.session().snapshot().user_profile.is_none());
    assert!(!h.navigator.is_loading());

    // A second transition during the fetch does not start another one.
    let second = h.navigator.navigate("/settings");
    assert!(second.hydration.is_none());

    nav.settled().await;
    assert!(h.navigator.session().has_user_profile());
    assert_eq!(h.accounts.user_fetches(), 1);
}

#[tokio::test]
async fn test_hydration_failure_clears_session_and_redirects() {
    let h = harness(accounts(), &[(USER_TOKEN_KEY, "revoked-token")]);

    let nav = h.navigator.navigate("/chat");
    assert_eq!(nav.decision, GuardDecision::Proceed);
    nav.settled().await;

    let session = h.navigator.session().snapshot();
    assert!(session.user_token.is_none());
    assert!(h.store.get(USER_TOKEN_KEY).is_none());
    assert_eq!(h.navigator.current_path(), "/login");
}

#[tokio::test]
async fn test_stale_hydration_after_relogin_is_discarded() {
    let mock = accounts().with_latency(Duration::from_millis(100));
    mock.set_failing(true);
    let h = harness(mock, &[(USER_TOKEN_KEY, USER_TOKEN)]);

    let nav = h.navigator.navigate("/chat");
    assert!(nav.hydration.is_some());

    // Logout and log back in while the failing fetch is still in flight.
    h.navigator.logout(Realm::User);
    h.accounts.set_failing(false);
    h.navigator.session().login_user(USER_TOKEN).unwrap();
    let fresh = h.navigator.navigate("/settings");
    assert!(fresh.hydration.is_some());

    nav.settled().await;
    fresh.settled().await;

    // The stale failure neither cleared the new session nor redirected.
    let session = h.navigator.session().snapshot();
    assert_eq!(session.user_token.as_deref(), Some(USER_TOKEN));
    assert!(session.user_profile.is_some());
    assert_eq!(h.navigator.current_path(), "/settings");
}

#[tokio::test]
async fn test_admin_path_ignores_user_session() {
    let h = harness(accounts(), &[("admin_token", ADMIN_TOKEN)]);

    let nav = h.navigator.navigate("/admin/users");
    assert_eq!(nav.decision, GuardDecision::Proceed);
    assert!(nav.hydration.is_none());
    assert_eq!(h.accounts.user_fetches(), 0);

    let nav = h.navigator.navigate("/admin");
    assert_eq!(nav.path, "/admin/dashboard");
}

#[tokio::test]
async fn test_admin_path_without_admin_token_redirects() {
    let h = harness(accounts(), &[(USER_TOKEN_KEY, USER_TOKEN)]);

    let nav = h.navigator.navigate("/admin/knowledge");
    assert_eq!(nav.decision, GuardDecision::Redirect(LoginView::Admin));
    assert_eq!(nav.path, "/admin/login");
    // The end-user session is left alone.
    assert!(h.navigator.session().snapshot().has_user_token());
}

#[tokio::test]
async fn test_unmatched_path_is_left_to_router() {
    let h = harness(accounts(), &[(USER_TOKEN_KEY, USER_TOKEN)]);
    let nav = h.navigator.navigate("/no/such/page").settled().await;
    assert_eq!(nav.decision, GuardDecision::Proceed);
    assert!(nav.route.is_none());
    assert_eq!(nav.title, "招生咨询");
}

#[tokio::test]
async fn test_admin_login_loads_permissions() {
    let h = harness(accounts(), &[]);

    let nav = h.navigator.login_admin(&credentials("secret")).await.unwrap();
    assert_eq!(nav.path, "/admin/dashboard");
    assert!(h.navigator.session().permissions().contains("knowledge:read"));
    assert_eq!(h.store.get("admin_token").as_deref(), Some(ADMIN_TOKEN));
}

#[tokio::test]
async fn test_login_with_bad_password_keeps_session_empty() {
    let h = harness(accounts(), &[]);

    assert!(h.navigator.login_admin(&credentials("wrong")).await.is_err());
    assert!(h.navigator.login_user(&credentials("wrong"), None).await.is_err());
    assert_eq!(h.navigator.session().snapshot(), Session::default());
}

#[tokio::test]
async fn test_user_login_follows_redirect() {
    let h = harness(accounts(), &[]);

    let nav = h
        .navigator
        .login_user(&credentials("secret"), Some("/chat/7"))
        .await
        .unwrap();
    assert_eq!(nav.path, "/chat/7");
    nav.settled().await;
    assert!(h.navigator.session().has_user_profile());
}

#[tokio::test]
async fn test_logout_lands_on_login_view() {
    let h = harness(accounts(), &[("admin_token", ADMIN_TOKEN)]);
    let nav = h.navigator.logout(Realm::Admin);
    assert_eq!(nav.path, "/admin/login");
    assert!(!h.navigator.session().snapshot().has_admin_token());
}

#[test]
fn test_navigation_outside_runtime_skips_hydration() {
    let h = harness(accounts(), &[(USER_TOKEN_KEY, USER_TOKEN)]);

    let nav = h.navigator.navigate("/chat/42");
    assert_eq!(nav.decision, GuardDecision::Proceed);
    assert_eq!(h.navigator.current_path(), "/chat/42");
    assert!(nav.hydration.is_none());
    assert_eq!(h.accounts.user_fetches(), 0);

    // The generation was not marked as hydrating, so a later navigation inside a runtime
    // still fetches the profile.
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let nav = h.navigator.navigate("/settings");
        assert!(nav.hydration.is_some());
        nav.settled().await;
    });
    assert!(h.navigator.session().has_user_profile());
    assert_eq!(h.accounts.user_fetches(), 1);
}

#[test]
fn test_loading_raised_and_cleared_per_transition() {
    let h = harness(accounts(), &[]);
    let mut events = h.navigator.loading_events();

    h.navigator.navigate("/chat");
    assert_eq!(events.try_recv().ok(), Some(true));
    assert_eq!(events.try_recv().ok(), Some(false));
    assert!(events.try_recv().is_err());
    assert!(!h.navigator.is_loading());

    h.navigator.navigate("/admin/login");
    assert_eq!(events.try_recv().ok(), Some(true));
    assert_eq!(events.try_recv().ok(), Some(false));
}
