//! Navigator: runs each transition through the guard, tracks the current path and the
//! process-wide "route is loading" flag, and hydrates the user profile in the background.
//!
//! `navigate` itself is synchronous. Hydration needs a tokio runtime; without one the
//! transition still commits and the fetch is skipped until a later navigation inside a runtime.

use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex, RwLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use tokio::{runtime::Handle, sync::broadcast, task::JoinHandle};

use crate::{
    account::AccountState,
    error::ConsoleError,
    guard::{self, GuardDecision},
    models::Credentials,
    route_table::{ADMIN_HOME_PATH, RouteDescriptor, RouteTable, USER_LOGIN_PATH, normalize_path},
    session::{Generation, Realm, SessionContext},
};

/// Navigation
///
/// Result of one transition. `hydration` is the background profile fetch it spawned, if any;
/// dropping the handle does not cancel the fetch.
#[derive(Debug)]
pub struct Navigation {
    pub requested: String,
    pub path: String,
    pub decision: GuardDecision,
    pub route: Option<RouteDescriptor>,
    pub params: BTreeMap<String, String>,
    pub title: String,
    pub hydration: Option<JoinHandle<()>>,
}

impl Navigation {
    pub fn redirected(&self) -> bool {
        matches!(self.decision, GuardDecision::Redirect(_))
    }

    /// Waits for the background hydration, if one was spawned.
    pub async fn settled(mut self) -> Self {
        if let Some(handle) = self.hydration.take() {
            if let Err(e) = handle.await {
                tracing::warn!("profile hydration task failed: {}", e);
            }
        }
        self
    }
}

struct Inner {
    session: SessionContext,
    accounts: AccountState,
    routes: Arc<RouteTable>,
    app_title: String,
    current: RwLock<String>,
    // Transitions in flight; the route is loading while this is non-zero.
    in_flight: AtomicUsize,
    loading_tx: broadcast::Sender<bool>,
    hydrating: Mutex<Option<Generation>>,
}

const LOADING_EVENT_CAPACITY: usize = 16;

/// Counts one transition for its lifetime. Only the first raise and the last drop publish.
struct LoadingFlag<'a> {
    in_flight: &'a AtomicUsize,
    events: &'a broadcast::Sender<bool>,
}

impl<'a> LoadingFlag<'a> {
    fn raise(inner: &'a Inner) -> Self {
        if inner.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            // No subscribers is fine.
            let _ = inner.loading_tx.send(true);
        }
        Self {
            in_flight: &inner.in_flight,
            events: &inner.loading_tx,
        }
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.events.send(false);
        }
    }
}

#[derive(Clone)]
pub struct Navigator {
    inner: Arc<Inner>,
}

impl Navigator {
    pub fn new(
        session: SessionContext,
        accounts: AccountState,
        routes: Arc<RouteTable>,
        app_title: &str,
    ) -> Self {
        let (loading_tx, _) = broadcast::channel(LOADING_EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                session,
                accounts,
                routes,
                app_title: app_title.to_string(),
                current: RwLock::new("/".to_string()),
                in_flight: AtomicUsize::new(0),
                loading_tx,
                hydrating: Mutex::new(None),
            }),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    pub fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }

    pub fn current_path(&self) -> String {
        self.inner
            .current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Subscribes to loading changes: `true` when the first transition starts, `false` when
    /// the last one in flight finishes.
    pub fn loading_events(&self) -> broadcast::Receiver<bool> {
        self.inner.loading_tx.subscribe()
    }

    /// navigate
    ///
    /// Resolves route redirects, consults the guard and commits either the target or the
    /// login view. Must be called from within a tokio runtime when a user token is present,
    /// since profile hydration is spawned onto it.
    pub fn navigate(&self, path: &str) -> Navigation {
        let _loading = LoadingFlag::raise(&self.inner);

        let requested = normalize_path(path);
        let target = self.inner.routes.follow_redirects(&requested);
        let outcome = guard::evaluate(&target, &self.inner.session.snapshot());

        let committed = match outcome.decision {
            GuardDecision::Proceed => target,
            GuardDecision::Redirect(login) => login.path().to_string(),
        };

        let (route, params) = match self.inner.routes.resolve(&committed) {
            Some(m) => (Some(m.route.clone()), m.params),
            None => (None, BTreeMap::new()),
        };

        let title = match &route {
            Some(r) => format!("{} - {}", r.meta.title, self.inner.app_title),
            None => self.inner.app_title.clone(),
        };

        *self
            .inner
            .current
            .write()
            .unwrap_or_else(|e| e.into_inner()) = committed.clone();

        let hydration = if outcome.hydrate_user_profile {
            self.spawn_user_hydration()
        } else {
            None
        };

        tracing::debug!(%requested, path = %committed, "navigation committed");

        Navigation {
            requested,
            path: committed,
            decision: outcome.decision,
            route,
            params,
            title,
            hydration,
        }
    }

    /// Spawns the fire-and-forget user profile fetch. At most one fetch runs per session
    /// generation. Outside a tokio runtime nothing is spawned or marked.
    fn spawn_user_hydration(&self) -> Option<JoinHandle<()>> {
        let ticket = self.inner.session.begin_user_refresh()?;

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("skipping user profile hydration: {}", e);
                return None;
            }
        };

        {
            let mut hydrating = self
                .inner
                .hydrating
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if *hydrating == Some(ticket.generation) {
                return None;
            }
            *hydrating = Some(ticket.generation);
        }

        let navigator = self.clone();
        Some(runtime.spawn(async move {
            let inner = &navigator.inner;
            match inner.accounts.fetch_user_profile(&ticket.token).await {
                Ok(profile) => {
                    inner.session.apply_user_profile(&ticket, profile);
                }
                Err(e) => {
                    tracing::warn!("user profile fetch failed: {}", e);
                    if inner.session.invalidate(&ticket)
                        && navigator.current_path() != USER_LOGIN_PATH
                    {
                        navigator.navigate(USER_LOGIN_PATH);
                    }
                }
            }

            let mut hydrating = inner.hydrating.lock().unwrap_or_else(|e| e.into_inner());
            if *hydrating == Some(ticket.generation) {
                *hydrating = None;
            }
        }))
    }

    // --- Login / Logout Flows ---

    /// Logs an end user in and navigates to `redirect` (default `/`).
    pub async fn login_user(
        &self,
        credentials: &Credentials,
        redirect: Option<&str>,
    ) -> Result<Navigation, ConsoleError> {
        let token = self.inner.accounts.login(Realm::User, credentials).await?;
        self.inner.session.login_user(&token)?;
        Ok(self.navigate(redirect.unwrap_or("/")))
    }

    /// Logs an admin in, loads the admin profile (and with it the permission set) and opens
    /// the dashboard. A profile failure right after login undoes the login.
    pub async fn login_admin(&self, credentials: &Credentials) -> Result<Navigation, ConsoleError> {
        let token = self.inner.accounts.login(Realm::Admin, credentials).await?;
        self.inner.session.login_admin(&token)?;

        let ticket = self
            .inner
            .session
            .begin_admin_refresh()
            .ok_or(ConsoleError::Unauthorized)?;

        match self.inner.accounts.fetch_admin_profile(&ticket.token).await {
            Ok(profile) => {
                self.inner.session.apply_admin_profile(&ticket, profile);
            }
            Err(e) => {
                self.inner.session.invalidate(&ticket);
                return Err(e);
            }
        }

        Ok(self.navigate(ADMIN_HOME_PATH))
    }

    /// Logs `realm` out and lands on its login view.
    pub fn logout(&self, realm: Realm) -> Navigation {
        if let Err(e) = self.inner.session.logout(realm) {
            tracing::warn!("failed to clear persisted token: {}", e);
        }
        let login = match realm {
            Realm::User => guard::LoginView::User,
            Realm::Admin => guard::LoginView::Admin,
        };
        self.navigate(login.path())
    }
}
